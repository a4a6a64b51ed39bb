use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Level, Output};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use cotask_bench::hal::MotorDriver;

// ── Fault latch ───────────────────────────────────────────────────────────────
//  Written by the nFAULT watcher, read by the scheduler side.
static FAULT: AtomicBool = AtomicBool::new(false);
static N_SLEEP: Mutex<CriticalSectionRawMutex, RefCell<Option<Output<'static, AnyPin>>>> =
    Mutex::new(RefCell::new(None));

fn set_sleep_pin(level: Level) {
    N_SLEEP.lock(|pin| {
        if let Some(pin) = pin.borrow_mut().as_mut() {
            pin.set_level(level);
        }
    });
}

/// DRV8847 dual H-bridge: nSLEEP gates actuation, nFAULT reports faults.
pub struct Drv8847 {
    enabled: bool,
}

impl Drv8847 {
    /// Takes the nSLEEP pin and starts with the bridge asleep.
    pub fn new(mut n_sleep: Output<'static, AnyPin>) -> Self {
        n_sleep.set_low();
        N_SLEEP.lock(|pin| pin.replace(Some(n_sleep)));
        Self { enabled: false }
    }
}

impl MotorDriver for Drv8847 {
    fn enable(&mut self) {
        if FAULT.load(Ordering::Acquire) {
            return;
        }
        set_sleep_pin(Level::High);
        self.enabled = true;
    }

    fn disable(&mut self) {
        set_sleep_pin(Level::Low);
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled && !FAULT.load(Ordering::Acquire)
    }

    fn is_faulted(&self) -> bool {
        FAULT.load(Ordering::Acquire)
    }

    fn clear_fault(&mut self) {
        self.disable();
        FAULT.store(false, Ordering::Release);
    }
}

/// nFAULT watcher: latches the fault and sleeps the bridge on the falling
/// edge, without waiting for the scheduler.
#[embassy_executor::task]
pub async fn fault_task(mut n_fault: ExtiInput<'static, AnyPin>) -> ! {
    loop {
        n_fault.wait_for_falling_edge().await;
        set_sleep_pin(Level::Low);
        FAULT.store(true, Ordering::Release);
        defmt::warn!("DRV8847 nFAULT asserted, bridge put to sleep");
    }
}
