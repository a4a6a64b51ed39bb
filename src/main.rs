#![no_std]
#![no_main]

mod board;
mod drivers;
mod usb;

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_stm32::exti::{Channel as _, ExtiInput};
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pin, Pull, Speed};
use embassy_stm32::time::khz;
use embassy_stm32::timer::qei::{Qei, QeiPin};
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::{Channel, CountingMode};
use embassy_time::{Duration, Timer};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use cotask_bench::config::{
    DRIVER_TASK, ENCODER_A_TASK, ENCODER_B_TASK, MOTOR_A_TASK, MOTOR_B_TASK, USER_TASK,
};
use cotask_bench::protocol::{EncoderId, MotorId};
use cotask_bench::sample::SampleBuffer;
use cotask_bench::tasks::{DriverTask, EncoderTask, MotorTask, UserTask};
use cotask_bench::time::Clock;
use cotask_bench::{AbortSignal, Scheduler, Shares};

use crate::board::{Board, EmbassyClock};
use crate::drivers::drv8847::{fault_task, Drv8847};
use crate::drivers::encoder::QuadEncoder;
use crate::drivers::motor::{BridgePwm, HBridgeMotor};
use crate::usb::UsbConsole;

// ── Shared state ──────────────────────────────────────────────────────────────
static SHARES: Shares = Shares::new();
static ABORT: AbortSignal = AbortSignal::new();

// 30 s of rows lives in .bss, never on a stack.
static SAMPLES: ConstStaticCell<SampleBuffer> = ConstStaticCell::new(SampleBuffer::new());
static BRIDGE_PWM: StaticCell<BridgePwm> = StaticCell::new();

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;

    // 2. USB CDC-ACM console, split into RX / TX pumps
    let (usb_dev, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
    let (usb_tx, usb_rx) = usb_serial.split();
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();
    spawner.spawn(usb::usb_rx_task(usb_rx)).unwrap();
    spawner.spawn(usb::usb_tx_task(usb_tx)).unwrap();

    // 3. Encoders: TIM4 (PB6/PB7) and TIM8 (PC6/PC7) in encoder mode
    let qei_a = Qei::new(p.TIM4, QeiPin::new_ch1(p.PB6), QeiPin::new_ch2(p.PB7));
    let qei_b = Qei::new(p.TIM8, QeiPin::new_ch1(p.PC6), QeiPin::new_ch2(p.PC7));

    // 4. DRV8847 bridge: TIM3 @ 20 kHz, motor A on CH1/CH2 (PB4/PB5),
    //    motor B on CH3/CH4 (PB0/PB1)
    let pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PB4, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PB5, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PB0, OutputType::PushPull)),
        Some(PwmPin::new_ch4(p.PB1, OutputType::PushPull)),
        khz(20),
        CountingMode::EdgeAlignedUp,
    );
    let pwm: &'static BridgePwm = BRIDGE_PWM.init(RefCell::new(pwm));

    // 5. nSLEEP (PA15) and nFAULT (PB2, falling edge)
    let n_sleep = Output::new(p.PA15.degrade(), Level::Low, Speed::Low);
    let n_fault = ExtiInput::new(Input::new(p.PB2.degrade(), Pull::Up), p.EXTI2.degrade());
    spawner.spawn(fault_task(n_fault)).unwrap();

    // 6. Task set
    let clock = EmbassyClock;
    let now = clock.now();

    let mut user = UserTask::new(USER_TASK, &SHARES, SAMPLES.take(), &ABORT, now);
    let mut enc_a = EncoderTask::new(
        ENCODER_A_TASK,
        QuadEncoder::new(EncoderId::A, qei_a),
        &SHARES,
        now,
    );
    let mut enc_b = EncoderTask::new(
        ENCODER_B_TASK,
        QuadEncoder::new(EncoderId::B, qei_b),
        &SHARES,
        now,
    );
    let mut driver = DriverTask::new(DRIVER_TASK, Drv8847::new(n_sleep), &SHARES, now);
    let mut motor_a = MotorTask::new(
        MOTOR_A_TASK,
        HBridgeMotor::new(MotorId::A, pwm, Channel::Ch1, Channel::Ch2),
        &SHARES,
        &ABORT,
        now,
    );
    let mut motor_b = MotorTask::new(
        MOTOR_B_TASK,
        HBridgeMotor::new(MotorId::B, pwm, Channel::Ch3, Channel::Ch4),
        &SHARES,
        &ABORT,
        now,
    );

    let mut sched = Scheduler::new(clock);
    sched.register(&mut user).unwrap();
    sched.register(&mut enc_a).unwrap();
    sched.register(&mut enc_b).unwrap();
    sched.register(&mut driver).unwrap();
    sched.register(&mut motor_a).unwrap();
    sched.register(&mut motor_b).unwrap();

    // 7. Cooperative loop: one pass, then let the USB pumps run
    let mut console = UsbConsole;
    defmt::info!("scheduler started with {} tasks", sched.len());
    while !ABORT.is_raised() {
        sched.pass(&mut console);
        yield_now().await;
    }
    sched.shutdown(&mut console);

    // Give the farewell time to leave the TX pipe, then idle.
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
