use core::fmt;
use core::mem::MaybeUninit;

use embassy_stm32::usb_otg::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::{Builder, Config, UsbDevice};

use cotask_bench::console::Console;

bind_interrupts!(pub struct Irqs {
    OTG_FS => usb_otg::InterruptHandler<peripherals::USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, peripherals::USB_OTG_FS>;
pub type UsbSerial<'a> = CdcAcmClass<'a, UsbDriver>;

const MAX_PACKET: u16 = 64;

// ── Console pipes ─────────────────────────────────────────────────────────────
//  The scheduler side only ever try_reads / try_writes; the USB tasks do the
//  awaiting.
static RX_PIPE: Pipe<CriticalSectionRawMutex, 256> = Pipe::new();
static TX_PIPE: Pipe<CriticalSectionRawMutex, 1024> = Pipe::new();

pub struct UsbResources<'a> {
    config_desc: [u8; 256],
    bos_desc: [u8; 256],
    control_buf: [u8; 64],
    state: MaybeUninit<State<'a>>,
    ep_out_buffer: [u8; 256],
}

impl<'a> UsbResources<'a> {
    pub const fn new() -> Self {
        Self {
            config_desc: [0; 256],
            bos_desc: [0; 256],
            control_buf: [0; 64],
            state: MaybeUninit::uninit(),
            ep_out_buffer: [0; 256],
        }
    }
}

static mut USB_RES: UsbResources<'static> = UsbResources::new();

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Host → console.
#[embassy_executor::task]
pub async fn usb_rx_task(mut rx: Receiver<'static, UsbDriver>) -> ! {
    let mut buf = [0u8; MAX_PACKET as usize];
    loop {
        rx.wait_connection().await;
        defmt::info!("USB console connected");
        while let Ok(n) = rx.read_packet(&mut buf).await {
            RX_PIPE.write_all(&buf[..n]).await;
        }
        defmt::info!("USB console disconnected");
    }
}

/// Console → host.
#[embassy_executor::task]
pub async fn usb_tx_task(mut tx: Sender<'static, UsbDriver>) -> ! {
    // One byte short of a full packet, so no zero-length packet is ever owed.
    let mut buf = [0u8; MAX_PACKET as usize - 1];
    loop {
        tx.wait_connection().await;
        loop {
            let n = TX_PIPE.read(&mut buf).await;
            if tx.write_packet(&buf[..n]).await.is_err() {
                break;
            }
        }
    }
}

/// Scheduler-side end of the console pipes. Never blocks: input is whatever
/// has arrived, output that does not fit in the pipe is dropped.
pub struct UsbConsole;

impl fmt::Write for UsbConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            match TX_PIPE.try_write(bytes) {
                Ok(n) => bytes = &bytes[n..],
                Err(_) => break,
            }
        }
        Ok(())
    }
}

impl Console for UsbConsole {
    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match RX_PIPE.try_read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

pub fn init(
    usb_periph: peripherals::USB_OTG_FS,
    pa12: peripherals::PA12,
    pa11: peripherals::PA11,
) -> (UsbDevice<'static, UsbDriver>, UsbSerial<'static>) {
    // init runs once, so these are the only references to USB_RES.
    let driver_buf = unsafe { &mut *(&raw mut USB_RES.ep_out_buffer) };
    let mut usb_config = embassy_stm32::usb_otg::Config::default();
    usb_config.vbus_detection = false;
    let driver = Driver::new_fs(usb_periph, Irqs, pa12, pa11, driver_buf, usb_config);

    let mut config = Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("cotask");
    config.product = Some("Two-motor bench console");
    config.serial_number = Some("00000001");

    let res = unsafe { &mut *(&raw mut USB_RES) };
    let mut builder = Builder::new(
        driver,
        config,
        &mut res.config_desc,
        &mut res.bos_desc,
        &mut [], // msos_descs
        &mut res.control_buf,
    );

    let state = res.state.write(State::new());
    let class = CdcAcmClass::new(&mut builder, state, MAX_PACKET);
    let usb = builder.build();

    (usb, class)
}
