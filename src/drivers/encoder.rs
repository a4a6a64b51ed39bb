use embassy_stm32::timer::qei::Qei;
use embassy_stm32::timer::CaptureCompare16bitInstance;

use cotask_bench::config::COUNTS_PER_REV;
use cotask_bench::hal::Encoder;
use cotask_bench::protocol::EncoderId;

/// Quadrature encoder on a 16-bit timer in encoder mode.
///
/// The hardware counter wraps every 65536 counts; `update` folds each wrapped
/// step into a 32-bit running count, so it must run often enough that the
/// shaft moves less than 32768 counts between calls (8 rev at 4000 CPR).
pub struct QuadEncoder<'d, T: CaptureCompare16bitInstance> {
    id: EncoderId,
    qei: Qei<'d, T>,
    last_count: u16,
    raw: i32,
    offset: i32,
    position: i32,
    delta: i32,
}

impl<'d, T: CaptureCompare16bitInstance> QuadEncoder<'d, T> {
    pub fn new(id: EncoderId, qei: Qei<'d, T>) -> Self {
        let last_count = qei.count();
        Self {
            id,
            qei,
            last_count,
            raw: 0,
            offset: 0,
            position: 0,
            delta: 0,
        }
    }
}

impl<T: CaptureCompare16bitInstance> Encoder for QuadEncoder<'_, T> {
    fn id(&self) -> EncoderId {
        self.id
    }

    fn counts_per_rev(&self) -> u32 {
        COUNTS_PER_REV
    }

    fn update(&mut self) {
        let count = self.qei.count();
        // Reinterpreting the wrapped difference as i16 picks the short way round.
        let step = count.wrapping_sub(self.last_count) as i16 as i32;
        self.last_count = count;
        self.raw = self.raw.wrapping_add(step);
        self.delta = step;
        self.position = self.raw.wrapping_sub(self.offset);
    }

    fn zero(&mut self) {
        self.offset = self.raw;
        self.position = 0;
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn delta(&self) -> i32 {
        self.delta
    }
}
