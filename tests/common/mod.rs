//! Host bench: every task wired to mocks, a transcript console and helpers
//! for driving whole scheduler passes.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;

use cotask_bench::config::{
    DRIVER_TASK, ENCODER_A_TASK, ENCODER_B_TASK, MOTOR_A_TASK, MOTOR_B_TASK, USER_TASK,
};
use cotask_bench::console::Console;
use cotask_bench::mock::{MockDriver, MockEncoder, MockMotor};
use cotask_bench::protocol::{EncoderId, MotorId};
use cotask_bench::sample::SampleBuffer;
use cotask_bench::tasks::{DriverTask, EncoderTask, MotorTask, UserTask};
use cotask_bench::time::{Clock, Instant};
use cotask_bench::{AbortSignal, Scheduler, Shares};

pub const PERIOD_US: u32 = 10_000;

/// Unbounded console that keeps everything written to it.
#[derive(Default)]
pub struct TranscriptConsole {
    input: VecDeque<u8>,
    output: String,
}

impl TranscriptConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_keys(&mut self, keys: &[u8]) {
        self.input.extend(keys.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.input.len()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl fmt::Write for TranscriptConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

impl Console for TranscriptConsole {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }
}

/// Clock that moves forward a fixed step every time it is read, for
/// [`Scheduler::run`] which never advances time itself.
pub struct SteppingClock {
    now_us: Cell<u32>,
    step_us: u32,
}

impl SteppingClock {
    pub fn new(step_us: u32) -> Self {
        Self {
            now_us: Cell::new(0),
            step_us,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let t = self.now_us.get();
        self.now_us.set(t.wrapping_add(self.step_us));
        Instant::from_micros(t)
    }
}

/// Collaborators handed to the tasks.
pub struct Hardware {
    pub enc_a: MockEncoder,
    pub enc_b: MockEncoder,
    pub motor_a: MockMotor,
    pub motor_b: MockMotor,
    pub driver: MockDriver,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            enc_a: MockEncoder::new(EncoderId::A),
            enc_b: MockEncoder::new(EncoderId::B),
            motor_a: MockMotor::new(MotorId::A),
            motor_b: MockMotor::new(MotorId::B),
            driver: MockDriver::new(),
        }
    }
}

/// The full task set, in dispatch order.
pub struct Bench<'a> {
    pub user: UserTask<'a>,
    pub enc_a: EncoderTask<'a, MockEncoder>,
    pub enc_b: EncoderTask<'a, MockEncoder>,
    pub driver: DriverTask<'a, MockDriver>,
    pub motor_a: MotorTask<'a, MockMotor>,
    pub motor_b: MotorTask<'a, MockMotor>,
}

impl<'a> Bench<'a> {
    pub fn new(
        hw: Hardware,
        shares: &'a Shares,
        samples: &'a mut SampleBuffer,
        abort: &'a AbortSignal,
        now: Instant,
    ) -> Self {
        Self {
            user: UserTask::new(USER_TASK, shares, samples, abort, now),
            enc_a: EncoderTask::new(ENCODER_A_TASK, hw.enc_a, shares, now),
            enc_b: EncoderTask::new(ENCODER_B_TASK, hw.enc_b, shares, now),
            driver: DriverTask::new(DRIVER_TASK, hw.driver, shares, now),
            motor_a: MotorTask::new(MOTOR_A_TASK, hw.motor_a, shares, abort, now),
            motor_b: MotorTask::new(MOTOR_B_TASK, hw.motor_b, shares, abort, now),
        }
    }

    pub fn scheduler<'t, K: Clock>(&'t mut self, clock: K) -> Scheduler<'t, K> {
        let mut sched = Scheduler::new(clock);
        sched.register(&mut self.user).unwrap();
        sched.register(&mut self.enc_a).unwrap();
        sched.register(&mut self.enc_b).unwrap();
        sched.register(&mut self.driver).unwrap();
        sched.register(&mut self.motor_a).unwrap();
        sched.register(&mut self.motor_b).unwrap();
        sched
    }
}

/// One pass per period for `ms` milliseconds of simulated time.
pub fn run_for<K: Clock>(
    sched: &mut Scheduler<'_, K>,
    clock: &cotask_bench::mock::MockClock,
    console: &mut TranscriptConsole,
    ms: u32,
) {
    for _ in 0..ms * 1_000 / PERIOD_US {
        clock.advance(PERIOD_US);
        sched.pass(console);
    }
}
