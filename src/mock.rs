//! Host-side collaborators for tests.
//!
//! Always compiled (they are `no_std` too) so integration tests and downstream
//! crates can drive the task set without hardware.

use core::cell::Cell;
use core::fmt;

use heapless::{Deque, String};

use crate::config::COUNTS_PER_REV;
use crate::console::Console;
use crate::hal::{Encoder, Motor, MotorDriver};
use crate::protocol::{EncoderId, MotorId};
use crate::time::{Clock, Instant};

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Manually advanced clock.
#[derive(Default)]
pub struct MockClock {
    now_us: Cell<u32>,
}

impl MockClock {
    pub const fn new() -> Self {
        Self { now_us: Cell::new(0) }
    }

    pub fn at(us: u32) -> Self {
        Self { now_us: Cell::new(us) }
    }

    pub fn set(&self, us: u32) {
        self.now_us.set(us);
    }

    /// Moves time forward, wrapping like the hardware counter.
    pub fn advance(&self, us: u32) {
        self.now_us.set(self.now_us.get().wrapping_add(us));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.now_us.get())
    }
}

// ── Encoder ───────────────────────────────────────────────────────────────────

/// Encoder whose raw count is moved by the test.
pub struct MockEncoder {
    id: EncoderId,
    raw: i32,
    last_raw: i32,
    offset: i32,
    position: i32,
    delta: i32,
    pub zero_calls: u32,
    pub updates: u32,
}

impl MockEncoder {
    pub const fn new(id: EncoderId) -> Self {
        Self {
            id,
            raw: 0,
            last_raw: 0,
            offset: 0,
            position: 0,
            delta: 0,
            zero_calls: 0,
            updates: 0,
        }
    }

    /// Turns the shaft by `ticks` (seen at the next update).
    pub fn rotate(&mut self, ticks: i32) {
        self.raw = self.raw.wrapping_add(ticks);
    }
}

impl Encoder for MockEncoder {
    fn id(&self) -> EncoderId {
        self.id
    }

    fn counts_per_rev(&self) -> u32 {
        COUNTS_PER_REV
    }

    fn update(&mut self) {
        self.delta = self.raw.wrapping_sub(self.last_raw);
        self.last_raw = self.raw;
        self.position = self.raw.wrapping_sub(self.offset);
        self.updates += 1;
    }

    fn zero(&mut self) {
        self.offset = self.raw;
        self.position = 0;
        self.zero_calls += 1;
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn delta(&self) -> i32 {
        self.delta
    }
}

// ── Motor ─────────────────────────────────────────────────────────────────────

/// Motor that records every hardware command.
pub struct MockMotor {
    id: MotorId,
    duty: u8,
    direction: i8,
    /// Number of `set_duty` calls.
    pub commands: u32,
    pub last_command: Option<i8>,
}

impl MockMotor {
    pub const fn new(id: MotorId) -> Self {
        Self {
            id,
            duty: 0,
            direction: 0,
            commands: 0,
            last_command: None,
        }
    }

    /// Starts with a duty already applied, without counting a command.
    pub fn running(id: MotorId, signed_duty: i8) -> Self {
        let mut m = Self::new(id);
        m.duty = signed_duty.unsigned_abs();
        m.direction = signed_duty.signum();
        m
    }
}

impl Motor for MockMotor {
    fn id(&self) -> MotorId {
        self.id
    }

    fn set_duty(&mut self, duty: i8) {
        let duty = duty.clamp(-100, 100);
        self.duty = duty.unsigned_abs();
        self.direction = duty.signum();
        self.commands += 1;
        self.last_command = Some(duty);
    }

    fn duty(&self) -> u8 {
        self.duty
    }

    fn direction(&self) -> i8 {
        self.direction
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDriver {
    enabled: bool,
    faulted: bool,
}

impl MockDriver {
    pub const fn new() -> Self {
        Self {
            enabled: false,
            faulted: false,
        }
    }

    /// Simulates the fault pin: actuation drops immediately.
    pub fn trip_fault(&mut self) {
        self.faulted = true;
        self.enabled = false;
    }
}

impl MotorDriver for MockDriver {
    fn enable(&mut self) {
        if !self.faulted {
            self.enabled = true;
        }
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_faulted(&self) -> bool {
        self.faulted
    }

    fn clear_fault(&mut self) {
        self.faulted = false;
    }
}

// ── Console ───────────────────────────────────────────────────────────────────

/// Console with a scripted input queue and captured output.
///
/// Output past `OUT` bytes is dropped and flagged in [`MockConsole::overflowed`].
pub struct MockConsole<const IN: usize = 64, const OUT: usize = 4096> {
    input: Deque<u8, IN>,
    output: String<OUT>,
    overflowed: bool,
}

impl<const IN: usize, const OUT: usize> MockConsole<IN, OUT> {
    pub const fn new() -> Self {
        Self {
            input: Deque::new(),
            output: String::new(),
            overflowed: false,
        }
    }

    /// Queues bytes as if typed. Bytes beyond `IN` are dropped.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.input.push_back(b).is_err() {
                break;
            }
        }
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    pub fn output(&self) -> &str {
        self.output.as_str()
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
        self.overflowed = false;
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl<const IN: usize, const OUT: usize> Default for MockConsole<IN, OUT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const IN: usize, const OUT: usize> fmt::Write for MockConsole<IN, OUT> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.output.push_str(s).is_err() {
            self.overflowed = true;
        }
        Ok(())
    }
}

impl<const IN: usize, const OUT: usize> Console for MockConsole<IN, OUT> {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }
}
