//! Cooperative tasks and the periodic-dispatch bookkeeping they share.
//!
//! ```text
//!   scheduler pass ──► run() ──► due? ──no──► return
//!                                  │
//!                                 yes
//!                                  ▼
//!                       one FSM transition (bounded)
//!                                  ▼
//!                     next_deadline += period (fixed increment)
//! ```

pub mod driver_task;
pub mod encoder_task;
pub mod motor_task;
pub mod user_task;

use core::fmt;

use crate::config::TaskConfig;
use crate::console::Console;
use crate::time::Instant;

pub use driver_task::DriverTask;
pub use encoder_task::EncoderTask;
pub use motor_task::MotorTask;
pub use user_task::UserTask;

// ── Task interface ────────────────────────────────────────────────────────────

/// What a task step gets from the scheduler.
pub struct Context<'c> {
    /// Timestamp taken just before this task's step.
    pub now: Instant,
    pub console: &'c mut dyn Console,
}

/// A cooperatively scheduled task.
///
/// `run` is called once per scheduler pass whether or not the task is due;
/// the deadline check is the task's own business. It must return in bounded
/// time and never wait on another task.
pub trait Task {
    fn name(&self) -> &'static str;

    fn run(&mut self, cx: &mut Context<'_>) -> Result<(), TaskFault>;

    /// Called once when the scheduler stops.
    fn shutdown(&mut self, _cx: &mut Context<'_>) {}
}

/// Invariant violation that stops a task for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskFault {
    /// The task's state did not permit the shared-cell value it observed.
    ProtocolViolation {
        task: &'static str,
        expected: &'static str,
    },
}

impl fmt::Display for TaskFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation { task, expected } => {
                write!(f, "{}: protocol violation, expected {}", task, expected)
            }
        }
    }
}

// ── Periodic dispatch ─────────────────────────────────────────────────────────

/// FSM state enums name themselves for transition traces.
pub trait StateName: Copy + PartialEq {
    fn name(self) -> &'static str;
}

/// Deadline tracking plus the current FSM state of one task.
pub struct PeriodicTask<S> {
    name: &'static str,
    period_us: u32,
    next_deadline: Instant,
    state: S,
    debug: bool,
    runs: u32,
}

impl<S: StateName> PeriodicTask<S> {
    /// First deadline is one period after `now`.
    pub fn new(config: TaskConfig, initial: S, now: Instant) -> Self {
        Self {
            name: config.name,
            period_us: config.period_us,
            next_deadline: now.ticks_add(config.period_us),
            state: initial,
            debug: config.debug,
            runs: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Completed dispatches.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn state(&self) -> S {
        self.state
    }

    /// Deadline reached, compared with wrap-safe signed difference.
    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        now.reached(self.next_deadline)
    }

    /// Closes a dispatch: the deadline moves by exactly one period no matter
    /// how late this dispatch ran.
    pub fn complete(&mut self) {
        self.next_deadline = self.next_deadline.ticks_add(self.period_us);
        self.runs = self.runs.wrapping_add(1);
    }

    pub fn transition_to(&mut self, next: S) {
        if self.debug {
            log_debug!("{}: {} -> {}", self.name, self.state.name(), next.name());
        }
        self.state = next;
    }
}
