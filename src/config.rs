//! Compile-time configuration for the task set.
//!
//! All times are in microseconds, matching the [`crate::time::Instant`] tick.

/// Upper bound on tasks a [`crate::Scheduler`] can hold.
pub const MAX_TASKS: usize = 8;

/// Quadrature counts per output-shaft revolution.
pub const COUNTS_PER_REV: u32 = 4000;

/// Sampling sessions stop appending once this much time has elapsed.
pub const SESSION_LIMIT_US: u32 = 30_000_000;

/// Rows a [`crate::sample::SampleBuffer`] can hold: 30 s at the 10 ms
/// encoder period with headroom for a late scheduler.
pub const SAMPLE_CAPACITY: usize = 3_200;

/// Report rows written per user-task tick. At 10 ms that is about 40 kB/s,
/// well inside what the USB console drains.
pub const REPORT_ROWS_PER_TICK: usize = 8;

/// Longest accepted duty-cycle entry, sign included ("-100" needs four).
pub const DUTY_ENTRY_LEN: usize = 6;

/// Static per-task configuration.
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    /// Name used in logs and fault reports.
    pub name: &'static str,
    /// Dispatch period.
    pub period_us: u32,
    /// Log every FSM transition at debug level.
    pub debug: bool,
}

impl TaskConfig {
    pub const fn new(name: &'static str, period_us: u32) -> Self {
        Self {
            name,
            period_us,
            debug: false,
        }
    }

    pub const fn with_debug(self, debug: bool) -> Self {
        Self { debug, ..self }
    }
}

// ── Default task table (all 100 Hz) ──────────────────────────────────────────

pub const USER_TASK: TaskConfig = TaskConfig::new("USER", 10_000);
pub const ENCODER_A_TASK: TaskConfig = TaskConfig::new("ENC_A", 10_000);
pub const ENCODER_B_TASK: TaskConfig = TaskConfig::new("ENC_B", 10_000);
pub const MOTOR_A_TASK: TaskConfig = TaskConfig::new("MOTOR_A", 10_000);
pub const MOTOR_B_TASK: TaskConfig = TaskConfig::new("MOTOR_B", 10_000);
pub const DRIVER_TASK: TaskConfig = TaskConfig::new("MOTOR_DRIVER", 10_000);
