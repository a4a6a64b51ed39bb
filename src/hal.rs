//! Hardware collaborators driven by the tasks.
//!
//! The firmware implements these over STM32 timers and GPIO; [`crate::mock`]
//! implements them for host tests.

use crate::protocol::{EncoderId, MotorId};

/// Quadrature encoder with a logical zero.
pub trait Encoder {
    fn id(&self) -> EncoderId;

    /// Counts per output-shaft revolution.
    fn counts_per_rev(&self) -> u32;

    /// Latches the hardware counter. Called once per encoder-task period, so
    /// [`Encoder::delta`] is the tick change over one period.
    fn update(&mut self);

    /// Redefines the current position as zero.
    fn zero(&mut self);

    /// Ticks since the last zero, as of the last update.
    fn position(&self) -> i32;

    /// Ticks gained during the last update interval.
    fn delta(&self) -> i32;
}

/// One DC motor on an H-bridge.
pub trait Motor {
    fn id(&self) -> MotorId;

    /// Applies a signed duty in `[-100, 100]`. Positive drives forward,
    /// negative reverse, zero brakes.
    fn set_duty(&mut self, duty: i8);

    /// Magnitude of the applied duty, `0..=100`.
    fn duty(&self) -> u8;

    /// `1` forward, `-1` reverse, `0` braked.
    fn direction(&self) -> i8;

    /// `duty() * direction()`.
    fn signed_duty(&self) -> i16 {
        self.duty() as i16 * self.direction() as i16
    }
}

/// Dual H-bridge driver chip shared by both motors.
///
/// An electrical fault disables actuation inside the implementation the
/// moment it happens; the core only observes it.
pub trait MotorDriver {
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
    fn is_faulted(&self) -> bool;
    /// Releases a latched fault. Actuation stays disabled.
    fn clear_fault(&mut self);
}
