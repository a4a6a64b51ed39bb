//! Cooperative, time-triggered task set for a two-motor / two-encoder bench.
//!
//! A user-interface task, two encoder tasks, two motor tasks and a motor-driver
//! task run one bounded step each per scheduler pass. They never call each
//! other: every hand-off goes through the single-slot [`shared::SharedCell`]s
//! bundled in [`state::Shares`], carrying the command vocabulary defined in
//! [`protocol`].
//!
//! ```text
//!  user ──EncoderCommand──► encoder A / encoder B ──position, delta──► user
//!  user ──MotorCommand────► motor A / motor B / motor driver
//! ```
//!
//! Tasks sharing a command cell obey one rule: peek, act only if the command
//! targets you, otherwise leave the cell untouched for your sibling.
//!
//! The library is `no_std` and hardware-free; the STM32 firmware in
//! `src/main.rs` supplies the encoder, motor, driver and console collaborators.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod config;
pub mod console;
pub mod hal;
pub mod mock;
pub mod protocol;
pub mod sample;
pub mod scheduler;
pub mod shared;
pub mod state;
pub mod tasks;
pub mod time;

pub use scheduler::{AbortSignal, Scheduler, SchedulerError};
pub use shared::SharedCell;
pub use state::Shares;
pub use tasks::{Context, Task, TaskFault};
