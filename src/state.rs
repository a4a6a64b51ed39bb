//! Shared cells for inter-task communication.
//!
//! One writer family per direction: the user task writes commands, the
//! encoder tasks write samples back. All payloads are `Copy`.

use crate::protocol::{EncoderCommand, MotorCommand};
use crate::shared::SharedCell;

// ── Cell bundle ───────────────────────────────────────────────────────────────

pub struct Shares {
    /// user → encoder A / encoder B, and the `SampleReady` tag back.
    pub encoder_cmd: SharedCell<EncoderCommand>,
    /// user → motor A / motor B / motor driver.
    pub motor_cmd: SharedCell<MotorCommand>,
    /// Encoder position in radians, written with a `SampleReady` tag.
    pub position: SharedCell<f32>,
    /// Encoder velocity in rad/s, written with a `SampleReady` tag.
    pub delta: SharedCell<f32>,
}

impl Shares {
    pub const fn new() -> Self {
        Self {
            encoder_cmd: SharedCell::empty(),
            motor_cmd: SharedCell::empty(),
            position: SharedCell::empty(),
            delta: SharedCell::empty(),
        }
    }

    /// Empties the encoder command cell and both data cells.
    pub fn clear_sampling(&self) {
        self.encoder_cmd.clear();
        self.position.clear();
        self.delta.clear();
    }

    /// Drops any sample in flight and tells the encoders to stop.
    pub fn halt_sampling(&self) {
        self.position.clear();
        self.delta.clear();
        self.encoder_cmd.write(EncoderCommand::Halt);
    }
}

impl Default for Shares {
    fn default() -> Self {
        Self::new()
    }
}
