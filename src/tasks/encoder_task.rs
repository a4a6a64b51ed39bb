use core::f32::consts::PI;
use core::fmt::Write;

use crate::config::TaskConfig;
use crate::hal::Encoder;
use crate::protocol::EncoderCommand;
use crate::state::Shares;
use crate::time::Instant;

use super::{Context, PeriodicTask, StateName, Task, TaskFault};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Init,
    ZeroEncoder,
    ReportPosition,
    ReportDelta,
    GatherSample,
    Halt,
}

impl StateName for EncoderState {
    fn name(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::ZeroEncoder => "ZeroEncoder",
            Self::ReportPosition => "ReportPosition",
            Self::ReportDelta => "ReportDelta",
            Self::GatherSample => "GatherSample",
            Self::Halt => "Halt",
        }
    }
}

/// Encoder task: serves the encoder command cell for one bound encoder.
///
/// Two instances share the cell. Each resolves only commands naming its own
/// encoder (plus the shared `Halt`) and leaves everything else in place.
/// Every action completes within the tick that observed it.
pub struct EncoderTask<'a, E: Encoder> {
    task: PeriodicTask<EncoderState>,
    encoder: E,
    shares: &'a Shares,
}

impl<'a, E: Encoder> EncoderTask<'a, E> {
    pub fn new(config: TaskConfig, encoder: E, shares: &'a Shares, now: Instant) -> Self {
        Self {
            task: PeriodicTask::new(config, EncoderState::Init, now),
            encoder,
            shares,
        }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn periodic(&self) -> &PeriodicTask<EncoderState> {
        &self.task
    }

    pub fn ticks_to_radians(&self, ticks: i32) -> f32 {
        ticks as f32 * (2.0 * PI / self.encoder.counts_per_rev() as f32)
    }

    /// Ticks gained over one task period, as rad/s.
    pub fn radians_per_second(&self, delta_ticks: i32) -> f32 {
        let period_s = self.task.period_us() as f32 / 1_000_000.0;
        self.ticks_to_radians(delta_ticks) / period_s
    }

    fn step(&mut self, cx: &mut Context<'_>) {
        self.encoder.update();

        let Some(cmd) = self.shares.encoder_cmd.read() else {
            return;
        };
        if !cmd.is_for(self.encoder.id()) {
            return;
        }

        let label = self.encoder.id().label();
        match cmd {
            EncoderCommand::Zero(_) => {
                self.task.transition_to(EncoderState::ZeroEncoder);
                self.encoder.zero();
                let _ = write!(cx.console, "{} position zeroed\r\n\r\n", label);
                self.shares.encoder_cmd.clear_if(|c| *c == cmd);
            }
            EncoderCommand::ReportPosition(_) => {
                self.task.transition_to(EncoderState::ReportPosition);
                let ticks = self.encoder.position();
                let _ = write!(
                    cx.console,
                    "{} position: {} ticks ({:.4} rad)\r\n\r\n",
                    label,
                    ticks,
                    self.ticks_to_radians(ticks)
                );
                self.shares.encoder_cmd.clear_if(|c| *c == cmd);
            }
            EncoderCommand::ReportDelta(_) => {
                self.task.transition_to(EncoderState::ReportDelta);
                let ticks = self.encoder.delta();
                let _ = write!(
                    cx.console,
                    "{} delta: {} ticks ({:.4} rad/s)\r\n\r\n",
                    label,
                    ticks,
                    self.radians_per_second(ticks)
                );
                self.shares.encoder_cmd.clear_if(|c| *c == cmd);
            }
            EncoderCommand::Gather(id) => {
                self.task.transition_to(EncoderState::GatherSample);
                self.shares
                    .position
                    .write(self.ticks_to_radians(self.encoder.position()));
                self.shares
                    .delta
                    .write(self.radians_per_second(self.encoder.delta()));
                // The tag tells the user task which stream this sample is from.
                self.shares.encoder_cmd.write(EncoderCommand::SampleReady(id));
            }
            EncoderCommand::Halt => {
                self.task.transition_to(EncoderState::Halt);
                self.shares.encoder_cmd.clear_if(|c| *c == EncoderCommand::Halt);
            }
            EncoderCommand::SampleReady(_) => return,
        }
        self.task.transition_to(EncoderState::Init);
    }
}

impl<E: Encoder> Task for EncoderTask<'_, E> {
    fn name(&self) -> &'static str {
        self.task.name()
    }

    fn run(&mut self, cx: &mut Context<'_>) -> Result<(), TaskFault> {
        if !self.task.is_due(cx.now) {
            return Ok(());
        }
        self.step(cx);
        self.task.complete();
        Ok(())
    }
}
