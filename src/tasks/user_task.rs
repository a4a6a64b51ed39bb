use core::fmt::Write;

use crate::config::{TaskConfig, REPORT_ROWS_PER_TICK, SAMPLE_CAPACITY, SESSION_LIMIT_US};
use crate::protocol::{decode_key, EncoderCommand, EncoderId, MotorCommand, UserAction};
use crate::sample::{PushError, SampleBuffer};
use crate::scheduler::AbortSignal;
use crate::state::Shares;
use crate::time::Instant;

use super::{Context, PeriodicTask, StateName, Task, TaskFault};

const MENU: &str = "\r\n\
      Select an option (keys are case sensitive):\r\n\
+-------------------------------------------------------------------+\r\n\
| z / Z    Zero encoder A / B                                       |\r\n\
| p / P    Print position of encoder A / B                          |\r\n\
| d / D    Print velocity of encoder A / B                          |\r\n\
| m / M    Enter a new duty cycle for motor A / B                   |\r\n\
| x X      Both motors full forward                                 |\r\n\
| y Y      Both motors full reverse                                 |\r\n\
| g / G    Record encoder A / B for 30 s, then print the data       |\r\n\
| s S      Stop recording early                                     |\r\n\
| e E      Enable / disable the motor driver                        |\r\n\
| c C      Clear a motor driver fault                               |\r\n\
| h H      Show this menu                                           |\r\n\
| Ctrl+C   Quit                                                     |\r\n\
+-------------------------------------------------------------------+\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Init,
    WaitForInput,
    /// Streaming a finished session's table, a few rows per tick.
    Report,
}

impl StateName for UserState {
    fn name(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::WaitForInput => "WaitForInput",
            Self::Report => "Report",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Session {
    source: EncoderId,
    started: Instant,
}

/// User-interface task: turns keystrokes into commands and runs sampling
/// sessions.
///
/// One keystroke is decoded per tick. While a motor task owns the console
/// for duty entry (a `ModifyDuty` sits in the motor cell) no keystroke is
/// consumed here.
///
/// A session alternates `Gather(id)` → `SampleReady(id)` through the encoder
/// cell, one row per round trip, until `s` is pressed, 30 s elapse or the
/// buffer fills. The table is then streamed to the console and the buffer
/// emptied.
pub struct UserTask<'a, const N: usize = SAMPLE_CAPACITY> {
    task: PeriodicTask<UserState>,
    shares: &'a Shares,
    samples: &'a mut SampleBuffer<N>,
    session: Option<Session>,
    report_cursor: usize,
    abort: &'a AbortSignal,
}

impl<'a, const N: usize> UserTask<'a, N> {
    pub fn new(
        config: TaskConfig,
        shares: &'a Shares,
        samples: &'a mut SampleBuffer<N>,
        abort: &'a AbortSignal,
        now: Instant,
    ) -> Self {
        Self {
            task: PeriodicTask::new(config, UserState::Init, now),
            shares,
            samples,
            session: None,
            report_cursor: 0,
            abort,
        }
    }

    pub fn periodic(&self) -> &PeriodicTask<UserState> {
        &self.task
    }

    pub fn samples(&self) -> &SampleBuffer<N> {
        &*self.samples
    }

    /// A session is collecting rows.
    pub fn is_sampling(&self) -> bool {
        self.session.is_some()
    }

    fn step(&mut self, cx: &mut Context<'_>) -> Result<(), TaskFault> {
        match self.task.state() {
            UserState::Init => {
                let _ = cx.console.write_str(MENU);
                self.task.transition_to(UserState::WaitForInput);
            }
            UserState::WaitForInput => {
                if !self.duty_entry_pending() {
                    if let Some(byte) = cx.console.read_byte() {
                        self.handle_key(cx, byte);
                    }
                }
                self.collect_sample(cx)?;
            }
            UserState::Report => self.continue_report(cx),
        }
        Ok(())
    }

    fn duty_entry_pending(&self) -> bool {
        matches!(
            self.shares.motor_cmd.read(),
            Some(MotorCommand::ModifyDuty(_))
        )
    }

    fn handle_key(&mut self, cx: &mut Context<'_>, byte: u8) {
        let Some(action) = decode_key(byte) else {
            if byte != b'\r' && byte != b'\n' {
                let _ = write!(cx.console, "Command '{}' is invalid.\r\n\r\n", byte as char);
            }
            return;
        };

        match action {
            UserAction::Encoder(cmd) => {
                if self.refuse_while_sampling(cx) {
                    return;
                }
                self.shares.encoder_cmd.write(cmd);
            }
            UserAction::Motor(cmd) => self.shares.motor_cmd.write(cmd),
            UserAction::StartSession(id) => {
                if self.refuse_while_sampling(cx) {
                    return;
                }
                self.samples.clear();
                self.shares.clear_sampling();
                self.session = Some(Session {
                    source: id,
                    started: cx.now,
                });
                let _ = write!(cx.console, "Beginning {} data collection...\r\n", id.label());
                log_info!("sampling session started on {}", id.label());
                self.shares.encoder_cmd.write(EncoderCommand::Gather(id));
            }
            UserAction::HaltSession => {
                if self.session.is_some() {
                    self.end_session(cx);
                } else {
                    let _ = cx.console.write_str("No data collection in progress\r\n\r\n");
                }
            }
            UserAction::ShowMenu => {
                let _ = cx.console.write_str(MENU);
            }
            UserAction::Abort => {
                let _ = cx.console.write_str("\r\nCtrl+C received, stopping...\r\n");
                log_info!("operator abort");
                self.abort.raise();
            }
        }
    }

    fn refuse_while_sampling(&self, cx: &mut Context<'_>) -> bool {
        if self.session.is_none() {
            return false;
        }
        let _ = cx
            .console
            .write_str("Data collection in progress, press [s] to stop it first\r\n\r\n");
        true
    }

    /// Accepts one tagged sample, then re-arms or ends the session.
    fn collect_sample(&mut self, cx: &mut Context<'_>) -> Result<(), TaskFault> {
        let Some(EncoderCommand::SampleReady(id)) = self.shares.encoder_cmd.read() else {
            return Ok(());
        };

        let session = match self.session {
            Some(s) if s.source == id => s,
            _ => {
                // Left over from a session that already ended.
                self.shares
                    .encoder_cmd
                    .clear_if(|c| *c == EncoderCommand::SampleReady(id));
                self.shares.position.clear();
                self.shares.delta.clear();
                return Ok(());
            }
        };

        let (Some(position), Some(delta)) = (self.shares.position.read(), self.shares.delta.read())
        else {
            return Err(TaskFault::ProtocolViolation {
                task: self.task.name(),
                expected: "sample data with SampleReady",
            });
        };
        self.shares.position.clear();
        self.shares.delta.clear();

        let elapsed_us = cx.now.ticks_diff(session.started).max(0) as u32;
        match self.samples.push(elapsed_us, position, delta) {
            Ok(()) if elapsed_us < SESSION_LIMIT_US => {
                self.shares.encoder_cmd.write(EncoderCommand::Gather(id));
            }
            Ok(()) | Err(PushError::Expired) => self.end_session(cx),
            Err(PushError::Full) => {
                log_warn!(
                    "sample buffer full after {} rows, ending session early",
                    self.samples.len()
                );
                self.end_session(cx);
            }
        }
        Ok(())
    }

    /// Stops sampling and starts streaming the table.
    fn end_session(&mut self, cx: &mut Context<'_>) {
        self.session = None;
        self.shares.halt_sampling();
        self.report_cursor = 0;
        let _ = SampleBuffer::<N>::write_header(&mut *cx.console);
        log_info!("sampling session ended with {} rows", self.samples.len());
        self.task.transition_to(UserState::Report);
    }

    fn continue_report(&mut self, cx: &mut Context<'_>) {
        let len = self.samples.len();
        self.report_cursor = self
            .samples
            .write_rows(&mut *cx.console, self.report_cursor, REPORT_ROWS_PER_TICK)
            .unwrap_or(len);
        if self.report_cursor >= len {
            self.finish_report(cx);
        }
    }

    fn finish_report(&mut self, cx: &mut Context<'_>) {
        let _ = self.samples.write_trailer(&mut *cx.console);
        self.samples.clear();
        self.report_cursor = 0;
        self.task.transition_to(UserState::WaitForInput);
    }
}

impl<const N: usize> Task for UserTask<'_, N> {
    fn name(&self) -> &'static str {
        self.task.name()
    }

    fn run(&mut self, cx: &mut Context<'_>) -> Result<(), TaskFault> {
        if !self.task.is_due(cx.now) {
            return Ok(());
        }
        let result = self.step(cx);
        self.task.complete();
        result
    }

    /// Flushes whatever a session collected so far.
    fn shutdown(&mut self, cx: &mut Context<'_>) {
        if self.session.is_some() {
            self.end_session(cx);
        }
        if self.task.state() == UserState::Report {
            let _ = self
                .samples
                .write_rows(&mut *cx.console, self.report_cursor, usize::MAX);
            self.finish_report(cx);
        }
    }
}
