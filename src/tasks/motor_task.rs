use core::fmt::Write;

use heapless::String;

use crate::config::{TaskConfig, DUTY_ENTRY_LEN};
use crate::hal::Motor;
use crate::protocol::{MotorCommand, CTRL_C};
use crate::scheduler::AbortSignal;
use crate::state::Shares;
use crate::time::Instant;

use super::{Context, PeriodicTask, StateName, Task, TaskFault};

const CR: u8 = b'\r';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Init,
    ModifyDutyCycle,
}

impl StateName for MotorState {
    fn name(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::ModifyDutyCycle => "ModifyDutyCycle",
        }
    }
}

/// Motor task: resolves duty-cycle requests for one bound motor.
///
/// A `ModifyDuty` request reads a signed decimal from the console, terminated
/// by CR. Only bytes already waiting are consumed on each tick; until CR
/// arrives the task stays in `ModifyDutyCycle` and the request stays in the
/// motor cell, which tells the user task to keep its hands off the console.
///
/// A duty equal to the one already applied is reported as unchanged and never
/// reaches the motor. Ctrl+C typed during entry abandons it and raises the
/// operator abort, since the user task is not reading keys at that point.
pub struct MotorTask<'a, M: Motor> {
    task: PeriodicTask<MotorState>,
    motor: M,
    shares: &'a Shares,
    abort: &'a AbortSignal,
    entry: String<DUTY_ENTRY_LEN>,
}

impl<'a, M: Motor> MotorTask<'a, M> {
    pub fn new(
        config: TaskConfig,
        motor: M,
        shares: &'a Shares,
        abort: &'a AbortSignal,
        now: Instant,
    ) -> Self {
        Self {
            task: PeriodicTask::new(config, MotorState::Init, now),
            motor,
            shares,
            abort,
            entry: String::new(),
        }
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn periodic(&self) -> &PeriodicTask<MotorState> {
        &self.task
    }

    fn step(&mut self, cx: &mut Context<'_>) -> Result<(), TaskFault> {
        let id = self.motor.id();
        let cmd = self.shares.motor_cmd.read();

        match self.task.state() {
            MotorState::Init => match cmd {
                Some(MotorCommand::ModifyDuty(target)) if target == id => {
                    self.task.transition_to(MotorState::ModifyDutyCycle);
                    self.entry.clear();
                    let _ = write!(cx.console, "Enter a duty cycle for {}: ", id.label());
                    self.collect_entry(cx);
                    Ok(())
                }
                Some(MotorCommand::Extreme { duty, turn }) if turn == id => {
                    self.task.transition_to(MotorState::ModifyDutyCycle);
                    self.apply(cx, duty.duty() as i16);
                    match id.next() {
                        Some(next) => self
                            .shares
                            .motor_cmd
                            .write(MotorCommand::Extreme { duty, turn: next }),
                        None => {
                            self.shares
                                .motor_cmd
                                .clear_if(|c| *c == MotorCommand::Extreme { duty, turn });
                        }
                    }
                    self.task.transition_to(MotorState::Init);
                    Ok(())
                }
                _ => Ok(()),
            },
            MotorState::ModifyDutyCycle => match cmd {
                Some(MotorCommand::ModifyDuty(target)) if target == id => {
                    self.collect_entry(cx);
                    Ok(())
                }
                _ => Err(TaskFault::ProtocolViolation {
                    task: self.task.name(),
                    expected: "pending ModifyDuty",
                }),
            },
        }
    }

    /// Drains the console bytes available now. Resolves the request on CR.
    fn collect_entry(&mut self, cx: &mut Context<'_>) {
        while let Some(byte) = cx.console.read_byte() {
            match byte {
                CR => {
                    let target = self.resolve_entry();
                    let _ = cx.console.write_str("\r\n");
                    self.apply(cx, target);
                    self.finish_entry();
                    return;
                }
                CTRL_C => {
                    let _ = cx.console.write_str("\r\nCtrl+C received, stopping...\r\n");
                    log_info!("operator abort during {} duty entry", self.motor.id().label());
                    self.finish_entry();
                    self.abort.raise();
                    return;
                }
                b'-' if self.entry.is_empty() => self.accept(cx, '-'),
                b'0'..=b'9' => self.accept(cx, byte as char),
                _ => {}
            }
        }
    }

    fn finish_entry(&mut self) {
        self.entry.clear();
        let request = MotorCommand::ModifyDuty(self.motor.id());
        self.shares.motor_cmd.clear_if(|c| *c == request);
        self.task.transition_to(MotorState::Init);
    }

    /// Leading zeros are not stored. A full entry is already past ±100, so
    /// extra digits are echoed but change nothing after clamping.
    fn accept(&mut self, cx: &mut Context<'_>, c: char) {
        if c != '-' && self.entry.trim_start_matches('-') == "0" {
            self.entry.pop();
        }
        let _ = self.entry.push(c);
        let _ = cx.console.write_char(c);
    }

    /// Empty entry keeps the current signed duty; numbers clamp to ±100.
    fn resolve_entry(&self) -> i16 {
        match self.entry.parse::<i32>() {
            Ok(v) => v.clamp(-100, 100) as i16,
            Err(_) => self.motor.signed_duty(),
        }
    }

    fn apply(&mut self, cx: &mut Context<'_>, target: i16) {
        let label = self.motor.id().label();
        if target == self.motor.signed_duty() {
            let _ = write!(cx.console, "{} duty cycle unchanged...\r\n", label);
        } else {
            self.motor.set_duty(target as i8);
            let _ = write!(
                cx.console,
                "Setting {} duty cycle to {}%\r\n",
                label,
                target.unsigned_abs()
            );
        }
        let _ = match self.motor.direction() {
            d if d > 0 => write!(cx.console, "{} is running forwards at {}%\r\n\r\n", label, self.motor.duty()),
            d if d < 0 => write!(cx.console, "{} is running in reverse at {}%\r\n\r\n", label, self.motor.duty()),
            _ => write!(cx.console, "{} is stationary\r\n\r\n", label),
        };
    }
}

impl<M: Motor> Task for MotorTask<'_, M> {
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
}
