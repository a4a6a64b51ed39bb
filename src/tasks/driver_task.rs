use core::fmt::Write;

use crate::config::TaskConfig;
use crate::hal::MotorDriver;
use crate::protocol::MotorCommand;
use crate::state::Shares;
use crate::time::Instant;

use super::{Context, PeriodicTask, StateName, Task, TaskFault};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Init,
    ToggleEnable,
    ClearFault,
}

impl StateName for DriverState {
    fn name(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::ToggleEnable => "ToggleEnable",
            Self::ClearFault => "ClearFault",
        }
    }
}

/// Motor-driver task: owns actuation enable and fault recovery.
///
/// Shares the motor cell with both motor tasks and consumes only
/// `ToggleEnable` and `ClearFault`.
pub struct DriverTask<'a, D: MotorDriver> {
    task: PeriodicTask<DriverState>,
    driver: D,
    shares: &'a Shares,
    fault_reported: bool,
}

impl<'a, D: MotorDriver> DriverTask<'a, D> {
    pub fn new(config: TaskConfig, driver: D, shares: &'a Shares, now: Instant) -> Self {
        Self {
            task: PeriodicTask::new(config, DriverState::Init, now),
            driver,
            shares,
            fault_reported: false,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn periodic(&self) -> &PeriodicTask<DriverState> {
        &self.task
    }

    fn step(&mut self, cx: &mut Context<'_>) {
        self.watch_fault(cx);

        let Some(cmd) = self.shares.motor_cmd.read() else {
            return;
        };

        match cmd {
            MotorCommand::ToggleEnable => {
                self.task.transition_to(DriverState::ToggleEnable);
                if self.driver.is_faulted() {
                    let _ = cx.console.write_str(
                        "MOTOR DRIVER is faulted, clear the fault [c] before enabling\r\n\r\n",
                    );
                } else if self.driver.is_enabled() {
                    self.driver.disable();
                    let _ = cx.console.write_str("Motors disabled\r\n\r\n");
                    log_info!("motor driver disabled");
                } else {
                    self.driver.enable();
                    let _ = cx.console.write_str("Motors enabled\r\n\r\n");
                    log_info!("motor driver enabled");
                }
            }
            MotorCommand::ClearFault => {
                self.task.transition_to(DriverState::ClearFault);
                if self.driver.is_faulted() {
                    self.driver.clear_fault();
                    self.fault_reported = false;
                    let _ = cx
                        .console
                        .write_str("Fault cleared, motors remain disabled until enabled [e]\r\n\r\n");
                    log_info!("motor driver fault cleared");
                } else {
                    let _ = cx.console.write_str("No fault to clear\r\n\r\n");
                }
            }
            MotorCommand::ModifyDuty(_) | MotorCommand::Extreme { .. } => return,
        }

        self.shares.motor_cmd.clear_if(|c| *c == cmd);
        self.task.transition_to(DriverState::Init);
    }

    /// Announces a fault the first time it is seen.
    fn watch_fault(&mut self, cx: &mut Context<'_>) {
        if !self.driver.is_faulted() {
            self.fault_reported = false;
            return;
        }
        if !self.fault_reported {
            let _ = cx
                .console
                .write_str("\r\n*** MOTOR DRIVER FAULT, actuation suspended ***\r\n\r\n");
            log_warn!("motor driver fault");
            self.fault_reported = true;
        }
    }
}

impl<D: MotorDriver> Task for DriverTask<'_, D> {
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

    fn shutdown(&mut self, _cx: &mut Context<'_>) {
        self.driver.disable();
        log_info!("motor driver disabled for shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DRIVER_TASK;
    use crate::mock::{MockConsole, MockDriver};
    use crate::protocol::{ExtremeDuty, MotorId};

    fn tick(task: &mut DriverTask<'_, MockDriver>, console: &mut MockConsole) {
        let now = task.periodic().next_deadline();
        let mut cx = Context { now, console };
        task.run(&mut cx).unwrap();
    }

    #[test]
    fn toggle_flips_enable_and_clears() {
        let shares = Shares::new();
        let mut task = DriverTask::new(DRIVER_TASK, MockDriver::new(), &shares, Instant::default());
        let mut console: MockConsole = MockConsole::new();

        shares.motor_cmd.write(MotorCommand::ToggleEnable);
        tick(&mut task, &mut console);
        assert!(task.driver().is_enabled());
        assert!(shares.motor_cmd.is_empty());

        shares.motor_cmd.write(MotorCommand::ToggleEnable);
        tick(&mut task, &mut console);
        assert!(!task.driver().is_enabled());
        assert!(console.output().contains("Motors enabled"));
        assert!(console.output().contains("Motors disabled"));
    }

    #[test]
    fn toggle_is_refused_while_faulted() {
        let shares = Shares::new();
        let mut task = DriverTask::new(DRIVER_TASK, MockDriver::new(), &shares, Instant::default());
        let mut console: MockConsole = MockConsole::new();
        task.driver_mut().trip_fault();

        shares.motor_cmd.write(MotorCommand::ToggleEnable);
        tick(&mut task, &mut console);

        assert!(!task.driver().is_enabled());
        assert!(console.output().contains("clear the fault"));
        assert!(shares.motor_cmd.is_empty());
    }

    #[test]
    fn clear_fault_leaves_actuation_disabled() {
        let shares = Shares::new();
        let mut task = DriverTask::new(DRIVER_TASK, MockDriver::new(), &shares, Instant::default());
        let mut console: MockConsole = MockConsole::new();
        task.driver_mut().enable();
        task.driver_mut().trip_fault();

        shares.motor_cmd.write(MotorCommand::ClearFault);
        tick(&mut task, &mut console);

        assert!(!task.driver().is_faulted());
        assert!(!task.driver().is_enabled());
        assert!(console.output().contains("Fault cleared"));

        shares.motor_cmd.write(MotorCommand::ClearFault);
        tick(&mut task, &mut console);
        assert!(console.output().contains("No fault to clear"));
    }

    #[test]
    fn motor_commands_are_left_for_the_motors() {
        let shares = Shares::new();
        let mut task = DriverTask::new(DRIVER_TASK, MockDriver::new(), &shares, Instant::default());
        let mut console: MockConsole = MockConsole::new();

        for cmd in [
            MotorCommand::ModifyDuty(MotorId::B),
            MotorCommand::Extreme {
                duty: ExtremeDuty::Reverse,
                turn: MotorId::A,
            },
        ] {
            shares.motor_cmd.write(cmd);
            tick(&mut task, &mut console);
            assert_eq!(shares.motor_cmd.read(), Some(cmd));
        }
        assert_eq!(console.output(), "");
    }

    #[test]
    fn fault_is_announced_once() {
        let shares = Shares::new();
        let mut task = DriverTask::new(DRIVER_TASK, MockDriver::new(), &shares, Instant::default());
        let mut console: MockConsole = MockConsole::new();
        task.driver_mut().enable();
        task.driver_mut().trip_fault();

        tick(&mut task, &mut console);
        tick(&mut task, &mut console);
        assert_eq!(console.output().matches("MOTOR DRIVER FAULT").count(), 1);

        shares.motor_cmd.write(MotorCommand::ClearFault);
        tick(&mut task, &mut console);
        task.driver_mut().trip_fault();
        tick(&mut task, &mut console);
        assert_eq!(console.output().matches("MOTOR DRIVER FAULT").count(), 2);
    }

    #[test]
    fn shutdown_disables() {
        let shares = Shares::new();
        let mut task = DriverTask::new(DRIVER_TASK, MockDriver::new(), &shares, Instant::default());
        let mut console: MockConsole = MockConsole::new();
        task.driver_mut().enable();

        let mut cx = Context {
            now: Instant::default(),
            console: &mut console,
        };
        task.shutdown(&mut cx);
        assert!(!task.driver().is_enabled());
    }
}
