//! Cooperative round-robin scheduler.
//!
//! A pass offers every registered task one `run` in registration order, each
//! with a fresh timestamp. Tasks decide for themselves whether they are due.
//! A task that reports a [`TaskFault`] is parked for the rest of the program;
//! the others keep running.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};

use heapless::Vec;

use crate::config::MAX_TASKS;
use crate::console::Console;
use crate::tasks::{Context, Task};
use crate::time::Clock;

// ── Abort ─────────────────────────────────────────────────────────────────────

/// Operator abort request, checked between passes.
pub struct AbortSignal {
    raised: AtomicBool,
}

impl AbortSignal {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.raised.store(false, Ordering::Release);
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// More than [`MAX_TASKS`] registrations.
    TaskTableFull,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskTableFull => write!(f, "task table full ({} slots)", MAX_TASKS),
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

struct Slot<'t> {
    task: &'t mut dyn Task,
    faulted: bool,
}

pub struct Scheduler<'t, K: Clock> {
    clock: K,
    slots: Vec<Slot<'t>, MAX_TASKS>,
    passes: u32,
}

impl<'t, K: Clock> Scheduler<'t, K> {
    pub fn new(clock: K) -> Self {
        Self {
            clock,
            slots: Vec::new(),
            passes: 0,
        }
    }

    /// Appends a task to the dispatch order.
    pub fn register(&mut self, task: &'t mut dyn Task) -> Result<(), SchedulerError> {
        let name = task.name();
        self.slots
            .push(Slot {
                task,
                faulted: false,
            })
            .map_err(|_| SchedulerError::TaskTableFull)?;
        log_info!("task {} registered", name);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Completed passes.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Whether the named task has been parked by a fault.
    pub fn is_parked(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.faulted && slot.task.name() == name)
    }

    pub fn pass(&mut self, console: &mut dyn Console) {
        for slot in self.slots.iter_mut().filter(|slot| !slot.faulted) {
            let mut cx = Context {
                now: self.clock.now(),
                console: &mut *console,
            };
            if let Err(fault) = slot.task.run(&mut cx) {
                slot.faulted = true;
                log_error!("task {} parked: {}", slot.task.name(), fault);
                let _ = write!(console, "\r\n*** {} stopped: {} ***\r\n", slot.task.name(), fault);
            }
        }
        self.passes = self.passes.wrapping_add(1);
    }

    /// Passes until `abort` is raised, then shuts down.
    pub fn run(&mut self, console: &mut dyn Console, abort: &AbortSignal) {
        log_info!("scheduler running {} tasks", self.slots.len());
        while !abort.is_raised() {
            self.pass(console);
        }
        self.shutdown(console);
    }

    /// Gives every live task its shutdown hook, in registration order, then
    /// says goodbye.
    pub fn shutdown(&mut self, console: &mut dyn Console) {
        for slot in self.slots.iter_mut().filter(|slot| !slot.faulted) {
            let mut cx = Context {
                now: self.clock.now(),
                console: &mut *console,
            };
            slot.task.shutdown(&mut cx);
        }
        let _ = console.write_str("\r\n*** Program ending, have a nice day! ***\r\n");
        log_info!("scheduler stopped after {} passes", self.passes);
    }
}
