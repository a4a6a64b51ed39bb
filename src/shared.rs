//! Single-slot inter-task channel.
//!
//! A [`SharedCell`] holds at most one value. Writes overwrite whatever is
//! there, reads copy the value out and leave it in place. Every access runs
//! inside a critical section, so a cell may also be touched from interrupt
//! context even though the task set itself is single-threaded.

use core::cell::Cell;

use critical_section::Mutex;

pub struct SharedCell<T: Copy> {
    slot: Mutex<Cell<Option<T>>>,
}

impl<T: Copy> SharedCell<T> {
    pub const fn new(initial: Option<T>) -> Self {
        Self {
            slot: Mutex::new(Cell::new(initial)),
        }
    }

    pub const fn empty() -> Self {
        Self::new(None)
    }

    /// Overwrites the slot. Last writer wins.
    pub fn write(&self, value: T) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some(value)));
    }

    /// Copies the current value out without consuming it.
    pub fn read(&self) -> Option<T> {
        critical_section::with(|cs| self.slot.borrow(cs).get())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.slot.borrow(cs).set(None));
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_none()
    }

    /// Empties the slot only if its current value satisfies `owned`.
    ///
    /// Returns whether the slot was cleared. Check and clear happen in one
    /// critical section, so a value written in between is never lost.
    pub fn clear_if(&self, owned: impl FnOnce(&T) -> bool) -> bool {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            match cell.get() {
                Some(v) if owned(&v) => {
                    cell.set(None);
                    true
                }
                _ => false,
            }
        })
    }
}

impl<T: Copy> Default for SharedCell<T> {
    fn default() -> Self {
        Self::empty()
    }
}
