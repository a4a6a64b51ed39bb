//! Operator console seen by the tasks.

use core::fmt::Write;

/// Non-blocking byte console.
///
/// Output goes through [`core::fmt::Write`]; implementations drop text they
/// cannot buffer rather than block.
pub trait Console: Write {
    /// Next input byte, if one is waiting. Never blocks.
    fn read_byte(&mut self) -> Option<u8>;
}
