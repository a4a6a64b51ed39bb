//! Time-boxed capture buffer for a sampling session.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::config::{SAMPLE_CAPACITY, SESSION_LIMIT_US};
use crate::time::micros_to_secs;

/// One captured sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row {
    /// Since session start.
    pub elapsed_us: u32,
    /// Radians.
    pub position: f32,
    /// Radians per second.
    pub delta: f32,
}

/// Why a sample was not appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushError {
    /// Taken after the session ceiling.
    Expired,
    /// Storage exhausted before the ceiling.
    Full,
}

/// Three parallel sequences sharing one insertion index.
///
/// Bounded in time by [`SESSION_LIMIT_US`]; `N` only sizes the static
/// storage. All three sequences always have the same length.
pub struct SampleBuffer<const N: usize = SAMPLE_CAPACITY> {
    times_us: Vec<u32, N>,
    positions: Vec<f32, N>,
    deltas: Vec<f32, N>,
}

impl<const N: usize> SampleBuffer<N> {
    pub const fn new() -> Self {
        Self {
            times_us: Vec::new(),
            positions: Vec::new(),
            deltas: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.times_us.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times_us.is_empty()
    }

    pub fn clear(&mut self) {
        self.times_us.clear();
        self.positions.clear();
        self.deltas.clear();
    }

    /// Appends one row unless it falls after the ceiling or storage is full.
    pub fn push(&mut self, elapsed_us: u32, position: f32, delta: f32) -> Result<(), PushError> {
        if elapsed_us > SESSION_LIMIT_US {
            return Err(PushError::Expired);
        }
        if self.times_us.is_full() {
            return Err(PushError::Full);
        }
        // Capacity checked once above; the three pushes cannot diverge.
        let _ = self.times_us.push(elapsed_us);
        let _ = self.positions.push(position);
        let _ = self.deltas.push(delta);
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.times_us
            .iter()
            .zip(self.positions.iter())
            .zip(self.deltas.iter())
            .map(|((&elapsed_us, &position), &delta)| Row {
                elapsed_us,
                position,
                delta,
            })
    }

    pub fn write_header<W: Write + ?Sized>(out: &mut W) -> fmt::Result {
        out.write_str("************************** Data Output ****************************\r\n")?;
        out.write_str("-------------------------------------------------------------------\r\n")?;
        out.write_str("Time [s]        Position [rad]        Delta [rad/s]\r\n")
    }

    /// Writes at most `max` rows starting at index `from`. Returns the index
    /// of the first row not written.
    pub fn write_rows<W: Write + ?Sized>(
        &self,
        out: &mut W,
        from: usize,
        max: usize,
    ) -> Result<usize, fmt::Error> {
        let mut next = from;
        for row in self.rows().skip(from).take(max) {
            write!(
                out,
                "{:<16.2}{:<22.4}{:.4}\r\n",
                micros_to_secs(row.elapsed_us),
                row.position,
                row.delta
            )?;
            next += 1;
        }
        Ok(next)
    }

    pub fn write_trailer<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        write!(out, "***End of data collection ({} rows)\r\n\r\n", self.len())
    }
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
