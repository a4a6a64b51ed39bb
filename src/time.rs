//! Wrapping microsecond time base.
//!
//! The tick counter wraps at `u32::MAX`. Ordering between two instants is only
//! meaningful through [`Instant::ticks_diff`], which interprets the wrapped
//! difference as signed; instants less than ~35 minutes apart compare
//! correctly across a wrap.

/// A point on the wrapping microsecond timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u32);

impl Instant {
    pub const fn from_micros(us: u32) -> Self {
        Self(us)
    }

    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// `self + us`, wrapping.
    #[inline]
    pub const fn ticks_add(self, us: u32) -> Self {
        Self(self.0.wrapping_add(us))
    }

    /// Signed distance `self - earlier` in microseconds.
    ///
    /// Positive when `self` is after `earlier`, negative when before.
    #[inline]
    pub const fn ticks_diff(self, earlier: Instant) -> i32 {
        self.0.wrapping_sub(earlier.0) as i32
    }

    /// `true` once `self` is at or past `deadline`.
    #[inline]
    pub const fn reached(self, deadline: Instant) -> bool {
        self.ticks_diff(deadline) >= 0
    }
}

/// Monotonic time source consulted by the scheduler.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Microseconds to seconds.
#[inline]
pub fn micros_to_secs(us: u32) -> f32 {
    us as f32 / 1_000_000.0
}
