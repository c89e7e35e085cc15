//! Fixed-timestep frame pacer.
//!
//! Real-time games tick the simulation at a fixed rate (commonly 60Hz) while
//! rendering at whatever rate the display affords. [`Pacer`] accumulates
//! elapsed wall-clock time and reports how many simulation ticks are due,
//! capping the accumulator so a stall (a debugger breakpoint, a slow device
//! resume) doesn't cause a burst of catch-up ticks.
//!
//! The pacer is clock-agnostic: it consumes nanosecond timestamps from a
//! [`Clock`] implementation rather than calling `Instant::now()` directly,
//! so tests can drive it with a virtual clock instead of real wall time.

use std::time::Duration;

/// A source of monotonically non-decreasing timestamps, in nanoseconds.
///
/// Implement this over `std::time::Instant` in production code; tests can
/// implement it over a manually-advanced counter for deterministic timing.
pub trait Clock {
    /// Returns the current time, in nanoseconds, relative to an arbitrary
    /// fixed epoch. Only differences between successive calls are
    /// meaningful.
    fn now_nanos(&self) -> u64;
}

/// [`Clock`] implementation backed by `std::time::Instant`.
#[derive(Debug)]
pub struct SystemClock {
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}

/// Upper bound on how much elapsed time a single `tick()` call will
/// accumulate, regardless of how long actually passed since the last call.
/// This prevents a long stall from producing an unbounded burst of catch-up
/// simulation ticks.
pub const MAX_ACCUMULATED: Duration = Duration::from_millis(100);

/// Accumulates elapsed wall-clock time and reports how many fixed-size
/// simulation ticks are due.
///
/// # Example
///
/// ```
/// use lockstep_sync::pacer::{Pacer, SystemClock};
/// use std::time::Duration;
///
/// let mut pacer = Pacer::new(Duration::from_secs(1) / 60, SystemClock::default());
/// let ticks = pacer.tick();
/// for _ in 0..ticks {
///     // advance_frame() + handle_requests!(...) once per due tick
/// }
/// // render exactly once per tick() call, regardless of `ticks`
/// let _alpha = pacer.interpolation_alpha();
/// ```
#[derive(Debug)]
pub struct Pacer<C: Clock> {
    tick_duration: Duration,
    accumulator: Duration,
    last_sample: Option<u64>,
    clock: C,
}

impl<C: Clock> Pacer<C> {
    /// Creates a pacer that ticks every `tick_duration`, sampling elapsed
    /// time from `clock`.
    #[must_use]
    pub fn new(tick_duration: Duration, clock: C) -> Self {
        Self {
            tick_duration,
            accumulator: Duration::ZERO,
            last_sample: None,
            clock,
        }
    }

    /// Samples the clock, folds the elapsed time into the accumulator
    /// (capped at [`MAX_ACCUMULATED`]), and drains whole ticks out of it.
    ///
    /// Returns the number of simulation ticks now due. The caller is
    /// expected to render exactly once per `tick()` call regardless of the
    /// returned count, using [`interpolation_alpha`](Self::interpolation_alpha)
    /// to smooth the remainder.
    pub fn tick(&mut self) -> u32 {
        let now = self.clock.now_nanos();
        let elapsed = match self.last_sample {
            Some(last) => Duration::from_nanos(now.saturating_sub(last)),
            None => self.tick_duration,
        };
        self.last_sample = Some(now);

        let elapsed = elapsed.min(MAX_ACCUMULATED);
        self.accumulator = (self.accumulator + elapsed).min(MAX_ACCUMULATED);

        let mut ticks = 0;
        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            ticks += 1;
        }
        ticks
    }

    /// Fraction (`[0.0, 1.0)`) of a tick remaining in the accumulator after
    /// the most recent [`tick`](Self::tick) call, for interpolated rendering
    /// between simulation steps.
    #[must_use]
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.tick_duration.as_secs_f32()
    }

    /// Discards any accumulated time. Call this when the session stalls
    /// (e.g. desynchronizing) to avoid a burst of ticks once it resumes.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.last_sample = None;
    }
}
