#![forbid(unsafe_code)]

//! Time-driven animation primitives.
//!
//! Animations never read a clock. The host advances them with explicit
//! `tick(dt)` calls, which keeps every transition reproducible in tests and
//! identical across browsers.
//!
//! # Invariants
//!
//! 1. Easing functions map `[0, 1]` into `[0, 1]` with `f(0) = 0` and
//!    `f(1) = 1`; inputs outside the range are clamped.
//! 2. A [`Tween`] lands exactly on its target once complete.
//! 3. Zero durations are clamped to 1ns to avoid division by zero.

use web_time::Duration;

/// Maps linear progress to eased progress.
pub type EasingFn = fn(f32) -> f32;

/// Identity easing.
#[must_use]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in-out: accelerate through the first half, decelerate
/// through the second.
#[must_use]
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// A host-ticked animation.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Eased progress in `[0.0, 1.0]`.
    fn value(&self) -> f32;

    /// Rewind to the start.
    fn reset(&mut self);
}

/// Eased interpolation between two positions over a fixed duration.
#[derive(Debug, Clone)]
pub struct Tween {
    from: f64,
    to: f64,
    duration: Duration,
    elapsed: Duration,
    easing: EasingFn,
}

impl Tween {
    #[must_use]
    pub fn new(from: f64, to: f64, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration: duration.max(Duration::from_nanos(1)),
            elapsed: Duration::ZERO,
            easing: ease_in_out_quad,
        }
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Jump to an absolute elapsed time.
    pub fn seek(&mut self, elapsed: Duration) {
        self.elapsed = elapsed.min(self.duration);
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.to
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Current interpolated position.
    #[must_use]
    pub fn position(&self) -> f64 {
        if self.is_complete() {
            return self.to;
        }
        self.from + (self.to - self.from) * f64::from(self.value())
    }

    fn linear_progress(&self) -> f32 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()) as f32
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.linear_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}
