#![forbid(unsafe_code)]

//! Rolling number transition for counters.
//!
//! Two stacked labels sit in a container one line tall. Counting up shows
//! `prev` on top and scrolls down to `next`; counting down stacks the new
//! value on top and scrolls back up. `scroll_top` is stepped by host timer
//! callbacks with ease-in-out-quadratic timing rather than native smooth
//! scrolling, so every browser (and every test) sees the same frames.
//!
//! # Invariants
//!
//! 1. A finished roll rests exactly on its snap offset (`0` or `line_height`).
//! 2. Rolling while a roll is in flight cancels the old sequence and starts
//!    a new one from the current `scroll_top`, so the label never jumps.
//! 3. Rolling to the value already shown is a no-op.

use tracing::trace;
use web_time::Duration;

use quill_core::animation::{Animation, Tween, ease_in_out_quad};

use crate::config::AnimatorConfig;

/// The two numeric labels inside the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollLabels {
    /// Label at offset 0.
    pub prev: u64,
    /// Label at offset `line_height`.
    pub next: u64,
}

/// Result of a timer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing is animating.
    Idle,
    /// Still moving; schedule another step.
    Running,
    /// Landed on the snap offset.
    Finished,
}

#[derive(Debug, Clone)]
struct ScrollRun {
    tween: Tween,
    started: Duration,
}

/// Animated counter label.
#[derive(Debug, Clone)]
pub struct NumberScroll {
    line_height: f64,
    duration: Duration,
    frame_interval: Duration,
    labels: ScrollLabels,
    scroll_top: f64,
    shown: u64,
    run: Option<ScrollRun>,
}

impl NumberScroll {
    /// A label resting on `value`.
    #[must_use]
    pub fn new(config: &AnimatorConfig, value: u64) -> Self {
        Self {
            line_height: config.line_height_px,
            duration: config.duration(),
            frame_interval: config.frame_interval(),
            labels: ScrollLabels {
                prev: value,
                next: value,
            },
            scroll_top: 0.0,
            shown: value,
            run: None,
        }
    }

    /// Roll from `from` to `to`, starting at `now`.
    pub fn roll(&mut self, from: u64, to: u64, now: Duration) {
        if from == to && self.run.is_none() {
            self.labels = ScrollLabels { prev: to, next: to };
            self.scroll_top = 0.0;
            self.shown = to;
            return;
        }
        let restarting = self.run.is_some();
        let (labels, start, target) = if to >= from {
            (ScrollLabels { prev: from, next: to }, 0.0, self.line_height)
        } else {
            (ScrollLabels { prev: to, next: from }, self.line_height, 0.0)
        };
        if !restarting {
            self.scroll_top = start;
        }
        self.labels = labels;
        self.shown = to;
        self.run = Some(ScrollRun {
            tween: Tween::new(self.scroll_top, target, self.duration).easing(ease_in_out_quad),
            started: now,
        });
        trace!(from, to, restarting, "counter roll started");
    }

    /// Advance the current sequence to `now`.
    pub fn step(&mut self, now: Duration) -> StepOutcome {
        let Some(run) = self.run.as_mut() else {
            return StepOutcome::Idle;
        };
        run.tween.seek(now.saturating_sub(run.started));
        self.scroll_top = run.tween.position();
        if run.tween.is_complete() {
            self.run = None;
            StepOutcome::Finished
        } else {
            StepOutcome::Running
        }
    }

    /// When the host should fire the next timer callback.
    #[must_use]
    pub fn next_step_at(&self, now: Duration) -> Option<Duration> {
        self.run.as_ref().map(|_| now.saturating_add(self.frame_interval))
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.run.is_some()
    }

    #[must_use]
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    #[must_use]
    pub fn labels(&self) -> ScrollLabels {
        self.labels
    }

    /// Value the label settles on.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.shown
    }
}
