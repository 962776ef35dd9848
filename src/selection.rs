//! The in/out selection on the timeline.
//!
//! A [`Selection`] is a `[start, end]` range in seconds that always keeps at
//! least [`MIN_GAP`] between its markers and always lies inside
//! `[0, duration]`. It is only changed through the clamping operations
//! below, so an invalid selection can never be observed.

use crate::error::FramecutError;

/// Minimum distance between the start and end markers, in seconds.
pub const MIN_GAP: f64 = 0.5;

/// Tolerance used when comparing a requested range against the duration.
pub(crate) const DURATION_EPSILON: f64 = 1e-6;

/// Which selection marker is being addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start,
    End,
}

/// A clamped `[start, end]` range in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    start: f64,
    end: f64,
}

impl Selection {
    /// The whole media: `[0, duration]`.
    pub fn full(duration: f64) -> Self {
        Self {
            start: 0.0,
            end: sanitize(duration),
        }
    }

    /// Build a selection, checking it against `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`FramecutError::InvalidSelection`] if either bound is not
    /// finite, `start` is negative, `end` exceeds `duration`, or the markers
    /// are closer than the gap allowed for this duration.
    pub fn new(start: f64, end: f64, duration: f64) -> Result<Self, FramecutError> {
        let duration = sanitize(duration);
        let gap = Self::gap_for(duration);
        let valid = start.is_finite()
            && end.is_finite()
            && start >= 0.0
            && end <= duration + DURATION_EPSILON
            && end - start >= gap - DURATION_EPSILON;
        if valid {
            Ok(Self {
                start,
                end: end.min(duration),
            })
        } else {
            Err(FramecutError::InvalidSelection { start, end })
        }
    }

    /// The gap enforced for media of this length.
    ///
    /// Media shorter than [`MIN_GAP`] can only be selected as a whole.
    pub fn gap_for(duration: f64) -> f64 {
        MIN_GAP.min(sanitize(duration))
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the selection in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` lies inside the selection (bounds included).
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Clamp `time` into the selection.
    pub fn clamp(&self, time: f64) -> f64 {
        time.clamp(self.start, self.end)
    }

    /// Move the start marker towards `time`, keeping the gap to `end`.
    /// Returns the new start.
    pub(crate) fn drag_start(&mut self, time: f64, duration: f64) -> f64 {
        let gap = Self::gap_for(duration);
        let upper = (self.end - gap).max(0.0);
        self.start = sanitize(time).min(upper);
        self.start
    }

    /// Move the end marker towards `time`, keeping the gap to `start`.
    /// Returns the new end.
    pub(crate) fn drag_end(&mut self, time: f64, duration: f64) -> f64 {
        let duration = sanitize(duration);
        let gap = Self::gap_for(duration);
        let lower = (self.start + gap).min(duration);
        self.end = sanitize(time).clamp(lower, duration);
        self.end
    }
}

/// Non-finite and negative values collapse to zero.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
