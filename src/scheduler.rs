//! Rotation schedule for a spin that must settle on a known segment.
//!
//! The wheel turns counter-clockwise by an accumulated angle. Segment `i`
//! is centred `i * segment_angle` degrees clockwise from the pointer on the
//! unrotated wheel, so a rotation of `whole_turns * 360 + i * segment_angle`
//! leaves the pointer on the middle of segment `i`.

use std::iter::FusedIterator;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WheelError;

pub const DEFAULT_FRAME_COUNT: usize = 60;

/// Inclusive range of extra whole turns added to every spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRange {
    pub min: u32,
    pub max: u32,
}

impl Default for TurnRange {
    fn default() -> Self {
        Self { min: 3, max: 8 }
    }
}

impl TurnRange {
    pub fn validate(&self) -> Result<(), WheelError> {
        if self.min == 0 || self.min > self.max {
            return Err(WheelError::InvalidSpinParameters(format!(
                "turn range must satisfy 1 <= min <= max, got {}..={}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Extra rotation in degrees. Cosmetic only.
    pub fn draw_degrees<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let turns = rng.random_range(self.min..=self.max);
        360.0 * turns as f64
    }
}

/// Per-frame delay hint: `base + index * step`. Slows the spin down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Easing {
    pub base_ms: u64,
    pub step_ms: u64,
}

impl Default for Easing {
    fn default() -> Self {
        Self {
            base_ms: 30,
            step_ms: 10,
        }
    }
}

impl Easing {
    pub fn delay(&self, index: usize) -> Duration {
        let ms = self
            .step_ms
            .saturating_mul(index as u64)
            .saturating_add(self.base_ms);
        Duration::from_millis(ms)
    }
}

/// One step of the animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub index: usize,
    /// Accumulated rotation in degrees, never wrapped.
    pub angle: f64,
    pub delay: Duration,
    /// Set on the terminal frame only.
    pub highlight: Option<usize>,
}

impl AnimationFrame {
    pub fn is_final(&self) -> bool {
        self.highlight.is_some()
    }
}

/// Lazy, one-shot sequence of frames ending on the target segment.
///
/// Not `Clone`: a new spin needs a new schedule.
#[derive(Debug)]
pub struct SpinSchedule {
    target: usize,
    frame_count: usize,
    total_rotation: f64,
    easing: Easing,
    next: usize,
}

impl SpinSchedule {
    /// Build a schedule with a fixed extra rotation (degrees).
    pub fn new(
        target: usize,
        layout_size: usize,
        frame_count: usize,
        extra_degrees: f64,
    ) -> Result<Self, WheelError> {
        check_params(target, layout_size, frame_count)?;
        if !extra_degrees.is_finite() || extra_degrees < 0.0 {
            return Err(WheelError::InvalidSpinParameters(format!(
                "extra rotation must be finite and >= 0, got {extra_degrees}"
            )));
        }
        let total_rotation = extra_degrees + segment_angle(layout_size) * target as f64;
        if total_rotation <= 0.0 {
            return Err(WheelError::InvalidSpinParameters(
                "total rotation must be positive".to_string(),
            ));
        }
        Ok(Self {
            target,
            frame_count,
            total_rotation,
            easing: Easing::default(),
            next: 0,
        })
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn total_rotation(&self) -> f64 {
        self.total_rotation
    }
}

impl Iterator for SpinSchedule {
    type Item = AnimationFrame;

    fn next(&mut self) -> Option<AnimationFrame> {
        if self.next >= self.frame_count {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let is_final = index + 1 == self.frame_count;
        let angle = if is_final {
            self.total_rotation
        } else {
            self.total_rotation * (index + 1) as f64 / self.frame_count as f64
        };
        Some(AnimationFrame {
            index,
            angle,
            delay: self.easing.delay(index),
            highlight: is_final.then_some(self.target),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.frame_count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for SpinSchedule {}

impl FusedIterator for SpinSchedule {}

/// Build a schedule whose extra whole turns are drawn from `turns`.
/// Inputs are checked before the rng is touched.
pub fn compute_angle_sequence<R: Rng + ?Sized>(
    target: usize,
    layout_size: usize,
    frame_count: usize,
    turns: TurnRange,
    rng: &mut R,
) -> Result<SpinSchedule, WheelError> {
    check_params(target, layout_size, frame_count)?;
    turns.validate()?;
    let extra = turns.draw_degrees(rng);
    log::debug!(
        "Scheduling {} frames to position {} with {} extra degrees",
        frame_count,
        target,
        extra
    );
    SpinSchedule::new(target, layout_size, frame_count, extra)
}

pub fn segment_angle(layout_size: usize) -> f64 {
    360.0 / layout_size as f64
}

/// Segment resting under the pointer after rotating by `angle` degrees.
/// `None` for an empty wheel.
pub fn segment_under_pointer(angle: f64, layout_size: usize) -> Option<usize> {
    if layout_size == 0 {
        return None;
    }
    let seg = segment_angle(layout_size);
    let slot = (angle.rem_euclid(360.0) / seg).round() as usize;
    Some(slot % layout_size)
}

fn check_params(target: usize, layout_size: usize, frame_count: usize) -> Result<(), WheelError> {
    if frame_count == 0 {
        return Err(WheelError::InvalidSpinParameters(
            "frame count must be positive".to_string(),
        ));
    }
    if layout_size == 0 {
        return Err(WheelError::InvalidSpinParameters(
            "layout size must be positive".to_string(),
        ));
    }
    if target >= layout_size {
        return Err(WheelError::InvalidSpinParameters(format!(
            "target position {target} outside 0..{layout_size}"
        )));
    }
    Ok(())
}
