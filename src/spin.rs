//! A whole spin: one weighted draw, then the frames that land on it.

use rand::Rng;

use crate::error::WheelError;
use crate::sampler::{Sampler, SegmentDistribution, SpinResult, Tally};
use crate::scheduler::{
    AnimationFrame, DEFAULT_FRAME_COUNT, Easing, SpinSchedule, TurnRange, compute_angle_sequence,
};
use crate::weights::WeightMap;
use crate::wheel::WheelLayout;

/// Where a spin is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinPhase {
    /// Result chosen, no frame pulled yet.
    Sampled,
    /// `frame` of `of` frames has been handed out.
    Animating { frame: usize, of: usize },
    /// Terminal frame handed out; pointer rests on `position`.
    Settled { position: usize },
}

/// Wheel layout plus everything needed to spin it.
#[derive(Debug, Clone)]
pub struct Wheel {
    pub layout: WheelLayout,
    pub weights: WeightMap,
    pub sampler: Sampler,
    pub frame_count: usize,
    pub turns: TurnRange,
    pub easing: Easing,
}

impl Wheel {
    pub fn new(layout: WheelLayout, weights: WeightMap) -> Self {
        Self {
            layout,
            weights,
            sampler: Sampler::default(),
            frame_count: DEFAULT_FRAME_COUNT,
            turns: TurnRange::default(),
            easing: Easing::default(),
        }
    }

    /// The reference wheel with every weight at 1.0.
    pub fn reference() -> Self {
        let layout = WheelLayout::reference();
        let weights = WeightMap::uniform(&layout, 1.0);
        Self::new(layout, weights)
    }

    pub fn distribution(&self) -> Result<SegmentDistribution, WheelError> {
        self.sampler.distribution(&self.layout, &self.weights)
    }

    /// Sample a result and prepare its animation.
    ///
    /// Every input is validated before the rng is used, so a failed call
    /// leaves the rng untouched.
    pub fn spin<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Spin, WheelError> {
        if self.frame_count == 0 {
            return Err(WheelError::InvalidSpinParameters(
                "frame count must be positive".to_string(),
            ));
        }
        self.turns.validate()?;
        let result = self.sampler.sample(&self.layout, &self.weights, rng)?;

        let schedule = compute_angle_sequence(
            result.position,
            self.layout.len(),
            self.frame_count,
            self.turns,
            rng,
        )?
        .with_easing(self.easing);

        log::info!(
            "Spin result: '{}' at position {} ({:.1} degrees)",
            result.label,
            result.position,
            schedule.total_rotation()
        );
        Ok(Spin {
            result,
            schedule,
            phase: SpinPhase::Sampled,
        })
    }

    pub fn tally<R: Rng + ?Sized>(&self, samples: u64, rng: &mut R) -> Result<Tally, WheelError> {
        self.sampler
            .tally(&self.layout, &self.weights, samples, rng)
    }
}

/// One spin in progress. Yields its frames once, then stays settled.
#[derive(Debug)]
pub struct Spin {
    result: SpinResult,
    schedule: SpinSchedule,
    phase: SpinPhase,
}

impl Spin {
    pub fn result(&self) -> &SpinResult {
        &self.result
    }

    pub fn phase(&self) -> &SpinPhase {
        &self.phase
    }

    pub fn total_rotation(&self) -> f64 {
        self.schedule.total_rotation()
    }

    pub fn frame_count(&self) -> usize {
        self.schedule.frame_count()
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.phase, SpinPhase::Settled { .. })
    }
}

impl Iterator for Spin {
    type Item = AnimationFrame;

    fn next(&mut self) -> Option<AnimationFrame> {
        let frame = self.schedule.next()?;
        self.phase = match frame.highlight {
            Some(position) => SpinPhase::Settled { position },
            None => SpinPhase::Animating {
                frame: frame.index + 1,
                of: self.schedule.frame_count(),
            },
        };
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.schedule.size_hint()
    }
}

impl ExactSizeIterator for Spin {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::segment_under_pointer;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_lifecycle_reaches_settled_once() {
        let wheel = Wheel::reference();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut spin = wheel.spin(&mut rng).unwrap();
        assert_eq!(spin.phase(), &SpinPhase::Sampled);
        assert_eq!(spin.len(), 60);

        let first = spin.next().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(spin.phase(), &SpinPhase::Animating { frame: 1, of: 60 });

        let last = spin.by_ref().last().unwrap();
        let position = spin.result().position;
        assert_eq!(last.highlight, Some(position));
        assert_eq!(spin.phase(), &SpinPhase::Settled { position });
        assert!(spin.is_settled());
        assert!(spin.next().is_none());
        assert_eq!(
            segment_under_pointer(last.angle, wheel.layout.len()),
            Some(position)
        );
    }

    #[test]
    fn test_same_seed_same_spin() {
        let wheel = Wheel::reference();
        let mut a = Pcg32::seed_from_u64(77);
        let mut b = Pcg32::seed_from_u64(77);
        let spin_a = wheel.spin(&mut a).unwrap();
        let spin_b = wheel.spin(&mut b).unwrap();
        assert_eq!(spin_a.result(), spin_b.result());
        assert_eq!(spin_a.total_rotation(), spin_b.total_rotation());
    }

    #[test]
    fn test_invalid_wheel_leaves_rng_untouched() {
        let mut wheel = Wheel::reference();
        wheel.weights.set("Pachinko", 0.0);
        let mut used = Pcg32::seed_from_u64(5);
        let mut fresh = Pcg32::seed_from_u64(5);
        assert!(matches!(
            wheel.spin(&mut used),
            Err(WheelError::InvalidWeight { .. })
        ));
        assert_eq!(used.random::<u32>(), fresh.random::<u32>());

        let mut wheel = Wheel::reference();
        wheel.frame_count = 0;
        assert!(matches!(
            wheel.spin(&mut used),
            Err(WheelError::InvalidSpinParameters(_))
        ));
    }

    #[test]
    fn test_heavy_label_dominates() {
        let mut wheel = Wheel::reference();
        for label in wheel.layout.labels().into_iter().map(str::to_string).collect::<Vec<_>>() {
            wheel.weights.set(label, 0.1);
        }
        wheel.weights.set("Crazy Time", 3.0);
        wheel.frame_count = 1;
        let mut rng = Pcg32::seed_from_u64(8);
        let hits = (0..500)
            .filter(|_| wheel.spin(&mut rng).unwrap().result().label == "Crazy Time")
            .count();
        // 30 of 81 tickets in the pool.
        assert!(hits > 130 && hits < 240, "hits = {hits}");
    }
}
