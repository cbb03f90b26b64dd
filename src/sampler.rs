//! Weighted draw of a wheel segment.
//!
//! Each segment is weighted by the weight of its label, so a label that
//! occupies several slots is `occurrences * weight` likely overall.
//! Two modes:
//! - `Quantized`: every segment contributes `round(base_unit * weight)`
//!   tickets to a pool and one ticket is drawn uniformly.
//! - `Continuous`: the real-valued weights are used directly.

use std::collections::BTreeMap;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use crate::error::WheelError;
use crate::weights::WeightMap;
use crate::wheel::WheelLayout;

pub const DEFAULT_BASE_UNIT: u32 = 10;

/// Outcome of one draw. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpinResult {
    pub position: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SamplingMode {
    Quantized {
        #[serde(default = "default_base_unit")]
        base_unit: u32,
    },
    Continuous,
}

fn default_base_unit() -> u32 {
    DEFAULT_BASE_UNIT
}

impl Default for SamplingMode {
    fn default() -> Self {
        SamplingMode::Quantized {
            base_unit: DEFAULT_BASE_UNIT,
        }
    }
}

/// Per-segment selection weights, ready for repeated draws.
#[derive(Debug, Clone)]
pub struct SegmentDistribution {
    index: WeightedIndex<f64>,
    /// Weight of each position, in layout order.
    shares: Vec<f64>,
    total: f64,
}

impl SegmentDistribution {
    /// Validate `weights` against `layout` and build the table.
    /// Nothing random happens here.
    pub fn new(
        layout: &WheelLayout,
        weights: &WeightMap,
        mode: SamplingMode,
    ) -> Result<Self, WheelError> {
        if layout.is_empty() {
            return Err(WheelError::EmptyLayout);
        }

        let mut shares = Vec::with_capacity(layout.len());
        for seg in layout.segments() {
            let weight = weights.require(&seg.label)?;
            let share = match mode {
                SamplingMode::Quantized { base_unit } => {
                    let tickets = (base_unit as f64 * weight).round();
                    if tickets < 1.0 {
                        return Err(WheelError::invalid_weight(
                            &seg.label,
                            format!("weight {weight} is below one ticket at base unit {base_unit}"),
                        ));
                    }
                    tickets
                }
                SamplingMode::Continuous => weight,
            };
            shares.push(share);
        }

        let index = WeightedIndex::new(shares.iter().copied())
            .map_err(|e| WheelError::invalid_weight("*", e.to_string()))?;
        let total = shares.iter().sum();

        Ok(Self {
            index,
            shares,
            total,
        })
    }

    /// Draw one position. Always a valid index into the layout.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }

    /// Pool size in quantized mode; sum of weights in continuous mode.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn probability_of(&self, position: usize) -> f64 {
        self.shares.get(position).map_or(0.0, |s| s / self.total)
    }

    /// Effective probability of each label (all of its segments together).
    pub fn label_probabilities(&self, layout: &WheelLayout) -> BTreeMap<String, f64> {
        let mut probs = BTreeMap::new();
        for seg in layout.segments() {
            *probs.entry(seg.label.clone()).or_insert(0.0) += self.probability_of(seg.position);
        }
        probs
    }
}

/// Draws segments with a fixed sampling mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampler {
    mode: SamplingMode,
}

impl Sampler {
    pub fn new(mode: SamplingMode) -> Self {
        Self { mode }
    }

    pub fn quantized(base_unit: u32) -> Self {
        Self::new(SamplingMode::Quantized { base_unit })
    }

    pub fn continuous() -> Self {
        Self::new(SamplingMode::Continuous)
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn distribution(
        &self,
        layout: &WheelLayout,
        weights: &WeightMap,
    ) -> Result<SegmentDistribution, WheelError> {
        SegmentDistribution::new(layout, weights, self.mode)
    }

    /// Validate, then draw exactly one segment.
    ///
    /// Any finite positive weight is accepted; the slider `WeightRange` is
    /// applied by `WheelConfig` when weights are loaded, not here.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        layout: &WheelLayout,
        weights: &WeightMap,
        rng: &mut R,
    ) -> Result<SpinResult, WheelError> {
        let dist = self.distribution(layout, weights)?;
        let position = dist.draw(rng);
        let label = layout
            .get(position)
            .map(|s| s.label.clone())
            .ok_or(WheelError::EmptyLayout)?;
        log::debug!("Sampled position {} ('{}')", position, label);
        Ok(SpinResult { position, label })
    }

    /// Draw `samples` outcomes and count them per label.
    pub fn tally<R: Rng + ?Sized>(
        &self,
        layout: &WheelLayout,
        weights: &WeightMap,
        samples: u64,
        rng: &mut R,
    ) -> Result<Tally, WheelError> {
        let dist = self.distribution(layout, weights)?;
        let mut tally = Tally::default();
        for _ in 0..samples {
            let position = dist.draw(rng);
            if let Some(seg) = layout.get(position) {
                tally.record(&seg.label);
            }
        }
        Ok(tally)
    }
}

/// Sample with the default quantized pool. Weights are not bounded to a
/// `WeightRange` here, see `WeightMap::clamp_to`.
pub fn sample<R: Rng + ?Sized>(
    layout: &WheelLayout,
    weights: &WeightMap,
    rng: &mut R,
) -> Result<SpinResult, WheelError> {
    Sampler::default().sample(layout, weights, rng)
}

/// Observed outcome counts per label.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl Tally {
    pub fn record(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn frequency(&self, label: &str) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(label) as f64 / self.total as f64
        }
    }
}
