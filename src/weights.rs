//! Per-label weights and the slider range they are drawn from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::WheelError;
use crate::wheel::WheelLayout;

/// Weight every label starts at.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Accepted weight interval with its step, like a UI slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for WeightRange {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 3.0,
            step: 0.1,
        }
    }
}

impl WeightRange {
    pub fn validate(&self) -> Result<(), WheelError> {
        let ok = self.min.is_finite()
            && self.max.is_finite()
            && self.step.is_finite()
            && self.min > 0.0
            && self.min <= self.max
            && self.step > 0.0;
        if ok {
            Ok(())
        } else {
            Err(WheelError::Config(format!(
                "weight range must satisfy 0 < min <= max and step > 0, got {:?}",
                self
            )))
        }
    }

    /// Bound to `[min, max]` without snapping.
    pub fn bound(&self, weight: f64) -> f64 {
        if weight.is_nan() {
            return self.min;
        }
        weight.clamp(self.min, self.max)
    }

    /// Snap to the nearest step above `min`, then bound to `[min, max]`.
    pub fn clamp(&self, weight: f64) -> f64 {
        if weight.is_nan() {
            return self.min;
        }
        let steps = ((weight - self.min) / self.step).round();
        let snapped = self.min + steps * self.step;
        // Kill float noise like 1.0000000000000002.
        let snapped = (snapped * 1e9).round() / 1e9;
        snapped.clamp(self.min, self.max)
    }
}

/// Label -> relative likelihood.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap {
    weights: BTreeMap<String, f64>,
}

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every distinct label of `layout` at `weight`.
    pub fn uniform(layout: &WheelLayout, weight: f64) -> Self {
        let mut map = Self::new();
        for label in layout.labels() {
            map.set(label, weight);
        }
        map
    }

    pub fn set(&mut self, label: impl Into<String>, weight: f64) {
        self.weights.insert(label.into(), weight);
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.weights.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight for a label the layout references. Missing, non-finite or
    /// non-positive weights are rejected.
    pub fn require(&self, label: &str) -> Result<f64, WheelError> {
        match self.get(label) {
            None => Err(WheelError::invalid_weight(label, "no weight specified")),
            Some(w) if !w.is_finite() => Err(WheelError::invalid_weight(label, "weight is not finite")),
            Some(w) if w <= 0.0 => Err(WheelError::invalid_weight(
                label,
                format!("weight must be > 0, got {w}"),
            )),
            Some(w) => Ok(w),
        }
    }

    /// Check that every label on the wheel has a usable weight.
    pub fn validate_for(&self, layout: &WheelLayout) -> Result<(), WheelError> {
        for label in layout.labels() {
            self.require(label)?;
        }
        Ok(())
    }

    /// Bring every weight into `range`, logging the ones that moved.
    /// With `snap` the weights also land on the range's step grid.
    pub fn clamp_to(&mut self, range: &WeightRange, snap: bool) {
        for (label, weight) in self.weights.iter_mut() {
            let clamped = if snap {
                range.clamp(*weight)
            } else {
                range.bound(*weight)
            };
            if clamped != *weight {
                log::warn!("Weight for '{}' adjusted from {} to {}", label, weight, clamped);
                *weight = clamped;
            }
        }
    }
}

/// Parse a `LABEL=WEIGHT` override. The label may contain spaces.
pub fn parse_weight_override(arg: &str) -> Result<(String, f64), WheelError> {
    let (label, value) = arg
        .rsplit_once('=')
        .ok_or_else(|| WheelError::Config(format!("expected LABEL=WEIGHT, got '{arg}'")))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(WheelError::Config(format!("missing label in '{arg}'")));
    }
    let weight: f64 = value
        .trim()
        .parse()
        .map_err(|_| WheelError::Config(format!("weight '{}' is not a number", value.trim())))?;
    Ok((label.to_string(), weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::Palette;

    #[test]
    fn test_clamp_snaps_and_bounds() {
        let range = WeightRange::default();
        assert_eq!(range.clamp(0.0), 0.1);
        assert_eq!(range.clamp(-4.0), 0.1);
        assert_eq!(range.clamp(9.0), 3.0);
        assert_eq!(range.clamp(1.04), 1.0);
        assert_eq!(range.clamp(1.06), 1.1);
        assert_eq!(range.clamp(2.5), 2.5);
        assert_eq!(range.clamp(f64::NAN), 0.1);
    }

    #[test]
    fn test_range_validation() {
        assert!(WeightRange::default().validate().is_ok());
        let bad = WeightRange { min: 2.0, max: 1.0, step: 0.1 };
        assert!(bad.validate().is_err());
        let zero = WeightRange { min: 0.0, max: 1.0, step: 0.1 };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_validate_for_layout() {
        let layout = WheelLayout::new(["A", "B"], &Palette::new());
        let mut weights = WeightMap::new();
        weights.set("A", 1.0);
        assert!(matches!(
            weights.validate_for(&layout),
            Err(WheelError::InvalidWeight { ref label, .. }) if label == "B"
        ));

        weights.set("B", 0.0);
        assert!(weights.validate_for(&layout).is_err());

        weights.set("B", 0.5);
        assert!(weights.validate_for(&layout).is_ok());
    }

    #[test]
    fn test_clamp_to_range() {
        let mut weights = WeightMap::new();
        weights.set("A", 7.0);
        weights.set("B", 0.02);
        weights.clamp_to(&WeightRange::default(), true);
        assert_eq!(weights.get("A"), Some(3.0));
        assert_eq!(weights.get("B"), Some(0.1));
    }

    #[test]
    fn test_bound_keeps_off_grid_weights() {
        let range = WeightRange::default();
        assert_eq!(range.bound(0.15), 0.15);
        assert_eq!(range.bound(7.0), 3.0);
        assert_eq!(range.bound(f64::NAN), 0.1);

        let mut weights = WeightMap::new();
        weights.set("A", 0.15);
        weights.set("B", 0.01);
        weights.clamp_to(&range, false);
        assert_eq!(weights.get("A"), Some(0.15));
        assert_eq!(weights.get("B"), Some(0.1));
    }

    #[test]
    fn test_parse_weight_override() {
        assert_eq!(
            parse_weight_override("Coin Flip=2.5").unwrap(),
            ("Coin Flip".to_string(), 2.5)
        );
        assert!(parse_weight_override("nope").is_err());
        assert!(parse_weight_override("=1.0").is_err());
        assert!(parse_weight_override("A=x").is_err());
    }
}
