use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::WheelError;
use crate::sampler::{Sampler, SamplingMode};
use crate::scheduler::{DEFAULT_FRAME_COUNT, Easing, TurnRange};
use crate::spin::Wheel;
use crate::weights::{DEFAULT_WEIGHT, WeightMap, WeightRange};
use crate::wheel::{Palette, REFERENCE_SEGMENTS, WheelLayout, parse_hex_color};

/// A run of identical slots on the wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub label: String,
    #[serde(default = "one")]
    pub count: usize,
    #[serde(default)]
    pub color: Option<String>,
}

fn one() -> usize {
    1
}

fn default_frame_count() -> usize {
    DEFAULT_FRAME_COUNT
}

// The JSON file has the following structure:
// {
//    "segments": [ { "label": "1", "count": 20, "color": "#f6d743" }, ... ],
//    "weights": { "1": 1.0, ... },
//    "weight_range": { "min": 0.1, "max": 3.0, "step": 0.1 },
//    "sampling": { "mode": "quantized", "base_unit": 10 },
//    "frame_count": 60,
//    "turns": { "min": 3, "max": 8 },
//    "easing": { "base_ms": 30, "step_ms": 10 }
// }
// Only "segments" is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelConfig {
    pub segments: Vec<SegmentSpec>,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub weight_range: WeightRange,
    #[serde(default)]
    pub sampling: SamplingMode,
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,
    #[serde(default)]
    pub turns: TurnRange,
    #[serde(default)]
    pub easing: Easing,
}

impl WheelConfig {
    /// The built-in 52 slot wheel, all weights at their default.
    pub fn reference() -> Self {
        Self {
            segments: REFERENCE_SEGMENTS
                .iter()
                .map(|&(label, count, color)| SegmentSpec {
                    label: label.to_string(),
                    count,
                    color: Some(color.to_string()),
                })
                .collect(),
            weights: BTreeMap::new(),
            weight_range: WeightRange::default(),
            sampling: SamplingMode::default(),
            frame_count: DEFAULT_FRAME_COUNT,
            turns: TurnRange::default(),
            easing: Easing::default(),
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, WheelError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: WheelConfig = serde_json::from_reader(reader)?;
        log::info!(
            "Loaded wheel config from {} ({} segment groups)",
            path.display(),
            config.segments.len()
        );
        Ok(config)
    }

    pub fn palette(&self) -> Result<Palette, WheelError> {
        let mut palette = Palette::new();
        for spec in &self.segments {
            if let Some(hex) = &spec.color {
                palette.insert(spec.label.clone(), parse_hex_color(hex)?);
            }
        }
        Ok(palette)
    }

    pub fn layout(&self) -> Result<WheelLayout, WheelError> {
        let palette = self.palette()?;
        let labels = self
            .segments
            .iter()
            .flat_map(|spec| std::iter::repeat_n(spec.label.as_str(), spec.count));
        Ok(WheelLayout::new(labels, &palette))
    }

    /// Weights for every label on the wheel. Unlisted labels get the
    /// default weight, out-of-range values are clamped. Only the
    /// quantized sampler snaps weights to the range's step.
    pub fn weight_map(&self, layout: &WheelLayout) -> Result<WeightMap, WheelError> {
        self.weight_range.validate()?;
        let labels = layout.labels();
        if let Some(unknown) = self.weights.keys().find(|k| !labels.contains(&k.as_str())) {
            return Err(WheelError::Config(format!(
                "weight given for '{unknown}', which is not on the wheel"
            )));
        }

        let mut weights = WeightMap::new();
        for label in labels {
            let w = self.weights.get(label).copied().unwrap_or(DEFAULT_WEIGHT);
            weights.set(label, w);
        }
        let snap = matches!(self.sampling, SamplingMode::Quantized { .. });
        weights.clamp_to(&self.weight_range, snap);
        Ok(weights)
    }

    /// Apply a `LABEL=WEIGHT` override on top of the file values.
    pub fn set_weight(&mut self, label: impl Into<String>, weight: f64) {
        self.weights.insert(label.into(), weight);
    }

    pub fn build(&self) -> Result<Wheel, WheelError> {
        let layout = self.layout()?;
        if layout.is_empty() {
            return Err(WheelError::EmptyLayout);
        }
        let weights = self.weight_map(&layout)?;
        let mut wheel = Wheel::new(layout, weights);
        wheel.sampler = Sampler::new(self.sampling);
        wheel.frame_count = self.frame_count;
        wheel.turns = self.turns;
        wheel.easing = self.easing;
        Ok(wheel)
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::io::Write;

    #[test]
    fn test_read_wheel_json() {
        let config = WheelConfig::load_from_file("wheel.json").expect("should read file");
        let wheel = config.build().expect("should build");
        assert_eq!(wheel.layout.len(), 52);
        assert_eq!(wheel.frame_count, 60);
        assert_eq!(wheel.weights.get("Crazy Time"), Some(1.0));
    }

    #[test]
    fn test_reference_matches_builtin_layout() {
        let from_config = WheelConfig::reference().layout().unwrap();
        let builtin = WheelLayout::reference();
        assert_eq!(from_config.segments(), builtin.segments());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let json = r##"{
            "segments": [
                { "label": "Win", "color": "#00ff00" },
                { "label": "Lose", "count": 3 }
            ],
            "weights": { "Win": 9.0 },
            "sampling": { "mode": "continuous" }
        }"##;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = WheelConfig::load_from_file(file.path()).unwrap();
        let wheel = config.build().unwrap();
        assert_eq!(wheel.layout.len(), 4);
        assert_eq!(wheel.layout.segments()[0].color, [0, 255, 0]);
        assert_eq!(wheel.weights.get("Win"), Some(3.0));
        assert_eq!(wheel.weights.get("Lose"), Some(1.0));
        assert_eq!(wheel.sampler.mode(), SamplingMode::Continuous);
        assert_eq!(wheel.turns, TurnRange::default());
    }

    #[test]
    fn test_continuous_mode_keeps_fine_weights() {
        let json = r#"{
            "segments": [ { "label": "A" }, { "label": "B" } ],
            "weights": { "A": 0.1, "B": 0.15 },
            "sampling": { "mode": "continuous" }
        }"#;
        let config: WheelConfig = serde_json::from_str(json).unwrap();
        let wheel = config.build().unwrap();
        assert_eq!(wheel.weights.get("B"), Some(0.15));

        let probs = wheel.distribution().unwrap().label_probabilities(&wheel.layout);
        assert!((probs["A"] - 0.4).abs() < 1e-12);
        assert!((probs["B"] - 0.6).abs() < 1e-12);

        let mut quantized = config.clone();
        quantized.sampling = SamplingMode::default();
        assert_ne!(quantized.build().unwrap().weights.get("B"), Some(0.15));
    }

    #[test]
    fn test_huge_easing_step_does_not_overflow() {
        let mut config = WheelConfig::reference();
        config.easing = Easing {
            base_ms: 30,
            step_ms: u64::MAX,
        };
        let wheel = config.build().unwrap();
        let mut rng = Pcg32::seed_from_u64(4);
        let frames: Vec<_> = wheel.spin(&mut rng).unwrap().collect();
        assert_eq!(frames.len(), 60);
        assert_eq!(frames[59].delay, std::time::Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_unknown_weight_label_rejected() {
        let mut config = WheelConfig::reference();
        config.set_weight("Jackpot", 2.0);
        assert!(matches!(config.build(), Err(WheelError::Config(_))));
    }

    #[test]
    fn test_empty_segments_rejected() {
        let mut config = WheelConfig::reference();
        config.segments.clear();
        assert!(matches!(config.build(), Err(WheelError::EmptyLayout)));
    }

    #[test]
    fn test_bad_color_rejected() {
        let mut config = WheelConfig::reference();
        config.segments[0].color = Some("yellow".to_string());
        assert!(matches!(config.build(), Err(WheelError::Config(_))));
    }
}
