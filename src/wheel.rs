//! Wheel layout: the fixed, ordered ring of segments.

use std::collections::BTreeMap;

use crate::error::WheelError;

/// Grey used for labels that have no palette entry.
pub const FALLBACK_COLOR: [u8; 3] = [128, 128, 128];

/// Reference wheel: (label, slot count, color). 52 slots in total.
pub const REFERENCE_SEGMENTS: &[(&str, usize, &str)] = &[
    ("1", 20, "#f6d743"),
    ("2", 12, "#4eb1d4"),
    ("5", 7, "#ec6f3c"),
    ("10", 4, "#9467bd"),
    ("Coin Flip", 4, "#00bcd4"),
    ("Cash Hunt", 2, "#a0cf4f"),
    ("Pachinko", 2, "#ffb347"),
    ("Crazy Time", 1, "#d62828"),
];

pub const REFERENCE_SEGMENT_COUNT: usize = slot_total(REFERENCE_SEGMENTS);

const fn slot_total(table: &[(&str, usize, &str)]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < table.len() {
        total += table[i].1;
        i += 1;
    }
    total
}

/// One slot on the wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub label: String,
    pub position: usize,
    pub color: [u8; 3],
}

/// Label -> RGB color. Display only, never consulted by the sampler.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    colors: BTreeMap<String, [u8; 3]>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, color: [u8; 3]) {
        self.colors.insert(label.into(), color);
    }

    pub fn color_for(&self, label: &str) -> [u8; 3] {
        self.colors.get(label).copied().unwrap_or(FALLBACK_COLOR)
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(hex: &str) -> Result<[u8; 3], WheelError> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(WheelError::Config(format!("bad color '{hex}', expected #rrggbb")));
    }
    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| WheelError::Config(format!("bad color '{hex}', expected #rrggbb")))?;
    }
    Ok(rgb)
}

/// The ordered ring of segments. Never mutated once built.
#[derive(Debug, Clone)]
pub struct WheelLayout {
    segments: Vec<Segment>,
}

impl WheelLayout {
    /// Build a layout from labels in wheel order. Position = index.
    pub fn new<I, S>(labels: I, palette: &Palette) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = labels
            .into_iter()
            .enumerate()
            .map(|(position, label)| {
                let label = label.into();
                let color = palette.color_for(&label);
                Segment {
                    label,
                    position,
                    color,
                }
            })
            .collect();
        Self { segments }
    }

    /// The 52-slot reference wheel with its palette.
    pub fn reference() -> Self {
        let mut palette = Palette::new();
        let mut labels = Vec::with_capacity(REFERENCE_SEGMENT_COUNT);
        for &(label, count, hex) in REFERENCE_SEGMENTS {
            // Constant table, always well formed.
            palette.insert(label, parse_hex_color(hex).unwrap_or(FALLBACK_COLOR));
            labels.extend(std::iter::repeat_n(label, count));
        }
        Self::new(labels, &palette)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, position: usize) -> Option<&Segment> {
        self.segments.get(position)
    }

    /// Distinct labels in order of first appearance.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if !seen.contains(&seg.label.as_str()) {
                seen.push(&seg.label);
            }
        }
        seen
    }

    pub fn occurrences(&self, label: &str) -> usize {
        self.segments.iter().filter(|s| s.label == label).count()
    }

    /// Degrees spanned by one segment.
    pub fn segment_angle(&self) -> f64 {
        360.0 / self.segments.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_layout_shape() {
        let layout = WheelLayout::reference();
        assert_eq!(REFERENCE_SEGMENT_COUNT, 52);
        assert_eq!(layout.len(), REFERENCE_SEGMENT_COUNT);
        assert_eq!(layout.occurrences("1"), 20);
        assert_eq!(layout.occurrences("2"), 12);
        assert_eq!(layout.occurrences("Crazy Time"), 1);
        assert_eq!(layout.labels().len(), 8);
        assert_eq!(layout.get(51).map(|s| s.label.as_str()), Some("Crazy Time"));
        assert_eq!(layout.get(0).map(|s| s.color), Some([0xf6, 0xd7, 0x43]));
    }

    #[test]
    fn test_positions_follow_order() {
        let layout = WheelLayout::new(["A", "A", "B"], &Palette::new());
        for (i, seg) in layout.segments().iter().enumerate() {
            assert_eq!(seg.position, i);
            assert_eq!(seg.color, FALLBACK_COLOR);
        }
        assert_eq!(layout.labels(), vec!["A", "B"]);
        assert_eq!(layout.segment_angle(), 120.0);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#d62828").unwrap(), [0xd6, 0x28, 0x28]);
        assert_eq!(parse_hex_color("00bcd4").unwrap(), [0x00, 0xbc, 0xd4]);
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }
}
