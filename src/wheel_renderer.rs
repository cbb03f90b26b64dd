//! Draws the wheel for a frame: wedges, pointer, labels and the settled
//! highlight. Writes a still image or an animated GIF of a whole spin.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::codecs::gif::GifEncoder;
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage};
use rusttype::{Font, Scale, point};

use crate::error::WheelError;
use crate::scheduler::AnimationFrame;
use crate::wheel::WheelLayout;

pub const FONT_ENV_VAR: &str = "WHEEL_FONT_PATH";

const FONT_CANDIDATES: &[&str] = &[
    "DejaVuSans-Bold", "DejaVuSans", "Arial", "Helvetica", "LiberationSans-Bold", "LiberationSans",
    "SegoeUI", "NotoSans-Bold", "NotoSans-Regular", "Cantarell-Regular",
];

const BACKGROUND: Rgb<u8> = Rgb([245, 245, 245]);
const RIM: Rgb<u8> = Rgb([40, 40, 40]);
const HUB: Rgb<u8> = Rgb([30, 30, 30]);
const POINTER: Rgb<u8> = Rgb([0, 0, 0]);
const HIGHLIGHT: Rgb<u8> = Rgb([230, 0, 0]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);

/// Extra time the settled frame stays up in a GIF.
const SETTLE_HOLD: Duration = Duration::from_millis(1500);

fn font_dirs() -> Vec<PathBuf> {
    let home = dirs_next::home_dir();
    let mut dirs = Vec::new();
    if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.extend(home.map(|h| h.join("Library/Fonts")));
    } else if cfg!(target_os = "windows") {
        dirs.extend(std::env::var_os("WINDIR").map(|w| PathBuf::from(w).join("Fonts")));
        dirs.push(PathBuf::from("C:/Windows/Fonts"));
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(h) = home {
            dirs.push(h.join(".fonts"));
            dirs.push(h.join(".local/share/fonts"));
        }
    }
    dirs
}

fn font_files() -> Vec<PathBuf> {
    font_dirs()
        .into_iter()
        .filter(|d| d.exists())
        .flat_map(|d| walkdir::WalkDir::new(d).follow_links(true).into_iter().filter_map(|e| e.ok()))
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
        })
        .collect()
}

/// Printable ASCII glyphs the font can draw.
fn ascii_coverage(font: &Font) -> usize {
    (32u8..=126).filter(|&c| font.glyph(c as char).id().0 != 0).count()
}

/// Locate a usable font: env override, then well-known names, then the
/// installed font with the widest ASCII coverage.
pub fn find_system_font_data() -> Option<Vec<u8>> {
    if let Some(path) = std::env::var_os(FONT_ENV_VAR) {
        match fs::read(&path) {
            Ok(bytes) => return Some(bytes),
            Err(e) => log::warn!("{} set but unreadable: {}", FONT_ENV_VAR, e),
        }
    }

    let files = font_files();
    for cand in FONT_CANDIDATES {
        let hit = files.iter().find(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case(cand))
        });
        if let Some(bytes) = hit.and_then(|p| fs::read(p).ok()) {
            log::info!("Using font {}", cand);
            return Some(bytes);
        }
    }

    let mut best: Option<(usize, &Path)> = None;
    for path in &files {
        let Some(font) = fs::read(path).ok().and_then(Font::try_from_vec) else {
            continue;
        };
        let score = ascii_coverage(&font);
        if best.is_none_or(|(s, _)| score > s) {
            best = Some((score, path));
        }
    }
    let (_, path) = best?;
    log::info!("Using font {}", path.display());
    fs::read(path).ok()
}

struct TextPainter {
    font: Font<'static>,
    scale: Scale,
}

impl TextPainter {
    fn new(font_data: Vec<u8>, px: f32) -> Result<Self, WheelError> {
        let font = Font::try_from_vec(font_data)
            .ok_or_else(|| WheelError::Font("invalid font data".to_string()))?;
        Ok(Self {
            font,
            scale: Scale::uniform(px),
        })
    }

    fn text_width(&self, text: &str) -> f32 {
        self.font
            .layout(text, self.scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    /// Draw `text` centred on (cx, cy).
    fn draw_centered(&self, img: &mut RgbImage, text: &str, cx: f32, cy: f32, color: Rgb<u8>) {
        let v = self.font.v_metrics(self.scale);
        let left = cx - self.text_width(text) / 2.0;
        let baseline = cy + (v.ascent + v.descent) / 2.0;
        for glyph in self.font.layout(text, self.scale, point(left, baseline)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|x, y, a| {
                if a < 0.05 {
                    return;
                }
                let gx = bb.min.x + x as i32;
                let gy = bb.min.y + y as i32;
                if gx < 0 || gy < 0 || gx as u32 >= img.width() || gy as u32 >= img.height() {
                    return;
                }
                let dst = img.get_pixel_mut(gx as u32, gy as u32);
                for i in 0..3 {
                    dst[i] = (dst[i] as f32 * (1.0 - a) + color[i] as f32 * a) as u8;
                }
            });
        }
    }
}

/// Labels that fit a narrow wedge: initials for multi-word labels.
fn short_label(label: &str) -> String {
    let words: Vec<&str> = label.split_whitespace().collect();
    if words.len() > 1 {
        words.iter().filter_map(|w| w.chars().next()).collect()
    } else {
        label.chars().take(3).collect()
    }
}

/// Segment index under wheel-frame angle `phi` (clockwise degrees from
/// the pointer on the unrotated wheel), plus the offset into that wedge.
fn segment_at(phi: f64, count: usize) -> (usize, f64) {
    let seg = 360.0 / count as f64;
    let shifted = (phi + seg / 2.0).rem_euclid(360.0);
    let index = ((shifted / seg) as usize).min(count - 1);
    (index, shifted - index as f64 * seg)
}

pub struct WheelRenderer {
    size: u32,
    painter: Option<TextPainter>,
}

impl WheelRenderer {
    /// Renderer with labels if a system font can be found.
    pub fn new(size: u32) -> Self {
        let painter = find_system_font_data().and_then(|data| {
            TextPainter::new(data, (size as f32 * 0.028).max(8.0))
                .map_err(|e| log::warn!("{}", e))
                .ok()
        });
        if painter.is_none() {
            log::warn!("No system font found, drawing wheel without labels");
        }
        Self { size, painter }
    }

    pub fn without_labels(size: u32) -> Self {
        Self {
            size,
            painter: None,
        }
    }

    pub fn with_font(size: u32, font_data: Vec<u8>) -> Result<Self, WheelError> {
        let painter = TextPainter::new(font_data, (size as f32 * 0.028).max(8.0))?;
        Ok(Self {
            size,
            painter: Some(painter),
        })
    }

    fn geometry(&self) -> (f64, f64, f64) {
        let s = self.size as f64;
        (s / 2.0, s / 2.0 + s * 0.04, s * 0.42)
    }

    pub fn render_frame(&self, layout: &WheelLayout, frame: &AnimationFrame) -> RgbImage {
        self.render_angle(layout, frame.angle, frame.highlight)
    }

    /// Wheel rotated counter-clockwise by `angle` degrees.
    pub fn render_angle(&self, layout: &WheelLayout, angle: f64, highlight: Option<usize>) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.size, self.size, BACKGROUND);
        if layout.is_empty() {
            return img;
        }
        let (cx, cy, r) = self.geometry();
        let count = layout.len();
        let segments = layout.segments();

        for (x, y, px) in img.enumerate_pixels_mut() {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let d = dx.hypot(dy);
            if d > r + 3.0 {
                continue;
            }
            if d > r {
                *px = RIM;
                continue;
            }
            if d < r * 0.12 {
                *px = HUB;
                continue;
            }
            let screen = dx.atan2(-dy).to_degrees();
            let (index, offset) = segment_at(screen + angle, count);
            let seg_angle = 360.0 / count as f64;

            let outlined = highlight == Some(index) && {
                let edge = offset.min(seg_angle - offset).to_radians() * d;
                edge < 2.5 || d > r - 4.0
            };
            *px = if outlined {
                HIGHLIGHT
            } else {
                Rgb(segments[index].color)
            };
        }

        if let Some(painter) = &self.painter {
            let seg_angle = 360.0 / count as f64;
            for seg in segments {
                let screen = (seg.position as f64 * seg_angle - angle).to_radians();
                let lx = cx + r * 0.8 * screen.sin();
                let ly = cy - r * 0.8 * screen.cos();
                painter.draw_centered(&mut img, &short_label(&seg.label), lx as f32, ly as f32, TEXT);
            }
        }

        self.draw_pointer(&mut img);
        img
    }

    /// Downward triangle at 12 o'clock, tip just inside the rim.
    fn draw_pointer(&self, img: &mut RgbImage) {
        let s = self.size as f64;
        let (cx, cy, r) = self.geometry();
        let tip = cy - r + s * 0.03;
        let base = (cy - r - s * 0.05).max(0.0);
        let half = s * 0.03;
        let height = tip - base;
        if height <= 0.0 {
            return;
        }
        for y in base as u32..=tip as u32 {
            let t = (tip - y as f64) / height;
            let w = half * t;
            let x0 = (cx - w).max(0.0) as u32;
            let x1 = ((cx + w) as u32).min(self.size.saturating_sub(1));
            for x in x0..=x1 {
                if y < self.size {
                    img.put_pixel(x, y, POINTER);
                }
            }
        }
    }

    /// Write one frame; format follows the extension (PNG if unknown).
    pub fn write_still(
        &self,
        layout: &WheelLayout,
        frame: &AnimationFrame,
        path: impl AsRef<Path>,
    ) -> Result<(), WheelError> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
        let img = self.render_frame(layout, frame);
        let mut file = File::create(path)?;
        img.write_to(&mut file, format)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }

    /// Encode every frame into an animated GIF, using each frame's delay.
    /// Returns the number of frames written.
    pub fn write_gif<I>(&self, layout: &WheelLayout, frames: I, path: impl AsRef<Path>) -> Result<usize, WheelError>
    where
        I: IntoIterator<Item = AnimationFrame>,
    {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), 10);
        let mut written = 0;
        for frame in frames {
            let rgba = DynamicImage::ImageRgb8(self.render_frame(layout, &frame)).into_rgba8();
            let hold = if frame.is_final() { SETTLE_HOLD } else { Duration::ZERO };
            let delay = Delay::from_saturating_duration(frame.delay + hold);
            encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
            written += 1;
        }
        drop(encoder);
        log::info!("Wrote {} frames to {}", written, path.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SpinSchedule;
    use crate::wheel::Palette;

    fn four_colors() -> WheelLayout {
        let mut palette = Palette::new();
        palette.insert("A", [10, 200, 10]);
        palette.insert("B", [10, 10, 200]);
        palette.insert("C", [200, 200, 10]);
        palette.insert("D", [10, 200, 200]);
        WheelLayout::new(["A", "B", "C", "D"], &palette)
    }

    #[test]
    fn test_segment_at() {
        assert_eq!(segment_at(0.0, 4).0, 0);
        assert_eq!(segment_at(44.0, 4).0, 0);
        assert_eq!(segment_at(46.0, 4).0, 1);
        assert_eq!(segment_at(-44.0, 4).0, 0);
        assert_eq!(segment_at(540.0, 4).0, 2);
    }

    #[test]
    fn test_pointer_sits_over_target() {
        let layout = four_colors();
        let renderer = WheelRenderer::without_labels(200);
        let (cx, cy, r) = renderer.geometry();
        let img = renderer.render_angle(&layout, 540.0, None);
        let px = img.get_pixel(cx as u32, (cy - r * 0.6) as u32);
        assert_eq!(*px, Rgb([200, 200, 10]));
        assert_eq!(*img.get_pixel(cx as u32, (cy - r + 1.0) as u32), POINTER);
    }

    #[test]
    fn test_highlight_only_on_settled_frame() {
        let layout = four_colors();
        let renderer = WheelRenderer::without_labels(160);
        let red = |img: &RgbImage| img.pixels().filter(|p| **p == HIGHLIGHT).count();
        assert_eq!(red(&renderer.render_angle(&layout, 540.0, None)), 0);
        assert!(red(&renderer.render_angle(&layout, 540.0, Some(2))) > 0);
    }

    #[test]
    fn test_labels_drawn_with_system_font() {
        let Some(font_data) = find_system_font_data() else {
            eprintln!("no system font installed, skipping label check");
            return;
        };
        let layout = four_colors();
        let labelled = WheelRenderer::with_font(240, font_data).unwrap();
        let plain = WheelRenderer::without_labels(240);

        let with_text = labelled.render_angle(&layout, 90.0, None);
        let without_text = plain.render_angle(&layout, 90.0, None);
        let changed = with_text
            .pixels()
            .zip(without_text.pixels())
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 0, "expected label pixels on the wheel");
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("Coin Flip"), "CF");
        assert_eq!(short_label("Pachinko"), "Pac");
        assert_eq!(short_label("10"), "10");
    }

    #[test]
    fn test_write_gif_and_still() {
        let layout = four_colors();
        let renderer = WheelRenderer::without_labels(64);
        let dir = tempfile::tempdir().unwrap();

        let gif = dir.path().join("spin.gif");
        let schedule = SpinSchedule::new(1, 4, 3, 360.0).unwrap();
        assert_eq!(renderer.write_gif(&layout, schedule, &gif).unwrap(), 3);
        let decoded = image::open(&gif).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));

        let png = dir.path().join("final.png");
        let last = SpinSchedule::new(1, 4, 3, 360.0).unwrap().last().unwrap();
        renderer.write_still(&layout, &last, &png).unwrap();
        assert!(png.exists());
    }
}
