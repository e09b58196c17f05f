//! Frequency bar geometry and colouring.
//!
//! Only the lower half of the bins is painted; the upper half is mostly
//! silence for typical music.

use egui::{Color32, Pos2, Rect};

use crate::backend::Fill;
use crate::config::BarStyle;

/// Gradient start, used for the lowest bin.
pub const LOW_COLOR: Color32 = Color32::from_rgb(147, 51, 234);
/// Gradient end, approached by the highest painted bin.
pub const HIGH_COLOR: Color32 = Color32::from_rgb(219, 39, 119);

/// Wave style backdrop, repainted each frame for a fading trail.
pub const WAVE_BACKDROP: Fill = Fill {
    r: 0,
    g: 0,
    b: 0,
    alpha: 0.2,
};

/// Harmonics style backdrop (slate-900).
pub const HARMONICS_BACKDROP: Fill = Fill {
    r: 15,
    g: 23,
    b: 42,
    alpha: 1.0,
};

const HARMONICS_EXPONENT: f64 = 0.6;
const HARMONICS_HEADROOM: f64 = 0.85;
const HARMONICS_MIN_ALPHA: f64 = 0.7;

/// Number of bins worth painting for a buffer of `bin_count`.
pub fn usable_bins(bin_count: usize) -> usize {
    bin_count / 2
}

fn lerp_channel(from: u8, to: u8, progress: f64) -> u8 {
    (f64::from(from) + (f64::from(to) - f64::from(from)) * progress).floor() as u8
}

/// Colour of bin `index` out of `usable` painted bins, before alpha.
pub fn bin_color(index: usize, usable: usize) -> (u8, u8, u8) {
    let progress = index as f64 / usable as f64;
    (
        lerp_channel(LOW_COLOR.r(), HIGH_COLOR.r(), progress),
        lerp_channel(LOW_COLOR.g(), HIGH_COLOR.g(), progress),
        lerp_channel(LOW_COLOR.b(), HIGH_COLOR.b(), progress),
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub rect: Rect,
    pub fill: Fill,
}

/// Lays out one bar per usable bin of `data` on a `width` x `height` surface.
pub fn layout(style: BarStyle, data: &[u8], width: f64, height: f64) -> Vec<Bar> {
    let usable = usable_bins(data.len());
    if usable == 0 {
        return Vec::new();
    }
    let bar_width = width / usable as f64;

    data[..usable]
        .iter()
        .enumerate()
        .map(|(i, &magnitude)| {
            let (r, g, b) = bin_color(i, usable);
            let normalized = f64::from(magnitude) / 255.0;
            let x = i as f64 * bar_width;

            let (left, bar_w, bar_h, alpha) = match style {
                BarStyle::Wave => (x, bar_width, normalized * height, f64::from(magnitude) / 32.0),
                BarStyle::Harmonics => {
                    let enhanced = normalized.powf(HARMONICS_EXPONENT);
                    let bar_h = (enhanced * HARMONICS_HEADROOM * height).max(1.0);
                    (x + 1.0, bar_width - 2.0, bar_h, enhanced.max(HARMONICS_MIN_ALPHA))
                }
            };

            Bar {
                rect: Rect::from_min_size(
                    Pos2::new(left as f32, (height - bar_h) as f32),
                    egui::vec2(bar_w as f32, bar_h as f32),
                ),
                fill: Fill::new(r, g, b, alpha),
            }
        })
        .collect()
}
