//! Color resolution and the 256-entry palette ceiling
//!
//! Colors are resolved per primitive first, then the set of distinct colors
//! is reduced with median cut when it exceeds the palette size. Every
//! primitive keeps its requested color and gains a palette slot pointing at
//! the nearest representative.

use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};

use tracing::{debug, warn};

use super::config::ColorMode;
use super::primitive::Primitive;
use crate::domain::Rgb;

/// Hard palette size of the picture format
pub const MAX_PALETTE_SIZE: usize = 256;

/// Small splitmix64 generator for random primitive colors
#[derive(Debug, Clone)]
pub struct ColorRng {
    state: u64,
}

impl ColorRng {
    pub fn seeded(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the process's hash randomization
    ///
    /// Each `RandomState` is keyed from OS randomness and no two share keys,
    /// so hashing a constant through a fresh one gives a new seed per call.
    pub fn from_entropy() -> Self {
        Self::seeded(RandomState::new().hash_one(0x5eed_u64))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    pub fn next_color(&mut self) -> Rgb {
        let [r, g, b, ..] = self.next_u64().to_le_bytes();
        Rgb::new(r, g, b)
    }
}

/// Resolve the color of every primitive according to `mode`
pub fn assign_colors(
    primitives: &mut [Primitive],
    mode: ColorMode,
    specified: Rgb,
    rng: &mut ColorRng,
) {
    for primitive in primitives.iter_mut() {
        primitive.color = match mode {
            ColorMode::Default => primitive.cell_color.map_or(specified, |c| c.rgb()),
            ColorMode::Specified => specified,
            ColorMode::Random => rng.next_color(),
        };
    }
}

/// The color table written into a picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<Rgb>,
    /// Whether distinct requested colors had to be merged
    pub reduced: bool,
}

impl Palette {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the entry closest to `color`
    pub fn nearest(&self, color: &Rgb) -> usize {
        nearest_index(&self.colors, color)
    }
}

/// Build the palette and set each primitive's palette slot
///
/// Never fails: more than [`MAX_PALETTE_SIZE`] distinct colors are merged.
pub fn limit_palette(primitives: &mut [Primitive]) -> Palette {
    let mut distinct: Vec<Rgb> = Vec::new();
    let mut seen: HashMap<Rgb, usize> = HashMap::new();
    for primitive in primitives.iter() {
        seen.entry(primitive.color).or_insert_with(|| {
            distinct.push(primitive.color);
            distinct.len() - 1
        });
    }

    let palette = if distinct.len() <= MAX_PALETTE_SIZE {
        Palette {
            colors: distinct,
            reduced: false,
        }
    } else {
        warn!(
            requested = distinct.len(),
            limit = MAX_PALETTE_SIZE,
            "too many distinct colors, quantizing palette"
        );
        let colors = median_cut(&distinct, MAX_PALETTE_SIZE);
        seen = distinct
            .iter()
            .map(|c| (*c, nearest_index(&colors, c)))
            .collect();
        Palette {
            colors,
            reduced: true,
        }
    };

    for primitive in primitives.iter_mut() {
        let slot = seen
            .get(&primitive.color)
            .copied()
            .unwrap_or_else(|| palette.nearest(&primitive.color));
        primitive.color_index = slot as u8;
    }

    debug!(entries = palette.len(), reduced = palette.reduced, "palette built");
    palette
}

fn nearest_index(palette: &[Rgb], color: &Rgb) -> usize {
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, entry)| entry.distance_sq(color))
        .map_or(0, |(i, _)| i)
}

/// Reduce `colors` to at most `max_colors` box averages
///
/// Repeatedly splits the box with the widest channel range at the median of
/// that channel.
pub fn median_cut(colors: &[Rgb], max_colors: usize) -> Vec<Rgb> {
    if colors.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    let mut boxes: Vec<Vec<Rgb>> = vec![colors.to_vec()];
    while boxes.len() < max_colors {
        let Some((index, channel)) = widest_box(&boxes) else {
            break;
        };

        let mut bucket = boxes.swap_remove(index);
        bucket.sort_by_key(|c| c.to_array()[channel]);
        let upper = bucket.split_off(bucket.len() / 2);
        boxes.push(bucket);
        boxes.push(upper);
    }

    boxes.iter().map(|b| average(b)).collect()
}

/// Box with the largest channel range and that channel, if any box can split
fn widest_box(boxes: &[Vec<Rgb>]) -> Option<(usize, usize)> {
    boxes
        .iter()
        .enumerate()
        .filter(|(_, b)| b.len() > 1)
        .filter_map(|(i, b)| {
            let (channel, range) = (0..3)
                .map(|ch| {
                    let values = b.iter().map(|c| c.to_array()[ch]);
                    let lo = values.clone().min().unwrap_or(0);
                    let hi = values.max().unwrap_or(0);
                    (ch, hi - lo)
                })
                .max_by_key(|&(_, range)| range)?;
            (range > 0).then_some((i, channel, range))
        })
        .max_by_key(|&(_, _, range)| range)
        .map(|(i, channel, _)| (i, channel))
}

fn average(colors: &[Rgb]) -> Rgb {
    let n = colors.len().max(1) as u32;
    let (r, g, b) = colors.iter().fold((0u32, 0u32, 0u32), |(r, g, b), c| {
        (r + u32::from(c.r), g + u32::from(c.g), b + u32::from(c.b))
    });
    let mean = |sum: u32| ((sum + n / 2) / n) as u8;
    Rgb::new(mean(r), mean(g), mean(b))
}
