use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::primitive::PrimitiveKind;
use crate::domain::Rgb;
use crate::error::Result;

/// Leading bytes of every picture stream
pub const MAGIC: [u8; 4] = *b"VPIC";

pub const FORMAT_VERSION: u8 = 1;

/// A primitive as stored in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicturePrimitive {
    pub kind: PrimitiveKind,
    pub color_index: u8,
    pub points: Vec<[u32; 2]>,
}

/// The decoded content of a picture stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub resolution: u32,
    /// Grid width and height of the drawing
    pub extent: [u32; 2],
    pub palette: Vec<Rgb>,
    /// Primitives in drawing order
    pub primitives: Vec<PicturePrimitive>,
}

impl Picture {
    /// Resolved color of a primitive, if its palette slot exists
    pub fn color_of(&self, primitive: &PicturePrimitive) -> Option<Rgb> {
        self.palette.get(usize::from(primitive.color_index)).copied()
    }
}

/// Serialize a picture
///
/// Stream layout (little endian):
/// - 4 byte magic `VPIC`, 1 byte version
/// - u32 resolution, u32 width, u32 height
/// - u16 palette count, then 3 bytes RGB per entry
/// - u32 primitive count, then per primitive:
///   - u8 kind (0 point, 1 segment, 2 polygon), u8 palette index
///   - u32 point count, then u32 x, u32 y per point
pub fn encode(picture: &Picture) -> Vec<u8> {
    let total_points = picture.primitives.iter().map(|p| p.points.len()).sum();
    let mut out = Vec::with_capacity(estimate_picture_size(
        picture.primitives.len(),
        picture.palette.len(),
        total_points,
    ));

    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&picture.resolution.to_le_bytes());
    out.extend_from_slice(&picture.extent[0].to_le_bytes());
    out.extend_from_slice(&picture.extent[1].to_le_bytes());

    out.extend_from_slice(&(picture.palette.len() as u16).to_le_bytes());
    for color in &picture.palette {
        out.extend_from_slice(&color.to_array());
    }

    out.extend_from_slice(&(picture.primitives.len() as u32).to_le_bytes());
    for primitive in &picture.primitives {
        out.push(primitive.kind.tag());
        out.push(primitive.color_index);
        out.extend_from_slice(&(primitive.points.len() as u32).to_le_bytes());
        for point in &primitive.points {
            out.extend_from_slice(&point[0].to_le_bytes());
            out.extend_from_slice(&point[1].to_le_bytes());
        }
    }

    out
}

/// Size in bytes of an encoded picture
pub fn estimate_picture_size(primitives: usize, palette: usize, points: usize) -> usize {
    // header (4 magic + 1 version + 12) + palette (2 + 3n) + primitives (4 + 6n + 8 per point)
    17 + 2 + palette * 3 + 4 + primitives * 6 + points * 8
}

/// Write encoded picture bytes to a file
pub fn write_picture(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}
