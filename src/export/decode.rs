use super::encode::{FORMAT_VERSION, MAGIC, Picture, PicturePrimitive};
use super::palette::MAX_PALETTE_SIZE;
use super::primitive::PrimitiveKind;
use crate::domain::Rgb;
use crate::error::{PlotError, Result};

/// Parse a picture stream produced by [`super::encode::encode`]
///
/// Rejects truncated input, unknown tags, palette slots past the table and
/// trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<Picture> {
    let mut reader = Reader { bytes, pos: 0 };

    if reader.take(4)? != MAGIC {
        return Err(malformed("missing VPIC magic"));
    }
    let version = reader.u8()?;
    if version != FORMAT_VERSION {
        return Err(malformed(format!("unsupported version {version}")));
    }

    let resolution = reader.u32()?;
    let extent = [reader.u32()?, reader.u32()?];

    let palette_len = usize::from(reader.u16()?);
    if palette_len > MAX_PALETTE_SIZE {
        return Err(malformed(format!("palette of {palette_len} entries")));
    }
    let palette = (0..palette_len)
        .map(|_| -> Result<Rgb> {
            let rgb = reader.take(3)?;
            Ok(Rgb::new(rgb[0], rgb[1], rgb[2]))
        })
        .collect::<Result<Vec<_>>>()?;

    let count = reader.u32()? as usize;
    let mut primitives = Vec::new();
    for i in 0..count {
        let tag = reader.u8()?;
        let kind = PrimitiveKind::from_tag(tag)
            .ok_or_else(|| malformed(format!("primitive {i} has unknown kind {tag}")))?;
        let color_index = reader.u8()?;
        if usize::from(color_index) >= palette.len() {
            return Err(malformed(format!(
                "primitive {i} uses palette slot {color_index} of {}",
                palette.len()
            )));
        }

        let n = reader.u32()? as usize;
        let points = (0..n)
            .map(|_| -> Result<[u32; 2]> { Ok([reader.u32()?, reader.u32()?]) })
            .collect::<Result<Vec<_>>>()?;

        primitives.push(PicturePrimitive {
            kind,
            color_index,
            points,
        });
    }

    if reader.remaining() != 0 {
        return Err(malformed(format!(
            "{} trailing bytes after last primitive",
            reader.remaining()
        )));
    }

    Ok(Picture {
        resolution,
        extent,
        palette,
        primitives,
    })
}

fn malformed(msg: impl Into<String>) -> PlotError {
    PlotError::Malformed(msg.into())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| malformed(format!("stream truncated at byte {}", self.pos)))?;
        let bytes: &'a [u8] = self.bytes;
        let slice = &bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}
