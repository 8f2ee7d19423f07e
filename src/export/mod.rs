//! Depth-sorted export of meshes to the palette-limited picture format
//!
//! One export runs build -> color -> palette -> sort -> encode, in that
//! order. Colors are resolved before sorting so they follow cells, not
//! draw positions.

pub mod config;
pub mod decode;
pub mod encode;
pub mod palette;
pub mod primitive;

pub use config::{ColorMode, ExportConfig};
pub use decode::decode;
pub use encode::{Picture, PicturePrimitive, encode, estimate_picture_size, write_picture};
pub use palette::{ColorRng, MAX_PALETTE_SIZE, Palette, assign_colors, limit_palette};
pub use primitive::{Primitive, PrimitiveKind, PrimitiveSet, build_primitives, decompose_cell};

use std::io::Write;

use tracing::info;

use crate::domain::{Mesh, Rgb};
use crate::error::Result;
use crate::geometry::Viewport;

/// Stable sort, farthest (largest depth) first
///
/// Equal depths keep mesh order.
pub fn sort_back_to_front(primitives: &mut [Primitive]) {
    primitives.sort_by(|a, b| b.depth.total_cmp(&a.depth));
}

/// What an export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub primitives: usize,
    pub palette_size: usize,
    /// Whether requested colors were merged to fit the palette
    pub palette_reduced: bool,
    pub bytes: usize,
}

/// Projects, colors, sorts and encodes meshes
///
/// Holds only its immutable configuration and an optional viewport, so a
/// single exporter can serve any number of exports.
pub struct VectorExporter<'a> {
    config: ExportConfig,
    viewport: Option<&'a dyn Viewport>,
}

impl<'a> VectorExporter<'a> {
    /// Create an exporter, rejecting out-of-range settings
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            viewport: None,
        })
    }

    pub fn with_viewport(mut self, viewport: &'a dyn Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Run the full pipeline and return the decoded-equivalent picture
    pub fn render(&self, mesh: &Mesh) -> Result<(Picture, Palette)> {
        let PrimitiveSet {
            mut primitives,
            extent,
        } = build_primitives(mesh, self.viewport, self.config.resolution)?;

        let mut rng = self
            .config
            .random_seed
            .map_or_else(ColorRng::from_entropy, ColorRng::seeded);
        assign_colors(
            &mut primitives,
            self.config.color_mode,
            Rgb::from_unit(self.config.specified_color),
            &mut rng,
        );
        let palette = limit_palette(&mut primitives);

        if self.config.sort {
            sort_back_to_front(&mut primitives);
        }

        let picture = Picture {
            resolution: self.config.resolution,
            extent,
            palette: palette.colors.clone(),
            primitives: primitives
                .into_iter()
                .map(|p| PicturePrimitive {
                    kind: p.kind,
                    color_index: p.color_index,
                    points: p.points,
                })
                .collect(),
        };
        Ok((picture, palette))
    }

    /// Encode `mesh` into an in-memory picture stream
    pub fn export_to_vec(&self, mesh: &Mesh) -> Result<(Vec<u8>, ExportSummary)> {
        let (picture, palette) = self.render(mesh)?;
        let bytes = encode(&picture);
        let summary = ExportSummary {
            primitives: picture.primitives.len(),
            palette_size: palette.len(),
            palette_reduced: palette.reduced,
            bytes: bytes.len(),
        };
        info!(
            primitives = summary.primitives,
            palette = summary.palette_size,
            bytes = summary.bytes,
            "encoded picture"
        );
        Ok((bytes, summary))
    }

    /// Encode `mesh` and write the stream to `sink`
    ///
    /// Nothing is written unless encoding succeeded.
    pub fn export<W: Write>(&self, mesh: &Mesh, sink: &mut W) -> Result<ExportSummary> {
        let (bytes, summary) = self.export_to_vec(mesh)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(summary)
    }
}
