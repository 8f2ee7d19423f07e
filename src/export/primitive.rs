//! Decomposition of mesh cells into drawable primitives
//!
//! Triangle strips become triangles and polylines become two-point
//! segments; vertices and polygons pass through. Points are then mapped to
//! the drawing plane and snapped onto the integer grid.

use tracing::debug;

use crate::domain::{Cell, CellKind, Mesh, Rgb, Rgba};
use crate::error::{PlotError, Result};
use crate::geometry::{Bounds, DisplayPoint, DropZ, Quantizer, Viewport};

/// Drawable primitive type, as tagged in the picture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Point,
    Segment,
    Polygon,
}

impl PrimitiveKind {
    pub fn tag(self) -> u8 {
        match self {
            PrimitiveKind::Point => 0,
            PrimitiveKind::Segment => 1,
            PrimitiveKind::Polygon => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(PrimitiveKind::Point),
            1 => Some(PrimitiveKind::Segment),
            2 => Some(PrimitiveKind::Polygon),
            _ => None,
        }
    }
}

/// One drawable piece of a mesh cell
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    /// Index of the source cell in mesh order
    pub cell: usize,
    /// Quantized grid coordinates
    pub points: Vec<[u32; 2]>,
    /// Mean depth of the constituent points
    pub depth: f64,
    /// Color carried by the source cell
    pub cell_color: Option<Rgba>,
    /// Resolved color, filled in by color assignment
    pub color: Rgb,
    /// Palette slot, filled in by palette limiting
    pub color_index: u8,
}

/// Primitives of one mesh on a shared grid
#[derive(Debug, Clone)]
pub struct PrimitiveSet {
    pub primitives: Vec<Primitive>,
    /// Grid size of the picture's bounding box
    pub extent: [u32; 2],
}

/// A primitive's point indices before projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPrimitive {
    pub kind: PrimitiveKind,
    pub indices: Vec<usize>,
}

/// Split one cell into raw primitives
///
/// Strip triangles alternate winding so every triangle keeps the strip's
/// orientation: `(s0,s1,s2), (s1,s3,s2), (s2,s3,s4), ...`.
pub fn decompose_cell(kind: CellKind, cell: &Cell) -> Result<Vec<RawPrimitive>> {
    let ids = &cell.indices;
    if ids.len() < kind.min_points() {
        return Err(PlotError::InvalidConfig(format!(
            "{kind:?} cell needs at least {} points, got {}",
            kind.min_points(),
            ids.len()
        )));
    }

    let raw = match kind {
        CellKind::Vertex => ids
            .iter()
            .map(|&i| RawPrimitive {
                kind: PrimitiveKind::Point,
                indices: vec![i],
            })
            .collect(),
        CellKind::Line => ids
            .windows(2)
            .map(|pair| RawPrimitive {
                kind: PrimitiveKind::Segment,
                indices: pair.to_vec(),
            })
            .collect(),
        CellKind::Polygon => vec![RawPrimitive {
            kind: PrimitiveKind::Polygon,
            indices: ids.clone(),
        }],
        CellKind::TriangleStrip => (0..ids.len() - 2)
            .map(|j| {
                let indices = if j % 2 == 0 {
                    vec![ids[j], ids[j + 1], ids[j + 2]]
                } else {
                    vec![ids[j], ids[j + 2], ids[j + 1]]
                };
                RawPrimitive {
                    kind: PrimitiveKind::Polygon,
                    indices,
                }
            })
            .collect(),
    };
    Ok(raw)
}

/// Build the quantized primitives of `mesh`
///
/// Points go through `viewport` when given, otherwise their z is dropped and
/// used as depth.
pub fn build_primitives(
    mesh: &Mesh,
    viewport: Option<&dyn Viewport>,
    resolution: u32,
) -> Result<PrimitiveSet> {
    let viewport = viewport.unwrap_or(&DropZ);

    let mut pending: Vec<(usize, RawPrimitive, Option<Rgba>)> = Vec::new();
    for (cell_index, (kind, cell)) in mesh.cells().enumerate() {
        if let Some(&bad) = cell.indices.iter().find(|&&i| i >= mesh.points.len()) {
            return Err(PlotError::InvalidConfig(format!(
                "cell {cell_index} references point {bad}, mesh has {} points",
                mesh.points.len()
            )));
        }
        for raw in decompose_cell(kind, cell)? {
            pending.push((cell_index, raw, cell.color));
        }
    }

    if pending.is_empty() {
        return Err(PlotError::DegenerateInput(
            "mesh has no drawable primitives".to_string(),
        ));
    }

    let display: Vec<DisplayPoint> = mesh.points.iter().map(|p| viewport.to_display(p)).collect();
    let referenced = pending.iter().flat_map(|(_, raw, _)| raw.indices.iter());
    if let Some(&bad) = referenced.clone().find(|&&i| !is_finite(&display[i])) {
        return Err(PlotError::DegenerateInput(format!(
            "point {bad} maps to a non-finite display coordinate"
        )));
    }

    let used: Vec<(f64, f64)> = referenced
        .map(|&i| (display[i].x, display[i].y))
        .collect();
    let bounds = Bounds::from_points(&used).ok_or_else(|| {
        PlotError::DegenerateInput("mesh has no drawable points".to_string())
    })?;
    let quantizer = Quantizer::from_bounds(&bounds, resolution);

    let primitives: Vec<Primitive> = pending
        .into_iter()
        .map(|(cell, raw, cell_color)| {
            let points = raw
                .indices
                .iter()
                .map(|&i| quantizer.quantize(display[i].x, display[i].y))
                .collect();
            let depth = raw.indices.iter().map(|&i| display[i].depth).sum::<f64>()
                / raw.indices.len() as f64;
            Primitive {
                kind: raw.kind,
                cell,
                points,
                depth,
                cell_color,
                color: Rgb::BLACK,
                color_index: 0,
            }
        })
        .collect();

    debug!(
        cells = mesh.cell_count(),
        primitives = primitives.len(),
        width = bounds.width(),
        height = bounds.height(),
        "built primitives"
    );

    Ok(PrimitiveSet {
        primitives,
        extent: quantizer.extent(&bounds),
    })
}

fn is_finite(p: &DisplayPoint) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.depth.is_finite()
}
