use serde::Deserialize;

use super::color::Rgba;
use crate::Point3;

/// Topology of a mesh cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Vertex,
    Line,
    Polygon,
    TriangleStrip,
}

impl CellKind {
    /// Minimum number of point indices a cell of this kind needs
    pub fn min_points(self) -> usize {
        match self {
            CellKind::Vertex => 1,
            CellKind::Line => 2,
            CellKind::Polygon | CellKind::TriangleStrip => 3,
        }
    }
}

/// An ordered list of point indices with an optional color
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cell {
    pub indices: Vec<usize>,
    #[serde(default)]
    pub color: Option<Rgba>,
}

impl Cell {
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }
}

/// A polygonal mesh: shared points plus vertex, line, polygon and strip cells
///
/// Cells are traversed in a fixed order (vertices, lines, polygons, strips),
/// which is the order export tie-breaking refers to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mesh {
    pub points: Vec<Point3>,
    #[serde(default)]
    pub verts: Vec<Cell>,
    #[serde(default)]
    pub lines: Vec<Cell>,
    #[serde(default)]
    pub polys: Vec<Cell>,
    #[serde(default)]
    pub strips: Vec<Cell>,
}

impl Mesh {
    pub fn new(points: Vec<Point3>) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }

    /// Append a cell to the list for its kind
    pub fn push_cell(&mut self, kind: CellKind, cell: Cell) {
        match kind {
            CellKind::Vertex => self.verts.push(cell),
            CellKind::Line => self.lines.push(cell),
            CellKind::Polygon => self.polys.push(cell),
            CellKind::TriangleStrip => self.strips.push(cell),
        }
    }

    pub fn with_cell(mut self, kind: CellKind, cell: Cell) -> Self {
        self.push_cell(kind, cell);
        self
    }

    /// All cells in mesh order, tagged with their kind
    pub fn cells(&self) -> impl Iterator<Item = (CellKind, &Cell)> {
        self.verts
            .iter()
            .map(|c| (CellKind::Vertex, c))
            .chain(self.lines.iter().map(|c| (CellKind::Line, c)))
            .chain(self.polys.iter().map(|c| (CellKind::Polygon, c)))
            .chain(self.strips.iter().map(|c| (CellKind::TriangleStrip, c)))
    }

    pub fn cell_count(&self) -> usize {
        self.verts.len() + self.lines.len() + self.polys.len() + self.strips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}
