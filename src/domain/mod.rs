pub mod color;
pub mod mesh;
pub mod polyline;

pub use color::{Rgb, Rgba};
pub use mesh::{Cell, CellKind, Mesh};
pub use polyline::{Polyline, SharedPolyline};
