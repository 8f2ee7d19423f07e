pub mod cache;
pub mod projection;
pub mod scaling;

pub use cache::{Versioned, VersionedCache};
pub use projection::{DisplayPoint, DropZ, MatrixViewport, Viewport, ViewportSpec};
pub use scaling::{Bounds, Quantizer};
