pub mod extrusion;
pub mod implicit;

pub use extrusion::{ExtrusionField, extrusion_axis};
pub use implicit::{FieldSample, ImplicitFunction};
