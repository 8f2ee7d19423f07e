//! polyplot - Polyline extrusion fields and depth-sorted vector export of meshes

pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod field;
pub mod geometry;

pub use error::{PlotError, Result};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;
