use serde::Deserialize;

use crate::{Matrix4, Point3};

/// A point mapped to the drawing plane
///
/// `depth` is the coordinate the mapping consumed; larger values are farther
/// from the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Maps world points to 2D device coordinates plus a depth
pub trait Viewport {
    fn to_display(&self, point: &Point3) -> DisplayPoint;
}

impl<F> Viewport for F
where
    F: Fn(&Point3) -> DisplayPoint,
{
    fn to_display(&self, point: &Point3) -> DisplayPoint {
        self(point)
    }
}

/// The default mapping: keep x and y, use z as depth
#[derive(Debug, Clone, Copy, Default)]
pub struct DropZ;

impl Viewport for DropZ {
    fn to_display(&self, point: &Point3) -> DisplayPoint {
        DisplayPoint {
            x: point.x,
            y: point.y,
            depth: point.z,
        }
    }
}

/// Homogeneous world-to-clip transform followed by a viewport mapping
///
/// Clip space x and y in [-1, 1] map onto `[0, width] x [0, height]`; the
/// normalized z becomes the depth.
#[derive(Debug, Clone)]
pub struct MatrixViewport {
    matrix: Matrix4,
    width: f64,
    height: f64,
}

impl MatrixViewport {
    pub fn new(matrix: Matrix4, width: f64, height: f64) -> Self {
        Self {
            matrix,
            width,
            height,
        }
    }

    /// Build from a row-major 4x4 matrix
    pub fn from_rows(rows: [[f64; 4]; 4], width: f64, height: f64) -> Self {
        let matrix = Matrix4::from_fn(|r, c| rows[r][c]);
        Self::new(matrix, width, height)
    }

    /// Orthographic view from `eye` towards `target`
    ///
    /// `half_extent` is half the world-space size visible along each screen
    /// axis; `near`/`far` bound the depth range.
    pub fn orthographic(
        eye: &Point3,
        target: &Point3,
        up: &crate::Vector3,
        half_extent: f64,
        near: f64,
        far: f64,
        size: (f64, f64),
    ) -> Self {
        let view = Matrix4::look_at_rh(eye, target, up);
        let aspect = size.0 / size.1;
        let projection = Matrix4::new_orthographic(
            -half_extent * aspect,
            half_extent * aspect,
            -half_extent,
            half_extent,
            near,
            far,
        );
        Self::new(projection * view, size.0, size.1)
    }
}

impl Viewport for MatrixViewport {
    fn to_display(&self, point: &Point3) -> DisplayPoint {
        let clip = self.matrix * point.to_homogeneous();
        let w = if clip.w.abs() > 1e-12 { clip.w } else { 1.0 };

        let ndc_x = clip.x / w;
        let ndc_y = clip.y / w;
        let ndc_z = clip.z / w;

        DisplayPoint {
            x: (ndc_x + 1.0) * 0.5 * self.width,
            y: (ndc_y + 1.0) * 0.5 * self.height,
            depth: ndc_z,
        }
    }
}

/// Serialized form of a [`MatrixViewport`]
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportSpec {
    /// Row-major world-to-clip matrix
    pub matrix: [[f64; 4]; 4],
    pub width: f64,
    pub height: f64,
}

impl From<ViewportSpec> for MatrixViewport {
    fn from(spec: ViewportSpec) -> Self {
        MatrixViewport::from_rows(spec.matrix, spec.width, spec.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector3;
    use approx::assert_relative_eq;

    #[test]
    fn test_drop_z() {
        let p = DropZ.to_display(&Point3::new(1.0, 2.0, 3.0));
        assert_eq!(
            p,
            DisplayPoint {
                x: 1.0,
                y: 2.0,
                depth: 3.0
            }
        );
    }

    #[test]
    fn test_identity_matrix_viewport() {
        let vp = MatrixViewport::new(Matrix4::identity(), 200.0, 100.0);
        let p = vp.to_display(&Point3::new(0.0, 1.0, 0.25));
        assert_relative_eq!(p.x, 100.0);
        assert_relative_eq!(p.y, 100.0);
        assert_relative_eq!(p.depth, 0.25);
    }

    #[test]
    fn test_orthographic_depth_grows_away_from_eye() {
        let vp = MatrixViewport::orthographic(
            &Point3::new(0.0, 0.0, 10.0),
            &Point3::origin(),
            &Vector3::y(),
            5.0,
            1.0,
            20.0,
            (100.0, 100.0),
        );
        let near = vp.to_display(&Point3::new(0.0, 0.0, 2.0));
        let far = vp.to_display(&Point3::new(0.0, 0.0, -2.0));
        assert!(far.depth > near.depth);
        assert_relative_eq!(near.x, 50.0, epsilon = 1e-9);
        assert_relative_eq!(near.y, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_closure_viewport() {
        let swap = |p: &Point3| DisplayPoint {
            x: p.y,
            y: p.x,
            depth: -p.z,
        };
        let p = swap.to_display(&Point3::new(1.0, 2.0, 3.0));
        assert_eq!(p.x, 2.0);
        assert_eq!(p.depth, -3.0);
    }

    #[test]
    fn test_spec_from_rows() {
        let spec: ViewportSpec = serde_json::from_str(
            r#"{"matrix": [[1,0,0,2],[0,1,0,0],[0,0,1,0],[0,0,0,1]], "width": 2, "height": 2}"#,
        )
        .unwrap();
        let vp = MatrixViewport::from(spec);
        // Translation of +2 in clip x lands outside [-1, 1]; still mapped linearly.
        let p = vp.to_display(&Point3::origin());
        assert_relative_eq!(p.x, 3.0);
    }
}
