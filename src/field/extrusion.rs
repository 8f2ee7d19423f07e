//! Implicit field of a polyline extruded along the Z axis
//!
//! Every segment of the polyline sweeps a plane parallel to Z. The field
//! value at a point is its signed distance to the segment plane that is
//! closest to zero; the gradient is that plane's unit normal.

use std::cell::Ref;

use tracing::debug;

use super::implicit::{FieldSample, ImplicitFunction};
use crate::domain::{Polyline, SharedPolyline};
use crate::error::{PlotError, Result};
use crate::geometry::VersionedCache;
use crate::{Point3, Vector3};

/// Normals shorter than this are treated as degenerate segments
const MIN_NORMAL_LENGTH: f64 = 1e-12;

/// Direction every segment is swept along
pub fn extrusion_axis() -> Vector3 {
    Vector3::z()
}

/// Scalar field generated by extruding a polyline along Z
///
/// The field reads its polyline through a shared handle and caches one
/// normal per segment, keyed by the polyline revision. Instances are not
/// `Send`; use one per thread.
#[derive(Debug)]
pub struct ExtrusionField {
    polyline: SharedPolyline,
    normals: VersionedCache<Vec<Vector3>>,
}

impl ExtrusionField {
    pub fn new(polyline: SharedPolyline) -> Self {
        Self {
            polyline,
            normals: VersionedCache::new(),
        }
    }

    /// Rebind to another polyline, dropping the cached normals
    pub fn set_polyline(&mut self, polyline: SharedPolyline) {
        self.polyline = polyline;
        self.normals.invalidate();
    }

    /// Whether the next evaluation has to recompute the segment normals
    ///
    /// A polyline that is currently being edited counts as stale.
    pub fn is_stale(&self) -> bool {
        read(&self.polyline).map_or(true, |polyline| self.normals.is_stale(&*polyline))
    }

    /// Per-segment unit normals, recomputed if the polyline changed
    pub fn segment_normals(&mut self) -> Result<&[Vector3]> {
        self.ensure_fresh()
    }

    /// Evaluate value and gradient at `point`
    pub fn evaluate(&mut self, point: &Point3) -> Result<FieldSample> {
        let handle = self.polyline.clone();
        let polyline = read(&handle)?;
        if polyline.len() < 2 {
            return Err(PlotError::DegenerateInput(format!(
                "extrusion field needs at least 2 polyline points, got {}",
                polyline.len()
            )));
        }

        let normals = self.ensure_fresh()?;
        let points = polyline.points();

        let mut best: Option<(usize, f64)> = None;
        for (i, normal) in normals.iter().enumerate() {
            if normal.norm_squared() < MIN_NORMAL_LENGTH {
                continue;
            }
            let distance = normal.dot(&(point - points[i]));
            if best.is_none_or(|(_, d)| distance.abs() < d.abs()) {
                best = Some((i, distance));
            }
        }

        let (segment, value) = best.ok_or_else(|| {
            PlotError::DegenerateInput(
                "every polyline segment is parallel to the extrusion axis".to_string(),
            )
        })?;

        Ok(FieldSample::new(
            value,
            normals[segment],
            segment,
            polyline.rev(),
        ))
    }

    /// Evaluate value and gradient together
    pub fn evaluate_with_gradient(&mut self, point: &Point3) -> Result<(f64, Vector3)> {
        let sample = self.evaluate(point)?;
        Ok((sample.value(), sample.gradient()))
    }

    /// Gradient carried by an earlier sample
    ///
    /// Fails if the polyline has been modified since the sample was taken,
    /// since the winning segment may no longer exist or point the same way.
    pub fn gradient(&self, sample: &FieldSample) -> Result<Vector3> {
        let rev = read(&self.polyline)?.rev();
        if sample.rev() != rev {
            return Err(PlotError::StaleQuery(format!(
                "sample taken at polyline revision {}, polyline is now at {}",
                sample.rev(),
                rev
            )));
        }
        Ok(sample.gradient())
    }

    fn ensure_fresh(&mut self) -> Result<&[Vector3]> {
        let polyline = read(&self.polyline)?;
        Ok(self.normals.get_or_update(&*polyline, compute_normals))
    }
}

fn read(handle: &SharedPolyline) -> Result<Ref<'_, Polyline>> {
    handle.try_borrow().map_err(|_| {
        PlotError::StaleQuery("polyline is borrowed for editing".to_string())
    })
}

impl ImplicitFunction for ExtrusionField {
    fn sample(&mut self, point: &Point3) -> Result<FieldSample> {
        self.evaluate(point)
    }
}

/// One unit normal per segment: `normalize(direction x axis)`
///
/// Segments with no extent across the axis get a zero normal.
fn compute_normals(polyline: &Polyline) -> Vec<Vector3> {
    let axis = extrusion_axis();
    let normals: Vec<Vector3> = polyline
        .points()
        .windows(2)
        .map(|pair| {
            let normal = (pair[1] - pair[0]).cross(&axis);
            normal.try_normalize(MIN_NORMAL_LENGTH).unwrap_or_else(Vector3::zeros)
        })
        .collect();

    debug!(
        rev = polyline.rev(),
        segments = normals.len(),
        "recomputed extrusion normals"
    );
    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn shared(points: &[[f64; 3]]) -> SharedPolyline {
        Polyline::from_points(points.iter().map(|p| Point3::from(*p)).collect()).into_shared()
    }

    #[test]
    fn test_single_segment_is_a_plane() {
        let mut field = ExtrusionField::new(shared(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]));

        // direction +X crossed with +Z is -Y
        let sample = field.evaluate(&Point3::new(0.3, 2.0, 5.0)).unwrap();
        assert_relative_eq!(sample.value(), -2.0);
        assert_relative_eq!(sample.gradient(), Vector3::new(0.0, -1.0, 0.0));

        // Any point on the plane, at any height, evaluates to zero.
        let on_plane = field.evaluate(&Point3::new(7.0, 0.0, -3.0)).unwrap();
        assert_relative_eq!(on_plane.value(), 0.0);
    }

    #[test]
    fn test_normals_match_segments() {
        let mut field = ExtrusionField::new(shared(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 2.0],
        ]));
        let normals = field.segment_normals().unwrap().to_vec();
        assert_eq!(normals.len(), 2);
        assert_relative_eq!(normals[0], Vector3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(normals[1], Vector3::new(1.0, 0.0, 0.0));
        for n in &normals {
            assert_relative_eq!(n.norm(), 1.0);
        }
    }

    #[test]
    fn test_too_few_points() {
        let mut field = ExtrusionField::new(shared(&[[0.0, 0.0, 0.0]]));
        let err = field.evaluate(&Point3::origin()).unwrap_err();
        assert!(matches!(err, PlotError::DegenerateInput(_)));

        let mut empty = ExtrusionField::new(Polyline::new().into_shared());
        assert!(empty.evaluate(&Point3::origin()).is_err());
        assert!(empty.segment_normals().unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_segment_is_skipped() {
        // Second segment repeats a point; third is vertical in Z only.
        let mut field = ExtrusionField::new(shared(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 4.0],
        ]));
        let normals = field.segment_normals().unwrap().to_vec();
        assert_eq!(normals.len(), 3);
        assert_eq!(normals[1], Vector3::zeros());
        assert_eq!(normals[2], Vector3::zeros());

        let sample = field.evaluate(&Point3::new(0.5, 1.0, 0.0)).unwrap();
        assert_eq!(sample.segment(), 0);
        assert_relative_eq!(sample.value(), -1.0);
    }

    #[test]
    fn test_all_segments_degenerate() {
        let mut field =
            ExtrusionField::new(shared(&[[1.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 3.0]]));
        let err = field.evaluate(&Point3::origin()).unwrap_err();
        assert!(matches!(err, PlotError::DegenerateInput(_)));
    }

    #[test]
    fn test_picks_plane_closest_to_zero() {
        // An L: along +X then along +Y.
        let mut field = ExtrusionField::new(shared(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
        ]));

        // 0.5 from the second plane (x = 4), 3 from the first (y = 0).
        let sample = field.evaluate(&Point3::new(3.5, 3.0, 0.0)).unwrap();
        assert_eq!(sample.segment(), 1);
        assert_relative_eq!(sample.value(), -0.5);
        assert_relative_eq!(sample.gradient(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_continuous_across_shared_vertex() {
        // Two nearly collinear segments meeting at (1, 0).
        let mut field = ExtrusionField::new(shared(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.01, 0.0],
        ]));

        let eps = 1e-6;
        let left = field.evaluate(&Point3::new(1.0 - eps, 0.2, 0.0)).unwrap();
        let right = field.evaluate(&Point3::new(1.0 + eps, 0.2, 0.0)).unwrap();
        assert!((left.value() - right.value()).abs() < 1e-3);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut field = ExtrusionField::new(shared(&[
            [0.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [3.0, 3.0, 0.0],
        ]));
        let p = Point3::new(1.7, 0.4, 2.0);

        let first = field.evaluate(&p).unwrap();
        let second = field.evaluate(&p).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            field.gradient(&first).unwrap(),
            field.gradient(&second).unwrap()
        );
    }

    #[test]
    fn test_cache_follows_polyline_edits() {
        let polyline = shared(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut field = ExtrusionField::new(polyline.clone());
        assert!(field.is_stale());

        let p = Point3::new(0.5, 1.0, 0.0);
        assert_relative_eq!(field.evaluate(&p).unwrap().value(), -1.0);
        assert!(!field.is_stale());

        // Turn the segment to run along +Y.
        polyline
            .borrow_mut()
            .set_point(1, Point3::new(0.0, 1.0, 0.0));
        assert!(field.is_stale());

        let moved = field.evaluate(&Point3::new(2.0, 0.5, 0.0)).unwrap();
        assert_relative_eq!(moved.value(), 2.0);
        assert_relative_eq!(moved.gradient(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_gradient_of_stale_sample_fails() {
        let polyline = shared(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut field = ExtrusionField::new(polyline.clone());
        let sample = field.evaluate(&Point3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(field.gradient(&sample).is_ok());

        polyline.borrow_mut().push(Point3::new(1.0, 1.0, 0.0));
        let err = field.gradient(&sample).unwrap_err();
        assert!(matches!(err, PlotError::StaleQuery(_)));
    }

    #[test]
    fn test_set_polyline_invalidates() {
        let mut field = ExtrusionField::new(shared(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]));
        field.evaluate(&Point3::origin()).unwrap();
        assert!(!field.is_stale());

        // Rebinding alone marks the cache stale.
        field.set_polyline(shared(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]));
        assert!(field.is_stale());
        let (value, gradient) = field
            .evaluate_with_gradient(&Point3::new(3.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(value, 3.0);
        assert_relative_eq!(gradient, Vector3::x());
    }

    #[test]
    fn test_replacing_polyline_through_handle_recomputes() {
        let polyline = shared(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut field = ExtrusionField::new(polyline.clone());
        let before = field.evaluate(&Point3::new(3.0, 0.5, 0.0)).unwrap();
        assert_relative_eq!(before.value(), -0.5);

        *polyline.borrow_mut() =
            Polyline::from_points(vec![Point3::origin(), Point3::new(0.0, 1.0, 0.0)]);
        assert!(field.is_stale());
        assert!(matches!(
            field.gradient(&before),
            Err(PlotError::StaleQuery(_))
        ));

        let after = field.evaluate(&Point3::new(3.0, 0.5, 0.0)).unwrap();
        assert_relative_eq!(after.value(), 3.0);
        assert_relative_eq!(after.gradient(), Vector3::x());
    }

    #[test]
    fn test_evaluate_while_polyline_is_edited() {
        let polyline = shared(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut field = ExtrusionField::new(polyline.clone());
        let sample = field.evaluate(&Point3::origin()).unwrap();

        let guard = polyline.borrow_mut();
        assert!(field.is_stale());
        assert!(matches!(
            field.evaluate(&Point3::origin()),
            Err(PlotError::StaleQuery(_))
        ));
        assert!(field.segment_normals().is_err());
        assert!(field.gradient(&sample).is_err());
        drop(guard);

        assert!(field.evaluate(&Point3::origin()).is_ok());
    }
}
