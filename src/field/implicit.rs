use crate::error::Result;
use crate::{Point3, Vector3};

/// Result of evaluating an implicit field at one point
///
/// Carries the gradient alongside the value so callers never have to ask the
/// field again for state left over from a previous evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    value: f64,
    gradient: Vector3,
    segment: usize,
    rev: u64,
}

impl FieldSample {
    pub(crate) fn new(value: f64, gradient: Vector3, segment: usize, rev: u64) -> Self {
        Self {
            value,
            gradient,
            segment,
            rev,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn gradient(&self) -> Vector3 {
        self.gradient
    }

    /// Index of the segment that produced the value
    pub fn segment(&self) -> usize {
        self.segment
    }

    /// Source revision the sample was computed against
    pub fn rev(&self) -> u64 {
        self.rev
    }
}

/// A scalar function over 3D space with a gradient
pub trait ImplicitFunction {
    fn sample(&mut self, point: &Point3) -> Result<FieldSample>;

    fn value(&mut self, point: &Point3) -> Result<f64> {
        Ok(self.sample(point)?.value())
    }

    /// Sample a batch of points, stopping at the first failure
    fn sample_many(&mut self, points: &[Point3]) -> Result<Vec<FieldSample>> {
        points.iter().map(|p| self.sample(p)).collect()
    }
}
