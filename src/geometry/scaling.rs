/// Axis-aligned bounding box in display coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from a set of points
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let mut iter = points.iter();
        let &(x0, y0) = iter.next()?;
        let mut bounds = Self {
            min_x: x0,
            max_x: x0,
            min_y: y0,
            max_y: y0,
        };
        bounds.expand(iter.as_slice());
        Some(bounds)
    }

    /// Expand bounds to include another set of points
    pub fn expand(&mut self, points: &[(f64, f64)]) {
        for &(x, y) in points {
            self.min_x = self.min_x.min(x);
            self.max_x = self.max_x.max(x);
            self.min_y = self.min_y.min(y);
            self.max_y = self.max_y.max(y);
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Length of the longer side
    pub fn max_extent(&self) -> f64 {
        self.width().max(self.height())
    }
}

/// Snaps display coordinates onto an integer grid
///
/// The longer side of the bounds spans `resolution` grid units; the shorter
/// side uses the same scale so the aspect ratio is kept.
#[derive(Debug, Clone)]
pub struct Quantizer {
    /// Grid units per display unit
    scale: f64,
    min_x: f64,
    min_y: f64,
    resolution: u32,
}

impl Quantizer {
    pub fn from_bounds(bounds: &Bounds, resolution: u32) -> Self {
        let max_dim = bounds.max_extent();
        // A single point (or coincident points) collapses onto the origin.
        let scale = if max_dim > 0.0 {
            f64::from(resolution) / max_dim
        } else {
            0.0
        };

        Self {
            scale,
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            resolution,
        }
    }

    /// Quantize a display point to grid coordinates
    pub fn quantize(&self, x: f64, y: f64) -> [u32; 2] {
        [self.snap(x - self.min_x), self.snap(y - self.min_y)]
    }

    /// Grid extent covered by the given bounds
    pub fn extent(&self, bounds: &Bounds) -> [u32; 2] {
        [
            self.snap(bounds.width()),
            self.snap(bounds.height()),
        ]
    }

    fn snap(&self, offset: f64) -> u32 {
        let v = (offset * self.scale).round();
        v.clamp(0.0, f64::from(self.resolution)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let points = vec![(0.0, 0.0), (1000.0, 2000.0), (500.0, 1000.0)];
        let bounds = Bounds::from_points(&points).unwrap();

        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 1000.0);
        assert_eq!(bounds.min_y, 0.0);
        assert_eq!(bounds.max_y, 2000.0);
        assert_eq!(bounds.max_extent(), 2000.0);
    }

    #[test]
    fn test_bounds_empty() {
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_quantizer_longer_axis_spans_resolution() {
        let bounds = Bounds {
            min_x: -1.0,
            max_x: 3.0,
            min_y: 0.0,
            max_y: 2.0,
        };
        let q = Quantizer::from_bounds(&bounds, 1000);

        assert_eq!(q.quantize(-1.0, 0.0), [0, 0]);
        assert_eq!(q.quantize(3.0, 2.0), [1000, 500]);
        assert_eq!(q.quantize(1.0, 1.0), [500, 250]);
        assert_eq!(q.extent(&bounds), [1000, 500]);
    }

    #[test]
    fn test_quantizer_degenerate_bounds() {
        let bounds = Bounds::from_points(&[(4.0, 4.0)]).unwrap();
        let q = Quantizer::from_bounds(&bounds, 100);
        assert_eq!(q.quantize(4.0, 4.0), [0, 0]);
        assert_eq!(q.extent(&bounds), [0, 0]);
    }

    #[test]
    fn test_quantize_clamps_to_grid() {
        let bounds = Bounds::from_points(&[(0.0, 0.0), (7.0, 3.0)]).unwrap();
        let q = Quantizer::from_bounds(&bounds, 100);
        assert_eq!(q.quantize(-1.0, 9.0), [0, 100]);
        assert_eq!(q.quantize(3.5, 1.5), [50, 21]);
    }
}
