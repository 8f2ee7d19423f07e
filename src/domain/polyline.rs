use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Point3;
use crate::geometry::Versioned;

/// Handle through which a polyline is shared between its owner and the fields reading it
pub type SharedPolyline = Rc<RefCell<Polyline>>;

static NEXT_REV: AtomicU64 = AtomicU64::new(1);

/// Process-wide revision stamp; never repeats
fn next_rev() -> u64 {
    NEXT_REV.fetch_add(1, Ordering::Relaxed)
}

/// An ordered sequence of 3D points with a modification stamp
///
/// Every new polyline and every mutation takes a fresh `rev` from one
/// process-wide counter, so readers holding derived data can tell when it
/// no longer matches the points, even if the whole value was replaced.
#[derive(Debug, Clone, Deserialize)]
pub struct Polyline {
    points: Vec<Point3>,
    #[serde(skip, default = "next_rev")]
    rev: u64,
}

impl Default for Polyline {
    fn default() -> Self {
        Self::from_points(Vec::new())
    }
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point3>) -> Self {
        Self {
            points,
            rev: next_rev(),
        }
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedPolyline {
        Rc::new(RefCell::new(self))
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of segments between consecutive points
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn push(&mut self, point: Point3) {
        self.points.push(point);
        self.touch();
    }

    pub fn insert(&mut self, index: usize, point: Point3) {
        self.points.insert(index, point);
        self.touch();
    }

    /// Remove the point at `index`, returning it if it existed
    pub fn remove(&mut self, index: usize) -> Option<Point3> {
        if index >= self.points.len() {
            return None;
        }
        let point = self.points.remove(index);
        self.touch();
        Some(point)
    }

    /// Move the point at `index`; returns false if out of range
    pub fn set_point(&mut self, index: usize, point: Point3) -> bool {
        match self.points.get_mut(index) {
            Some(slot) => {
                *slot = point;
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.rev = next_rev();
    }
}

impl Versioned for Polyline {
    fn version(&self) -> u64 {
        self.rev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutations_bump_rev() {
        let mut pl = Polyline::new();
        let mut last = pl.rev();

        let mut assert_bumped = |pl: &Polyline| {
            assert!(pl.rev() > last, "rev {} not past {}", pl.rev(), last);
            last = pl.rev();
        };

        pl.push(Point3::new(0.0, 0.0, 0.0));
        assert_bumped(&pl);
        pl.push(Point3::new(1.0, 0.0, 0.0));
        assert_bumped(&pl);

        pl.insert(1, Point3::new(0.5, 1.0, 0.0));
        assert_bumped(&pl);

        assert!(pl.set_point(0, Point3::new(-1.0, 0.0, 0.0)));
        assert_bumped(&pl);

        assert!(pl.remove(2).is_some());
        assert_bumped(&pl);
        assert_eq!(pl.segment_count(), 1);

        pl.clear();
        assert_bumped(&pl);
        assert!(pl.is_empty());
    }

    #[test]
    fn test_out_of_range_is_not_a_change() {
        let mut pl = Polyline::from_points(vec![Point3::origin()]);
        let rev = pl.rev();
        assert!(!pl.set_point(3, Point3::origin()));
        assert!(pl.remove(3).is_none());
        assert_eq!(pl.rev(), rev);
    }

    #[test]
    fn test_new_polylines_never_share_a_rev() {
        let a = Polyline::from_points(vec![Point3::origin()]);
        let b = Polyline::from_points(vec![Point3::origin()]);
        let c = Polyline::new();
        assert_ne!(a.rev(), b.rev());
        assert!(c.rev() > b.rev());

        // A replacement value is always newer than the one it overwrites.
        let mut slot = a.clone();
        let old = slot.rev();
        slot = Polyline::from_points(vec![Point3::new(1.0, 0.0, 0.0)]);
        assert!(slot.rev() > old);
    }

    #[test]
    fn test_deserialize() {
        let before = Polyline::new().rev();
        let pl: Polyline =
            serde_json::from_str(r#"{"points": [[0, 0, 0], [1, 2, 3]]}"#).unwrap();
        assert_eq!(pl.len(), 2);
        assert_eq!(pl.points()[1], Point3::new(1.0, 2.0, 3.0));
        assert!(pl.rev() > before);
    }
}
