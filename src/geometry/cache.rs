//! Revision-keyed caching of derived data
//!
//! A source exposes a monotonically increasing version. The cache stores a
//! value together with the version it was computed from and recomputes only
//! when the source has moved on.

/// Anything with a modification counter
pub trait Versioned {
    fn version(&self) -> u64;
}

/// A value derived from a [`Versioned`] source
#[derive(Debug, Clone)]
pub struct VersionedCache<T> {
    entry: Option<(T, u64)>,
}

impl<T> Default for VersionedCache<T> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<T> VersionedCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cached value is missing or computed from an older version
    pub fn is_stale<S: Versioned + ?Sized>(&self, source: &S) -> bool {
        self.entry
            .as_ref()
            .is_none_or(|(_, version)| *version != source.version())
    }

    /// Return the cached value, recomputing it first if the source changed
    pub fn get_or_update<S, F>(&mut self, source: &S, compute: F) -> &T
    where
        S: Versioned + ?Sized,
        F: FnOnce(&S) -> T,
    {
        if self.is_stale(source) {
            self.entry = None;
        }
        let (value, _) = self
            .entry
            .get_or_insert_with(|| (compute(source), source.version()));
        value
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
