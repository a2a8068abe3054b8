/// Largest coordinate accepted from a file. Leaves room for the
/// exclusive end `end + 1` as an `i64`.
pub const MAX_COORDINATE: u64 = i64::MAX as u64 - 1;

/// A base-pair coordinate. Annotation coordinates are 1-based and
/// inclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bp(pub u64);

/// Index of a feature in the feature arena of a
/// [`ParseResult`](crate::annotations::ParseResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub usize);

impl FeatureId {
    #[inline]
    pub fn ix(&self) -> usize {
        self.0
    }
}

impl From<usize> for FeatureId {
    fn from(u: usize) -> FeatureId {
        FeatureId(u)
    }
}

impl From<FeatureId> for usize {
    fn from(id: FeatureId) -> usize {
        id.0
    }
}

impl From<u64> for Bp {
    fn from(u: u64) -> Bp {
        Bp(u)
    }
}

impl From<Bp> for u64 {
    fn from(bp: Bp) -> u64 {
        bp.0
    }
}

impl std::fmt::Display for Bp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The covered region of a set of features, `start..=end`. An empty
/// set has the extent `0..=0`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    pub start: Bp,
    pub end: Bp,
}

impl Extent {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start: Bp(start),
            end: Bp(end),
        }
    }

    /// Number of base pairs covered, counting both ends.
    pub fn len(&self) -> u64 {
        self.end.0.saturating_sub(self.start.0).saturating_add(1)
    }

    /// The smallest extent covering all `(start, end)` spans, or the
    /// empty extent if there are none.
    pub fn covering(spans: impl IntoIterator<Item = (u64, u64)>) -> Self {
        spans
            .into_iter()
            .fold(None, |acc: Option<(u64, u64)>, (s, e)| match acc {
                None => Some((s, e)),
                Some((l, r)) => Some((l.min(s), r.max(e))),
            })
            .map(|(s, e)| Self::new(s, e))
            .unwrap_or_default()
    }
}
