use std::collections::HashMap;

use iset::IntervalMap;

use crate::annotations::ParseResult;
use crate::types::FeatureId;

/// A horizontal lane holding root features that do not overlap each
/// other.
#[derive(Debug, Clone)]
pub struct Track {
    features: Vec<FeatureId>,
    // half-open `start..end + 1` spans of `features`
    occupied: IntervalMap<u64, FeatureId>,
}

impl Track {
    fn new() -> Self {
        Self {
            features: Vec::new(),
            occupied: IntervalMap::new(),
        }
    }

    /// Roots in this lane, in the order they were placed.
    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `true` if any feature in the lane overlaps the inclusive span
    /// `start..=end`.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.occupied.iter(span(start, end)).next().is_some()
    }

    fn push(&mut self, id: FeatureId, start: u64, end: u64) {
        self.occupied.insert(span(start, end), id);
        self.features.push(id);
    }
}

fn span(start: u64, end: u64) -> std::ops::Range<u64> {
    start..end.saturating_add(1)
}

/// Lane assignment for the root features of a [`ParseResult`].
///
/// Roots are placed greedily in file order into the first lane where
/// they fit, so the lane count is an upper bound on the minimum
/// rather than the minimum itself. Descendants are drawn in their
/// root's lane.
#[derive(Debug, Clone, Default)]
pub struct TrackLayout {
    tracks: Vec<Track>,
    root_lanes: HashMap<FeatureId, usize>,
}

impl TrackLayout {
    pub fn build(result: &ParseResult) -> Self {
        let mut tracks: Vec<Track> = Vec::new();
        let mut root_lanes = HashMap::new();

        for (id, feature) in result.root_features() {
            let (start, end) = (feature.start.0, feature.end.0);

            let lane = match tracks.iter().position(|t| !t.overlaps(start, end))
            {
                Some(lane) => lane,
                None => {
                    tracks.push(Track::new());
                    tracks.len() - 1
                }
            };

            tracks[lane].push(id, start, end);
            root_lanes.insert(id, lane);
        }

        log::debug!(
            "{}: {} roots in {} lanes",
            result.name,
            root_lanes.len(),
            tracks.len()
        );

        Self { tracks, root_lanes }
    }

    pub fn lanes(&self) -> &[Track] {
        &self.tracks
    }

    pub fn lane_count(&self) -> usize {
        self.tracks.len()
    }

    /// The lane `id` is drawn in; descendants resolve to their root's
    /// lane.
    pub fn lane_of(&self, result: &ParseResult, id: FeatureId) -> Option<usize> {
        let root = result.root_of(id);
        self.root_lanes.get(&root).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::parse_annotations;
    use crate::annotations::tests::BRCA1;

    fn roots(spans: &[(u64, u64)]) -> ParseResult {
        let text = spans
            .iter()
            .enumerate()
            .map(|(i, (s, e))| format!("chr1\t.\tgene\t{s}\t{e}\t.\t+\t.\tID=g{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        parse_annotations(&text, "t.gff").unwrap()
    }

    fn lane_ids(layout: &TrackLayout) -> Vec<Vec<usize>> {
        layout
            .lanes()
            .iter()
            .map(|t| t.features().iter().map(|id| id.ix()).collect())
            .collect()
    }

    #[test]
    fn brca1_single_lane() {
        let result = parse_annotations(BRCA1, "brca1.gff3").unwrap();
        let layout = TrackLayout::build(&result);

        assert_eq!(layout.lane_count(), 1);
        assert_eq!(layout.lanes()[0].features(), &[FeatureId(0)]);
        // exon002 is drawn in the gene's lane
        assert_eq!(layout.lane_of(&result, FeatureId(3)), Some(0));
    }

    #[test]
    fn first_fit_in_file_order() {
        let result = roots(&[(1, 100), (50, 150), (101, 200), (120, 130)]);
        let layout = TrackLayout::build(&result);

        assert_eq!(lane_ids(&layout), vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[test]
    fn touching_intervals_overlap() {
        // [1,100] and [100,200] share base 100
        let result = roots(&[(1, 100), (100, 200), (201, 300)]);
        let layout = TrackLayout::build(&result);

        assert_eq!(lane_ids(&layout), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn greedy_is_not_optimal() {
        // no point is covered more than twice, but file order needs
        // three lanes
        let result = roots(&[(1, 2), (4, 5), (2, 3), (5, 6), (3, 4)]);
        let layout = TrackLayout::build(&result);

        assert_eq!(lane_ids(&layout), vec![vec![0, 1], vec![2, 3], vec![4]]);
    }
}
