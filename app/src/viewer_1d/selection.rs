use annoview_core::annotations::Strand;
use annoview_core::{Bp, Feature, FeatureId};

/// Everything shown about a single feature in the details panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPayload {
    pub id: FeatureId,
    pub name: String,
    pub length: u64,
    pub feature_type: String,
    pub seqid: String,
    pub start: Bp,
    pub end: Bp,
    pub strand: Strand,
    pub source: Option<String>,
    pub score: Option<f64>,
    pub phase: Option<u8>,
    /// All attributes, sorted by key.
    pub attributes: Vec<(String, String)>,
}

impl DisplayPayload {
    pub fn new(id: FeatureId, feature: &Feature) -> Self {
        let mut attributes = feature
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>();
        attributes.sort();

        let source = (feature.source != ".").then(|| feature.source.clone());

        Self {
            id,
            name: feature.display_name().to_string(),
            length: feature.length(),
            feature_type: feature.feature_type.clone(),
            seqid: feature.seqid.clone(),
            start: feature.start,
            end: feature.end,
            strand: feature.strand,
            source,
            score: feature.score,
            phase: feature.phase,
            attributes,
        }
    }
}

impl std::fmt::Display for DisplayPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({})", self.name, self.feature_type)?;
        writeln!(
            f,
            "  {}:{}-{} ({}) {} bp",
            self.seqid, self.start, self.end, self.strand, self.length
        )?;
        if let Some(source) = &self.source {
            writeln!(f, "  source: {source}")?;
        }
        if let Some(score) = self.score {
            writeln!(f, "  score: {score}")?;
        }
        if let Some(phase) = self.phase {
            writeln!(f, "  phase: {phase}")?;
        }
        for (key, value) in &self.attributes {
            writeln!(f, "  {key}={value}")?;
        }
        Ok(())
    }
}

/// Hovered and pinned features. The pin outlives hover changes until
/// it is dismissed or replaced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    hovered: Option<FeatureId>,
    pinned: Option<FeatureId>,
}

impl Selection {
    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    pub fn pinned(&self) -> Option<FeatureId> {
        self.pinned
    }

    /// The pinned feature if any, else the hovered one.
    pub fn current(&self) -> Option<FeatureId> {
        self.pinned.or(self.hovered)
    }

    pub fn hover(&mut self, hit: Option<FeatureId>) {
        self.hovered = hit;
    }

    /// A press pins the feature under the pointer; a press on the
    /// background clears the pin.
    pub fn press(&mut self, hit: Option<FeatureId>) {
        self.pinned = hit;
        self.hovered = hit;
    }

    pub fn leave(&mut self) {
        self.hovered = None;
    }

    pub fn dismiss_pinned(&mut self) {
        self.pinned = None;
    }
}
