use std::collections::HashMap;

use crate::types::{Bp, FeatureId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// `+`
    Forward,
    /// `-`
    Reverse,
    /// `?`, stranded but unknown
    Unknown,
    /// `.`, not stranded
    Unspecified,
}

impl Strand {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            "?" => Some(Strand::Unknown),
            "." => Some(Strand::Unspecified),
            _ => None,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::Unknown => "?",
            Strand::Unspecified => ".",
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}

/// How a feature type is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Gene,
    Transcript,
    Exon,
    Cds,
    Utr,
    Other,
}

impl FeatureKind {
    pub fn from_type(feature_type: &str) -> Self {
        let ty = feature_type.to_ascii_lowercase();
        match ty.as_str() {
            "exon" => FeatureKind::Exon,
            "cds" => FeatureKind::Cds,
            "utr" | "five_prime_utr" | "three_prime_utr" => FeatureKind::Utr,
            "gene" | "pseudogene" => FeatureKind::Gene,
            "mrna" | "transcript" | "primary_transcript" => {
                FeatureKind::Transcript
            }
            _ if ty.ends_with("_gene") => FeatureKind::Gene,
            _ if ty.ends_with("rna") => FeatureKind::Transcript,
            _ => FeatureKind::Other,
        }
    }

    /// Exons, coding segments and UTRs are drawn as blocks on their
    /// parent's row, everything else as a strand arrow.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            FeatureKind::Exon | FeatureKind::Cds | FeatureKind::Utr
        )
    }
}

/// One annotation record, 1-based and inclusive: `start <= end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub seqid: String,
    pub source: String,
    pub feature_type: String,
    pub start: Bp,
    pub end: Bp,
    pub score: Option<f64>,
    pub strand: Strand,
    pub phase: Option<u8>,
    pub attributes: HashMap<String, String>,

    pub parent: Option<FeatureId>,
    pub children: Vec<FeatureId>,

    /// 1-based line number in the source text
    pub line: usize,
}

impl Feature {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("ID").filter(|id| !id.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute("Name").filter(|name| !name.is_empty())
    }

    /// The parent ID this feature asks for. GFF3 allows a comma
    /// separated list; only the first entry is linked.
    pub fn parent_id(&self) -> Option<&str> {
        let parent = self.attribute("Parent")?;
        let first = parent.split(',').next().unwrap_or_default().trim();
        (!first.is_empty()).then_some(first)
    }

    pub fn display_name(&self) -> &str {
        self.name().or_else(|| self.id()).unwrap_or("Unnamed")
    }

    pub fn length(&self) -> u64 {
        self.end.0.saturating_sub(self.start.0).saturating_add(1)
    }

    pub fn kind(&self) -> FeatureKind {
        FeatureKind::from_type(&self.feature_type)
    }

    /// `true` unless one of the two inclusive intervals ends strictly
    /// before the other begins.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        !(self.end.0 < start || end < self.start.0)
    }
}
