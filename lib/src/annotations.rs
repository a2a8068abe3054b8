use std::collections::BTreeSet;

use bimap::BiMap;

use crate::types::{Extent, FeatureId};

pub mod attributes;
pub mod error;
pub mod hierarchy;
pub mod parser;
pub mod record;

pub use error::{FormatError, Issue, IssueKind, ParseError};
pub use record::{Feature, FeatureKind, Strand};

use error::REPORTED_LINE_ERRORS;

/// GFF3 directive after which the file only holds sequence data.
const FASTA_DIRECTIVE: &str = "##FASTA";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines in the annotation section, including blank and comment
    /// lines.
    pub lines: usize,
    pub total_features: usize,
    pub root_features: usize,
    /// Dropped lines.
    pub error_count: usize,
    /// Unresolved or cyclic parent references.
    pub warning_count: usize,
}

/// A parsed annotation file. Immutable once built; features are
/// stored in file order and linked by [`FeatureId`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub name: String,
    pub features: Vec<Feature>,
    pub roots: Vec<FeatureId>,
    pub feature_by_id: BiMap<String, FeatureId>,
    pub extent: Extent,
    pub sequences: BTreeSet<String>,
    pub feature_types: BTreeSet<String>,
    pub issues: Vec<Issue>,
    pub stats: ParseStats,
}

/// The name of an annotation set is the file stem of its path.
fn annotation_set_name(file_path: impl AsRef<std::path::Path>) -> String {
    let path = file_path.as_ref();
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Parses a whole annotation file held in memory.
///
/// Every line is parsed independently; lines that fail are kept as
/// issues. If strictly more than 10% of the lines fail, the whole
/// file is rejected with [`ParseError::Malformed`]. A file that parses
/// but holds no features is rejected with [`ParseError::EmptyResult`].
pub fn parse_annotations(
    text: &str,
    file_name: &str,
) -> Result<ParseResult, ParseError> {
    let source_lines = text.lines().collect::<Vec<_>>();

    let mut features = Vec::new();
    let mut line_errors = Vec::new();
    let mut lines = 0;

    for (ix, &line) in source_lines.iter().enumerate() {
        if line.starts_with(FASTA_DIRECTIVE) {
            log::debug!("{file_name}: sequence section starts at line {}", ix + 1);
            break;
        }
        lines += 1;

        match parser::parse_line(line, ix + 1) {
            Ok(Some(feature)) => features.push(feature),
            Ok(None) => (),
            Err(err) => {
                log::debug!("{file_name}: {err}");
                line_errors.push(Issue::from_format_error(&err, line));
            }
        }
    }

    if line_errors.len() * 10 > lines {
        let failed = line_errors.len();
        let remaining = failed.saturating_sub(REPORTED_LINE_ERRORS);
        line_errors.truncate(REPORTED_LINE_ERRORS);
        return Err(ParseError::Malformed {
            failed,
            total: lines,
            first: line_errors,
            remaining,
        });
    }

    if features.is_empty() {
        return Err(ParseError::EmptyResult);
    }

    let hierarchy = hierarchy::build_hierarchy(&mut features, &source_lines);

    let extent =
        Extent::covering(features.iter().map(|f| (f.start.0, f.end.0)));
    let sequences = features.iter().map(|f| f.seqid.clone()).collect();
    let feature_types =
        features.iter().map(|f| f.feature_type.clone()).collect();

    let stats = ParseStats {
        lines,
        total_features: features.len(),
        root_features: hierarchy.roots.len(),
        error_count: line_errors.len(),
        warning_count: hierarchy.warnings.len(),
    };

    let mut issues = line_errors;
    issues.extend(hierarchy.warnings);
    issues.sort_by_key(|issue| issue.line);

    if !issues.is_empty() {
        log::warn!(
            "{file_name}: {} lines skipped, {} parent references unresolved",
            stats.error_count,
            stats.warning_count
        );
    }

    log::info!(
        "{file_name}: {} features, {} roots, extent {}..={}",
        stats.total_features,
        stats.root_features,
        extent.start,
        extent.end
    );

    Ok(ParseResult {
        name: annotation_set_name(file_name),
        features,
        roots: hierarchy.roots,
        feature_by_id: hierarchy.feature_by_id,
        extent,
        sequences,
        feature_types,
        issues,
        stats,
    })
}

impl ParseResult {
    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.ix())
    }

    pub fn get_by_id(&self, id: &str) -> Option<(FeatureId, &Feature)> {
        let fid = *self.feature_by_id.get_by_left(id)?;
        Some((fid, &self.features[fid.ix()]))
    }

    pub fn parent(&self, id: FeatureId) -> Option<FeatureId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: FeatureId) -> &[FeatureId] {
        self.get(id).map(|f| f.children.as_slice()).unwrap_or(&[])
    }

    pub fn root_features(&self) -> impl Iterator<Item = (FeatureId, &Feature)> {
        self.roots.iter().map(|&id| (id, &self.features[id.ix()]))
    }

    /// Number of ancestors of `id`; roots have depth 0.
    pub fn depth(&self, id: FeatureId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    pub fn root_of(&self, id: FeatureId) -> FeatureId {
        let mut cur = id;
        while let Some(p) = self.parent(cur) {
            cur = p;
        }
        cur
    }

    /// All features below `id`, pre-order, children in file order.
    /// `id` itself is not included.
    pub fn descendants(&self, id: FeatureId) -> Vec<FeatureId> {
        let mut out = Vec::new();
        let mut stack = self.children(id).iter().rev().copied().collect::<Vec<_>>();

        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }

        out
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_error())
    }
}
