use bimap::BiMap;

use crate::types::FeatureId;

use super::error::{Issue, IssueKind};
use super::record::Feature;

/// The result of linking a flat feature list into trees.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub roots: Vec<FeatureId>,
    pub feature_by_id: BiMap<String, FeatureId>,
    /// Unresolved and cyclic parent references, in file order.
    pub warnings: Vec<Issue>,
}

/// Links `features` in place through their `ID` and `Parent`
/// attributes, setting `parent` and filling `children` in file order.
/// `lines` holds the source text, line `n` at index `n - 1`.
///
/// Features are indexed by `ID` before any link is resolved, so a
/// child may precede its parent in the file. A repeated `ID` points
/// the index at the later feature. A `Parent` that cannot be resolved,
/// or that would make a feature its own ancestor, leaves the feature
/// as a root and is reported in [`Hierarchy::warnings`].
pub fn build_hierarchy(features: &mut [Feature], lines: &[&str]) -> Hierarchy {
    let mut feature_by_id: BiMap<String, FeatureId> = BiMap::new();

    for (ix, feature) in features.iter().enumerate() {
        if let Some(id) = feature.id() {
            let overwritten =
                feature_by_id.insert(id.to_string(), FeatureId(ix));
            if overwritten.did_overwrite() {
                log::debug!(
                    "line {}: duplicate ID `{id}` replaces an earlier feature",
                    feature.line
                );
            }
        }
    }

    let mut roots = Vec::new();
    let mut warnings = Vec::new();
    let mut forest = Forest::new(features.len());

    for ix in 0..features.len() {
        let child = FeatureId(ix);

        let Some(parent_id) = features[ix].parent_id() else {
            roots.push(child);
            continue;
        };

        let line = features[ix].line;
        let source_line = line
            .checked_sub(1)
            .and_then(|i| lines.get(i))
            .copied()
            .unwrap_or_default();

        let Some(&parent) = feature_by_id.get_by_left(parent_id) else {
            log::warn!("line {line}: parent `{parent_id}` not found");
            warnings.push(Issue::new(
                line,
                IssueKind::UnresolvedParent,
                format!("line {line}: parent `{parent_id}` not found; shown as a top-level feature"),
                source_line,
            ));
            roots.push(child);
            continue;
        };

        // `child` has not been linked yet, so it is the root of its own
        // tree; linking closes a loop iff `parent` is in that tree
        let parent_root = forest.find(parent.ix());
        if parent_root == ix {
            log::warn!("line {line}: parent `{parent_id}` would form a cycle");
            warnings.push(Issue::new(
                line,
                IssueKind::CyclicParent,
                format!("line {line}: parent `{parent_id}` would make the feature its own ancestor; shown as a top-level feature"),
                source_line,
            ));
            roots.push(child);
            continue;
        }

        forest.attach(ix, parent_root);
        features[ix].parent = Some(parent);
        features[parent.ix()].children.push(child);
    }

    Hierarchy {
        roots,
        feature_by_id,
        warnings,
    }
}

/// Disjoint-set forest over feature indices, tracking the current root
/// of the tree each feature belongs to while links are added.
struct Forest {
    up: Vec<usize>,
}

impl Forest {
    fn new(len: usize) -> Self {
        Self {
            up: (0..len).collect(),
        }
    }

    fn find(&mut self, ix: usize) -> usize {
        let mut root = ix;
        while self.up[root] != root {
            root = self.up[root];
        }

        let mut cur = ix;
        while self.up[cur] != root {
            let next = self.up[cur];
            self.up[cur] = root;
            cur = next;
        }

        root
    }

    /// `child` must be a tree root.
    fn attach(&mut self, child: usize, root: usize) {
        self.up[child] = root;
    }
}
