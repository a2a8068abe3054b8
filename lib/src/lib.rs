//! Parsing, linking and lane layout of tab-delimited genome
//! annotations (GFF3).
//!
//! [`annotations::parse_annotations`] turns a text buffer into a
//! [`annotations::ParseResult`] with features linked into trees by
//! their `ID`/`Parent` attributes, and [`layout::TrackLayout`] assigns
//! the root features to non-overlapping lanes.

pub mod annotations;
pub mod layout;
pub mod types;

pub use annotations::{parse_annotations, Feature, ParseError, ParseResult};
pub use layout::{Track, TrackLayout};
pub use types::{Bp, Extent, FeatureId};
