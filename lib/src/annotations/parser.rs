use crate::types::{Bp, MAX_COORDINATE};

use super::attributes::parse_attributes;
use super::error::FormatError;
use super::record::{Feature, Strand};

pub const COLUMN_COUNT: usize = 9;

/// Parses one record line. `line_no` is 1-based and only used for
/// diagnostics.
///
/// Returns `Ok(None)` for blank lines and `#` comment or directive
/// lines.
pub fn parse_line(
    line: &str,
    line_no: usize,
) -> Result<Option<Feature>, FormatError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields = line.split('\t').collect::<Vec<_>>();

    let [seqid, source, feature_type, start, end, score, strand, phase, attributes] =
        fields[..]
    else {
        return Err(FormatError::ColumnCount {
            line: line_no,
            found: fields.len(),
        });
    };

    let start = parse_coordinate(start, "start", line_no)?;
    let end = parse_coordinate(end, "end", line_no)?;

    if start > end {
        return Err(FormatError::CoordinateOrder {
            line: line_no,
            start,
            end,
        });
    }

    let strand =
        Strand::from_token(strand).ok_or_else(|| FormatError::Strand {
            line: line_no,
            value: strand.to_string(),
        })?;

    let score = match score {
        "." => None,
        s => Some(s.trim().parse::<f64>().map_err(|_| FormatError::Score {
            line: line_no,
            value: s.to_string(),
        })?),
    };

    let phase = match phase {
        "." => None,
        p => Some(p.trim().parse::<u8>().map_err(|_| FormatError::Phase {
            line: line_no,
            value: p.to_string(),
        })?),
    };

    Ok(Some(Feature {
        seqid: seqid.to_string(),
        source: source.to_string(),
        feature_type: feature_type.to_string(),
        start: Bp(start),
        end: Bp(end),
        score,
        strand,
        phase,
        attributes: parse_attributes(attributes),
        parent: None,
        children: Vec::new(),
        line: line_no,
    }))
}

fn parse_coordinate(
    field: &str,
    column: &'static str,
    line_no: usize,
) -> Result<u64, FormatError> {
    let value = btoi::btou::<u64>(field.trim().as_bytes()).map_err(|_| {
        FormatError::CoordinateType {
            line: line_no,
            column,
            value: field.to_string(),
        }
    })?;

    if value == 0 || value > MAX_COORDINATE {
        return Err(FormatError::CoordinateRange {
            line: line_no,
            column,
            value,
        });
    }

    Ok(value)
}
