use annoview_core::{Bp, ParseResult};

use super::view::ViewportState;

pub enum Msg {
    View(ViewCmd),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCmd {
    /// Fit the view to the inclusive span `range.start..=range.end`.
    GotoRange {
        seqid: Option<String>,
        range: std::ops::Range<Bp>,
    },
    Reset,
}

impl ViewCmd {
    /// Applies the command to `view`. Returns `false` if the command
    /// was rejected.
    pub fn apply(self, result: &ParseResult, view: &mut ViewportState) -> bool {
        match self {
            ViewCmd::GotoRange { seqid, range } => {
                if let Some(seqid) = seqid {
                    if !result.sequences.contains(&seqid) {
                        log::warn!("unknown sequence `{seqid}`");
                        return false;
                    }
                }

                view.goto_range(range);
            }
            ViewCmd::Reset => {
                view.reset();
            }
        }
        true
    }
}

/// Parses `[seqid:]start-end` with inclusive basepair coordinates.
/// Thousands separators (`,`) in the numbers are ignored.
pub fn parse_pos_range(text: &str) -> Option<(Option<String>, std::ops::Range<Bp>)> {
    let text = text.trim();

    let (seqid, coords) = match text.rsplit_once(':') {
        Some((seqid, coords)) => {
            let seqid = seqid.trim();
            if seqid.is_empty() {
                return None;
            }
            (Some(seqid.to_string()), coords)
        }
        None => (None, text),
    };

    let (start, end) = coords.split_once('-')?;
    let parse = |s: &str| s.trim().replace(',', "").parse::<u64>().ok();

    let start = parse(start)?;
    let end = parse(end)?;

    if start > end {
        return None;
    }

    Some((seqid, Bp(start)..Bp(end)))
}
