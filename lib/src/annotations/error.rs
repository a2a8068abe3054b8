use thiserror::Error;

/// Maximum number of line errors listed in a [`ParseError::Malformed`].
pub const REPORTED_LINE_ERRORS: usize = 5;

/// Maximum number of characters of the source line kept in an [`Issue`].
pub const ISSUE_TEXT_LEN: usize = 100;

/// A problem with a single record line. Recoverable: the line is
/// dropped and recorded as an [`Issue`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("line {line}: expected 9 tab-separated columns, found {found}")]
    ColumnCount { line: usize, found: usize },

    #[error("line {line}: {column} coordinate `{value}` is not an integer")]
    CoordinateType {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: {column} coordinate {value} is out of range (coordinates start at 1)")]
    CoordinateRange {
        line: usize,
        column: &'static str,
        value: u64,
    },

    #[error("line {line}: start {start} is greater than end {end}")]
    CoordinateOrder { line: usize, start: u64, end: u64 },

    #[error("line {line}: invalid strand `{value}` (expected '+', '-', '.' or '?')")]
    Strand { line: usize, value: String },

    #[error("line {line}: score `{value}` is not a number")]
    Score { line: usize, value: String },

    #[error("line {line}: phase `{value}` is not an integer")]
    Phase { line: usize, value: String },
}

/// Discriminant of a [`FormatError`], kept in the issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatErrorKind {
    ColumnCount,
    CoordinateType,
    CoordinateRange,
    CoordinateOrder,
    Strand,
    Score,
    Phase,
}

impl FormatError {
    pub fn line(&self) -> usize {
        match self {
            FormatError::ColumnCount { line, .. }
            | FormatError::CoordinateType { line, .. }
            | FormatError::CoordinateRange { line, .. }
            | FormatError::CoordinateOrder { line, .. }
            | FormatError::Strand { line, .. }
            | FormatError::Score { line, .. }
            | FormatError::Phase { line, .. } => *line,
        }
    }

    pub fn kind(&self) -> FormatErrorKind {
        match self {
            FormatError::ColumnCount { .. } => FormatErrorKind::ColumnCount,
            FormatError::CoordinateType { .. } => {
                FormatErrorKind::CoordinateType
            }
            FormatError::CoordinateRange { .. } => {
                FormatErrorKind::CoordinateRange
            }
            FormatError::CoordinateOrder { .. } => {
                FormatErrorKind::CoordinateOrder
            }
            FormatError::Strand { .. } => FormatErrorKind::Strand,
            FormatError::Score { .. } => FormatErrorKind::Score,
            FormatError::Phase { .. } => FormatErrorKind::Phase,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// The line could not be parsed and was dropped.
    Format(FormatErrorKind),
    /// The `Parent` attribute names an ID that no feature carries; the
    /// feature is kept as a root.
    UnresolvedParent,
    /// Linking to the named parent would make the feature its own
    /// ancestor; the feature is kept as a root.
    CyclicParent,
}

/// One entry of the issue list of a parse: either a dropped line or a
/// hierarchy warning.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub line: usize,
    pub kind: IssueKind,
    pub message: String,
    /// The source line, truncated to [`ISSUE_TEXT_LEN`] characters.
    pub text: String,
}

impl Issue {
    pub fn new(
        line: usize,
        kind: IssueKind,
        message: impl Into<String>,
        source_line: &str,
    ) -> Self {
        Self {
            line,
            kind,
            message: message.into(),
            text: truncate_line(source_line),
        }
    }

    pub fn from_format_error(err: &FormatError, source_line: &str) -> Self {
        Self::new(
            err.line(),
            IssueKind::Format(err.kind()),
            err.to_string(),
            source_line,
        )
    }

    /// `true` for dropped lines, `false` for warnings.
    pub fn is_error(&self) -> bool {
        matches!(self.kind, IssueKind::Format(_))
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn truncate_line(line: &str) -> String {
    match line.char_indices().nth(ISSUE_TEXT_LEN) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}

/// A file-level failure. Nothing is laid out or rendered when parsing
/// returns one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{}", malformed_message(.failed, .total, .first, .remaining))]
    Malformed {
        failed: usize,
        total: usize,
        /// The first [`REPORTED_LINE_ERRORS`] line errors.
        first: Vec<Issue>,
        /// Number of line errors beyond `first`.
        remaining: usize,
    },

    #[error("no features found")]
    EmptyResult,
}

fn malformed_message(
    failed: &usize,
    total: &usize,
    first: &[Issue],
    remaining: &usize,
) -> String {
    let mut msg = format!(
        "malformed annotation file: {failed} of {total} lines could not be parsed"
    );
    for issue in first {
        msg.push_str("\n  ");
        msg.push_str(&issue.message);
    }
    if *remaining > 0 {
        msg.push_str(&format!("\n  ... and {remaining} more"));
    }
    msg
}
