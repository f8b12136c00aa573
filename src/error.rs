//! Error types for tx2gen

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tx2gen operations
pub type Result<T> = std::result::Result<T, Tx2GenError>;

/// Why a CIGAR string could not be tokenized.
///
/// `offset` is the byte offset into the CIGAR string where the problem was found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CigarError {
    #[error("empty CIGAR string")]
    Empty,

    #[error("operation '{op}' at offset {offset} has no length")]
    MissingLength { op: char, offset: usize },

    #[error("length at offset {offset} is not followed by an operation")]
    DanglingLength { offset: usize },

    #[error("unknown operation '{op}' at offset {offset}")]
    UnknownOperation { op: char, offset: usize },

    #[error("zero-length operation at offset {offset}")]
    ZeroLength { offset: usize },

    #[error("operation length at offset {offset} does not fit in 32 bits")]
    LengthOverflow { offset: usize },
}

/// Structural problems with an alignment record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("alignment has no CIGAR operations")]
    EmptyTokens,

    #[error("clip operation '{op}' at token {index} is not at either end of the alignment")]
    InteriorClip { op: char, index: usize },

    #[error("negative reference start {0}")]
    NegativeStart(i64),

    #[error("strand must be '+' or '-', got '{0}'")]
    InvalidStrand(String),
}

/// Error types that can occur in tx2gen
#[derive(Debug, Error)]
pub enum Tx2GenError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CIGAR: {0}")]
    MalformedCigar(#[from] CigarError),

    #[error("invalid alignment: {0}")]
    InvalidAlignment(#[from] AlignmentError),

    /// A table line with the wrong shape or an unparsable integer column
    #[error("malformed row at line {line}: {msg}")]
    MalformedRow { line: usize, msg: String },

    #[error("position {position} out of range for transcript of length {transcript_length}")]
    PositionOutOfRange {
        position: i64,
        transcript_length: u64,
    },

    /// The projector walked every token without resolving a position that
    /// passed the range check. Always fatal.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// Missing, empty or unreadable input file
    #[error("input file {}: {reason}", .path.display())]
    InputFile { path: PathBuf, reason: String },

    #[error("failed to write summary: {0}")]
    Summary(#[from] serde_json::Error),

    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Tx2GenError {
    /// Row-level kind for errors that are reported per row, `None` for run-level errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Tx2GenError::MalformedCigar(_) => Some(ErrorKind::MalformedCigar),
            Tx2GenError::InvalidAlignment(_) => Some(ErrorKind::InvalidAlignment),
            Tx2GenError::MalformedRow { .. } => Some(ErrorKind::MalformedRow),
            Tx2GenError::PositionOutOfRange { .. } => Some(ErrorKind::PositionOutOfRange),
            _ => None,
        }
    }
}

/// Per-row error kinds, as written to the status column of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    MalformedCigar,
    InvalidAlignment,
    MalformedRow,
    TranscriptNotFound,
    PositionOutOfRange,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedCigar => "MalformedCigar",
            ErrorKind::InvalidAlignment => "InvalidAlignment",
            ErrorKind::MalformedRow => "MalformedRow",
            ErrorKind::TranscriptNotFound => "TranscriptNotFound",
            ErrorKind::PositionOutOfRange => "PositionOutOfRange",
        }
    }

    /// Kinds that make a row of an input table unusable. Any of these sets a
    /// non-zero exit status.
    pub fn is_input_defect(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedCigar | ErrorKind::InvalidAlignment | ErrorKind::MalformedRow
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_row_errors() {
        let err: Tx2GenError = CigarError::Empty.into();
        assert_eq!(err.kind(), Some(ErrorKind::MalformedCigar));

        let err: Tx2GenError = AlignmentError::NegativeStart(-4).into();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidAlignment));

        let err = Tx2GenError::PositionOutOfRange {
            position: 12,
            transcript_length: 10,
        };
        assert_eq!(err.kind(), Some(ErrorKind::PositionOutOfRange));
    }

    #[test]
    fn test_run_level_errors_have_no_kind() {
        let err = Tx2GenError::InternalInvariantViolation("walk exhausted".to_string());
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn test_error_messages() {
        let err = CigarError::UnknownOperation { op: 'P', offset: 3 };
        assert_eq!(err.to_string(), "unknown operation 'P' at offset 3");

        let err: Tx2GenError = AlignmentError::InvalidStrand("*".to_string()).into();
        assert_eq!(err.to_string(), "invalid alignment: strand must be '+' or '-', got '*'");
    }

    #[test]
    fn test_input_defects() {
        assert!(ErrorKind::MalformedCigar.is_input_defect());
        assert!(ErrorKind::MalformedRow.is_input_defect());
        assert!(!ErrorKind::TranscriptNotFound.is_input_defect());
        assert!(!ErrorKind::PositionOutOfRange.is_input_defect());
    }
}
