//! CIGAR tokenizer and the per-operation consumption table.

use crate::error::CigarError;
use std::fmt;

/// CIGAR operation kinds accepted in transcript alignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    /// M: aligned block, match or mismatch
    Match,
    /// =: aligned block, sequence match
    Equal,
    /// X: aligned block, sequence mismatch
    Diff,
    /// I: insertion relative to the reference
    Ins,
    /// D: deletion relative to the reference
    Del,
    /// N: reference skip, usually an intron
    RefSkip,
    /// S: clipped from the alignment but still part of the transcript
    SoftClip,
    /// H: removed from the transcript coordinate space entirely
    HardClip,
}

impl CigarOp {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            'M' => Some(CigarOp::Match),
            '=' => Some(CigarOp::Equal),
            'X' => Some(CigarOp::Diff),
            'I' => Some(CigarOp::Ins),
            'D' => Some(CigarOp::Del),
            'N' => Some(CigarOp::RefSkip),
            'S' => Some(CigarOp::SoftClip),
            'H' => Some(CigarOp::HardClip),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Equal => '=',
            CigarOp::Diff => 'X',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
            CigarOp::RefSkip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
        }
    }

    /// M, =, X, I and S advance the transcript cursor.
    #[inline]
    pub fn consumes_transcript(&self) -> bool {
        match self {
            CigarOp::Match | CigarOp::Equal | CigarOp::Diff | CigarOp::Ins | CigarOp::SoftClip => {
                true
            }
            CigarOp::Del | CigarOp::RefSkip | CigarOp::HardClip => false,
        }
    }

    /// M, =, X, D and N advance the reference cursor.
    #[inline]
    pub fn consumes_reference(&self) -> bool {
        match self {
            CigarOp::Match | CigarOp::Equal | CigarOp::Diff | CigarOp::Del | CigarOp::RefSkip => {
                true
            }
            CigarOp::Ins | CigarOp::SoftClip | CigarOp::HardClip => false,
        }
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.consumes_transcript() && self.consumes_reference()
    }

    #[inline]
    pub fn is_clip(&self) -> bool {
        matches!(self, CigarOp::SoftClip | CigarOp::HardClip)
    }

    /// D and N: the reference advances while the transcript stands still.
    #[inline]
    pub fn is_reference_gap(&self) -> bool {
        !self.consumes_transcript() && self.consumes_reference()
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single run-length encoded operation. `len` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CigarToken {
    pub op: CigarOp,
    pub len: u32,
}

impl CigarToken {
    pub fn new(op: CigarOp, len: u32) -> Self {
        Self { op, len }
    }

    /// Bases of the transcript coordinate space covered by this token
    #[inline]
    pub fn transcript_len(&self) -> u64 {
        if self.op.consumes_transcript() {
            self.len as u64
        } else {
            0
        }
    }

    /// Reference bases covered by this token
    #[inline]
    pub fn reference_len(&self) -> u64 {
        if self.op.consumes_reference() {
            self.len as u64
        } else {
            0
        }
    }
}

impl fmt::Display for CigarToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.op)
    }
}

/// Parse a CIGAR string into tokens, exactly as written.
///
/// Adjacent operations of the same kind are not merged. Every unit must be a
/// positive decimal length followed by one of `MIDNSH=X`.
pub fn parse_cigar(cigar: &str) -> Result<Vec<CigarToken>, CigarError> {
    if cigar.is_empty() {
        return Err(CigarError::Empty);
    }

    let mut tokens = Vec::new();
    let mut len: u64 = 0;
    let mut len_start: Option<usize> = None;

    for (offset, ch) in cigar.char_indices() {
        if ch.is_ascii_digit() {
            let start = *len_start.get_or_insert(offset);
            len = len * 10 + (ch as u64 - '0' as u64);
            if len > u32::MAX as u64 {
                return Err(CigarError::LengthOverflow { offset: start });
            }
            continue;
        }

        let op = CigarOp::from_char(ch).ok_or(CigarError::UnknownOperation { op: ch, offset })?;
        let start = len_start
            .take()
            .ok_or(CigarError::MissingLength { op: ch, offset })?;
        if len == 0 {
            return Err(CigarError::ZeroLength { offset: start });
        }
        tokens.push(CigarToken::new(op, len as u32));
        len = 0;
    }

    if let Some(offset) = len_start {
        return Err(CigarError::DanglingLength { offset });
    }

    Ok(tokens)
}

/// Render tokens back into a CIGAR string.
pub fn cigar_string(tokens: &[CigarToken]) -> String {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// Sum of M/=/X/I/S lengths
pub fn transcript_length(tokens: &[CigarToken]) -> u64 {
    tokens.iter().map(CigarToken::transcript_len).sum()
}

/// Sum of M/=/X/D/N lengths
pub fn reference_span(tokens: &[CigarToken]) -> u64 {
    tokens.iter().map(CigarToken::reference_len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let tokens = parse_cigar("10M5I20M3D15M").unwrap();
        assert_eq!(
            tokens,
            vec![
                CigarToken::new(CigarOp::Match, 10),
                CigarToken::new(CigarOp::Ins, 5),
                CigarToken::new(CigarOp::Match, 20),
                CigarToken::new(CigarOp::Del, 3),
                CigarToken::new(CigarOp::Match, 15),
            ]
        );
    }

    #[test]
    fn test_parse_all_operations() {
        let tokens = parse_cigar("2H3S4=5X6I7D8N9M1S1H").unwrap();
        let ops: String = tokens.iter().map(|t| t.op.as_char()).collect();
        assert_eq!(ops, "HS=XIDNMSH");
        assert_eq!(tokens[3].len, 5);
    }

    #[test]
    fn test_adjacent_same_ops_not_merged() {
        let tokens = parse_cigar("5M5M").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(cigar_string(&tokens), "5M5M");
    }

    #[test]
    fn test_multi_digit_lengths() {
        let tokens = parse_cigar("1234M56789N1M").unwrap();
        assert_eq!(tokens[0].len, 1234);
        assert_eq!(tokens[1].len, 56789);
    }

    #[test]
    fn test_empty_is_malformed() {
        assert_eq!(parse_cigar(""), Err(CigarError::Empty));
    }

    #[test]
    fn test_missing_length() {
        assert_eq!(
            parse_cigar("M"),
            Err(CigarError::MissingLength { op: 'M', offset: 0 })
        );
        assert_eq!(
            parse_cigar("10MI"),
            Err(CigarError::MissingLength { op: 'I', offset: 3 })
        );
    }

    #[test]
    fn test_dangling_length() {
        assert_eq!(
            parse_cigar("10M25"),
            Err(CigarError::DanglingLength { offset: 3 })
        );
    }

    #[test]
    fn test_unknown_operation() {
        assert_eq!(
            parse_cigar("10M2P3M"),
            Err(CigarError::UnknownOperation { op: 'P', offset: 4 })
        );
        assert_eq!(
            parse_cigar("10m"),
            Err(CigarError::UnknownOperation { op: 'm', offset: 2 })
        );
        assert!(matches!(
            parse_cigar("10M 5M"),
            Err(CigarError::UnknownOperation { op: ' ', .. })
        ));
    }

    #[test]
    fn test_zero_length() {
        assert_eq!(
            parse_cigar("10M0I5M"),
            Err(CigarError::ZeroLength { offset: 3 })
        );
        assert_eq!(parse_cigar("00M"), Err(CigarError::ZeroLength { offset: 0 }));
    }

    #[test]
    fn test_length_overflow() {
        assert_eq!(
            parse_cigar("99999999999M"),
            Err(CigarError::LengthOverflow { offset: 0 })
        );
    }

    #[test]
    fn test_consumption_table() {
        let both = [CigarOp::Match, CigarOp::Equal, CigarOp::Diff];
        for op in both {
            assert!(op.consumes_transcript() && op.consumes_reference());
            assert!(op.is_aligned());
        }
        for op in [CigarOp::Ins, CigarOp::SoftClip] {
            assert!(op.consumes_transcript() && !op.consumes_reference());
        }
        for op in [CigarOp::Del, CigarOp::RefSkip] {
            assert!(!op.consumes_transcript() && op.consumes_reference());
            assert!(op.is_reference_gap());
        }
        assert!(!CigarOp::HardClip.consumes_transcript());
        assert!(!CigarOp::HardClip.consumes_reference());
    }

    #[test]
    fn test_lengths() {
        let tokens = parse_cigar("5H3S10M5I20M3D100N15M2S4H").unwrap();
        assert_eq!(transcript_length(&tokens), 3 + 10 + 5 + 20 + 15 + 2);
        assert_eq!(reference_span(&tokens), 10 + 20 + 3 + 100 + 15);
    }
}
