//! Transcript-to-genome alignment records

use crate::cigar::{self, CigarToken};
use crate::error::{AlignmentError, Tx2GenError};
use std::fmt;
use std::str::FromStr;

/// Strand of a transcript alignment on the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        *self == Strand::Reverse
    }
}

impl FromStr for Strand {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            other => Err(AlignmentError::InvalidStrand(other.to_string())),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One transcript alignment. Immutable once built; lengths are derived from
/// the tokens at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    transcript_id: String,
    ref_name: String,
    ref_start: u64,
    strand: Strand,
    tokens: Vec<CigarToken>,
    transcript_length: u64,
    reference_span: u64,
}

impl AlignmentRecord {
    /// Build a record, checking that the token list is non-empty, that
    /// clipping only occurs at the ends, and that the start is not negative.
    pub fn new(
        transcript_id: impl Into<String>,
        ref_name: impl Into<String>,
        ref_start: i64,
        strand: Strand,
        tokens: Vec<CigarToken>,
    ) -> Result<Self, AlignmentError> {
        if ref_start < 0 {
            return Err(AlignmentError::NegativeStart(ref_start));
        }
        if tokens.is_empty() {
            return Err(AlignmentError::EmptyTokens);
        }
        check_edge_clipping(&tokens)?;

        let transcript_length = cigar::transcript_length(&tokens);
        let reference_span = cigar::reference_span(&tokens);

        Ok(Self {
            transcript_id: transcript_id.into(),
            ref_name: ref_name.into(),
            ref_start: ref_start as u64,
            strand,
            tokens,
            transcript_length,
            reference_span,
        })
    }

    /// Build a record from raw table fields.
    pub fn from_fields(
        transcript_id: &str,
        ref_name: &str,
        ref_start: i64,
        strand: &str,
        cigar: &str,
    ) -> Result<Self, Tx2GenError> {
        let tokens = cigar::parse_cigar(cigar)?;
        let strand = strand.parse::<Strand>()?;
        Ok(Self::new(transcript_id, ref_name, ref_start, strand, tokens)?)
    }

    pub fn transcript_id(&self) -> &str {
        &self.transcript_id
    }

    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    /// 0-based, inclusive
    pub fn ref_start(&self) -> u64 {
        self.ref_start
    }

    /// 0-based, exclusive
    pub fn ref_end(&self) -> u64 {
        self.ref_start + self.reference_span
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn tokens(&self) -> &[CigarToken] {
        &self.tokens
    }

    /// Addressable transcript length; hard-clipped bases are excluded.
    pub fn transcript_length(&self) -> u64 {
        self.transcript_length
    }

    pub fn reference_span(&self) -> u64 {
        self.reference_span
    }

    pub fn cigar(&self) -> String {
        cigar::cigar_string(&self.tokens)
    }
}

/// Clip tokens (S/H) may only form one run at each end of the alignment.
fn check_edge_clipping(tokens: &[CigarToken]) -> Result<(), AlignmentError> {
    let first = tokens.iter().position(|t| !t.op.is_clip());
    let last = tokens.iter().rposition(|t| !t.op.is_clip());

    // All-clip alignments are a single edge run
    let (Some(first), Some(last)) = (first, last) else {
        return Ok(());
    };

    for (index, token) in tokens.iter().enumerate().take(last + 1).skip(first) {
        if token.op.is_clip() {
            return Err(AlignmentError::InteriorClip {
                op: token.op.as_char(),
                index,
            });
        }
    }
    Ok(())
}
