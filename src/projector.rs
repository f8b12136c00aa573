//! Transcript-to-genome coordinate projection.
//!
//! A position is given in the transcript's own 5'->3' coordinate space. For
//! minus-strand alignments it is first flipped into the left-to-right order
//! the CIGAR is written in, then the CIGAR is walked with two cursors:
//!
//! - M/=/X: consume both; a hit yields `ref_cursor + offset`
//! - I/S: consume transcript only; a hit has no reference base and is
//!   reported `Unmapped`, anchored at the current reference cursor
//! - D/N: consume reference only; never hit
//! - H: consume neither
//!
//! Blocks are half-open, so the last base of a block always scores against
//! that block.

use crate::cigar::CigarToken;
use crate::error::{Result, Tx2GenError};
use crate::record::AlignmentRecord;
use serde::Serialize;
use std::fmt;

/// How a projected position relates to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MappingStatus {
    /// Inside an aligned block
    Exact,
    /// Inside an aligned block, on the base adjacent to a D/N gap
    Boundary,
    /// No reference counterpart (insertion or soft clip); coordinate is an anchor
    Unmapped,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Exact => "Exact",
            MappingStatus::Boundary => "Boundary",
            MappingStatus::Unmapped => "Unmapped",
        }
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to report for a position on the edge of an aligned block that
/// touches a deletion or intron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BoundaryPolicy {
    /// Report `Boundary`
    #[default]
    Flag,
    /// Report `Exact`
    Collapse,
}

/// Result of projecting one transcript position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// 0-based, left-to-right reference coordinate regardless of strand
    pub genomic_position: u64,
    pub status: MappingStatus,
}

/// Project with the default boundary policy.
pub fn project(record: &AlignmentRecord, position: i64) -> Result<Projection> {
    project_with(record, position, BoundaryPolicy::default())
}

/// Project a 0-based transcript position onto the reference.
///
/// Fails with `PositionOutOfRange` unless `0 <= position < transcript_length`.
/// A walk that runs off the end of the tokens is an
/// `InternalInvariantViolation`.
pub fn project_with(
    record: &AlignmentRecord,
    position: i64,
    policy: BoundaryPolicy,
) -> Result<Projection> {
    let transcript_length = record.transcript_length();
    if position < 0 || position as u64 >= transcript_length {
        return Err(Tx2GenError::PositionOutOfRange {
            position,
            transcript_length,
        });
    }

    let position = position as u64;
    let walk_position = if record.strand().is_reverse() {
        transcript_length - 1 - position
    } else {
        position
    };

    walk(record.tokens(), record.ref_start(), walk_position, policy).ok_or_else(|| {
        Tx2GenError::InternalInvariantViolation(format!(
            "walk position {} not resolved by CIGAR {} of transcript {} (length {})",
            walk_position,
            record.cigar(),
            record.transcript_id(),
            transcript_length
        ))
    })
}

/// Walk tokens left to right. `None` means the tokens ran out first.
fn walk(
    tokens: &[CigarToken],
    ref_start: u64,
    walk_position: u64,
    policy: BoundaryPolicy,
) -> Option<Projection> {
    let mut tx_cursor = 0u64;
    let mut ref_cursor = ref_start;

    for (index, token) in tokens.iter().enumerate() {
        let tx_len = token.transcript_len();

        if walk_position < tx_cursor + tx_len {
            let offset = walk_position - tx_cursor;

            if !token.op.consumes_reference() {
                return Some(Projection {
                    genomic_position: ref_cursor,
                    status: MappingStatus::Unmapped,
                });
            }

            let status = if policy == BoundaryPolicy::Flag
                && touches_reference_gap(tokens, index, offset)
            {
                MappingStatus::Boundary
            } else {
                MappingStatus::Exact
            };
            return Some(Projection {
                genomic_position: ref_cursor + offset,
                status,
            });
        }

        tx_cursor += tx_len;
        ref_cursor += token.reference_len();
    }

    None
}

/// First base of a block right after D/N, or last base right before D/N.
fn touches_reference_gap(tokens: &[CigarToken], index: usize, offset: u64) -> bool {
    let after_gap = offset == 0
        && index > 0
        && tokens[index - 1].op.is_reference_gap();
    let before_gap = offset + 1 == tokens[index].len as u64
        && tokens
            .get(index + 1)
            .map_or(false, |next| next.op.is_reference_gap());
    after_gap || before_gap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cigar::parse_cigar;
    use crate::record::Strand;

    fn record(cigar: &str, ref_start: i64, strand: Strand) -> AlignmentRecord {
        AlignmentRecord::new("tx1", "chr1", ref_start, strand, parse_cigar(cigar).unwrap()).unwrap()
    }

    fn exact(genomic_position: u64) -> Projection {
        Projection {
            genomic_position,
            status: MappingStatus::Exact,
        }
    }

    fn unmapped(genomic_position: u64) -> Projection {
        Projection {
            genomic_position,
            status: MappingStatus::Unmapped,
        }
    }

    #[test]
    fn test_indel_scenario() {
        let rec = record("10M5I20M3D15M", 1000, Strand::Forward);
        assert_eq!(rec.transcript_length(), 50);

        assert_eq!(project(&rec, 12).unwrap(), unmapped(1010));
        assert_eq!(project(&rec, 30).unwrap(), exact(1025));
        assert_eq!(project(&rec, 40).unwrap(), exact(1038));
    }

    #[test]
    fn test_block_edges_are_half_open() {
        let rec = record("10M5I20M", 1000, Strand::Forward);
        // Last base of the first block stays in that block
        assert_eq!(project(&rec, 9).unwrap(), exact(1009));
        // First inserted base
        assert_eq!(project(&rec, 10).unwrap(), unmapped(1010));
        // Last inserted base
        assert_eq!(project(&rec, 14).unwrap(), unmapped(1010));
        // First base after the insertion
        assert_eq!(project(&rec, 15).unwrap(), exact(1010));
    }

    #[test]
    fn test_pure_match_round_trip() {
        let rec = record("25M", 500, Strand::Forward);
        for p in 0..25 {
            assert_eq!(project(&rec, p).unwrap(), exact(500 + p as u64));
        }
    }

    #[test]
    fn test_out_of_range() {
        let rec = record("10M5I20M3D15M", 1000, Strand::Forward);
        for position in [-1, 50, 51, i64::MAX, i64::MIN] {
            match project(&rec, position) {
                Err(Tx2GenError::PositionOutOfRange {
                    position: p,
                    transcript_length,
                }) => {
                    assert_eq!(p, position);
                    assert_eq!(transcript_length, 50);
                }
                other => panic!("expected PositionOutOfRange, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_minus_strand_reversal() {
        let minus = record("10M", 100, Strand::Reverse);
        let plus = record("10M", 100, Strand::Forward);
        assert_eq!(project(&minus, 0).unwrap(), exact(109));
        assert_eq!(project(&minus, 0).unwrap(), project(&plus, 9).unwrap());
        assert_eq!(project(&minus, 9).unwrap(), exact(100));
    }

    #[test]
    fn test_minus_strand_with_indels() {
        // Walk order positions: 0..10 M, 10..15 I, 15..35 M, 35..50 M after 3D
        let rec = record("10M5I20M3D15M", 1000, Strand::Reverse);
        // 5' position 0 is the rightmost walk position 49
        assert_eq!(project(&rec, 0).unwrap(), exact(1047));
        // 5' position 37 is walk position 12, inside the insertion
        assert_eq!(project(&rec, 37).unwrap(), unmapped(1010));
        // 5' position 49 is walk position 0
        assert_eq!(project(&rec, 49).unwrap(), exact(1000));
    }

    #[test]
    fn test_soft_clips_anchor_at_alignment_edges() {
        let rec = record("3S10M4S", 200, Strand::Forward);
        assert_eq!(rec.transcript_length(), 17);
        assert_eq!(project(&rec, 0).unwrap(), unmapped(200));
        assert_eq!(project(&rec, 2).unwrap(), unmapped(200));
        assert_eq!(project(&rec, 3).unwrap(), exact(200));
        assert_eq!(project(&rec, 12).unwrap(), exact(209));
        assert_eq!(project(&rec, 13).unwrap(), unmapped(210));
        assert_eq!(project(&rec, 16).unwrap(), unmapped(210));
    }

    #[test]
    fn test_hard_clips_not_addressable() {
        let rec = record("5H10M5H", 300, Strand::Forward);
        assert_eq!(rec.transcript_length(), 10);
        assert_eq!(project(&rec, 0).unwrap(), exact(300));
        assert_eq!(project(&rec, 9).unwrap(), exact(309));
        assert!(matches!(
            project(&rec, 10),
            Err(Tx2GenError::PositionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_intron_skip() {
        let rec = record("5M1000N5M", 0, Strand::Forward);
        assert_eq!(project_with(&rec, 2, BoundaryPolicy::Collapse).unwrap(), exact(2));
        assert_eq!(project_with(&rec, 7, BoundaryPolicy::Collapse).unwrap(), exact(1007));
    }

    #[test]
    fn test_equal_and_diff_blocks() {
        let rec = record("4=1X5=", 10, Strand::Forward);
        assert_eq!(project(&rec, 4).unwrap(), exact(14));
        assert_eq!(project(&rec, 9).unwrap(), exact(19));
    }

    #[test]
    fn test_boundary_flag_policy() {
        let rec = record("5M100N5M3D5M", 0, Strand::Forward);
        let status = |p| project_with(&rec, p, BoundaryPolicy::Flag).unwrap();

        // Last base before the intron
        assert_eq!(status(4).status, MappingStatus::Boundary);
        assert_eq!(status(4).genomic_position, 4);
        // First base after the intron
        assert_eq!(status(5).status, MappingStatus::Boundary);
        assert_eq!(status(5).genomic_position, 105);
        // Interior bases
        assert_eq!(status(3).status, MappingStatus::Exact);
        assert_eq!(status(7).status, MappingStatus::Exact);
        // Around the deletion
        assert_eq!(status(9).status, MappingStatus::Boundary);
        assert_eq!(status(9).genomic_position, 109);
        assert_eq!(status(10).status, MappingStatus::Boundary);
        assert_eq!(status(10).genomic_position, 113);
        // Alignment ends are not gap junctions
        assert_eq!(status(0).status, MappingStatus::Exact);
        assert_eq!(status(14).status, MappingStatus::Exact);
    }

    #[test]
    fn test_boundary_collapse_policy() {
        let rec = record("5M100N5M3D5M", 0, Strand::Forward);
        for p in [4, 5, 9, 10] {
            let flagged = project_with(&rec, p, BoundaryPolicy::Flag).unwrap();
            let collapsed = project_with(&rec, p, BoundaryPolicy::Collapse).unwrap();
            assert_eq!(collapsed.status, MappingStatus::Exact);
            assert_eq!(collapsed.genomic_position, flagged.genomic_position);
        }
    }

    #[test]
    fn test_boundary_ignores_insertions() {
        let rec = record("5M2I5M", 0, Strand::Forward);
        assert_eq!(project(&rec, 4).unwrap().status, MappingStatus::Exact);
        assert_eq!(project(&rec, 7).unwrap().status, MappingStatus::Exact);
    }

    #[test]
    fn test_boundary_on_minus_strand() {
        let rec = record("5M100N5M", 0, Strand::Reverse);
        // 5' position 4 is walk position 5, first base after the intron
        let hit = project(&rec, 4).unwrap();
        assert_eq!(hit.status, MappingStatus::Boundary);
        assert_eq!(hit.genomic_position, 105);
    }

    #[test]
    fn test_default_policy_is_flag() {
        assert_eq!(BoundaryPolicy::default(), BoundaryPolicy::Flag);
    }

    #[test]
    fn test_walk_past_tokens_is_none() {
        let tokens = parse_cigar("5M2D").unwrap();
        assert!(walk(&tokens, 0, 5, BoundaryPolicy::Flag).is_none());
        assert!(walk(&tokens, 0, 4, BoundaryPolicy::Flag).is_some());
    }
}
