//! Batch translation of transcript positions against an alignment table

use crate::error::{ErrorKind, Result, Tx2GenError};
use crate::projector::{project_with, BoundaryPolicy, MappingStatus};
use crate::record::{AlignmentRecord, Strand};
use rayon::prelude::*;
use std::collections::HashMap;

/// A 0-based transcript position to translate. Negative positions are kept
/// so they can be reported as out of range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionQuery {
    pub transcript_id: String,
    pub position: i64,
    /// Position as written in the query table, echoed back in the output
    pub position_text: String,
}

impl PositionQuery {
    pub fn new(transcript_id: impl Into<String>, position: i64) -> Self {
        Self::with_text(transcript_id, position, position.to_string())
    }

    pub fn with_text(
        transcript_id: impl Into<String>,
        position: i64,
        position_text: impl Into<String>,
    ) -> Self {
        Self {
            transcript_id: transcript_id.into(),
            position,
            position_text: position_text.into(),
        }
    }
}

/// Transcript id -> alignment records. Built once, then only read.
#[derive(Debug, Default)]
pub struct TranscriptIndex {
    records: Vec<AlignmentRecord>,
    by_transcript: HashMap<String, Vec<usize>>,
}

impl TranscriptIndex {
    pub fn new(records: Vec<AlignmentRecord>) -> Self {
        let mut by_transcript: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_transcript
                .entry(record.transcript_id().to_string())
                .or_default()
                .push(idx);
        }
        Self {
            records,
            by_transcript,
        }
    }

    /// Record indices for a transcript, in insertion order
    pub fn lookup(&self, transcript_id: &str) -> Option<&[usize]> {
        self.by_transcript.get(transcript_id).map(Vec::as_slice)
    }

    pub fn record(&self, record_index: usize) -> Option<&AlignmentRecord> {
        self.records.get(record_index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn transcript_count(&self) -> usize {
        self.by_transcript.len()
    }

    /// Transcripts with more than one alignment record
    pub fn multi_mapped(&self) -> usize {
        self.by_transcript.values().filter(|v| v.len() > 1).count()
    }
}

impl FromIterator<AlignmentRecord> for TranscriptIndex {
    fn from_iter<I: IntoIterator<Item = AlignmentRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A successful projection of one query through one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// Index of the producing record in the `TranscriptIndex`
    pub record_index: usize,
    pub ref_name: String,
    pub genomic_position: u64,
    pub strand: Strand,
    pub status: MappingStatus,
}

/// Per-query failures. These never stop a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    TranscriptNotFound,
    PositionOutOfRange {
        record_index: usize,
        ref_name: String,
        strand: Strand,
        transcript_length: u64,
    },
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::TranscriptNotFound => ErrorKind::TranscriptNotFound,
            QueryError::PositionOutOfRange { .. } => ErrorKind::PositionOutOfRange,
        }
    }
}

/// One output row: a query and what one record (or the lack of one) made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRow {
    /// Position of the query in the input sequence
    pub query_index: usize,
    pub query: PositionQuery,
    pub outcome: std::result::Result<TranslationResult, QueryError>,
}

/// Translate every query against the index.
///
/// Rows come back in query order. A query against a transcript with several
/// records yields one row per record, in record order. Queries are projected
/// in parallel on the current rayon pool.
pub fn translate(
    index: &TranscriptIndex,
    queries: &[PositionQuery],
    policy: BoundaryPolicy,
) -> Result<Vec<TranslationRow>> {
    let per_query: Vec<Vec<TranslationRow>> = queries
        .par_iter()
        .enumerate()
        .map(|(query_index, query)| translate_query(index, query_index, query, policy))
        .collect::<Result<_>>()?;

    let rows: Vec<TranslationRow> = per_query.into_iter().flatten().collect();
    debug_assert!(rows.windows(2).all(|w| w[0].query_index <= w[1].query_index));
    Ok(rows)
}

fn translate_query(
    index: &TranscriptIndex,
    query_index: usize,
    query: &PositionQuery,
    policy: BoundaryPolicy,
) -> Result<Vec<TranslationRow>> {
    let Some(record_indices) = index.lookup(&query.transcript_id) else {
        log::debug!(
            "query {}: transcript {} not in alignment table",
            query_index,
            query.transcript_id
        );
        return Ok(vec![TranslationRow {
            query_index,
            query: query.clone(),
            outcome: Err(QueryError::TranscriptNotFound),
        }]);
    };

    let mut rows = Vec::with_capacity(record_indices.len());
    for &record_index in record_indices {
        let Some(record) = index.record(record_index) else {
            return Err(Tx2GenError::InternalInvariantViolation(format!(
                "transcript {} points at missing record {}",
                query.transcript_id, record_index
            )));
        };
        let outcome = match project_with(record, query.position, policy) {
            Ok(projection) => Ok(TranslationResult {
                record_index,
                ref_name: record.ref_name().to_string(),
                genomic_position: projection.genomic_position,
                strand: record.strand(),
                status: projection.status,
            }),
            Err(Tx2GenError::PositionOutOfRange {
                transcript_length, ..
            }) => Err(QueryError::PositionOutOfRange {
                record_index,
                ref_name: record.ref_name().to_string(),
                strand: record.strand(),
                transcript_length,
            }),
            Err(e) => return Err(e),
        };
        rows.push(TranslationRow {
            query_index,
            query: query.clone(),
            outcome,
        });
    }
    Ok(rows)
}
