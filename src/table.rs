//! Tab-delimited alignment, query and output tables.
//!
//! Alignment table, one alignment per line:
//! `transcript_id  ref_name  ref_start  strand  cigar`, or the older four
//! column form without the strand column (implies `+`).
//!
//! Query table: `transcript_id  position`, split on any whitespace.
//!
//! Blank lines and lines starting with `#` are skipped in both inputs.
//! Malformed rows are collected with their line number instead of aborting
//! the read.

use crate::error::{ErrorKind, Result, Tx2GenError};
use crate::record::{AlignmentRecord, Strand};
use crate::translate::{PositionQuery, QueryError, TranslationRow};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::num::IntErrorKind;
use std::path::Path;

/// A rejected input row. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiagnostic {
    pub line: usize,
    pub kind: ErrorKind,
    pub message: String,
}

impl RowDiagnostic {
    fn from_error(line: usize, err: &Tx2GenError) -> Self {
        let message = match err {
            Tx2GenError::MalformedRow { msg, .. } => msg.clone(),
            other => other.to_string(),
        };
        Self {
            line,
            kind: err.kind().unwrap_or(ErrorKind::MalformedRow),
            message,
        }
    }
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.kind, self.message)
    }
}

/// Fail unless `path` is an existing, non-empty regular file.
pub fn check_input_file(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|e| Tx2GenError::InputFile {
        path: path.to_path_buf(),
        reason: format!("cannot locate file ({})", e),
    })?;
    if !meta.is_file() {
        return Err(Tx2GenError::InputFile {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    if meta.len() == 0 {
        return Err(Tx2GenError::InputFile {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    log::info!("Found file: {}", path.display());
    Ok(())
}

fn data_line(raw: &str) -> Option<&str> {
    let line = raw.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        None
    } else {
        Some(line)
    }
}

#[derive(Debug, Default)]
pub struct AlignmentTable {
    pub records: Vec<AlignmentRecord>,
    /// Data lines seen, accepted or not
    pub rows_read: usize,
    pub rejected: Vec<RowDiagnostic>,
}

pub fn read_alignment_table(path: &Path) -> Result<AlignmentTable> {
    let file = File::open(path)?;
    parse_alignment_table(BufReader::new(file))
}

pub fn parse_alignment_table<R: BufRead>(reader: R) -> Result<AlignmentTable> {
    let mut table = AlignmentTable::default();

    for (idx, raw) in reader.lines().enumerate() {
        let raw = raw?;
        let Some(line) = data_line(&raw) else {
            continue;
        };
        table.rows_read += 1;
        match parse_alignment_line(line, idx + 1) {
            Ok(record) => table.records.push(record),
            Err(e) => table.rejected.push(RowDiagnostic::from_error(idx + 1, &e)),
        }
    }
    Ok(table)
}

fn parse_alignment_line(line: &str, line_no: usize) -> Result<AlignmentRecord> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    let (tx, chrom, start, strand, cigar) = match fields.as_slice() {
        [tx, chrom, start, strand, cigar] => (*tx, *chrom, *start, *strand, *cigar),
        [tx, chrom, start, cigar] => (*tx, *chrom, *start, "+", *cigar),
        _ => {
            return Err(Tx2GenError::MalformedRow {
                line: line_no,
                msg: format!(
                    "expected 4 or 5 tab-separated columns, found {}",
                    fields.len()
                ),
            })
        }
    };

    if tx.is_empty() || chrom.is_empty() {
        return Err(Tx2GenError::MalformedRow {
            line: line_no,
            msg: "empty transcript or reference name".to_string(),
        });
    }
    let start = start.parse::<i64>().map_err(|_| Tx2GenError::MalformedRow {
        line: line_no,
        msg: format!("invalid reference start '{}'", start),
    })?;

    AlignmentRecord::from_fields(tx, chrom, start, strand, cigar)
}

/// A query table line, parsed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryLine {
    Parsed(PositionQuery),
    /// Raw fields are kept so the row can still be echoed to the output.
    Malformed {
        transcript_id: String,
        position: String,
        diagnostic: RowDiagnostic,
    },
}

#[derive(Debug, Default)]
pub struct QueryTable {
    pub lines: Vec<QueryLine>,
}

impl QueryTable {
    pub fn queries(&self) -> Vec<PositionQuery> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                QueryLine::Parsed(q) => Some(q.clone()),
                QueryLine::Malformed { .. } => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &RowDiagnostic> {
        self.lines.iter().filter_map(|line| match line {
            QueryLine::Parsed(_) => None,
            QueryLine::Malformed { diagnostic, .. } => Some(diagnostic),
        })
    }
}

pub fn read_query_table(path: &Path) -> Result<QueryTable> {
    let file = File::open(path)?;
    parse_query_table(BufReader::new(file))
}

pub fn parse_query_table<R: BufRead>(reader: R) -> Result<QueryTable> {
    let mut table = QueryTable::default();

    for (idx, raw) in reader.lines().enumerate() {
        let raw = raw?;
        let Some(line) = data_line(&raw) else {
            continue;
        };
        table.lines.push(parse_query_line(line, idx + 1));
    }
    Ok(table)
}

fn parse_query_line(line: &str, line_no: usize) -> QueryLine {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let malformed = |msg: String| QueryLine::Malformed {
        transcript_id: fields.first().unwrap_or(&"").to_string(),
        position: fields.get(1).unwrap_or(&"").to_string(),
        diagnostic: RowDiagnostic {
            line: line_no,
            kind: ErrorKind::MalformedRow,
            message: msg,
        },
    };

    if fields.len() != 2 {
        return malformed(format!(
            "expected 2 columns (transcript, position), found {}",
            fields.len()
        ));
    }
    match parse_position(fields[1]) {
        Some(position) => {
            QueryLine::Parsed(PositionQuery::with_text(fields[0], position, fields[1]))
        }
        None => malformed(format!("position '{}' is not an integer", fields[1])),
    }
}

/// Integers too large for `i64` saturate; no transcript is that long, so they
/// still come out as out of range rather than malformed.
fn parse_position(text: &str) -> Option<i64> {
    match text.parse::<i64>() {
        Ok(position) => Some(position),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

/// One line of the output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub transcript_id: String,
    pub position: String,
    pub ref_name: String,
    pub genomic_position: Option<u64>,
    pub strand: Option<Strand>,
    pub status: String,
}

impl OutputRow {
    pub fn from_translation(row: &TranslationRow) -> Self {
        let transcript_id = row.query.transcript_id.clone();
        let position = row.query.position_text.clone();
        match &row.outcome {
            Ok(result) => Self {
                transcript_id,
                position,
                ref_name: result.ref_name.clone(),
                genomic_position: Some(result.genomic_position),
                strand: Some(result.strand),
                status: result.status.to_string(),
            },
            Err(err) => {
                let (ref_name, strand) = match err {
                    QueryError::PositionOutOfRange {
                        ref_name, strand, ..
                    } => (ref_name.clone(), Some(*strand)),
                    QueryError::TranscriptNotFound => (String::new(), None),
                };
                Self {
                    transcript_id,
                    position,
                    ref_name,
                    genomic_position: None,
                    strand,
                    status: err.kind().to_string(),
                }
            }
        }
    }

    pub fn from_malformed(transcript_id: &str, position: &str, kind: ErrorKind) -> Self {
        Self {
            transcript_id: transcript_id.to_string(),
            position: position.to_string(),
            ref_name: String::new(),
            genomic_position: None,
            strand: None,
            status: kind.to_string(),
        }
    }
}

impl fmt::Display for OutputRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genomic = self
            .genomic_position
            .map(|p| p.to_string())
            .unwrap_or_default();
        let strand = self.strand.map(|s| s.to_string()).unwrap_or_default();
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.transcript_id, self.position, self.ref_name, genomic, strand, self.status
        )
    }
}

pub fn write_output<W: Write>(writer: &mut W, rows: &[OutputRow]) -> std::io::Result<()> {
    for row in rows {
        writeln!(writer, "{}", row)?;
    }
    writer.flush()
}
