//! Run-level counts, logged at the end of a run and optionally written as JSON

use crate::error::{ErrorKind, Result};
use crate::projector::MappingStatus;
use crate::table::RowDiagnostic;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Data lines in the alignment table
    pub alignment_rows: usize,
    pub records_loaded: usize,
    pub transcripts: usize,
    pub multi_mapped_transcripts: usize,
    /// Data lines in the query table
    pub query_rows: usize,
    pub output_rows: usize,
    /// Worker threads used for translation
    pub threads: usize,
    pub statuses: BTreeMap<MappingStatus, usize>,
    /// Rejected rows from both input tables plus per-query failures
    pub errors: BTreeMap<ErrorKind, usize>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn record_status(&mut self, status: MappingStatus) {
        *self.statuses.entry(status).or_insert(0) += 1;
    }

    pub fn record_error(&mut self, kind: ErrorKind) {
        *self.errors.entry(kind).or_insert(0) += 1;
    }

    pub fn record_diagnostics<'a>(
        &mut self,
        diagnostics: impl IntoIterator<Item = &'a RowDiagnostic>,
    ) {
        for d in diagnostics {
            self.record_error(d.kind);
        }
    }

    pub fn status_count(&self, status: MappingStatus) -> usize {
        self.statuses.get(&status).copied().unwrap_or(0)
    }

    pub fn error_count(&self, kind: ErrorKind) -> usize {
        self.errors.get(&kind).copied().unwrap_or(0)
    }

    /// Rows of either input table that could not be used
    pub fn input_defects(&self) -> usize {
        self.errors
            .iter()
            .filter(|(kind, _)| kind.is_input_defect())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn log(&self) {
        log::info!(
            "Alignments: {} rows, {} records loaded for {} transcripts ({} multi-mapped)",
            self.alignment_rows,
            self.records_loaded,
            self.transcripts,
            self.multi_mapped_transcripts
        );
        log::info!(
            "Queries: {} rows, {} output rows",
            self.query_rows,
            self.output_rows
        );
        for (status, n) in &self.statuses {
            log::info!("  {}: {}", status, n);
        }
        for (kind, n) in &self.errors {
            log::info!("  {}: {}", kind, n);
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
