use crate::error::{Result, Tx2GenError};
use crate::projector::BoundaryPolicy;
use crate::summary::RunSummary;
use crate::table::{self, OutputRow, QueryLine};
use crate::translate::{translate, TranscriptIndex};
use clap::Parser;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Exit status for a clean run
pub const EXIT_OK: i32 = 0;
/// Exit status when input rows were rejected or an input/output file failed
pub const EXIT_INPUT: i32 = 1;
/// Exit status when projection hit an internal invariant violation (EX_SOFTWARE)
pub const EXIT_INTERNAL: i32 = 70;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tx2gen",
    version,
    about = "Translate 0-based transcript positions to genomic positions through CIGAR alignments"
)]
pub struct Args {
    /// Alignment table: transcript, reference name, 0-based start, [strand,] CIGAR (tab-delimited)
    #[arg(short = 'r', long = "ref", value_name = "FILE")]
    pub reference: PathBuf,

    /// Query table: transcript, 0-based position
    #[arg(short, long, value_name = "FILE")]
    pub query: PathBuf,

    /// Output directory, created if missing
    #[arg(short = 'o', long, value_name = "DIR", default_value = "./")]
    pub outputdir: PathBuf,

    /// Output file name inside the output directory
    #[arg(short = 'f', long, value_name = "NAME", default_value = "queries_mapped.txt")]
    pub outfile: String,

    /// Number of threads
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Status for positions on an aligned base next to a deletion or intron
    #[arg(long, value_enum, default_value_t = BoundaryPolicy::Flag)]
    pub boundary_policy: BoundaryPolicy,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Write the log here instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else if self.quiet {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.outputdir.join(&self.outfile)
    }
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|e| Tx2GenError::InputFile {
            path: dir.to_path_buf(),
            reason: format!("output directory does not exist and cannot be created ({})", e),
        })?;
        log::info!("Created output directory {}", dir.display());
    }
    Ok(())
}

/// Translate every query in `args.query` and write the output table.
///
/// Rejected input rows are logged one per line and counted in the returned
/// summary; they do not stop the run. Only file-level failures and
/// `InternalInvariantViolation` come back as `Err`.
pub fn run_tx2gen(args: &Args) -> Result<RunSummary> {
    let started = Instant::now();

    prepare_output_dir(&args.outputdir)?;
    table::check_input_file(&args.reference)?;
    table::check_input_file(&args.query)?;

    let mut summary = RunSummary::default();

    let alignments = table::read_alignment_table(&args.reference)?;
    for diagnostic in &alignments.rejected {
        log::warn!("{}: {}", args.reference.display(), diagnostic);
    }
    summary.alignment_rows = alignments.rows_read;
    summary.record_diagnostics(&alignments.rejected);

    // Frozen from here on; shared read-only by the workers
    let index = TranscriptIndex::new(alignments.records);
    summary.records_loaded = index.len();
    summary.transcripts = index.transcript_count();
    summary.multi_mapped_transcripts = index.multi_mapped();
    log::info!(
        "Loaded {} alignment records for {} transcripts",
        index.len(),
        index.transcript_count()
    );

    let queries = table::read_query_table(&args.query)?;
    for diagnostic in queries.diagnostics() {
        log::warn!("{}: {}", args.query.display(), diagnostic);
    }
    summary.query_rows = queries.lines.len();
    summary.record_diagnostics(queries.diagnostics());

    // A pool per run, so `-t` holds even when the global pool already exists
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()?;
    summary.threads = pool.current_num_threads();

    let parsed = queries.queries();
    log::info!(
        "Translating {} queries on {} threads",
        parsed.len(),
        summary.threads
    );
    let rows = pool.install(|| translate(&index, &parsed, args.boundary_policy))?;

    // Interleave translated rows with malformed query lines, in input order
    let mut output = Vec::with_capacity(rows.len() + summary.query_rows - parsed.len());
    let mut rows = rows.into_iter().peekable();
    let mut query_index = 0;
    for line in &queries.lines {
        match line {
            QueryLine::Parsed(_) => {
                while let Some(row) = rows.next_if(|r| r.query_index == query_index) {
                    match &row.outcome {
                        Ok(result) => summary.record_status(result.status),
                        Err(e) => summary.record_error(e.kind()),
                    }
                    output.push(OutputRow::from_translation(&row));
                }
                query_index += 1;
            }
            QueryLine::Malformed {
                transcript_id,
                position,
                diagnostic,
            } => output.push(OutputRow::from_malformed(
                transcript_id,
                position,
                diagnostic.kind,
            )),
        }
    }
    summary.output_rows = output.len();

    let output_path = args.output_path();
    let mut writer = BufWriter::new(File::create(&output_path)?);
    table::write_output(&mut writer, &output)?;
    log::info!("Wrote {} rows to {}", output.len(), output_path.display());

    summary.elapsed_secs = started.elapsed().as_secs_f64();
    summary.log();
    if let Some(path) = &args.summary {
        summary.write_json(path)?;
        log::info!("Summary written to {}", path.display());
    }
    log::info!("Execution time (sec): {:.0}", summary.elapsed_secs);

    Ok(summary)
}

/// Process exit status for the outcome of a run.
pub fn exit_code(outcome: &Result<RunSummary>) -> i32 {
    match outcome {
        Ok(summary) if summary.input_defects() > 0 => EXIT_INPUT,
        Ok(_) => EXIT_OK,
        Err(Tx2GenError::InternalInvariantViolation(_)) => EXIT_INTERNAL,
        Err(_) => EXIT_INPUT,
    }
}
