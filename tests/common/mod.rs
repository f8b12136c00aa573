use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use tx2gen::Args;

/// Write `contents` to a fresh temp file
pub fn table_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.as_file_mut().sync_all().unwrap();
    file
}

/// Create default Args for testing, writing into `outdir`
pub fn default_test_args(reference: PathBuf, query: PathBuf, outdir: &TempDir) -> Args {
    Args {
        reference,
        query,
        outputdir: outdir.path().to_path_buf(),
        outfile: "queries_mapped.txt".to_string(),
        threads: 1,
        boundary_policy: Default::default(),
        summary: None,
        log_file: None,
        verbose: false,
        quiet: false,
    }
}

/// Output table lines split into columns
pub fn read_output(args: &Args) -> Vec<Vec<String>> {
    std::fs::read_to_string(args.output_path())
        .unwrap()
        .lines()
        .map(|l| l.split('\t').map(str::to_string).collect())
        .collect()
}
