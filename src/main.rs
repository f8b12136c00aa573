use clap::Parser;
use std::fs::File;
use tx2gen::tx2gen::{exit_code, run_tx2gen, Args, EXIT_INPUT};

fn init_logging(args: &Args) -> std::io::Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder
        .filter_level(args.log_level())
        .format_timestamp(None) // Don't show timestamps
        .format_target(false); // Don't show module names

    if let Some(path) = &args.log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("Cannot open log file: {}", e);
        std::process::exit(EXIT_INPUT);
    }

    log::info!(
        "Command: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    log::debug!("Arguments: {:?}", args);

    let outcome = run_tx2gen(&args);
    match &outcome {
        Ok(summary) if summary.input_defects() > 0 => {
            log::error!(
                "{} input rows could not be used; see the warnings above",
                summary.input_defects()
            );
        }
        Ok(_) => log::info!("Program finished"),
        Err(e) => log::error!("ERROR {}. Exiting...", e),
    }

    std::process::exit(exit_code(&outcome));
}
