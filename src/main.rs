//! ransom-guard entrypoint: watch a directory, scan it once, tail the log, or query status.

use clap::Parser;
use ransom_guard::{
    cli::{Cli, Commands},
    config::{absolutize, DetectorConfig},
    logging::{tail_lines, StructuredLogger},
    runtime, scan, status, DetectorError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

fn execute(cli: &Cli, config: &DetectorConfig) -> Result<(), DetectorError> {
    match &cli.command {
        Commands::Watch(_) => {
            info!(root = %config.monitor.root.display(), "ransom-guard starting");
            let stop = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&stop);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                warn!(error = %e, "could not install signal handler");
            }
            runtime::run(config, stop)
        }
        Commands::Scan { .. } => {
            let paths = config.resolve()?;
            let report = scan::scan(&paths);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Logs { lines } => {
            let path = absolutize(&config.log.file)?;
            let tail = tail_lines(&path, *lines)?;
            if tail.is_empty() {
                println!("(no log entries at {})", path.display());
            }
            for line in tail {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Status => {
            let st = status::status(&config.state_dir);
            println!("{}", serde_json::to_string(&st)?);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let mut config = DetectorConfig::load(&cli.config_path());
    cli.apply(&mut config);

    let guard = match &cli.command {
        Commands::Watch(_) => match StructuredLogger::init(&config.log, &config.log.file) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("cannot open log file {}: {}", config.log.file.display(), e);
                std::process::exit(1);
            }
        },
        _ => None,
    };

    if let Err(e) = execute(&cli, &config) {
        error!(error = %e, "fatal");
        eprintln!("ransom-guard: {}", e);
        drop(guard);
        std::process::exit(1);
    }
}
