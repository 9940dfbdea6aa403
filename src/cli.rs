use crate::config::DetectorConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ransomware behavior detector for a monitored directory", long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, global = true, env = "RANSOM_GUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the logging level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch a directory until interrupted
    Watch(WatchArgs),
    /// Scan a directory once for executables and ransomware extensions
    Scan {
        /// Directory to scan
        root: PathBuf,
    },
    /// Print the last lines of the detection log
    Logs {
        #[arg(short = 'n', long, default_value_t = crate::logging::DEFAULT_TAIL_LINES)]
        lines: usize,
    },
    /// Report whether a detector is running
    Status,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Directory to monitor
    pub root: PathBuf,
    /// Training dataset (CSV) for the classifier
    #[arg(long)]
    pub dataset: Option<PathBuf>,
    /// Refuse to start without a working classifier
    #[arg(long)]
    pub require_classifier: bool,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// Fold command-line overrides into a loaded config.
    pub fn apply(&self, config: &mut DetectorConfig) {
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        match &self.command {
            Commands::Watch(args) => {
                config.monitor.root = args.root.clone();
                if let Some(ds) = &args.dataset {
                    config.classifier.dataset_path = Some(ds.clone());
                }
                if args.require_classifier {
                    config.classifier.required = true;
                }
            }
            Commands::Scan { root } => config.monitor.root = root.clone(),
            Commands::Logs { .. } | Commands::Status => {}
        }
    }
}
