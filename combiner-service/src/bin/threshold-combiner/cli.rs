use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "threshold-combiner")]
#[command(about = "Threshold response combiner in front of a set of signer nodes", long_about = None)]
pub struct Cli {
    /// Path to configuration file (falls back to COMBINER_CONFIG_PATH, then ./combiner-config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log filters, e.g. `info` or `debug,root=warn,reqwest=info`
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Directory for rolling log files; console only when omitted
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
