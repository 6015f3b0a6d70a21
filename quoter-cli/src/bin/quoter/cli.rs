//! Command-line surface: config file path plus `--exchange`/`--symbol`/
//! etc. overrides that take precedence over the file.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Reconciling quoting engine")]
pub struct Args {
    /// Path to the TOML runtime configuration.
    #[arg(short, long)]
    pub config: String,

    /// Overrides `config.exchange`.
    #[arg(long)]
    pub exchange: Option<String>,

    /// Overrides `config.symbol` (regex).
    #[arg(long)]
    pub symbol: Option<String>,

    /// Overrides `config.account`.
    #[arg(long)]
    pub account: Option<String>,

    /// Overrides `config.enable_trading`. Trading stays opt-in even with
    /// this flag absent and the config file silent.
    #[arg(long)]
    pub enable_trading: bool,

    /// Overrides `config.simulation`.
    #[arg(long)]
    pub simulation: bool,

    /// Log level, overridden by `RUST_LOG` when set.
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long)]
    pub json_logs: bool,
}
