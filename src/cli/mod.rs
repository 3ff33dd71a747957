use clap::Parser;

use crate::config::UssdConfig;

#[derive(Parser, Debug)]
#[command(name = "ussd_wallet")]
#[command(about = "MVola USSD session simulator", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, default_value = "ussd.toml")]
    pub config: String,

    /// Inactivity timeout in milliseconds (overrides the config file)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded file.
    pub fn apply(&self, config: &mut UssdConfig) {
        if let Some(timeout_ms) = self.timeout_ms.filter(|ms| *ms > 0) {
            config.session.timeout_ms = timeout_ms;
        }
    }
}
