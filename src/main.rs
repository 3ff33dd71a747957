use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ussd_wallet::cli::Cli;
use ussd_wallet::config::UssdConfig;
use ussd_wallet::interactive;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the screens on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = UssdConfig::load_or_default(&cli.config);
    cli.apply(&mut config);

    let code = match interactive::start(&config).await {
        Ok(end) => end.exit_code(),
        Err(e) => {
            error!("Session aborted: {}", e);
            eprintln!("❌ {}", e);
            1
        }
    };
    std::process::exit(code);
}
