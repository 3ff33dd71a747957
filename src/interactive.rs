use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

use crate::account::Ledger;
use crate::config::UssdConfig;
use crate::error::Result;
use crate::menu::{MainMenu, Navigator};
use crate::session::{AuthOutcome, Renderer, SessionEnd, SessionLoop, SessionSupervisor};
use crate::ui::TerminalRenderer;

/// Interactive session on stdin/stdout.
pub async fn start(config: &UssdConfig) -> Result<SessionEnd> {
    print!("\x1B[2J\x1B[1;1H");
    let stdin = BufReader::new(tokio::io::stdin());
    run_session(config, stdin, &mut TerminalRenderer).await
}

/// One full session: PIN gate, then the menu loop. The watchdog is stopped
/// on every exit path.
pub async fn run_session<R, W>(config: &UssdConfig, input: R, renderer: &mut W) -> Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
    W: Renderer,
{
    let ledger = Ledger::new(
        config.account.number.clone(),
        &config.account.pin,
        config.account.opening_balance,
    )?
    .with_max_pin_attempts(config.account.max_pin_attempts)
    .into_shared();

    let supervisor = Arc::new(SessionSupervisor::new(config.session.timeout()));
    let watchdog = supervisor.spawn_watchdog(config.session.tick());
    info!(
        account = %config.account.number,
        timeout_ms = config.session.timeout_ms,
        "🚀 Session started"
    );

    let mut session = SessionLoop::new(input, supervisor);
    let result = match session.authenticate(&ledger, renderer).await {
        Ok(AuthOutcome::Granted) => {
            let mut navigator = Navigator::new(Box::new(MainMenu::new(ledger)));
            session.run(&mut navigator, renderer).await
        }
        Ok(AuthOutcome::Ended(end)) => Ok(end),
        Err(e) => Err(e),
    };

    watchdog.abort();
    if let Ok(end) = &result {
        info!(?end, "Session ended");
    }
    result
}
