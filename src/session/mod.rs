//! Session driver: PIN gate, then the render → read → dispatch loop.
//!
//! Every read races the supervisor's expiry signal, so a user who walks away
//! mid-prompt is logged out by the watchdog without typing anything.

pub mod supervisor;

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::account::validation::validate_pin_format;
use crate::account::{lock, SharedLedger};
use crate::error::{Result, UssdError};
use crate::menu::{Navigator, Notice, Screen};

pub use supervisor::SessionSupervisor;

const PIN_PROMPT: &str = "Entrez votre code PIN (0 pour quitter): ";
const GOODBYE: &str = "Merci d'avoir utilisé MVola. Au revoir!";

/// Presentation surface for the session loop
pub trait Renderer {
    fn screen(&mut self, screen: &Screen);
    fn notice(&mut self, notice: &Notice);
    fn prompt(&mut self, label: &str);
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    Expired,
    Locked,
    InputClosed,
}

impl SessionEnd {
    pub fn exit_code(self) -> i32 {
        match self {
            SessionEnd::Locked => 1,
            SessionEnd::Quit | SessionEnd::Expired | SessionEnd::InputClosed => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    Ended(SessionEnd),
}

enum Read {
    Line(String),
    Expired,
    Closed,
}

/// One typed line without its terminator. Bytes that are not UTF-8 become
/// U+FFFD, which every menu rejects like any other bad choice.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(&['\r', '\n'][..])
        .to_string()
}

pub struct SessionLoop<R> {
    input: R,
    buf: Vec<u8>,
    supervisor: Arc<SessionSupervisor>,
    expired: watch::Receiver<bool>,
}

impl<R: AsyncBufRead + Unpin> SessionLoop<R> {
    pub fn new(reader: R, supervisor: Arc<SessionSupervisor>) -> Self {
        let expired = supervisor.subscribe();
        Self { input: reader, buf: Vec::new(), supervisor, expired }
    }

    pub fn supervisor(&self) -> &Arc<SessionSupervisor> {
        &self.supervisor
    }

    async fn next_line(&mut self) -> Result<Read> {
        self.buf.clear();
        let read = tokio::select! {
            biased;
            _ = self.expired.wait_for(|expired| *expired) => return Ok(Read::Expired),
            read = self.input.read_until(b'\n', &mut self.buf) => read?,
        };
        if read == 0 {
            return Ok(Read::Closed);
        }
        Ok(Read::Line(decode_line(&self.buf)))
    }

    fn end_expired<W: Renderer>(&self, renderer: &mut W) -> SessionEnd {
        renderer.notice(&Notice::Error(UssdError::SessionExpired.to_string()));
        SessionEnd::Expired
    }

    /// Start-up PIN gate. Badly formatted PINs are rejected before they reach
    /// the ledger and do not count as attempts.
    pub async fn authenticate<W: Renderer>(
        &mut self,
        ledger: &SharedLedger,
        renderer: &mut W,
    ) -> Result<AuthOutcome> {
        let account = lock(ledger).account_number().to_string();
        renderer.screen(&Screen {
            title: "MVola".to_string(),
            lines: vec![format!("Compte: {}", account)],
        });

        loop {
            if !self.supervisor.check_session() {
                return Ok(AuthOutcome::Ended(self.end_expired(renderer)));
            }
            renderer.prompt(PIN_PROMPT);
            let pin = match self.next_line().await? {
                Read::Line(line) => line.trim().to_string(),
                Read::Expired => return Ok(AuthOutcome::Ended(self.end_expired(renderer))),
                Read::Closed => return Ok(AuthOutcome::Ended(SessionEnd::InputClosed)),
            };
            self.supervisor.update_activity();

            if pin == "0" {
                renderer.notice(&Notice::Info(GOODBYE.to_string()));
                return Ok(AuthOutcome::Ended(SessionEnd::Quit));
            }
            if let Err(e) = validate_pin_format(&pin) {
                renderer.notice(&Notice::Error(e.to_string()));
                continue;
            }

            let mut guard = lock(ledger);
            match guard.verify_pin(&pin) {
                Ok(true) => {
                    info!(account = %account, "Session opened");
                    renderer.notice(&Notice::Success("Authentification réussie.".to_string()));
                    return Ok(AuthOutcome::Granted);
                }
                Ok(false) if guard.is_locked() => {
                    renderer.notice(&Notice::Error(UssdError::AccountLocked.to_string()));
                    return Ok(AuthOutcome::Ended(SessionEnd::Locked));
                }
                Ok(false) => renderer.notice(&Notice::Error(format!(
                    "Code PIN incorrect. Il vous reste {} tentative(s).",
                    guard.remaining_pin_attempts()
                ))),
                Err(UssdError::AccountLocked) => {
                    renderer.notice(&Notice::Error(UssdError::AccountLocked.to_string()));
                    return Ok(AuthOutcome::Ended(SessionEnd::Locked));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Drive the navigator until the user quits, the account locks, the
    /// session expires or input runs out.
    pub async fn run<W: Renderer>(
        &mut self,
        navigator: &mut Navigator,
        renderer: &mut W,
    ) -> Result<SessionEnd> {
        loop {
            if !self.supervisor.check_session() {
                return Ok(self.end_expired(renderer));
            }

            let current = navigator.current();
            renderer.screen(&current.screen());
            renderer.prompt(current.prompt());

            let line = match self.next_line().await? {
                Read::Line(line) => line,
                Read::Expired => return Ok(self.end_expired(renderer)),
                Read::Closed => {
                    info!("Input closed");
                    return Ok(SessionEnd::InputClosed);
                }
            };

            let result = navigator.handle_input(&line);
            self.supervisor.update_activity();

            match result {
                Ok(dispatch) => {
                    if let Some(notice) = &dispatch.notice {
                        renderer.notice(notice);
                    }
                    if dispatch.quit {
                        info!("Session closed by user");
                        return Ok(SessionEnd::Quit);
                    }
                }
                Err(UssdError::AccountLocked) => {
                    warn!("Session ended: account locked");
                    renderer.notice(&Notice::Error(UssdError::AccountLocked.to_string()));
                    return Ok(SessionEnd::Locked);
                }
                Err(e) if e.is_recoverable() => renderer.notice(&Notice::Error(e.to_string())),
                Err(e) => return Err(e),
            }
        }
    }
}
