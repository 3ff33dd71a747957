//! Account ledger for the USSD session
//!
//! - Balance and ordered transaction log for one account
//! - PIN verification with lockout after repeated failures
//! - Format checks for PINs, recipients and amounts typed at the prompts

pub mod types;
pub mod auth;
pub mod ledger;
pub mod validation;

pub use types::{AccountNumber, Transaction, TransactionKind};
pub use auth::PinHash;
pub use ledger::{lock, Ledger, SharedLedger, DEFAULT_MAX_PIN_ATTEMPTS};
