//! Balance, PIN lockout and transaction log for a single account

use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use super::auth::PinHash;
use super::types::{AccountNumber, Transaction, TransactionKind};
use crate::error::{Result, UssdError};

pub const DEFAULT_MAX_PIN_ATTEMPTS: u32 = 3;

/// Ledger handle shared between the menus of one session
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Lock a shared ledger. Poisoning is ignored: every operation commits in a single step.
pub fn lock(ledger: &SharedLedger) -> MutexGuard<'_, Ledger> {
    ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct Ledger {
    account_number: AccountNumber,
    balance: Decimal,
    pin: PinHash,
    pin_attempts: u32,
    max_pin_attempts: u32,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(
        account_number: impl Into<AccountNumber>,
        pin: &str,
        opening_balance: Decimal,
    ) -> Result<Self> {
        Ok(Self {
            account_number: account_number.into(),
            balance: opening_balance.max(Decimal::ZERO),
            pin: PinHash::new(pin)?,
            pin_attempts: 0,
            max_pin_attempts: DEFAULT_MAX_PIN_ATTEMPTS,
            transactions: Vec::new(),
        })
    }

    pub fn with_max_pin_attempts(mut self, max: u32) -> Self {
        self.max_pin_attempts = max.max(1);
        self
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Defensive copy of the log, oldest first
    pub fn history(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    pub fn pin_attempts(&self) -> u32 {
        self.pin_attempts
    }

    pub fn remaining_pin_attempts(&self) -> u32 {
        self.max_pin_attempts.saturating_sub(self.pin_attempts)
    }

    pub fn is_locked(&self) -> bool {
        self.pin_attempts >= self.max_pin_attempts
    }

    /// Compare `candidate` with the stored PIN.
    ///
    /// Once the failure counter has reached the maximum every call fails with
    /// `AccountLocked`, even for the right PIN, and the counter is left alone.
    pub fn verify_pin(&mut self, candidate: &str) -> Result<bool> {
        if self.is_locked() {
            warn!(account = %self.account_number, "PIN check refused: account locked");
            return Err(UssdError::AccountLocked);
        }

        if self.pin.matches(candidate) {
            self.pin_attempts = 0;
            return Ok(true);
        }

        self.pin_attempts += 1;
        warn!(
            account = %self.account_number,
            attempts = self.pin_attempts,
            max = self.max_pin_attempts,
            "Wrong PIN"
        );
        Ok(false)
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<Transaction> {
        self.deposit_for(amount, "Dépôt")
    }

    /// Credit with a custom description (credit request, top-up...)
    pub fn deposit_for(&mut self, amount: Decimal, description: &str) -> Result<Transaction> {
        Self::check_amount(amount)?;
        let new_balance = self
            .balance
            .checked_add(amount)
            .ok_or(UssdError::InvalidAmount)?;

        Ok(self.commit(new_balance, TransactionKind::Deposit, amount, description, None))
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<Transaction> {
        self.withdraw_for(amount, "Retrait")
    }

    /// Debit with a custom description (airtime purchase, repayment...)
    pub fn withdraw_for(&mut self, amount: Decimal, description: &str) -> Result<Transaction> {
        let new_balance = self.debited_balance(amount)?;
        Ok(self.commit(new_balance, TransactionKind::Withdrawal, amount, description, None))
    }

    /// Debit-only transfer: `counterparty` lives outside this ledger and no
    /// matching credit is produced here.
    pub fn transfer(&mut self, amount: Decimal, counterparty: &str) -> Result<Transaction> {
        let new_balance = self.debited_balance(amount)?;
        Ok(self.commit(
            new_balance,
            TransactionKind::Transfer,
            amount,
            "Transfert",
            Some(counterparty.to_string()),
        ))
    }

    fn check_amount(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(UssdError::InvalidAmount);
        }
        Ok(())
    }

    fn debited_balance(&self, amount: Decimal) -> Result<Decimal> {
        Self::check_amount(amount)?;
        if amount > self.balance {
            return Err(UssdError::InsufficientFunds);
        }
        Ok(self.balance - amount)
    }

    // All validation happens before this point; balance and log move together.
    fn commit(
        &mut self,
        new_balance: Decimal,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
        counterparty: Option<AccountNumber>,
    ) -> Transaction {
        let tx = Transaction::new(kind, amount, Some(description.to_string()), counterparty);
        self.balance = new_balance;
        self.transactions.push(tx.clone());
        info!(
            account = %self.account_number,
            tx = %tx.id,
            kind = %kind,
            %amount,
            balance = %self.balance,
            "Ledger updated"
        );
        tx
    }
}
