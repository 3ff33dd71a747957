//! Transaction record types for the in-memory ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Account identifier - phone-style account number
pub type AccountNumber = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Transfer => "TRANSFER",
        }
    }

    /// Short French label used on the history screen
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DÉPÔT",
            TransactionKind::Withdrawal => "RETRAIT",
            TransactionKind::Transfer => "TRANSFERT",
        }
    }

    /// Whether this kind takes money out of the account
    pub fn is_debit(&self) -> bool {
        !matches!(self, TransactionKind::Deposit)
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed ledger entry. `amount` is always positive; `kind` carries the direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
    pub counterparty: Option<AccountNumber>,
}

impl Transaction {
    pub(crate) fn new(
        kind: TransactionKind,
        amount: Decimal,
        description: Option<String>,
        counterparty: Option<AccountNumber>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            timestamp: Utc::now(),
            description,
            counterparty,
        }
    }

    /// Balance delta this entry applied
    pub fn signed_amount(&self) -> Decimal {
        if self.kind.is_debit() {
            -self.amount
        } else {
            self.amount
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_amount_follows_kind() {
        let deposit = Transaction::new(TransactionKind::Deposit, Decimal::from(500), None, None);
        let transfer = Transaction::new(
            TransactionKind::Transfer,
            Decimal::from(200),
            None,
            Some("0341234567".to_string()),
        );
        assert_eq!(deposit.signed_amount(), Decimal::from(500));
        assert_eq!(transfer.signed_amount(), Decimal::from(-200));
        assert_ne!(deposit.id, transfer.id);
    }

    #[test]
    fn test_kind_displays_uppercase() {
        assert_eq!(TransactionKind::Withdrawal.to_string(), "WITHDRAWAL");
        assert_eq!(TransactionKind::Deposit.label(), "DÉPÔT");
    }
}
