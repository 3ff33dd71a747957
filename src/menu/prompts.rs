//! Free-text entry nodes: recipient, amount, confirmation and PIN.
//!
//! Each prompt is its own stack entry so every read goes through the session
//! loop (and its timeout race) instead of nested blocking reads.

use rust_decimal::Decimal;
use tracing::info;

use super::{parse_choice, Menu, Notice, Outcome, Screen};
use crate::account::validation::{
    parse_amount, validate_account_number, validate_phone_number, validate_pin_format,
};
use crate::account::{lock, SharedLedger};
use crate::error::{Result, UssdError};
use crate::ui::format_amount;

const BACK: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferChannel {
    Mvola,
    Bank,
}

impl TransferChannel {
    pub fn label(&self) -> &'static str {
        match self {
            TransferChannel::Mvola => "MVola",
            TransferChannel::Bank => "Banque",
        }
    }

    fn validate(&self, recipient: &str) -> Result<()> {
        match self {
            TransferChannel::Mvola => validate_phone_number(recipient),
            TransferChannel::Bank => validate_account_number(recipient),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawChannel {
    Agent,
    Atm,
}

/// What an entered amount is used for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Airtime,
    CreditRequest,
    CreditRepayment,
    Withdrawal(WithdrawChannel),
    Transfer { channel: TransferChannel, recipient: String },
}

impl Operation {
    fn title(&self) -> String {
        match self {
            Operation::Airtime => "Acheter crédit".to_string(),
            Operation::CreditRequest => "Demander un crédit".to_string(),
            Operation::CreditRepayment => "Rembourser un crédit".to_string(),
            Operation::Withdrawal(WithdrawChannel::Agent) => "Retrait chez un agent".to_string(),
            Operation::Withdrawal(WithdrawChannel::Atm) => "Retrait à un ATM".to_string(),
            Operation::Transfer { channel, .. } => format!("Transfert {}", channel.label()),
        }
    }

    fn question(&self) -> &'static str {
        match self {
            Operation::Airtime => "Entrez le montant à acheter",
            Operation::CreditRequest => "Montant du crédit souhaité",
            Operation::CreditRepayment => "Montant à rembourser",
            Operation::Withdrawal(_) => "Montant à retirer",
            Operation::Transfer { .. } => "Montant à transférer",
        }
    }

    /// Apply a non-transfer operation to the ledger and describe the result
    fn apply(&self, ledger: &SharedLedger, amount: Decimal) -> Result<String> {
        let mut ledger = lock(ledger);
        let message = match self {
            Operation::Airtime => {
                ledger.withdraw_for(amount, "Achat crédit")?;
                format!("Crédit de {} acheté avec succès!", format_amount(amount))
            }
            Operation::CreditRequest => {
                ledger.deposit_for(amount, "Crédit MVola")?;
                format!("Crédit de {} accordé avec succès!", format_amount(amount))
            }
            Operation::CreditRepayment => {
                ledger.withdraw_for(amount, "Remboursement crédit")?;
                format!("Remboursement de {} effectué avec succès!", format_amount(amount))
            }
            Operation::Withdrawal(channel) => {
                let description = match channel {
                    WithdrawChannel::Agent => "Retrait agent",
                    WithdrawChannel::Atm => "Retrait ATM",
                };
                ledger.withdraw_for(amount, description)?;
                format!("Retrait de {} effectué avec succès!", format_amount(amount))
            }
            Operation::Transfer { .. } => {
                return Err(UssdError::InvalidInput(
                    "Un transfert doit être confirmé par PIN".to_string(),
                ))
            }
        };
        Ok(format!("{} Nouveau solde: {}", message, format_amount(ledger.balance())))
    }
}

/// Recipient entry for a transfer
pub struct RecipientPrompt {
    ledger: SharedLedger,
    channel: TransferChannel,
}

impl RecipientPrompt {
    pub fn new(ledger: SharedLedger, channel: TransferChannel) -> Self {
        Self { ledger, channel }
    }
}

impl Menu for RecipientPrompt {
    fn key(&self) -> &str {
        "destinataire"
    }

    fn title(&self) -> String {
        format!("Transfert {}", self.channel.label())
    }

    fn options(&self) -> Vec<String> {
        Vec::new()
    }

    fn lines(&self) -> Vec<String> {
        let question = match self.channel {
            TransferChannel::Mvola => "Numéro MVola du destinataire:",
            TransferChannel::Bank => "Numéro de compte bancaire:",
        };
        vec![question.to_string(), String::new(), "0. Retour".to_string()]
    }

    fn prompt(&self) -> &str {
        "Numéro: "
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        let recipient = input.trim();
        if recipient == BACK {
            return Ok(Outcome::back());
        }
        self.channel.validate(recipient)?;
        Ok(Outcome::push(AmountPrompt::new(
            self.ledger.clone(),
            Operation::Transfer { channel: self.channel, recipient: recipient.to_string() },
        )))
    }
}

/// Amount entry; applies the operation directly, or hands over to confirmation for transfers
pub struct AmountPrompt {
    ledger: SharedLedger,
    operation: Operation,
}

impl AmountPrompt {
    pub fn new(ledger: SharedLedger, operation: Operation) -> Self {
        Self { ledger, operation }
    }
}

impl Menu for AmountPrompt {
    fn key(&self) -> &str {
        "montant"
    }

    fn title(&self) -> String {
        self.operation.title()
    }

    fn options(&self) -> Vec<String> {
        Vec::new()
    }

    fn lines(&self) -> Vec<String> {
        vec![format!("{}:", self.operation.question()), String::new(), "0. Retour".to_string()]
    }

    fn prompt(&self) -> &str {
        "Montant: "
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        if input.trim() == BACK {
            return Ok(Outcome::back());
        }
        let amount = parse_amount(input)?;

        if let Operation::Transfer { channel, recipient } = &self.operation {
            if amount > lock(&self.ledger).balance() {
                return Err(UssdError::InsufficientFunds);
            }
            return Ok(Outcome::push(ConfirmTransfer {
                ledger: self.ledger.clone(),
                channel: *channel,
                recipient: recipient.clone(),
                amount,
            }));
        }

        let message = self.operation.apply(&self.ledger, amount)?;
        Ok(Outcome::home().with_notice(Notice::Success(message)))
    }
}

/// "1. Oui / 0. Non" before asking for the PIN
pub struct ConfirmTransfer {
    ledger: SharedLedger,
    channel: TransferChannel,
    recipient: String,
    amount: Decimal,
}

impl Menu for ConfirmTransfer {
    fn key(&self) -> &str {
        "confirmation"
    }

    fn title(&self) -> String {
        "CONFIRMATION".to_string()
    }

    fn options(&self) -> Vec<String> {
        vec!["Oui".to_string()]
    }

    fn screen(&self) -> Screen {
        Screen {
            title: self.title(),
            lines: vec![
                format!("Transférer {} vers {}", format_amount(self.amount), self.recipient),
                format!("via {} ?", self.channel.label()),
                String::new(),
                "1. Oui".to_string(),
                "0. Non".to_string(),
            ],
        }
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        if input.trim() == BACK {
            return Ok(Outcome::home().with_notice(Notice::Info("Transfert annulé.".to_string())));
        }
        parse_choice(input, self.options().len())?;
        Ok(Outcome::push(PinPrompt {
            ledger: self.ledger.clone(),
            recipient: self.recipient.clone(),
            amount: self.amount,
        }))
    }
}

/// Final PIN check; the transfer is only committed after a match
pub struct PinPrompt {
    ledger: SharedLedger,
    recipient: String,
    amount: Decimal,
}

impl Menu for PinPrompt {
    fn key(&self) -> &str {
        "pin"
    }

    fn title(&self) -> String {
        "SÉCURITÉ".to_string()
    }

    fn options(&self) -> Vec<String> {
        Vec::new()
    }

    fn lines(&self) -> Vec<String> {
        vec![
            "Veuillez entrer votre code PIN à 4 chiffres".to_string(),
            String::new(),
            "0. Retour au menu principal".to_string(),
        ]
    }

    fn prompt(&self) -> &str {
        "Code PIN: "
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        let pin = input.trim();
        if pin == BACK {
            return Ok(Outcome::home().with_notice(Notice::Info("Transfert annulé.".to_string())));
        }
        validate_pin_format(pin)?;

        let mut ledger = lock(&self.ledger);
        if !ledger.verify_pin(pin)? {
            if ledger.is_locked() {
                return Err(UssdError::AccountLocked);
            }
            return Err(UssdError::InvalidInput(format!(
                "Code PIN incorrect. Il vous reste {} tentative(s).",
                ledger.remaining_pin_attempts()
            )));
        }

        match ledger.transfer(self.amount, &self.recipient) {
            Ok(tx) => {
                info!(tx = %tx.id, recipient = %self.recipient, "Transfer committed");
                let message = format!(
                    "Transfert de {} vers {} effectué avec succès! Nouveau solde: {}",
                    format_amount(self.amount),
                    self.recipient,
                    format_amount(ledger.balance())
                );
                Ok(Outcome::home().with_notice(Notice::Success(message)))
            }
            Err(e) if e.is_recoverable() => {
                Ok(Outcome::home().with_notice(Notice::Error(e.to_string())))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Ledger, TransactionKind};
    use crate::menu::Transition;

    fn ledger() -> SharedLedger {
        Ledger::new("0340000000", "1234", Decimal::from(10_000)).unwrap().into_shared()
    }

    fn expect_push(outcome: Outcome) -> Box<dyn Menu> {
        match outcome.transition {
            Transition::Push(menu) => menu,
            other => panic!("expected push, got {:?}", other),
        }
    }

    #[test]
    fn test_recipient_validation_per_channel() {
        let mut mvola = RecipientPrompt::new(ledger(), TransferChannel::Mvola);
        assert!(matches!(mvola.handle_input("1234567890"), Err(UssdError::InvalidInput(_))));
        let next = expect_push(mvola.handle_input("0341234567").unwrap());
        assert_eq!(next.key(), "montant");

        let mut bank = RecipientPrompt::new(ledger(), TransferChannel::Bank);
        assert!(matches!(bank.handle_input("0341"), Err(UssdError::InvalidInput(_))));
        assert!(bank.handle_input("1234567890").is_ok());
        assert!(matches!(bank.handle_input("0").unwrap().transition, Transition::Back));
    }

    #[test]
    fn test_amount_prompt_applies_withdrawal() {
        let shared = ledger();
        let mut prompt = AmountPrompt::new(shared.clone(), Operation::Withdrawal(WithdrawChannel::Atm));
        let outcome = prompt.handle_input("2500").unwrap();
        assert!(matches!(outcome.transition, Transition::Home));
        assert!(matches!(outcome.notice, Some(Notice::Success(_))));

        let ledger = lock(&shared);
        assert_eq!(ledger.balance(), Decimal::from(7_500));
        let history = ledger.history();
        assert_eq!(history[0].kind, TransactionKind::Withdrawal);
        assert_eq!(history[0].description.as_deref(), Some("Retrait ATM"));
    }

    #[test]
    fn test_amount_prompt_errors_keep_ledger() {
        let shared = ledger();
        let mut prompt = AmountPrompt::new(shared.clone(), Operation::Airtime);
        assert_eq!(prompt.handle_input("abc").unwrap_err(), UssdError::InvalidAmount);
        assert_eq!(prompt.handle_input("-3").unwrap_err(), UssdError::InvalidAmount);
        assert_eq!(prompt.handle_input("20000").unwrap_err(), UssdError::InsufficientFunds);
        assert_eq!(lock(&shared).balance(), Decimal::from(10_000));
        assert!(lock(&shared).history().is_empty());
    }

    #[test]
    fn test_credit_request_deposits() {
        let shared = ledger();
        let mut prompt = AmountPrompt::new(shared.clone(), Operation::CreditRequest);
        prompt.handle_input("5000").unwrap();
        assert_eq!(lock(&shared).balance(), Decimal::from(15_000));
        assert_eq!(lock(&shared).history()[0].kind, TransactionKind::Deposit);
    }

    #[test]
    fn test_transfer_requires_confirmation_and_pin() {
        let shared = ledger();
        let mut amount = AmountPrompt::new(
            shared.clone(),
            Operation::Transfer { channel: TransferChannel::Mvola, recipient: "0341234567".to_string() },
        );
        assert_eq!(amount.handle_input("50000").unwrap_err(), UssdError::InsufficientFunds);

        let mut confirm = expect_push(amount.handle_input("3000").unwrap());
        assert_eq!(lock(&shared).balance(), Decimal::from(10_000));
        assert!(confirm.screen().lines[0].contains("0341234567"));
        assert_eq!(confirm.handle_input("2").unwrap_err(), UssdError::InvalidSelection);

        let mut pin = expect_push(confirm.handle_input("1").unwrap());
        assert!(matches!(pin.handle_input("12"), Err(UssdError::InvalidInput(_))));
        assert_eq!(lock(&shared).pin_attempts(), 0);
        assert!(matches!(pin.handle_input("9999"), Err(UssdError::InvalidInput(_))));
        assert_eq!(lock(&shared).balance(), Decimal::from(10_000));

        let outcome = pin.handle_input("1234").unwrap();
        assert!(matches!(outcome.transition, Transition::Home));
        let ledger = lock(&shared);
        assert_eq!(ledger.balance(), Decimal::from(7_000));
        let history = ledger.history();
        let tx = &history[0];
        assert_eq!(tx.kind, TransactionKind::Transfer);
        assert_eq!(tx.counterparty.as_deref(), Some("0341234567"));
    }

    #[test]
    fn test_cancel_transfer_at_confirmation() {
        let shared = ledger();
        let mut confirm = ConfirmTransfer {
            ledger: shared.clone(),
            channel: TransferChannel::Bank,
            recipient: "1234567890".to_string(),
            amount: Decimal::from(100),
        };
        let outcome = confirm.handle_input("0").unwrap();
        assert!(matches!(outcome.transition, Transition::Home));
        assert_eq!(outcome.notice, Some(Notice::Info("Transfert annulé.".to_string())));
        assert!(lock(&shared).history().is_empty());
    }

    #[test]
    fn test_pin_prompt_locks_after_third_failure() {
        let shared = ledger();
        let mut pin = PinPrompt {
            ledger: shared.clone(),
            recipient: "0341234567".to_string(),
            amount: Decimal::from(100),
        };
        assert!(matches!(pin.handle_input("0000"), Err(UssdError::InvalidInput(_))));
        assert!(matches!(pin.handle_input("0001"), Err(UssdError::InvalidInput(_))));
        assert_eq!(pin.handle_input("0002").unwrap_err(), UssdError::AccountLocked);
        assert_eq!(pin.handle_input("1234").unwrap_err(), UssdError::AccountLocked);
        assert_eq!(lock(&shared).balance(), Decimal::from(10_000));
    }
}
