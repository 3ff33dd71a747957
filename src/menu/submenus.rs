//! Second-level menus reached from the main menu

use rust_decimal::Decimal;

use super::prompts::{AmountPrompt, Operation, RecipientPrompt, TransferChannel, WithdrawChannel};
use super::{parse_choice, Menu, Notice, Outcome};
use crate::account::{lock, SharedLedger};
use crate::error::{Result, UssdError};
use crate::ui::{format_amount, format_date};

fn labels(options: &[&str]) -> Vec<String> {
    options.iter().map(|s| s.to_string()).collect()
}

pub struct BuyCreditMenu {
    ledger: SharedLedger,
}

impl BuyCreditMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for BuyCreditMenu {
    fn key(&self) -> &str {
        "1"
    }

    fn title(&self) -> String {
        "Acheter crédit ou Offre Yas".to_string()
    }

    fn options(&self) -> Vec<String> {
        labels(&["Acheter crédit", "Offre Yas", "Retour"])
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        match parse_choice(input, self.options().len())? {
            1 => Ok(Outcome::push(AmountPrompt::new(self.ledger.clone(), Operation::Airtime))),
            2 => Ok(Outcome::push(YasOfferMenu::new(self.ledger.clone()))),
            _ => Ok(Outcome::back()),
        }
    }
}

/// Data bundles: (price in Ariary, volume label)
pub const YAS_OFFERS: [(i64, &str); 3] = [(1_000, "1 Go"), (2_000, "2 Go"), (5_000, "5 Go")];

pub struct YasOfferMenu {
    ledger: SharedLedger,
}

impl YasOfferMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for YasOfferMenu {
    fn key(&self) -> &str {
        "yas"
    }

    fn title(&self) -> String {
        "Offres Yas disponibles".to_string()
    }

    fn options(&self) -> Vec<String> {
        let mut options: Vec<String> = YAS_OFFERS
            .iter()
            .map(|(price, volume)| format!("{} - {}", format_amount(Decimal::from(*price)), volume))
            .collect();
        options.push("Retour".to_string());
        options
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        let choice = parse_choice(input, self.options().len())?;
        let Some((price, volume)) = YAS_OFFERS.get(choice - 1) else {
            return Ok(Outcome::back());
        };

        let price = Decimal::from(*price);
        let mut ledger = lock(&self.ledger);
        ledger.withdraw_for(price, &format!("Offre Yas {}", volume))?;
        let message = format!(
            "Offre Yas {} ({}) activée avec succès! Nouveau solde: {}",
            volume,
            format_amount(price),
            format_amount(ledger.balance())
        );
        Ok(Outcome::home().with_notice(Notice::Success(message)))
    }
}

pub struct TransferMenu {
    ledger: SharedLedger,
}

impl TransferMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for TransferMenu {
    fn key(&self) -> &str {
        "2"
    }

    fn title(&self) -> String {
        "Transférer argent".to_string()
    }

    fn options(&self) -> Vec<String> {
        labels(&["Vers un numéro MVola", "Vers un compte bancaire", "Retour"])
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        let channel = match parse_choice(input, self.options().len())? {
            1 => TransferChannel::Mvola,
            2 => TransferChannel::Bank,
            _ => return Ok(Outcome::back()),
        };
        Ok(Outcome::push(RecipientPrompt::new(self.ledger.clone(), channel)))
    }
}

pub struct MvolaCreditMenu {
    ledger: SharedLedger,
}

impl MvolaCreditMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for MvolaCreditMenu {
    fn key(&self) -> &str {
        "3"
    }

    fn title(&self) -> String {
        "Mvola Credit ou Epargne".to_string()
    }

    fn options(&self) -> Vec<String> {
        labels(&["Demander un crédit", "Rembourser un crédit", "Voir mes crédits", "Retour"])
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        match parse_choice(input, self.options().len())? {
            1 => Ok(Outcome::push(AmountPrompt::new(self.ledger.clone(), Operation::CreditRequest))),
            2 => Ok(Outcome::push(AmountPrompt::new(self.ledger.clone(), Operation::CreditRepayment))),
            3 => {
                let balance = lock(&self.ledger).balance();
                Ok(Outcome::stay()
                    .with_notice(Notice::Info(format!("Solde actuel: {}", format_amount(balance)))))
            }
            _ => Ok(Outcome::back()),
        }
    }
}

pub struct WithdrawMenu {
    ledger: SharedLedger,
}

impl WithdrawMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for WithdrawMenu {
    fn key(&self) -> &str {
        "4"
    }

    fn title(&self) -> String {
        "Retrait argent".to_string()
    }

    fn options(&self) -> Vec<String> {
        labels(&["Retrait chez un agent", "Retrait à un ATM", "Retour"])
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        let channel = match parse_choice(input, self.options().len())? {
            1 => WithdrawChannel::Agent,
            2 => WithdrawChannel::Atm,
            _ => return Ok(Outcome::back()),
        };
        Ok(Outcome::push(AmountPrompt::new(self.ledger.clone(), Operation::Withdrawal(channel))))
    }
}

/// Accepts only "1" (Retour); the balance is read at render time.
pub struct BalanceMenu {
    ledger: SharedLedger,
}

impl BalanceMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for BalanceMenu {
    fn key(&self) -> &str {
        "5"
    }

    fn title(&self) -> String {
        "Voir solde".to_string()
    }

    fn options(&self) -> Vec<String> {
        labels(&["Retour"])
    }

    fn lines(&self) -> Vec<String> {
        let ledger = lock(&self.ledger);
        vec![
            format!("Compte: {}", ledger.account_number()),
            format!("Solde actuel: {}", format_amount(ledger.balance())),
        ]
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        if input.trim() == "1" {
            Ok(Outcome::back())
        } else {
            Err(UssdError::InvalidSelection)
        }
    }
}

pub struct HistoryMenu {
    ledger: SharedLedger,
}

impl HistoryMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for HistoryMenu {
    fn key(&self) -> &str {
        "6"
    }

    fn title(&self) -> String {
        "Historique des transactions".to_string()
    }

    fn options(&self) -> Vec<String> {
        labels(&["Retour"])
    }

    fn lines(&self) -> Vec<String> {
        let history = lock(&self.ledger).history();
        if history.is_empty() {
            return vec!["Aucune transaction à afficher.".to_string()];
        }
        history
            .iter()
            .map(|tx| {
                let mut line = format!(
                    "{} | {:<9} | {}",
                    format_date(&tx.timestamp),
                    tx.kind.label(),
                    format_amount(tx.signed_amount())
                );
                if let Some(counterparty) = &tx.counterparty {
                    line.push_str(&format!(" → {}", counterparty));
                }
                line
            })
            .collect()
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        if input.trim() == "1" {
            Ok(Outcome::back())
        } else {
            Err(UssdError::InvalidSelection)
        }
    }
}
