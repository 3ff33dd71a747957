//! Input format checks applied at the prompts, before anything reaches the ledger

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{Result, UssdError};

pub const PIN_LENGTH: usize = 4;

/// Decimal places an amount may carry
pub const AMOUNT_SCALE: u32 = 2;

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Exactly four ASCII digits.
pub fn validate_pin_format(pin: &str) -> Result<()> {
    if pin.len() == PIN_LENGTH && all_digits(pin) {
        Ok(())
    } else {
        Err(UssdError::InvalidInput(
            "PIN invalide. Format attendu: 4 chiffres".to_string(),
        ))
    }
}

/// Local mobile number: `0`, an operator digit 3-9, then eight digits.
pub fn validate_phone_number(phone: &str) -> Result<()> {
    let bytes = phone.as_bytes();
    let valid = bytes.len() == 10
        && all_digits(phone)
        && bytes[0] == b'0'
        && (b'3'..=b'9').contains(&bytes[1]);
    if valid {
        Ok(())
    } else {
        Err(UssdError::InvalidInput(
            "Numéro de téléphone invalide. Format attendu: 0XXXXXXXXX".to_string(),
        ))
    }
}

/// Bank account number: ten digits.
pub fn validate_account_number(account: &str) -> Result<()> {
    if account.len() == 10 && all_digits(account) {
        Ok(())
    } else {
        Err(UssdError::InvalidInput(
            "Numéro de compte invalide. Format attendu: 10 chiffres".to_string(),
        ))
    }
}

/// Parse a user-typed amount. Spaces are accepted as thousands separators and
/// a comma as the decimal mark. Anything unparsable, not strictly positive or
/// finer than a centime is `InvalidAmount`.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let amount = Decimal::from_str(&cleaned).map_err(|_| UssdError::InvalidAmount)?;
    if amount <= Decimal::ZERO || amount.normalize().scale() > AMOUNT_SCALE {
        return Err(UssdError::InvalidAmount);
    }
    Ok(amount)
}
