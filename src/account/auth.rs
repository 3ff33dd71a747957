//! PIN storage and comparison

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::error::{Result, UssdError};

/// Argon2id cost for a 4-digit PIN: 1 MiB, one pass, one lane.
const PIN_M_COST_KIB: u32 = 1024;
const PIN_T_COST: u32 = 1;
const PIN_P_COST: u32 = 1;

fn pin_hasher() -> Argon2<'static> {
    let params = Params::new(PIN_M_COST_KIB, PIN_T_COST, PIN_P_COST, None).unwrap_or_default();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Argon2id PHC string of the account PIN. The clear PIN is never kept.
#[derive(Clone)]
pub struct PinHash {
    phc: String,
}

impl PinHash {
    pub fn new(pin: &str) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = pin_hasher()
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|e| UssdError::Config(format!("PIN hashing failed: {}", e)))?
            .to_string();
        Ok(Self { phc })
    }

    /// Length and format of `candidate` are not checked here.
    pub fn matches(&self, candidate: &str) -> bool {
        match PasswordHash::new(&self.phc) {
            Ok(parsed) => pin_hasher()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for PinHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // algorithm, version and params only; salt and hash stay out of logs
        let header: Vec<&str> = self.phc.split('$').take(4).collect();
        write!(f, "PinHash({}$…)", header.join("$"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_matching() {
        let pin = PinHash::new("1234").unwrap();
        assert!(pin.matches("1234"));
        assert!(!pin.matches("4321"));
        assert!(!pin.matches("12345"));
        assert!(!pin.matches(""));
    }

    #[test]
    fn test_same_pin_different_salt() {
        let a = PinHash::new("0000").unwrap();
        let b = PinHash::new("0000").unwrap();
        assert_ne!(a.phc, b.phc);
        assert!(a.matches("0000") && b.matches("0000"));
    }

    #[test]
    fn test_stored_as_argon2id_phc() {
        let pin = PinHash::new("1234").unwrap();
        assert!(pin.phc.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
    }

    #[test]
    fn test_debug_does_not_leak_pin() {
        let pin = PinHash::new("9876").unwrap();
        let shown = format!("{:?}", pin);
        assert!(!shown.contains("9876"));
        assert_eq!(shown, "PinHash($argon2id$v=19$m=1024,t=1,p=1$…)");
    }
}
