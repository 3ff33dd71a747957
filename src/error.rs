use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UssdError {
    #[error("Le montant doit être supérieur à 0")]
    InvalidAmount,
    #[error("Solde insuffisant")]
    InsufficientFunds,
    #[error("Compte bloqué. Trop de tentatives incorrectes.")]
    AccountLocked,
    #[error("Option invalide. Veuillez réessayer.")]
    InvalidSelection,
    #[error("Session expirée. Veuillez vous reconnecter.")]
    SessionExpired,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl UssdError {
    /// Errors the user can fix by typing something else at the same prompt
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UssdError::InvalidAmount
                | UssdError::InsufficientFunds
                | UssdError::InvalidSelection
                | UssdError::InvalidInput(_)
        )
    }
}

impl From<std::io::Error> for UssdError {
    fn from(err: std::io::Error) -> Self {
        UssdError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UssdError>;
