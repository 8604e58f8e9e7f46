use thiserror::Error;

#[derive(Error, Debug)]
pub enum MicrocalcError {
    #[error("Invalid revenue: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("No calculation ids left to assign")]
    IdsExhausted,
}

/// Rejections of raw revenue input. Saving stops here, before the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("revenue is empty")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("revenue must be greater than zero")]
    NotPositive,

    #[error("revenue must not exceed {0}")]
    TooLarge(rust_decimal::Decimal),
}

pub type Result<T> = std::result::Result<T, MicrocalcError>;

impl<T> From<std::sync::PoisonError<T>> for MicrocalcError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        MicrocalcError::LockPoisoned
    }
}
