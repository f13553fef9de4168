//! Input validation errors.
//!
//! These reject a request before the search starts. Failures of a single
//! candidate allocation are [`crate::AllocationError`] values instead and
//! never surface here.

/// Errors returned by validating entry points.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A symbol appears twice in one account.
    #[error("account {account}: duplicate position {symbol}")]
    DuplicateSymbol { account: String, symbol: String },

    /// A position references a symbol missing from the catalog.
    #[error("account {account}: {symbol} is not in the security catalog")]
    UnknownSymbol { account: String, symbol: String },

    /// A position has a negative or non-finite value.
    #[error("account {account}: {symbol} has an invalid value")]
    NegativeValue { account: String, symbol: String },

    /// A target ratio is outside `[0, 1]` or NaN.
    #[error("ratio {name} must be in [0, 1], got {value}")]
    InvalidRatio { name: &'static str, value: f64 },

    /// Asset mix, tax efficiency and expense ratio weights must sum to 100.
    #[error("score weights must sum to 100, got {sum}")]
    InvalidWeights { sum: f64 },

    /// The expense ratio baseline must be positive.
    #[error("expense ratio baseline must be > 0, got {0}")]
    InvalidBaseline(f64),

    /// A tax efficiency weight is negative or non-finite.
    #[error("tax efficiency weight for {bucket} must be finite and >= 0, got {value}")]
    InvalidTaxWeight { bucket: String, value: f64 },

    /// A security definition is malformed.
    #[error("security {symbol}: {reason}")]
    InvalidSecurity { symbol: String, reason: String },

    /// A ticker is empty, too long, or not ASCII.
    #[error("invalid symbol {0:?}: must be 1-8 ASCII bytes")]
    InvalidSymbol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
