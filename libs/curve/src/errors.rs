//! Error types for bonding-curve pricing and settlement
//!
//! Every error aborts the enclosing operation before any reserve mutation or
//! custody movement. Only [`CurveError::SlippageExceeded`] is worth retrying,
//! and only with a fresh quote.

use launchpad_config::ConfigError;
use thiserror::Error;

use crate::custody::CustodyError;

/// Failures of the checked integer helpers in [`crate::math`]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    /// Result exceeds the representable range of the widened intermediate
    #[error("Arithmetic overflow")]
    Overflow,

    /// Subtraction would go below zero
    #[error("Arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Widened result does not fit back into u64
    #[error("Value {value} does not fit in u64")]
    Narrowing { value: u128 },
}

/// Errors surfaced by quoting, trading, creation and withdrawal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error("Insufficient liquidity: requested {requested} tokens, {available} available")]
    InsufficientLiquidity { requested: u64, available: u64 },

    /// `quoted` is the total a buy would cost or the payout a sell would yield
    #[error("Slippage exceeded: quoted {quoted} lamports against limit {limit}")]
    SlippageExceeded { quoted: u64, limit: u64 },

    #[error("Bonding curve is complete")]
    CurveComplete,

    #[error("Bonding curve is not complete")]
    CurveNotComplete,

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Protocol configuration is not initialized")]
    NotInitialized,

    #[error("Fee recipient does not match the protocol configuration")]
    InvalidFeeRecipient,

    #[error("Caller is not the configured withdraw authority")]
    InvalidWithdrawAuthority,

    #[error("Unknown curve {handle}")]
    UnknownCurve { handle: String },

    #[error("Curve {handle} already exists")]
    CurveExists { handle: String },

    #[error("Invariant violated: {reason}")]
    InvariantViolation { reason: String },

    #[error(transparent)]
    Custody(#[from] CustodyError),
}

impl CurveError {
    /// Whether re-quoting and resubmitting can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CurveError::SlippageExceeded { .. })
    }

    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        CurveError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for CurveError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotInitialized => CurveError::NotInitialized,
            other => CurveError::invalid_configuration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CurveError>;
