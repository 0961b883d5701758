//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when the target row of an operation does not exist.
//! - [`ReferenceNotFound`] thrown when a caller-supplied foreign key (day,
//!   category, budget, currency) points at nothing.
//! - [`InvalidAmount`] thrown when an amount is not a decimal with at most two
//!   fractional digits, or does not fit the stored precision.
//! - [`InvalidRange`] thrown when a statistics year/month is out of bounds.
//! - [`UserHasNoBudgets`] thrown when statistics are requested for a user that
//!   owns no budget at all.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`ReferenceNotFound`]: EngineError::ReferenceNotFound
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidRange`]: EngineError::InvalidRange
//!  [`UserHasNoBudgets`]: EngineError::UserHasNoBudgets
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Referenced {0} not found!")]
    ReferenceNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("User \"{0}\" has no budgets")]
    UserHasNoBudgets(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Stable, machine-readable code for the error kind.
    ///
    /// Transport layers map these to status codes; the message text is free to
    /// change, the code is not.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::ReferenceNotFound(_) => "reference_not_found",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidRange(_) => "invalid_range",
            Self::UserHasNoBudgets(_) => "user_has_no_budgets",
            Self::ExistingKey(_) => "existing_key",
            Self::InvalidName(_) => "invalid_name",
            Self::Database(_) => "database",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ReferenceNotFound(a), Self::ReferenceNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidRange(a), Self::InvalidRange(b)) => a == b,
            (Self::UserHasNoBudgets(a), Self::UserHasNoBudgets(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
