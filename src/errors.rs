use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Invariant violations rejected when a domain value is built or mutated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    #[error("irregular schedule needs at least one installment")]
    EmptyInstallments,
    #[error("amount must not be negative: {0}")]
    NegativeAmount(Decimal),
    #[error("payment of {attempted} exceeds remaining {remaining} on transaction {transaction_id}")]
    Overpayment {
        transaction_id: Uuid,
        attempted: Decimal,
        remaining: Decimal,
    },
    #[error("transaction {0} is written off and accepts no payments")]
    WrittenOff(Uuid),
    #[error("provisioning needs at least one installment")]
    ZeroInstallments,
}

/// Error type shared by configuration, snapshot loading, and the CLI.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
