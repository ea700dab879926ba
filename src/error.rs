use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("no {category} record found for {identifier}")]
    NotFound { category: String, identifier: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },
    #[error("unknown ledger period: {0}")]
    InvalidPeriod(String),
    #[error("a transaction is already being processed")]
    AlreadyProcessing,
    #[error("settlement timed out")]
    Timeout,
    #[error("gateway failure: {0}")]
    GatewayFailure(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
