use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid snapshot document: {0}")]
    InvalidSnapshot(String),

    #[error("entity key must not be empty")]
    EmptyEntityKey,

    #[error("change kind {kind} does not match values of {entity_key}.{field_name}")]
    InconsistentChange {
        entity_key: String,
        field_name: String,
        kind: String,
    },
}

pub type TypeResult<T> = Result<T, TypeError>;
