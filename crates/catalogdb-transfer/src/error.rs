use catalogdb_core::error::CatalogError;
use std::{fmt, io};
use thiserror::Error as ThisError;

///
/// TransferError
///
/// Failures that stop a whole import or export. Individual bad rows are
/// reported through `RowRejection` instead.
///

#[derive(Debug, ThisError)]
pub enum TransferError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("no data found in '{collection}' to export")]
    EmptyCollection { collection: &'static str },
}

///
/// RejectReason
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RejectReason {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid type '{value}'; must be one of private_hospital, public_hospital, clinic")]
    InvalidType { value: String },

    #[error("duplicate name '{name}' found in the file")]
    DuplicateName { name: String },

    #[error("operator '{name}' not found")]
    UnknownOperator { name: String },

    #[error("unreadable row: {reason}")]
    Malformed { reason: String },
}

///
/// RowRejection
///
/// One skipped row. `line` is 1-based with the header on line 1.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RowRejection {
    pub line: u64,
    pub reason: RejectReason,
}

impl RowRejection {
    #[must_use]
    pub const fn new(line: u64, reason: RejectReason) -> Self {
        Self { line, reason }
    }
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.line, self.reason)
    }
}
