use crate::types::EntityId;
use std::fmt;
use thiserror::Error as ThisError;

///
/// CatalogError
///
/// Every failure surfaced by the catalog store to its immediate caller.
/// Nothing in the core retries on any of these.
///

#[derive(Clone, Debug, ThisError)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    IndexMissing(#[from] IndexMissingError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{collection}: no record with id {id}")]
    NotFound {
        collection: &'static str,
        id: EntityId,
    },
}

impl CatalogError {
    /// Stable classification for transports that map errors to status codes.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Reference(_) => ErrorClass::Reference,
            Self::IndexMissing(_) => ErrorClass::IndexMissing,
            Self::Batch(_) => ErrorClass::Batch,
            Self::Cursor(_) => ErrorClass::Cursor,
            Self::Config(_) => ErrorClass::Config,
            Self::NotFound { .. } => ErrorClass::NotFound,
        }
    }

    pub(crate) const fn not_found(collection: &'static str, id: EntityId) -> Self {
        Self::NotFound { collection, id }
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    Validation,
    Reference,
    IndexMissing,
    Batch,
    Cursor,
    Config,
    NotFound,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Reference => "reference",
            Self::IndexMissing => "index_missing",
            Self::Batch => "batch",
            Self::Cursor => "cursor",
            Self::Config => "config",
            Self::NotFound => "not_found",
        };

        f.write_str(label)
    }
}

///
/// ValidationError
///
/// Missing or invalid required field. No partial write happens.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidationError {
    #[error("{collection}: required field '{field}' is empty")]
    Required {
        collection: &'static str,
        field: &'static str,
    },

    #[error("{collection}: invalid value for '{field}': {reason}")]
    Invalid {
        collection: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("page size must be at least 1")]
    ZeroPageSize,
}

impl ValidationError {
    pub(crate) const fn required(collection: &'static str, field: &'static str) -> Self {
        Self::Required { collection, field }
    }

    pub(crate) fn invalid(
        collection: &'static str,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            collection,
            field,
            reason: reason.into(),
        }
    }
}

///
/// ReferenceError
///
/// A child record names a parent that does not exist at write time.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{child}.{field} references missing {parent} record {parent_id}")]
pub struct ReferenceError {
    pub child: &'static str,
    pub field: &'static str,
    pub parent: &'static str,
    pub parent_id: EntityId,
}

///
/// IndexMissingError
///
/// An ordering/predicate combination has no supporting index. Queries and
/// subscriptions fail terminally; an operator has to provision the index.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IndexMissingError {
    #[error("{collection}: no index supports ordering by '{field}'")]
    Order {
        collection: &'static str,
        field: String,
    },

    #[error("{collection}: range filter on '{range_field}' requires ordering by it, found '{order_field}'")]
    RangeOrder {
        collection: &'static str,
        range_field: String,
        order_field: String,
    },

    #[error("{collection}: no index supports filtering on '{field}'")]
    Filter {
        collection: &'static str,
        field: String,
    },

    #[error("{collection}: keyword membership is not indexed")]
    Keywords { collection: &'static str },

    #[error("{collection}: '{field}' is not stored lowercase and cannot back a case-insensitive prefix search")]
    CaseSensitive {
        collection: &'static str,
        field: String,
    },
}

///
/// BatchError
///
/// Any failed operation rolls back the whole batch; the caller may retry it.
///

#[derive(Clone, Debug, ThisError)]
pub enum BatchError {
    #[error("batch of {len} operations exceeds the maximum of {max}")]
    TooLarge { len: usize, max: usize },

    #[error("batch operation {index} failed: {source}")]
    OpFailed {
        index: usize,
        #[source]
        source: Box<CatalogError>,
    },

    /// `chunk` is zero-based, so it also counts the chunks left committed.
    #[error("chunk {chunk} failed; {chunk} earlier chunk(s) stay committed: {source}")]
    ChunkFailed {
        chunk: usize,
        #[source]
        source: Box<CatalogError>,
    },
}

///
/// CursorError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CursorError {
    #[error("invalid cursor token: {reason}")]
    Malformed { reason: String },

    #[error("cursor was issued for a different query on '{collection}'; restart from the first page")]
    SignatureMismatch { collection: &'static str },
}

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("invalid config value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
