//! Core of the denormalized catalog store: typed collections with write-time
//! keyword indexing, prefix and cursor queries, atomic batches, shared live
//! subscriptions, and the operator snapshot copied into every terminal.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod index;
pub mod model;
pub mod obs;
pub mod query;
pub mod traits;
pub mod types;
pub mod value;

///
/// CONSTANTS
///

/// Page size used when a caller does not pass one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Quiet period before a changed search term issues a new first page.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Largest number of operations committed atomically in one batch.
pub const MAX_BATCH_SIZE: usize = 500;

/// Upper bound appended to a prefix to close its range. Private-use code
/// point, greater than any character expected in catalog text.
pub const HIGH_SENTINEL: char = '\u{f8ff}';

/// Display name for a terminal whose operator cannot be resolved live.
pub const UNKNOWN_OPERATOR: &str = "Unknown Operator";

///
/// Prelude
///
/// Domain vocabulary only. Errors and store internals stay one level down.
///

pub mod prelude {
    pub use crate::{
        db::{BatchOp, CatalogStore, Collection, ReadPolicy, Record},
        entity::{
            Advertisement, AdvertisementDraft, AppConfig, AppConfigPatch, Facility,
            FacilityDraft, FacilityType, Operator, OperatorDraft, Terminal, TerminalDraft,
        },
        query::{Page, Predicate, prefix_query},
        traits::EntityKind,
        types::EntityId,
        value::Value,
    };
}
