//! Module: index
//! Responsibility: write-time search index derivation.
//! Does not own: query-time matching; `query` reads the persisted keyword sets.

mod keyword;

pub use keyword::{KeywordSet, index, normalize_token};
