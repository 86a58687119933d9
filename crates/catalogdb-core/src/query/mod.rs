//! Module: query
//! Responsibility: predicates, prefix ranges, ordered plans, cursor pages and
//! debounced paged search.
//! Does not own: row storage or locking; `db` hands in a borrowed `DataStore`.
//! Boundary: every ordering and predicate is checked against the
//! collection's `EntityModel` before any row is read.

pub(crate) mod cursor;
mod page;
pub(crate) mod plan;
mod predicate;
mod prefix;
mod search;

pub use page::Page;
pub(crate) use page::read_page;
pub use predicate::Predicate;
pub use prefix::prefix_query;
pub use search::{PagedSearch, next_settled_term, run_search};
