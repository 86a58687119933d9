//! Module: catalogdb-transfer
//! Responsibility: CSV import, export and templates for the catalog collections.
//! Does not own: field validation; every imported row is re-validated by the
//! store when its batch is committed.
//! Boundary: reaches the store only through `Collection` reads and
//! `commit_chunked`, so imports get the same atomicity as any other bulk write.
#![warn(unreachable_pub)]

mod error;
mod export;
mod import;
mod template;

pub use error::{RejectReason, RowRejection, TransferError};
pub use export::{export_advertisements, export_facilities, export_operators, export_terminals};
pub use import::{ImportReport, import_facilities, import_operators, import_terminals};
pub use template::{CsvKind, template};

///
/// CONSTANTS
///

/// Prefixed to every generated file so spreadsheet tools detect UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

const TRUE_CELL: &str = "TRUE";
const FALSE_CELL: &str = "FALSE";

/// Separator for list fields such as phone numbers, inside a single cell.
const LIST_SEPARATOR: char = ',';

// cells

const fn bool_cell(value: bool) -> &'static str {
    if value { TRUE_CELL } else { FALSE_CELL }
}

/// Only a literal `TRUE` (any case) counts as true.
fn parse_bool(cell: Option<&str>) -> bool {
    cell.is_some_and(|cell| cell.trim().eq_ignore_ascii_case(TRUE_CELL))
}

fn split_list(cell: Option<&str>) -> Vec<String> {
    cell.map(|cell| {
        cell.split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn join_list(items: &[String]) -> String {
    items.join(&LIST_SEPARATOR.to_string())
}
