//! Module: export
//! Responsibility: serialize whole collections to CSV.
//! Does not own: file naming or delivery; callers pass any `io::Write`.

use crate::{UTF8_BOM, bool_cell, error::TransferError, join_list, template::CsvKind};
use catalogdb_core::{
    db::{CatalogStore, Collection},
    entity::{Advertisement, Facility, Operator, Terminal},
    traits::EntityKind,
};
use std::io::Write;
use tracing::info;

/// Write every operator ordered by `nameLower`. Returns the row count.
pub fn export_operators<W: Write>(store: &CatalogStore, out: W) -> Result<usize, TransferError> {
    export_rows(&store.operators(), CsvKind::Operators, out, |op: &Operator| {
        vec![op.name.clone(), bool_cell(op.verified).to_string()]
    })
}

/// Write every terminal ordered by `operatorNameLower`, using the operator
/// name copied into each terminal.
pub fn export_terminals<W: Write>(store: &CatalogStore, out: W) -> Result<usize, TransferError> {
    export_rows(&store.terminals(), CsvKind::Terminals, out, |terminal: &Terminal| {
        vec![
            terminal.operator_name.clone(),
            terminal.terminal_name.clone().unwrap_or_default(),
            terminal.city.clone(),
            terminal.address.clone(),
            join_list(&terminal.phones),
        ]
    })
}

pub fn export_facilities<W: Write>(store: &CatalogStore, out: W) -> Result<usize, TransferError> {
    export_rows(&store.facilities(), CsvKind::Facilities, out, |facility: &Facility| {
        vec![
            facility.name.clone(),
            facility.kind.as_str().to_string(),
            facility.city.clone(),
            facility.address.clone(),
            join_list(&facility.phones),
            bool_cell(facility.verified).to_string(),
        ]
    })
}

pub fn export_advertisements<W: Write>(
    store: &CatalogStore,
    out: W,
) -> Result<usize, TransferError> {
    export_rows(&store.advertisements(), CsvKind::Advertisements, out, |ad: &Advertisement| {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();

        vec![
            ad.title.clone(),
            optional(&ad.description),
            join_list(&ad.contact),
            ad.address.clone(),
            optional(&ad.map),
            optional(&ad.image),
            optional(&ad.website),
            optional(&ad.facebook),
            optional(&ad.telegram),
            optional(&ad.tiktok),
            bool_cell(ad.enabled).to_string(),
            bool_cell(ad.verified).to_string(),
        ]
    })
}

// Phase 1: read the ordered snapshot and refuse an empty collection.
// Phase 2: BOM, header row, then one row per record.
fn export_rows<E, W, F>(
    collection: &Collection<E>,
    kind: CsvKind,
    mut out: W,
    row: F,
) -> Result<usize, TransferError>
where
    E: EntityKind,
    W: Write,
    F: Fn(&E) -> Vec<String>,
{
    let path = E::MODEL.path;
    let records = collection.list_all(kind.export_order())?;
    if records.is_empty() {
        return Err(TransferError::EmptyCollection { collection: path });
    }

    out.write_all(UTF8_BOM.as_bytes())?;
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(kind.headers())?;
    for record in &records {
        writer.write_record(row(&record.entity))?;
    }
    writer.flush()?;

    info!(collection = path, rows = records.len(), "csv export finished");

    Ok(records.len())
}
