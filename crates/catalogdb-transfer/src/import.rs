//! Module: import
//! Responsibility: parse catalog CSV files into insert batches.
//! Does not own: atomicity; valid rows go through `commit_chunked`.
//!
//! Rows are checked one at a time. A bad row is rejected with its line number
//! and never stops the rest of the file.

use crate::{
    error::{RejectReason, RowRejection, TransferError},
    parse_bool, split_list,
};
use catalogdb_core::{
    db::{BatchOp, CatalogStore, Collection},
    entity::{
        Facility, FacilityDraft, FacilityType, Operator, OperatorDraft, Terminal, TerminalDraft,
    },
    traits::EntityKind,
    types::EntityId,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{
    collections::{HashMap, HashSet},
    io::Read,
    str::FromStr,
};
use tracing::{info, warn};

///
/// ImportReport
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportReport {
    pub collection: &'static str,

    /// Ids of the inserted records, in file order.
    pub imported: Vec<EntityId>,

    pub rejected: Vec<RowRejection>,
}

impl ImportReport {
    #[must_use]
    pub const fn imported_count(&self) -> usize {
        self.imported.len()
    }

    /// True when every data row in the file was imported.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

///
/// import_operators
///
/// Columns: `name` (required), `isVerified`. Names repeated within the file,
/// compared case-insensitively, are rejected after their first occurrence.
///

pub fn import_operators<R: Read>(
    store: &CatalogStore,
    input: R,
) -> Result<ImportReport, TransferError> {
    let mut reader = csv_reader(input);
    let columns = Columns::read(&mut reader, &["name"])?;
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();
    let mut ops = Vec::new();

    for (line, record) in read_rows(&mut reader, &mut rejected) {
        match operator_row(&columns, &record, &mut seen) {
            Ok(draft) => ops.push(BatchOp::Insert(draft)),
            Err(reason) => reject(&mut rejected, Operator::MODEL.path, line, reason),
        }
    }

    commit(&store.operators(), ops, rejected)
}

fn operator_row(
    columns: &Columns,
    record: &StringRecord,
    seen: &mut HashSet<String>,
) -> Result<OperatorDraft, RejectReason> {
    let name = columns.require(record, "name")?;
    if !seen.insert(name.to_lowercase()) {
        return Err(RejectReason::DuplicateName {
            name: name.to_string(),
        });
    }

    Ok(OperatorDraft::new(name).verified(parse_bool(columns.get(record, "isVerified"))))
}

///
/// import_terminals
///
/// Columns: `operatorName`, `city`, `address` (required), `terminalName`,
/// `phones`. The operator name is matched case-insensitively against the
/// operators already in the store; when several share a name the one with the
/// lowest id wins.
///

pub fn import_terminals<R: Read>(
    store: &CatalogStore,
    input: R,
) -> Result<ImportReport, TransferError> {
    let mut reader = csv_reader(input);
    let columns = Columns::read(&mut reader, &["operatorName", "city", "address"])?;
    let operators = operator_ids_by_name(store)?;
    let mut rejected = Vec::new();
    let mut ops = Vec::new();

    for (line, record) in read_rows(&mut reader, &mut rejected) {
        match terminal_row(&columns, &record, &operators) {
            Ok(draft) => ops.push(BatchOp::Insert(draft)),
            Err(reason) => reject(&mut rejected, Terminal::MODEL.path, line, reason),
        }
    }

    commit(&store.terminals(), ops, rejected)
}

fn terminal_row(
    columns: &Columns,
    record: &StringRecord,
    operators: &HashMap<String, EntityId>,
) -> Result<TerminalDraft, RejectReason> {
    let operator_name = columns.require(record, "operatorName")?;
    let city = columns.require(record, "city")?;
    let address = columns.require(record, "address")?;

    let Some(&operator_id) = operators.get(&operator_name.to_lowercase()) else {
        return Err(RejectReason::UnknownOperator {
            name: operator_name.to_string(),
        });
    };

    let mut draft = TerminalDraft::new(operator_id, city, address)
        .phones(split_list(columns.get(record, "phones")));
    if let Some(terminal_name) = columns.get(record, "terminalName") {
        draft = draft.terminal_name(terminal_name);
    }

    Ok(draft)
}

// Lowercase name -> id. Rows come back ordered by `nameLower` with ties
// broken by id, so the first insert for a key is the lowest id.
fn operator_ids_by_name(
    store: &CatalogStore,
) -> Result<HashMap<String, EntityId>, TransferError> {
    let mut map = HashMap::new();
    for record in store.operators().list_all("nameLower")? {
        map.entry(record.entity.name_lower).or_insert(record.id);
    }

    Ok(map)
}

///
/// import_facilities
///
/// Columns: `name`, `type`, `city`, `address` (required), `phones`,
/// `isVerified`.
///

pub fn import_facilities<R: Read>(
    store: &CatalogStore,
    input: R,
) -> Result<ImportReport, TransferError> {
    let mut reader = csv_reader(input);
    let columns = Columns::read(&mut reader, &["name", "type", "city", "address"])?;
    let mut rejected = Vec::new();
    let mut ops = Vec::new();

    for (line, record) in read_rows(&mut reader, &mut rejected) {
        match facility_row(&columns, &record) {
            Ok(draft) => ops.push(BatchOp::Insert(draft)),
            Err(reason) => reject(&mut rejected, Facility::MODEL.path, line, reason),
        }
    }

    commit(&store.facilities(), ops, rejected)
}

fn facility_row(columns: &Columns, record: &StringRecord) -> Result<FacilityDraft, RejectReason> {
    let name = columns.require(record, "name")?;
    let kind = columns.require(record, "type")?;
    let city = columns.require(record, "city")?;
    let address = columns.require(record, "address")?;

    let kind = FacilityType::from_str(kind).map_err(|_| RejectReason::InvalidType {
        value: kind.to_string(),
    })?;

    Ok(FacilityDraft::new(name, kind, city, address)
        .phones(split_list(columns.get(record, "phones")))
        .verified(parse_bool(columns.get(record, "isVerified"))))
}

///
/// Columns
///
/// Header name -> column position for one file.
///

struct Columns {
    positions: HashMap<String, usize>,
}

impl Columns {
    fn read<R: Read>(
        reader: &mut csv::Reader<R>,
        required: &[&'static str],
    ) -> Result<Self, TransferError> {
        let positions: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), pos))
            .collect();

        if let Some(column) = required.iter().find(|column| !positions.contains_key(**column)) {
            return Err(TransferError::MissingColumn { column: *column });
        }

        Ok(Self { positions })
    }

    /// Trimmed cell value; blank cells and short rows read as absent.
    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        let pos = *self.positions.get(column)?;

        record
            .get(pos)
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
    }

    fn require<'r>(
        &self,
        record: &'r StringRecord,
        field: &'static str,
    ) -> Result<&'r str, RejectReason> {
        self.get(record, field)
            .ok_or(RejectReason::MissingField { field })
    }
}

// Flexible so short rows reach row validation instead of failing the file.
fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input)
}

// Data rows with their 1-based line numbers. Blank rows are skipped and
// unreadable ones are rejected in place.
fn read_rows<R: Read>(
    reader: &mut csv::Reader<R>,
    rejected: &mut Vec<RowRejection>,
) -> Vec<(u64, StringRecord)> {
    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let fallback_line = idx as u64 + 2;
        match result {
            Ok(record) => {
                if record.iter().all(|cell| cell.trim().is_empty()) {
                    continue;
                }
                let line = record.position().map_or(fallback_line, csv::Position::line);
                rows.push((line, record));
            }
            Err(err) => {
                let line = err.position().map_or(fallback_line, csv::Position::line);
                warn!(line, error = %err, "skipping unreadable csv row");
                rejected.push(RowRejection::new(
                    line,
                    RejectReason::Malformed {
                        reason: err.to_string(),
                    },
                ));
            }
        }
    }

    rows
}

fn reject(
    rejected: &mut Vec<RowRejection>,
    collection: &'static str,
    line: u64,
    reason: RejectReason,
) {
    warn!(collection, line, %reason, "csv row rejected");
    rejected.push(RowRejection::new(line, reason));
}

fn commit<E: EntityKind>(
    collection: &Collection<E>,
    ops: Vec<BatchOp<E>>,
    rejected: Vec<RowRejection>,
) -> Result<ImportReport, TransferError> {
    let path = E::MODEL.path;
    let imported: Vec<EntityId> = if ops.is_empty() {
        Vec::new()
    } else {
        collection
            .commit_chunked(ops)?
            .into_iter()
            .flat_map(|receipt| receipt.inserted)
            .collect()
    };

    info!(
        collection = path,
        imported = imported.len(),
        rejected = rejected.len(),
        "csv import finished"
    );

    Ok(ImportReport {
        collection: path,
        imported,
        rejected,
    })
}
