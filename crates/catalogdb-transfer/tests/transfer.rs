use catalogdb_core::{
    db::CatalogStore,
    entity::{AdvertisementDraft, FacilityDraft, FacilityType, OperatorDraft, TerminalDraft},
};
use catalogdb_transfer::{
    CsvKind, RejectReason, RowRejection, TransferError, UTF8_BOM, export_advertisements,
    export_facilities, export_operators, export_terminals, import_facilities, import_operators,
    import_terminals, template,
};

fn export_to_string(
    export: impl FnOnce(&mut Vec<u8>) -> Result<usize, TransferError>,
) -> (usize, String) {
    let mut out = Vec::new();
    let rows = export(&mut out).expect("export should succeed");
    let text = String::from_utf8(out).expect("export should be utf-8");

    (rows, text)
}

// imports

#[test]
fn operators_import_with_bom_and_blank_lines() {
    let store = CatalogStore::default();
    let csv = format!("{UTF8_BOM}name,isVerified\nShwe Mandalar,TRUE\n\nMandalar Min,false\n");

    let report = import_operators(&store, csv.as_bytes()).expect("import should succeed");

    assert!(report.is_clean());
    assert_eq!(report.imported_count(), 2);
    let operators = store
        .operators()
        .list_all("nameLower")
        .expect("operators should list");
    let names: Vec<_> = operators
        .iter()
        .map(|r| (r.entity.name.as_str(), r.entity.verified))
        .collect();
    assert_eq!(
        names,
        vec![("Mandalar Min", false), ("Shwe Mandalar", true)]
    );
}

#[test]
fn duplicate_operator_names_in_one_file_are_rejected() {
    let store = CatalogStore::default();
    let csv = "name,isVerified\nAlpha,TRUE\nalpha,FALSE\nBeta,\n,TRUE\n";

    let report = import_operators(&store, csv.as_bytes()).expect("import should succeed");

    assert_eq!(report.imported_count(), 2);
    assert_eq!(
        report.rejected,
        vec![
            RowRejection::new(
                3,
                RejectReason::DuplicateName {
                    name: "alpha".into()
                }
            ),
            RowRejection::new(5, RejectReason::MissingField { field: "name" }),
        ]
    );
    assert_eq!(store.operators().len(), 2);
}

#[test]
fn missing_required_column_fails_the_file() {
    let store = CatalogStore::default();

    let err = import_facilities(&store, "name,city,address\nA,Yangon,Street\n".as_bytes())
        .expect_err("file without a type column must fail");

    assert!(matches!(err, TransferError::MissingColumn { column: "type" }));
    assert!(store.facilities().is_empty());
}

#[test]
fn terminals_resolve_operators_case_insensitively() {
    let store = CatalogStore::default();
    let operator_id = store
        .operators()
        .insert(OperatorDraft::new("Shwe Mandalar").verified(true))
        .expect("operator insert should succeed");
    let csv = "operatorName,terminalName,city,address,phones\n\
               shwe mandalar,Aung Mingalar,Yangon,\"Room 1, Highway\",\"09-1, 09-2\"\n\
               Nobody,,Yangon,Street 2,\n\
               SHWE MANDALAR,,Mandalay,,\n";

    let report = import_terminals(&store, csv.as_bytes()).expect("import should succeed");

    assert_eq!(report.imported_count(), 1);
    assert_eq!(
        report.rejected,
        vec![
            RowRejection::new(
                3,
                RejectReason::UnknownOperator {
                    name: "Nobody".into()
                }
            ),
            RowRejection::new(4, RejectReason::MissingField { field: "address" }),
        ]
    );

    let terminal = store
        .terminals()
        .get(report.imported[0])
        .expect("imported terminal should exist");
    assert_eq!(terminal.entity.operator_id, operator_id);
    assert_eq!(terminal.entity.operator_name, "Shwe Mandalar");
    assert!(terminal.entity.operator_verified);
    assert_eq!(terminal.entity.terminal_name.as_deref(), Some("Aung Mingalar"));
    assert_eq!(terminal.entity.address, "Room 1, Highway");
    assert_eq!(terminal.entity.phones, vec!["09-1", "09-2"]);
}

#[test]
fn duplicate_operator_names_resolve_to_lowest_id() {
    let store = CatalogStore::default();
    let first = store
        .operators()
        .insert(OperatorDraft::new("Shwe"))
        .expect("operator insert should succeed");
    store
        .operators()
        .insert(OperatorDraft::new("SHWE"))
        .expect("operator insert should succeed");

    let report = import_terminals(
        &store,
        "operatorName,city,address\nshwe,Yangon,Street 1\n".as_bytes(),
    )
    .expect("import should succeed");

    let terminal = store
        .terminals()
        .get(report.imported[0])
        .expect("imported terminal should exist");
    assert_eq!(terminal.entity.operator_id, first);
}

#[test]
fn facility_type_is_restricted() {
    let store = CatalogStore::default();
    let csv = "name,type,city,address,phones,isVerified\n\
               Asia Royal,private_hospital,Yangon,Baho Road,09-123,TRUE\n\
               Corner Clinic,pharmacy,Yangon,Main Road,,\n";

    let report = import_facilities(&store, csv.as_bytes()).expect("import should succeed");

    assert_eq!(report.imported_count(), 1);
    assert_eq!(
        report.rejected,
        vec![RowRejection::new(
            3,
            RejectReason::InvalidType {
                value: "pharmacy".into()
            }
        )]
    );

    let facility = store
        .facilities()
        .get(report.imported[0])
        .expect("imported facility should exist");
    assert_eq!(facility.entity.kind, FacilityType::PrivateHospital);
    assert!(facility.entity.verified);
    assert!(facility.entity.keywords.contains("asia"));
}

#[test]
fn file_with_only_rejected_rows_commits_nothing() {
    let store = CatalogStore::default();

    let report = import_operators(&store, "name,isVerified\n,TRUE\n  ,  \n".as_bytes())
        .expect("import should succeed");

    assert!(report.imported.is_empty());
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(store.operators().revision(), 0);
}

#[test]
fn operator_template_imports_cleanly() {
    let store = CatalogStore::default();

    let report = import_operators(&store, template(CsvKind::Operators).as_bytes())
        .expect("template should import");

    assert!(report.is_clean());
    assert_eq!(report.imported_count(), 1);
}

// exports

#[test]
fn empty_collection_export_fails() {
    let store = CatalogStore::default();
    let mut out = Vec::new();

    let err = export_operators(&store, &mut out).expect_err("empty export must fail");

    assert!(matches!(
        err,
        TransferError::EmptyCollection {
            collection: "bus_operators"
        }
    ));
    assert!(out.is_empty());
}

#[test]
fn operators_export_sorted_with_bom() {
    let store = CatalogStore::default();
    for (name, verified) in [("zeta", false), ("Alpha", true)] {
        store
            .operators()
            .insert(OperatorDraft::new(name).verified(verified))
            .expect("operator insert should succeed");
    }

    let (rows, text) = export_to_string(|out| export_operators(&store, out));

    assert_eq!(rows, 2);
    assert_eq!(
        text,
        format!("{UTF8_BOM}name,isVerified\nAlpha,TRUE\nzeta,FALSE\n")
    );
}

#[test]
fn terminals_and_facilities_export_lists_joined() {
    let store = CatalogStore::default();
    let operator_id = store
        .operators()
        .insert(OperatorDraft::new("Shwe Mandalar"))
        .expect("operator insert should succeed");
    store
        .terminals()
        .insert(
            TerminalDraft::new(operator_id, "Yangon", "Unit 5")
                .terminal_name("Aung Mingalar")
                .phones(["09-1", "09-2"]),
        )
        .expect("terminal insert should succeed");
    store
        .facilities()
        .insert(FacilityDraft::new("Asia Royal", FacilityType::Clinic, "Yangon", "Baho Road"))
        .expect("facility insert should succeed");

    let (_, terminals) = export_to_string(|out| export_terminals(&store, out));
    let (_, facilities) = export_to_string(|out| export_facilities(&store, out));

    assert_eq!(
        terminals,
        format!(
            "{UTF8_BOM}operatorName,terminalName,city,address,phones\n\
             Shwe Mandalar,Aung Mingalar,Yangon,Unit 5,\"09-1,09-2\"\n"
        )
    );
    assert_eq!(
        facilities,
        format!(
            "{UTF8_BOM}name,type,city,address,phones,isVerified\n\
             Asia Royal,clinic,Yangon,Baho Road,,FALSE\n"
        )
    );
}

#[test]
fn advertisements_export_every_column() {
    let store = CatalogStore::default();
    store
        .advertisements()
        .insert(AdvertisementDraft::new("Golden Tours", ["09-111"], "Yangon").description("Daily"))
        .expect("ad insert should succeed");

    let (rows, text) = export_to_string(|out| export_advertisements(&store, out));

    assert_eq!(rows, 1);
    assert_eq!(
        text,
        format!(
            "{UTF8_BOM}title,description,contact,address,map,image,website,facebook,telegram,tiktok,isEnabled,isVerified\n\
             Golden Tours,Daily,09-111,Yangon,,,,,,,TRUE,FALSE\n"
        )
    );
}

#[test]
fn exported_facilities_reimport_into_a_fresh_store() {
    let source = CatalogStore::default();
    source
        .facilities()
        .insert(
            FacilityDraft::new("Asia Royal", FacilityType::PublicHospital, "Yangon", "Baho Road, 14")
                .phones(["09-1", "09-2"])
                .verified(true),
        )
        .expect("facility insert should succeed");
    let (_, text) = export_to_string(|out| export_facilities(&source, out));

    let target = CatalogStore::default();
    let report = import_facilities(&target, text.as_bytes()).expect("re-import should succeed");

    assert!(report.is_clean());
    let original = source
        .facilities()
        .list_all("nameLower")
        .expect("facilities should list");
    let copied = target
        .facilities()
        .list_all("nameLower")
        .expect("facilities should list");
    assert_eq!(copied[0].entity, original[0].entity);
}
