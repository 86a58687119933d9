use crate::{
    entity::{
        Advertisement, AdvertisementDraft, AdvertisementLinks, AdvertisementPatch, AppConfig,
        AppConfigPatch, Facility, FacilityDraft, FacilityType, Operator, OperatorDraft,
        OperatorPatch, Terminal,
    },
    error::ValidationError,
    model::EntityModel,
    traits::{EntityKind, Verifiable},
    value::Value,
};

fn build<E: EntityKind>(draft: E::Draft) -> E {
    let mut entity = E::from_draft(draft);
    entity.refresh_derived();
    entity
}

#[test]
fn operator_derives_lowercase_name_and_keywords() {
    let operator: Operator = build(OperatorDraft::new("  Shwe Mandalar "));

    assert_eq!(operator.name, "Shwe Mandalar");
    assert_eq!(operator.name_lower, "shwe mandalar");
    assert!(operator.keywords.contains("shwe"));
    assert!(operator.keywords.contains("mandalar"));
    assert!(operator.keywords.contains("shwe mandalar"));
    operator.validate().expect("named operator should validate");
}

#[test]
fn operator_patch_refreshes_derived_fields() {
    let mut operator: Operator = build(OperatorDraft::new("Old Name"));
    operator.apply_patch(OperatorPatch {
        name: Some("New Name".into()),
        ..OperatorPatch::default()
    });
    operator.refresh_derived();

    assert_eq!(operator.name_lower, "new name");
    assert!(!operator.keywords.contains("old"));
    assert!(operator.keywords.contains("new"));
}

#[test]
fn blank_operator_name_is_required() {
    let operator: Operator = build(OperatorDraft::new("   "));

    let err = operator
        .validate()
        .expect_err("blank name should fail validation");
    assert_eq!(
        err,
        ValidationError::Required {
            collection: "bus_operators",
            field: "name",
        }
    );
}

#[test]
fn operator_serializes_with_wire_field_names() {
    let operator: Operator = build(OperatorDraft::new("Elite").verified(true));
    let json = serde_json::to_value(&operator).expect("operator should serialize");

    assert_eq!(json["name"], "Elite");
    assert_eq!(json["nameLower"], "elite");
    assert_eq!(json["verified"], true);
    assert_eq!(json["keywords"], serde_json::json!(["elite"]));
}

#[test]
fn facility_type_parses_only_enumerated_values() {
    assert_eq!(
        "public_hospital".parse::<FacilityType>().expect("known type should parse"),
        FacilityType::PublicHospital
    );
    assert!("hospital".parse::<FacilityType>().is_err());
    assert!("Clinic".parse::<FacilityType>().is_err());
}

#[test]
fn facility_keywords_cover_name_city_and_type() {
    let facility: Facility = build(
        FacilityDraft::new("Asia Royal", FacilityType::PrivateHospital, "Yangon", "No. 14")
            .phones(["  09 123 ", "", "01 555"]),
    );

    assert_eq!(facility.phones, vec!["09 123".to_string(), "01 555".to_string()]);
    assert!(facility.keywords.contains("asia royal"));
    assert!(facility.keywords.contains("yangon"));
    assert!(facility.keywords.contains("private_hospital"));
    assert!(!facility.keywords.contains("no."));

    let json = serde_json::to_value(&facility).expect("facility should serialize");
    assert_eq!(json["type"], "private_hospital");
}

#[test]
fn advertisement_defaults_to_enabled_and_unverified() {
    let ad: Advertisement = build(
        AdvertisementDraft::new("Grand Sale", ["09 777"], "Bogyoke Market")
            .description("Everything half price"),
    );

    assert!(ad.enabled);
    assert!(!ad.verified);
    assert!(ad.keywords.contains("sale"));
    assert!(ad.keywords.contains("half"));
    assert!(ad.keywords.contains("bogyoke"));
    ad.validate().expect("complete ad should validate");
}

#[test]
fn advertisement_requires_a_contact() {
    let ad: Advertisement = build(AdvertisementDraft::new("Grand Sale", ["  "], "Market"));

    let err = ad.validate().expect_err("empty contact list should fail");
    assert!(matches!(err, ValidationError::Required { field: "contact", .. }));
}

#[test]
fn advertisement_blank_links_collapse_to_absent() {
    let ad: Advertisement = build(
        AdvertisementDraft::new("Grand Sale", ["09 777"], "Market").links(AdvertisementLinks {
            website: Some("  ".into()),
            facebook: Some("https://fb.example/sale".into()),
            ..AdvertisementLinks::default()
        }),
    );

    assert_eq!(ad.website, None);
    assert_eq!(ad.value("website"), None);
    assert_eq!(
        ad.value("facebook"),
        Some(Value::text("https://fb.example/sale"))
    );
}

#[test]
fn advertisement_patch_can_clear_description() {
    let mut ad: Advertisement = build(
        AdvertisementDraft::new("Grand Sale", ["09 777"], "Market").description("Half price"),
    );
    ad.apply_patch(AdvertisementPatch {
        description: Some(None),
        ..AdvertisementPatch::default()
    });
    ad.refresh_derived();

    assert_eq!(ad.description, None);
    assert!(!ad.keywords.contains("half"));
}

#[test]
fn toggles_are_expressed_as_patches() {
    let mut ad: Advertisement = build(AdvertisementDraft::new("Sale", ["09"], "Market"));

    ad.apply_patch(Advertisement::verified_patch(true));
    ad.apply_patch(Advertisement::enabled_patch(false));

    assert!(Verifiable::verified(&ad));
    assert!(!ad.enabled);
}

#[test]
fn app_config_merge_keeps_absent_fields() {
    let mut config = AppConfig {
        maintenance_on: false,
        maintenance_message: "Back soon".into(),
        welcome_message: "Hello".into(),
    };
    config.merge(AppConfigPatch {
        maintenance_on: Some(true),
        ..AppConfigPatch::default()
    });

    assert!(config.maintenance_on);
    assert_eq!(config.maintenance_message, "Back soon");
    assert_eq!(config.welcome_message, "Hello");
}

#[test]
fn app_config_reads_partial_documents() {
    let config: AppConfig = serde_json::from_str(r#"{"maintenanceOn":true}"#)
        .expect("partial config document should deserialize");

    assert!(config.maintenance_on);
    assert!(config.welcome_message.is_empty());
}

#[test]
fn search_fields_are_lowercase_ordered_fields() {
    let models: [&EntityModel; 4] = [
        Operator::MODEL,
        Terminal::MODEL,
        Facility::MODEL,
        Advertisement::MODEL,
    ];

    for model in models {
        assert!(model.is_lowercase(model.search_field), "{}", model.path);
        for field in model.lowercase {
            assert!(model.is_ordered(field), "{}.{field}", model.path);
            assert!(model.has_field(field), "{}.{field}", model.path);
        }
    }
}

#[test]
fn advertisement_keeps_lowercase_title_copy() {
    let mut ad: Advertisement = build(AdvertisementDraft::new("Golden Tours", ["09"], "Market"));
    assert_eq!(ad.title_lower, "golden tours");
    assert_eq!(ad.value("titleLower"), Some(Value::text("golden tours")));

    ad.apply_patch(AdvertisementPatch {
        title: Some("New Year SALE".into()),
        ..AdvertisementPatch::default()
    });
    ad.refresh_derived();

    assert_eq!(ad.title_lower, "new year sale");
}
