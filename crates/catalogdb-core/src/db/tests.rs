use crate::{
    UNKNOWN_OPERATOR,
    config::CatalogConfig,
    db::{CatalogStore, CollectionCounts, ReadPolicy, SubscriptionState},
    entity::{
        AdvertisementDraft, AppConfig, AppConfigPatch, FacilityDraft, FacilityType, Operator,
        OperatorDraft, OperatorPatch, TerminalDraft, TerminalPatch,
    },
    error::{CatalogError, IndexMissingError, ReferenceError},
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    query::{Predicate, prefix_query},
    traits::EntityKind,
    types::EntityId,
};
use std::{cell::RefCell, rc::Rc};

fn store_with_operator(name: &str) -> (CatalogStore, EntityId) {
    let store = CatalogStore::default();
    let id = store
        .operators()
        .insert(OperatorDraft::new(name))
        .expect("operator insert should succeed");

    (store, id)
}

#[derive(Default)]
struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

//
// STORE
//

#[test]
fn invalid_config_is_rejected_at_construction() {
    let config = CatalogConfig {
        max_batch_size: 0,
        ..CatalogConfig::default()
    };

    let err = CatalogStore::new(config).expect_err("zero batch size is invalid");
    assert!(matches!(err, CatalogError::Config(_)));
}

#[test]
fn counts_cover_every_entity_collection() {
    let (store, operator_id) = store_with_operator("Elite");
    store
        .terminals()
        .insert(TerminalDraft::new(operator_id, "Yangon", "Aung Mingalar"))
        .expect("terminal insert should succeed");
    store
        .facilities()
        .insert(FacilityDraft::new("Clinic A", FacilityType::Clinic, "Mandalay", "26th St"))
        .expect("facility insert should succeed");

    assert_eq!(
        store.counts(),
        CollectionCounts {
            operators: 1,
            terminals: 1,
            facilities: 1,
            advertisements: 0,
        }
    );
}

#[test]
fn clones_share_the_same_collections() {
    let (store, id) = store_with_operator("Elite");
    let other = store.clone();

    assert!(other.operators().get(id).is_some());
}

//
// WRITES
//

#[test]
fn single_op_errors_are_not_wrapped() {
    let store = CatalogStore::default();

    let err = store
        .operators()
        .insert(OperatorDraft::new(""))
        .expect_err("blank name must be rejected");
    assert!(matches!(err, CatalogError::Validation(_)));

    let missing = EntityId::generate();
    let err = store
        .operators()
        .delete(missing)
        .expect_err("deleting a missing id fails");
    assert!(matches!(err, CatalogError::NotFound { id, .. } if id == missing));
}

#[test]
fn update_recomputes_derived_fields() {
    let (store, id) = store_with_operator("Old Name");
    store
        .operators()
        .update(
            id,
            OperatorPatch {
                name: Some("New Name".into()),
                ..OperatorPatch::default()
            },
        )
        .expect("update should succeed");

    let operator = store.operators().get(id).expect("operator exists").entity;
    assert_eq!(operator.name_lower, "new name");
    assert_eq!(
        operator.keywords,
        crate::index::index(operator.keyword_sources())
    );
}

#[test]
fn toggles_flip_and_report_the_new_value() {
    let store = CatalogStore::default();
    let ads = store.advertisements();
    let id = ads
        .insert(AdvertisementDraft::new("Sale", ["09 1"], "Market"))
        .expect("ad insert should succeed");

    assert!(ads.toggle_verified(id).expect("toggle should succeed"));
    assert!(!ads.toggle_enabled(id).expect("toggle should succeed"));
    assert!(!ads.toggle_verified(id).expect("toggle should succeed"));

    let ad = ads.get(id).expect("ad exists").entity;
    assert!(!ad.verified);
    assert!(!ad.enabled);

    let err = ads
        .toggle_enabled(EntityId::generate())
        .expect_err("missing id cannot be toggled");
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

//
// DENORMALIZATION
//

#[test]
fn terminal_requires_an_existing_operator() {
    let store = CatalogStore::default();
    let ghost = EntityId::generate();

    let err = store
        .terminals()
        .insert(TerminalDraft::new(ghost, "Yangon", "Unit 5"))
        .expect_err("unknown operator must be rejected");

    match err {
        CatalogError::Reference(ReferenceError {
            child,
            field,
            parent,
            parent_id,
        }) => {
            assert_eq!(child, "bus_terminals");
            assert_eq!(field, "operatorId");
            assert_eq!(parent, "bus_operators");
            assert_eq!(parent_id, ghost);
        }
        other => panic!("expected reference error, got {other:?}"),
    }
    assert!(store.terminals().is_empty());
}

#[test]
fn terminal_keywords_include_the_copied_operator_name() {
    let (store, operator_id) = store_with_operator("Shwe Mandalar");
    let id = store
        .terminals()
        .insert(TerminalDraft::new(operator_id, "Yangon", "Unit 5").terminal_name("Aung Mingalar"))
        .expect("terminal insert should succeed");

    let terminal = store.terminals().get(id).expect("terminal exists").entity;
    assert_eq!(terminal.operator_name_lower, "shwe mandalar");
    for token in ["shwe", "mandalar", "aung", "mingalar", "yangon", "unit", "5"] {
        assert!(terminal.keywords.contains(token), "missing {token}");
    }
}

#[test]
fn parent_edit_leaves_snapshot_stale_until_reconciled() {
    let (store, operator_id) = store_with_operator("Shwe Mandalar");
    let terminal_id = store
        .terminals()
        .insert(TerminalDraft::new(operator_id, "Yangon", "Unit 5"))
        .expect("terminal insert should succeed");
    assert!(store
        .stale_terminals(operator_id)
        .expect("operator exists")
        .is_empty());

    store
        .operators()
        .update(
            operator_id,
            OperatorPatch {
                name: Some("New Name".into()),
                verified: Some(true),
            },
        )
        .expect("operator update should succeed");

    let stale = store.stale_terminals(operator_id).expect("operator exists");
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].entity.operator_name, "Shwe Mandalar");

    assert_eq!(
        store
            .reconcile_terminals(operator_id)
            .expect("reconcile should succeed"),
        1
    );
    let terminal = store.terminals().get(terminal_id).expect("terminal exists").entity;
    assert_eq!(terminal.operator_name, "New Name");
    assert!(terminal.operator_verified);
    assert!(terminal.keywords.contains("new"));
    assert!(!terminal.keywords.contains("shwe"));
    assert_eq!(store.reconcile_terminals(operator_id).expect("nothing stale"), 0);
}

#[test]
fn terminal_edit_refreshes_its_snapshot() {
    let (store, operator_id) = store_with_operator("Before");
    let terminal_id = store
        .terminals()
        .insert(TerminalDraft::new(operator_id, "Yangon", "Unit 5"))
        .expect("terminal insert should succeed");
    store
        .operators()
        .update(
            operator_id,
            OperatorPatch {
                name: Some("After".into()),
                ..OperatorPatch::default()
            },
        )
        .expect("operator update should succeed");

    store
        .terminals()
        .update(
            terminal_id,
            TerminalPatch {
                city: Some("Mandalay".into()),
                ..TerminalPatch::default()
            },
        )
        .expect("terminal update should succeed");

    let terminal = store.terminals().get(terminal_id).expect("terminal exists").entity;
    assert_eq!(terminal.operator_name, "After");
    assert_eq!(terminal.city, "Mandalay");
}

#[test]
fn stale_terminals_of_unknown_operator_is_not_found() {
    let store = CatalogStore::default();

    let err = store
        .stale_terminals(EntityId::generate())
        .expect_err("unknown operator");
    assert!(matches!(
        err,
        CatalogError::NotFound {
            collection: "bus_operators",
            ..
        }
    ));
}

#[test]
fn deleting_a_referenced_operator_is_allowed_and_reported() {
    let (store, operator_id) = store_with_operator("Shwe Mandalar");
    for address in ["Unit 5", "Unit 6"] {
        store
            .terminals()
            .insert(TerminalDraft::new(operator_id, "Yangon", address))
            .expect("terminal insert should succeed");
    }

    let capture = Rc::new(CaptureSink::default());
    with_metrics_sink(capture.clone(), || {
        store
            .operators()
            .delete(operator_id)
            .expect("delete should succeed");
    });

    assert!(capture.events.borrow().contains(&MetricsEvent::DanglingReferences {
        entity_path: Operator::MODEL.path,
        dangling: 2,
    }));
    assert_eq!(store.terminals().len(), 2);
}

#[test]
fn read_policies_differ_only_after_parent_changes() {
    let (store, operator_id) = store_with_operator("Shwe Mandalar");
    let terminal_id = store
        .terminals()
        .insert(TerminalDraft::new(operator_id, "Yangon", "Unit 5"))
        .expect("terminal insert should succeed");
    let record = store.terminals().get(terminal_id).expect("terminal exists");

    let snapshot = store.terminal_reader(ReadPolicy::Snapshot);
    let live = store.terminal_reader(ReadPolicy::LiveJoin);
    assert_eq!(snapshot.policy(), ReadPolicy::Snapshot);
    assert_eq!(snapshot.read(&record).operator_name, "Shwe Mandalar");
    assert_eq!(live.read(&record).operator_name, "Shwe Mandalar");

    store
        .operators()
        .delete(operator_id)
        .expect("delete should succeed");
    let live = store.terminal_reader(ReadPolicy::LiveJoin);

    assert_eq!(snapshot.operator_name(&record.entity), "Shwe Mandalar");
    assert_eq!(live.operator_name(&record.entity), UNKNOWN_OPERATOR);
    assert!(!live.operator_verified(&record.entity));
}

//
// SUBSCRIPTIONS
//

#[tokio::test]
async fn subscription_delivers_current_snapshot_first() {
    let (store, _) = store_with_operator("Elite");
    let mut sub = store.operators().subscribe_all("nameLower");

    let snapshot = sub
        .next()
        .await
        .expect("active subscription yields")
        .expect("supported query");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.items[0].entity.name, "Elite");
}

#[tokio::test]
async fn every_commit_pushes_the_full_result_set() {
    let store = CatalogStore::default();
    let operators = store.operators();
    let mut sub = operators.subscribe_all("nameLower");
    let initial = sub.next().await.expect("yields").expect("supported");
    assert!(initial.is_empty());

    operators
        .insert(OperatorDraft::new("b"))
        .expect("insert should succeed");
    operators
        .insert(OperatorDraft::new("a"))
        .expect("insert should succeed");

    let latest = sub.next().await.expect("yields").expect("supported");
    let names: Vec<_> = latest.items.iter().map(|r| r.entity.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(latest.revision, operators.revision());
}

#[tokio::test]
async fn unrelated_writes_do_not_wake_filtered_consumers() {
    let store = CatalogStore::default();
    let operators = store.operators();
    let mut verified = operators.subscribe("nameLower", Some(Predicate::eq("verified", true)));
    verified.next().await.expect("yields").expect("supported");

    operators
        .insert(OperatorDraft::new("unverified"))
        .expect("insert should succeed");
    let woke = tokio::time::timeout(std::time::Duration::from_millis(20), verified.next()).await;
    assert!(woke.is_err(), "consumer should not wake for an unchanged result");

    operators
        .insert(OperatorDraft::new("trusted").verified(true))
        .expect("insert should succeed");
    let snapshot = verified.next().await.expect("yields").expect("supported");
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn identical_queries_share_one_entry() {
    let (store, _) = store_with_operator("Elite");
    let operators = store.operators();

    let mut a = operators.subscribe("nameLower", prefix_query("nameLower", "el"));
    let b = operators.subscribe("nameLower", prefix_query("nameLower", "el"));
    let c = operators.subscribe_all("nameLower");
    assert_eq!(operators.active_subscriptions(), 2);
    assert_eq!(a.latest(), b.latest());

    a.cancel();
    a.cancel();
    assert!(matches!(a.state(), SubscriptionState::Cancelled));
    assert_eq!(operators.active_subscriptions(), 2);

    drop(b);
    assert_eq!(operators.active_subscriptions(), 1);
    drop(c);
    assert_eq!(operators.active_subscriptions(), 0);
}

#[tokio::test]
async fn cancelled_subscription_ends_its_stream() {
    let (store, _) = store_with_operator("Elite");
    let mut sub = store.operators().subscribe_all("name");

    sub.cancel();

    assert!(sub.next().await.is_none());
    assert!(sub.latest().is_none());
}

#[tokio::test]
async fn unsupported_subscription_fails_terminally() {
    let store = CatalogStore::default();
    let operators = store.operators();

    let mut sub = operators.subscribe_all("verified");

    assert!(!sub.is_active());
    assert!(matches!(
        sub.state(),
        SubscriptionState::Failed(CatalogError::IndexMissing(IndexMissingError::Order { .. }))
    ));
    assert!(matches!(sub.next().await, Some(Err(_))));
    assert!(sub.next().await.is_none());
    assert_eq!(operators.active_subscriptions(), 0);
}

//
// APP CONFIG
//

#[test]
fn app_config_defaults_until_first_merge() {
    let store = CatalogStore::default();

    assert!(!store.app_config_exists());
    assert_eq!(store.app_config(), AppConfig::default());

    let merged = store.merge_app_config(AppConfigPatch {
        welcome_message: Some("Mingalaba".into()),
        ..AppConfigPatch::default()
    });
    assert!(store.app_config_exists());
    assert_eq!(merged.welcome_message, "Mingalaba");

    let merged = store.merge_app_config(AppConfigPatch {
        maintenance_on: Some(true),
        ..AppConfigPatch::default()
    });
    assert!(merged.maintenance_on);
    assert_eq!(merged.welcome_message, "Mingalaba");
}

#[tokio::test]
async fn app_config_watchers_see_merges() {
    let store = CatalogStore::default();
    let mut rx = store.subscribe_app_config();
    assert!(!rx.borrow().maintenance_on);

    store.merge_app_config(AppConfigPatch {
        maintenance_on: Some(true),
        maintenance_message: Some("Upgrading".into()),
        ..AppConfigPatch::default()
    });

    rx.changed().await.expect("store is alive");
    let config = rx.borrow_and_update().clone();
    assert!(config.maintenance_on);
    assert_eq!(config.maintenance_message, "Upgrading");
}
