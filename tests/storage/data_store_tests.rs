//! DataStore interface tests.
//!
//! These tests verify the contract of the DataStore trait.
//! Each storage implementation should run these tests. Stores must be built
//! with a short lock acquire timeout; the lock tests wait on contention.

use uuid::Uuid;

use dataset_catalog::error::CatalogError;
use dataset_catalog::models::{
    Dataset, DatasetUpdate, Edition, EditionUpdate, LinkObject, State, Version, VersionLinks,
};
use dataset_catalog::storage::DataStore;

/// Unique dataset ID so tests sharing one store do not collide.
pub fn dataset_id(prefix: &str) -> String {
    format!("test_{}_{}", prefix, Uuid::new_v4().simple())
}

/// Create a version document at `1` in edition `time-series`.
pub fn make_version(dataset_id: &str, dataset_type: &str, state: State) -> Version {
    Version {
        id: Uuid::new_v4().to_string(),
        dataset_id: dataset_id.to_string(),
        edition: "time-series".to_string(),
        version: 1,
        dataset_type: dataset_type.to_string(),
        state: Some(state),
        links: Some(VersionLinks {
            version: Some(LinkObject::new(
                "1",
                format!("/datasets/{dataset_id}/editions/time-series/versions/1"),
            )),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn make_dataset(id: &str, next_type: &str, current_type: Option<&str>) -> DatasetUpdate {
    DatasetUpdate {
        id: id.to_string(),
        current: current_type.map(|ty| Dataset {
            id: id.to_string(),
            dataset_type: ty.to_string(),
            state: Some(State::Published),
            ..Default::default()
        }),
        next: Some(Dataset {
            id: id.to_string(),
            dataset_type: next_type.to_string(),
            state: Some(State::Created),
            ..Default::default()
        }),
    }
}

// =============================================================================
// Dataset tests
// =============================================================================

pub async fn test_get_missing_dataset<S: DataStore>(store: &S) {
    let err = store
        .get_dataset(&dataset_id("missing"))
        .await
        .expect_err("missing dataset should fail");
    assert!(matches!(err, CatalogError::DatasetNotFound));
}

pub async fn test_upsert_replaces_dataset<S: DataStore>(store: &S) {
    let id = dataset_id("upsert");

    store
        .upsert_dataset(&id, &make_dataset(&id, "v4", None))
        .await
        .expect("first upsert should succeed");
    store
        .upsert_dataset(&id, &make_dataset(&id, "v4", Some("v4")))
        .await
        .expect("second upsert should succeed");

    let doc = store.get_dataset(&id).await.expect("dataset should exist");
    assert_eq!(doc.id, id);
    assert!(doc.current.is_some(), "second upsert should replace the first");
}

pub async fn test_association_writes_next_only<S: DataStore>(store: &S) {
    let id = dataset_id("assoc");
    store
        .upsert_dataset(&id, &make_dataset(&id, "v4", Some("v4")))
        .await
        .expect("upsert should succeed");

    let mut version = make_version(&id, "v4", State::Associated);
    version.collection_id = "collection-1".to_string();
    store
        .update_dataset_with_association(&id, State::Associated, &version)
        .await
        .expect("association should succeed");

    let doc = store.get_dataset(&id).await.expect("dataset should exist");
    let next = doc.next.expect("next should exist");
    assert_eq!(next.state, Some(State::Associated));
    assert_eq!(next.collection_id, "collection-1");
    let latest = next
        .links
        .and_then(|links| links.latest_version)
        .expect("latest version link should be set");
    assert_eq!(latest.id, "1");
    assert!(latest.href.ends_with("/versions/1"));

    let current = doc.current.expect("current should exist");
    assert_eq!(current.state, Some(State::Published));
    assert!(current.collection_id.is_empty());
}

pub async fn test_association_on_missing_dataset<S: DataStore>(store: &S) {
    let id = dataset_id("assoc_missing");
    let err = store
        .update_dataset_with_association(&id, State::Associated, &make_version(&id, "v4", State::Associated))
        .await
        .expect_err("association on missing dataset should fail");
    assert!(matches!(err, CatalogError::DatasetNotFound));
}

pub async fn test_dataset_type_by_audience<S: DataStore>(store: &S) {
    let id = dataset_id("type");
    store
        .upsert_dataset(&id, &make_dataset(&id, "cantabular_table", Some("v4")))
        .await
        .expect("upsert should succeed");

    let authorised = store.get_dataset_type(&id, true).await.expect("next type");
    assert_eq!(authorised.as_str(), "cantabular_table");
    let public = store.get_dataset_type(&id, false).await.expect("current type");
    assert_eq!(public.as_str(), "filterable");

    let bad = dataset_id("bad_type");
    store
        .upsert_dataset(&bad, &make_dataset(&bad, "spreadsheet", None))
        .await
        .expect("upsert should succeed");
    let err = store
        .get_dataset_type(&bad, true)
        .await
        .expect_err("unknown type should fail");
    assert!(matches!(err, CatalogError::InvalidDatasetType));
}

// =============================================================================
// Edition tests
// =============================================================================

pub async fn test_edition_etag_filter<S: DataStore>(store: &S) {
    let id = dataset_id("edition");
    let doc = EditionUpdate {
        id: "edition-1".to_string(),
        next: Some(Edition {
            edition: "time-series".to_string(),
            state: Some(State::EditionConfirmed),
            ..Default::default()
        }),
        ..Default::default()
    };
    store
        .upsert_edition(&id, "time-series", &doc)
        .await
        .expect("upsert should succeed");

    let stored = store
        .get_edition(&id, "time-series", "*")
        .await
        .expect("wildcard read should succeed");
    assert!(!stored.e_tag.is_empty(), "upsert should stamp an etag");

    store
        .get_edition(&id, "time-series", &stored.e_tag)
        .await
        .expect("matching etag should succeed");

    let err = store
        .get_edition(&id, "time-series", "stale")
        .await
        .expect_err("stale etag should fail");
    assert!(matches!(err, CatalogError::EditionNotFound));

    let err = store
        .get_edition(&id, "2021", "*")
        .await
        .expect_err("missing edition should fail");
    assert!(matches!(err, CatalogError::EditionNotFound));
}

pub async fn test_check_edition_exists<S: DataStore>(store: &S) {
    let id = dataset_id("edition_exists");
    let doc = EditionUpdate {
        id: "edition-1".to_string(),
        current: Some(Edition {
            edition: "time-series".to_string(),
            state: Some(State::Published),
            ..Default::default()
        }),
        ..Default::default()
    };
    store
        .upsert_edition(&id, "time-series", &doc)
        .await
        .expect("upsert should succeed");

    store
        .check_edition_exists(&id, "time-series", None)
        .await
        .expect("edition exists");
    store
        .check_edition_exists(&id, "time-series", Some(State::Published))
        .await
        .expect("edition is published");

    let err = store
        .check_edition_exists(&id, "time-series", Some(State::Created))
        .await
        .expect_err("state mismatch should fail");
    assert!(matches!(err, CatalogError::EditionNotFound));
}

// =============================================================================
// Version tests
// =============================================================================

pub async fn test_add_and_get_version<S: DataStore>(store: &S) {
    let id = dataset_id("add");
    let version = make_version(&id, "v4", State::Created);

    let e_tag = store
        .add_version(&version)
        .await
        .expect("add should succeed");
    assert!(!e_tag.is_empty());

    let stored = store
        .get_version(&id, "time-series", 1, "*")
        .await
        .expect("version should exist");
    assert_eq!(stored.e_tag, e_tag);
    assert_eq!(stored.id, version.id);
    assert!(stored.last_updated.is_some());

    store
        .get_version(&id, "time-series", 1, &e_tag)
        .await
        .expect("matching etag should succeed");

    let err = store
        .get_version(&id, "time-series", 1, "stale")
        .await
        .expect_err("stale etag should fail");
    assert!(matches!(err, CatalogError::VersionNotFound));

    let err = store
        .get_version(&id, "time-series", 2, "*")
        .await
        .expect_err("missing version should fail");
    assert!(matches!(err, CatalogError::VersionNotFound));

    let instance = store
        .get_instance(&version.id)
        .await
        .expect("instance should be created");
    assert_eq!(instance.state, Some(State::Created));
    assert!(!instance.is_published);
}

pub async fn test_update_version_is_conditional<S: DataStore>(store: &S) {
    let id = dataset_id("update");
    let version = make_version(&id, "v4", State::Created);
    store.add_version(&version).await.expect("add should succeed");
    let current = store
        .get_version(&id, "time-series", 1, "*")
        .await
        .expect("version should exist");

    let mut candidate = current.clone();
    candidate.state = Some(State::Submitted);
    let new_etag = store
        .update_version(&current, &candidate, &current.e_tag)
        .await
        .expect("update with current etag should succeed");
    assert_ne!(new_etag, current.e_tag);

    let stored = store
        .get_version(&id, "time-series", 1, &new_etag)
        .await
        .expect("new etag should match");
    assert_eq!(stored.state, Some(State::Submitted));

    let instance = store
        .get_instance(&version.id)
        .await
        .expect("instance should exist");
    assert_eq!(instance.state, Some(State::Submitted));

    // The first etag no longer matches anything
    candidate.state = Some(State::Completed);
    let err = store
        .update_version(&current, &candidate, &current.e_tag)
        .await
        .expect_err("stale selector should conflict");
    assert!(err.is_conflict(), "expected conflict, got {err}");

    store
        .update_version(&current, &candidate, "*")
        .await
        .expect("wildcard selector should succeed");
    let stored = store
        .get_version(&id, "time-series", 1, "*")
        .await
        .expect("version should exist");
    assert_eq!(stored.state, Some(State::Completed));
}

pub async fn test_update_missing_version<S: DataStore>(store: &S) {
    let id = dataset_id("update_missing");
    let version = make_version(&id, "v4", State::Created);
    let err = store
        .update_version(&version, &version, "*")
        .await
        .expect_err("missing version should fail");
    assert!(matches!(err, CatalogError::VersionNotFound));
}

pub async fn test_update_keeps_identity<S: DataStore>(store: &S) {
    let id = dataset_id("identity");
    let version = make_version(&id, "v4", State::Created);
    store.add_version(&version).await.expect("add should succeed");
    let current = store
        .get_version(&id, "time-series", 1, "*")
        .await
        .expect("version should exist");

    let mut candidate = current.clone();
    candidate.id = "forged".to_string();
    candidate.version = 7;
    store
        .update_version(&current, &candidate, &current.e_tag)
        .await
        .expect("update should succeed");

    let stored = store
        .get_version(&id, "time-series", 1, "*")
        .await
        .expect("version stays in its slot");
    assert_eq!(stored.id, version.id);
    assert_eq!(stored.version, 1);
}

pub async fn test_static_versions_have_no_instance<S: DataStore>(store: &S) {
    let id = dataset_id("static");
    let version = make_version(&id, "static", State::Created);
    store.add_version(&version).await.expect("add should succeed");

    let err = store
        .get_instance(&version.id)
        .await
        .expect_err("static versions have no instance");
    assert!(matches!(err, CatalogError::InstanceNotFound));

    let current = store
        .get_version(&id, "time-series", 1, "*")
        .await
        .expect("version should exist");
    let mut candidate = current.clone();
    candidate.state = Some(State::Associated);
    store
        .update_version_static(&current, &candidate, &current.e_tag)
        .await
        .expect("static update should succeed");

    let stored = store
        .get_version(&id, "time-series", 1, "*")
        .await
        .expect("version should exist");
    assert_eq!(stored.state, Some(State::Associated));
}

pub async fn test_set_instance_is_published<S: DataStore>(store: &S) {
    let id = dataset_id("instance");
    let version = make_version(&id, "v4", State::Associated);
    store.add_version(&version).await.expect("add should succeed");

    store
        .set_instance_is_published(&version.id)
        .await
        .expect("publish should succeed");
    let instance = store
        .get_instance(&version.id)
        .await
        .expect("instance should exist");
    assert!(instance.is_published);
    assert_eq!(instance.state, Some(State::Published));

    let err = store
        .set_instance_is_published("no-such-instance")
        .await
        .expect_err("missing instance should fail");
    assert!(matches!(err, CatalogError::InstanceNotFound));
}

// =============================================================================
// Lock tests
// =============================================================================

pub async fn test_lock_kinds_share_keys<S: DataStore>(store: &S) {
    let key = format!("{}/time-series/1", dataset_id("lock"));

    let held = store
        .acquire_instance_lock(&key)
        .await
        .expect("first lock should succeed");

    let err = store
        .acquire_versions_lock(&key)
        .await
        .expect_err("same key under the other kind should wait and time out");
    assert!(matches!(err, CatalogError::LockAcquisition { .. }));

    store.unlock_instance(&held).await;

    let held = store
        .acquire_versions_lock(&key)
        .await
        .expect("lock should be free after release");
    store.unlock_versions(&held).await;
}

pub async fn test_distinct_keys_do_not_contend<S: DataStore>(store: &S) {
    let a = store
        .acquire_instance_lock(&dataset_id("lock_a"))
        .await
        .expect("lock a");
    let b = store
        .acquire_instance_lock(&dataset_id("lock_b"))
        .await
        .expect("lock b");
    assert_ne!(a, b);
    store.unlock_instance(&a).await;
    store.unlock_instance(&b).await;
}

/// Macro to run all DataStore tests against a store implementation.
#[macro_export]
macro_rules! run_data_store_tests {
    ($store:expr) => {
        use $crate::storage::data_store_tests::*;

        // dataset tests
        test_get_missing_dataset($store).await;
        println!("  test_get_missing_dataset: PASSED");

        test_upsert_replaces_dataset($store).await;
        println!("  test_upsert_replaces_dataset: PASSED");

        test_association_writes_next_only($store).await;
        println!("  test_association_writes_next_only: PASSED");

        test_association_on_missing_dataset($store).await;
        println!("  test_association_on_missing_dataset: PASSED");

        test_dataset_type_by_audience($store).await;
        println!("  test_dataset_type_by_audience: PASSED");

        // edition tests
        test_edition_etag_filter($store).await;
        println!("  test_edition_etag_filter: PASSED");

        test_check_edition_exists($store).await;
        println!("  test_check_edition_exists: PASSED");

        // version tests
        test_add_and_get_version($store).await;
        println!("  test_add_and_get_version: PASSED");

        test_update_version_is_conditional($store).await;
        println!("  test_update_version_is_conditional: PASSED");

        test_update_missing_version($store).await;
        println!("  test_update_missing_version: PASSED");

        test_update_keeps_identity($store).await;
        println!("  test_update_keeps_identity: PASSED");

        test_static_versions_have_no_instance($store).await;
        println!("  test_static_versions_have_no_instance: PASSED");

        test_set_instance_is_published($store).await;
        println!("  test_set_instance_is_published: PASSED");

        // lock tests
        test_lock_kinds_share_keys($store).await;
        println!("  test_lock_kinds_share_keys: PASSED");

        test_distinct_keys_do_not_contend($store).await;
        println!("  test_distinct_keys_do_not_contend: PASSED");
    };
}
