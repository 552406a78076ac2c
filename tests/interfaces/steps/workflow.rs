//! Version workflow step definitions.

use std::sync::Arc;

use cucumber::{given, then, when, World};

use dataset_catalog::downloads::mock::RecordingGenerator;
use dataset_catalog::downloads::DownloadsRegistry;
use dataset_catalog::error::CatalogError;
use dataset_catalog::models::{
    Dataset, DatasetType, DatasetUpdate, Edition, EditionUpdate, LinkObject, State, Version,
    VersionIdentifiers, VersionLinks,
};
use dataset_catalog::storage::mock::{method, MockDataStore};
use dataset_catalog::storage::DataStore;
use dataset_catalog::workflow::{AmendOptions, StateMachine};

const DATASET: &str = "cpih01";
const EDITION: &str = "time-series";

/// Test context for version workflow scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct WorkflowWorld {
    store: Arc<MockDataStore>,
    generator: Arc<RecordingGenerator>,
    dataset_type: String,
    last_version: Option<Version>,
    last_error: Option<String>,
}

impl std::fmt::Debug for WorkflowWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowWorld")
            .field("store", &"<MockDataStore>")
            .field("dataset_type", &self.dataset_type)
            .field("last_version", &self.last_version)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl WorkflowWorld {
    fn new() -> Self {
        Self {
            store: Arc::new(MockDataStore::new()),
            generator: Arc::new(RecordingGenerator::new()),
            dataset_type: String::new(),
            last_version: None,
            last_error: None,
        }
    }

    fn machine(&self) -> StateMachine {
        let mut downloads = DownloadsRegistry::new();
        for dataset_type in DatasetType::ALL {
            downloads.register(dataset_type, self.generator.clone());
        }
        StateMachine::new(self.store.clone()).with_downloads(downloads)
    }

    async fn stored(&self) -> Version {
        self.store
            .inner()
            .get_version(DATASET, EDITION, 1, "*")
            .await
            .expect("Stored version missing")
    }

    async fn rewrite_stored(&self, edit: impl FnOnce(&mut Version)) {
        let current = self.stored().await;
        let mut candidate = current.clone();
        edit(&mut candidate);
        self.store
            .inner()
            .update_version(&current, &candidate, "*")
            .await
            .expect("Failed to rewrite version");
    }

    async fn amend(&mut self, update: Version, options: AmendOptions) {
        let result = self
            .machine()
            .amend_version(
                &VersionIdentifiers::new(DATASET, EDITION, "1"),
                update,
                options,
            )
            .await;
        match result {
            Ok(version) => {
                self.last_version = Some(version);
                self.last_error = None;
            }
            Err(e) => {
                self.last_version = None;
                self.last_error = Some(e.to_string());
            }
        }
    }
}

fn parse_state(raw: &str) -> State {
    raw.parse().expect("Unknown state in feature file")
}

fn conflict() -> CatalogError {
    CatalogError::Conflict {
        resource: "cpih01/time-series/1".to_string(),
        selector: "stale".to_string(),
    }
}

// --- Given steps ---

#[given(expr = "a {string} dataset with a version in state {string}")]
async fn given_dataset_with_version(world: &mut WorkflowWorld, dataset_type: String, state: String) {
    let state = parse_state(&state);
    world.dataset_type = dataset_type.clone();

    let store = world.store.inner();
    store
        .upsert_dataset(
            DATASET,
            &DatasetUpdate {
                id: DATASET.to_string(),
                current: None,
                next: Some(Dataset {
                    id: DATASET.to_string(),
                    dataset_type: dataset_type.clone(),
                    state: Some(State::Created),
                    ..Default::default()
                }),
            },
        )
        .await
        .expect("Failed to seed dataset");
    store
        .upsert_edition(
            DATASET,
            EDITION,
            &EditionUpdate {
                id: "edition-1".to_string(),
                next: Some(Edition {
                    id: "edition-1".to_string(),
                    edition: EDITION.to_string(),
                    state: Some(State::EditionConfirmed),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to seed edition");
    store
        .add_version(&Version {
            id: "instance-1".to_string(),
            dataset_id: DATASET.to_string(),
            edition: EDITION.to_string(),
            version: 1,
            dataset_type,
            state: Some(state),
            links: Some(VersionLinks {
                version: Some(LinkObject::new(
                    "1",
                    "/datasets/cpih01/editions/time-series/versions/1",
                )),
                ..Default::default()
            }),
            ..Default::default()
        })
        .await
        .expect("Failed to seed version");
}

#[given(expr = "the version has release date {string}")]
async fn given_release_date(world: &mut WorkflowWorld, release_date: String) {
    world
        .rewrite_stored(|version| version.release_date = release_date)
        .await;
}

#[given("the version has no version link")]
async fn given_no_version_link(world: &mut WorkflowWorld) {
    world.rewrite_stored(|version| version.links = None).await;
}

#[given("the next version write conflicts")]
async fn given_write_conflicts(world: &mut WorkflowWorld) {
    let method = if world.dataset_type == "static" {
        method::UPDATE_VERSION_STATIC
    } else {
        method::UPDATE_VERSION
    };
    world.store.push_failure(method, conflict()).await;
}

#[given("the edition lookup fails")]
async fn given_edition_lookup_fails(world: &mut WorkflowWorld) {
    world
        .store
        .push_failure(method::GET_EDITION, CatalogError::EditionNotFound)
        .await;
}

#[given("the lock cannot be acquired")]
async fn given_lock_fails(world: &mut WorkflowWorld) {
    world
        .store
        .push_failure(
            method::ACQUIRE_INSTANCE_LOCK,
            CatalogError::LockAcquisition {
                key: "cpih01/time-series/1".to_string(),
                reason: "unavailable".to_string(),
            },
        )
        .await;
}

// --- When steps ---

#[when(expr = "the version is amended to state {string}")]
async fn when_amended(world: &mut WorkflowWorld, state: String) {
    let update = Version {
        state: Some(parse_state(&state)),
        ..Default::default()
    };
    world.amend(update, AmendOptions::default()).await;
}

#[when(expr = "the version is amended to state {string} with type {string}")]
async fn when_amended_with_type(world: &mut WorkflowWorld, state: String, dataset_type: String) {
    let update = Version {
        state: Some(parse_state(&state)),
        dataset_type,
        ..Default::default()
    };
    world.amend(update, AmendOptions::default()).await;
}

#[when(expr = "the version is amended to state {string} in collection {string}")]
async fn when_amended_in_collection(world: &mut WorkflowWorld, state: String, collection: String) {
    let update = Version {
        state: Some(parse_state(&state)),
        collection_id: collection,
        ..Default::default()
    };
    world.amend(update, AmendOptions::default()).await;
}

#[when(expr = "the version is amended to state {string} with downloads already generated")]
async fn when_amended_with_downloads(world: &mut WorkflowWorld, state: String) {
    let update = Version {
        state: Some(parse_state(&state)),
        ..Default::default()
    };
    world
        .amend(update, AmendOptions::default().has_downloads(true))
        .await;
}

// --- Then steps ---

#[then("the amend should succeed")]
fn then_amend_succeeds(world: &mut WorkflowWorld) {
    assert!(
        world.last_error.is_none(),
        "Expected success, got: {:?}",
        world.last_error
    );
    assert!(world.last_version.is_some());
}

#[then(expr = "the amend should fail with {string}")]
fn then_amend_fails(world: &mut WorkflowWorld, message: String) {
    let error = world.last_error.as_deref().expect("Expected an error");
    assert!(
        error.contains(&message),
        "Expected error containing '{}', got '{}'",
        message,
        error
    );
}

#[then(expr = "the stored version should be in state {string}")]
async fn then_stored_state(world: &mut WorkflowWorld, state: String) {
    assert_eq!(world.stored().await.state, Some(parse_state(&state)));
}

#[then(expr = "the stored version should have type {string}")]
async fn then_stored_type(world: &mut WorkflowWorld, dataset_type: String) {
    assert_eq!(world.stored().await.dataset_type, dataset_type);
}

#[then("the stored version should have no collection")]
async fn then_no_collection(world: &mut WorkflowWorld) {
    assert!(world.stored().await.collection_id.is_empty());
}

#[then(expr = "the dataset next should be in state {string} with collection {string}")]
async fn then_dataset_next(world: &mut WorkflowWorld, state: String, collection: String) {
    let dataset = world
        .store
        .inner()
        .get_dataset(DATASET)
        .await
        .expect("Dataset missing");
    let next = dataset.next.expect("Dataset next missing");
    assert_eq!(next.state, Some(parse_state(&state)));
    assert_eq!(next.collection_id, collection);
}

#[then("the dataset should be published with current equal to next")]
async fn then_dataset_published(world: &mut WorkflowWorld) {
    let dataset = world
        .store
        .inner()
        .get_dataset(DATASET)
        .await
        .expect("Dataset missing");
    assert_eq!(dataset.current, dataset.next);
    let current = dataset.current.expect("Dataset current missing");
    assert_eq!(current.state, Some(State::Published));
}

#[then("the dataset should not be published")]
async fn then_dataset_not_published(world: &mut WorkflowWorld) {
    let dataset = world
        .store
        .inner()
        .get_dataset(DATASET)
        .await
        .expect("Dataset missing");
    assert!(dataset.current.is_none());
}

#[then("the edition should be published")]
async fn then_edition_published(world: &mut WorkflowWorld) {
    let edition = world
        .store
        .inner()
        .get_edition(DATASET, EDITION, "*")
        .await
        .expect("Edition missing");
    assert_eq!(edition.current, edition.next);
    let current = edition.current.expect("Edition current missing");
    assert_eq!(current.state, Some(State::Published));
}

#[then("the instance should be published")]
async fn then_instance_published(world: &mut WorkflowWorld) {
    let instance = world
        .store
        .inner()
        .get_instance("instance-1")
        .await
        .expect("Instance missing");
    assert!(instance.is_published);
}

#[then(expr = "downloads generation should have been requested {int} time(s)")]
async fn then_generation_count(world: &mut WorkflowWorld, count: usize) {
    assert_eq!(world.generator.call_count().await, count);
}

#[then(expr = "the version should have been written {int} time(s)")]
async fn then_write_count(world: &mut WorkflowWorld, count: usize) {
    let writes = world.store.calls(method::UPDATE_VERSION).await
        + world.store.calls(method::UPDATE_VERSION_STATIC).await;
    assert_eq!(writes, count);
}

#[then("only the static write path should have been used")]
async fn then_static_path_only(world: &mut WorkflowWorld) {
    let store = &world.store;
    assert!(store.calls(method::UPDATE_VERSION_STATIC).await > 0);
    assert_eq!(store.calls(method::UPDATE_VERSION).await, 0);
    assert_eq!(store.calls(method::UPDATE_DATASET_WITH_ASSOCIATION).await, 0);
}

#[then("every lock acquired should have been released")]
async fn then_locks_balanced(world: &mut WorkflowWorld) {
    let acquires = world.store.lock_acquires().await;
    let releases = world.store.lock_releases().await;
    assert!(acquires > 0, "no lock was taken");
    assert_eq!(acquires, releases);
}

#[then("no document should have been read")]
async fn then_nothing_read(world: &mut WorkflowWorld) {
    assert_eq!(world.store.calls(method::GET_DATASET).await, 0);
    assert_eq!(world.store.calls(method::GET_VERSION).await, 0);
}
