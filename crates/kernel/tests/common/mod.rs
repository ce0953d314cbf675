#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] wires the REAL kernel routes, registry and read service over
//! an in-memory entry store seeded with the publication scenario, so tests
//! exercise the same code paths as the server without a database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use vellum_kernel::AppState;
use vellum_kernel::content::{ContentTypeRegistry, ReadLimits};
use vellum_kernel::models::Entry;
use vellum_kernel::routes;
use vellum_kernel::store::{EntryStore, MemoryEntryStore};
use vellum_test_utils::fixtures::{PublicationScenario, publication_scenario};
use vellum_test_utils::{TestEntry, schema};

/// Convert a test-utils builder into a kernel entry.
pub fn to_entry(entry: &TestEntry) -> Entry {
    Entry {
        id: entry.id,
        content_type: entry.content_type.clone(),
        published_at: entry.published_at,
        created: entry.created,
        fields: entry.fields.clone(),
    }
}

/// Registry holding the publication scenario schema.
pub fn scenario_registry() -> ContentTypeRegistry {
    let registry = ContentTypeRegistry::new();
    for component in schema::components() {
        registry.register_component(component);
    }
    for def in schema::content_types() {
        registry
            .register_type(def)
            .expect("scenario schema registers");
    }
    assert!(registry.validate().is_empty());
    registry
}

/// Memory store seeded with every scenario entry.
pub fn scenario_store(scenario: &PublicationScenario) -> MemoryEntryStore {
    let store = MemoryEntryStore::new();
    store.extend(scenario.entries.iter().map(to_entry));
    store
}

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: Arc<MemoryEntryStore>,
    pub scenario: PublicationScenario,
}

impl TestApp {
    /// App over the publication scenario with default limits.
    pub fn new() -> Self {
        Self::with_limits(ReadLimits::default())
    }

    pub fn with_limits(limits: ReadLimits) -> Self {
        let scenario = publication_scenario();
        let store = Arc::new(scenario_store(&scenario));
        let dyn_store: Arc<dyn EntryStore> = store.clone();

        let state = AppState::from_parts(scenario_registry(), dyn_store, limits);
        let router = routes::app(state.clone());

        Self {
            router,
            state,
            store,
            scenario,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `uri` and decode the JSON body.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let json = serde_json::from_slice(&body)
            .unwrap_or_else(|e| panic!("non-JSON body for {uri} ({status}): {e}"));
        (status, json)
    }

    /// GET `uri`, assert 200 and return the body.
    pub async fn get_ok(&self, uri: &str) -> Value {
        let (status, body) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri} returned {status}: {body}");
        body
    }
}

/// Find a collection row by its `name` attribute.
pub fn row<'a>(body: &'a Value, name: &str) -> &'a Value {
    body["data"]
        .as_array()
        .and_then(|rows| rows.iter().find(|r| r["attributes"]["name"] == name))
        .unwrap_or_else(|| panic!("no row named '{name}' in {body}"))
}
