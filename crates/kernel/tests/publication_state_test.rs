//! Publication state behavior of the content API, end to end.
//!
//! Runs against the scenario in `vellum_test_utils::fixtures`: drafts and
//! published entries across categories, countries and products, linked via
//! a relation and a component-embedded relation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use serde_json::Value;
use vellum_test_utils::{assert, test_entry};

use common::{TestApp, row, to_entry};

const POPULATE: &str = "populate=categories,comp.countries";

fn names(value: &Value) -> Vec<String> {
    assert::names(value)
}

// =============================================================================
// Root collections
// =============================================================================

#[tokio::test]
async fn collection_counts_per_mode() {
    let app = TestApp::new();

    for (collection, content_type) in [
        ("categories", "category"),
        ("countries", "country"),
        ("products", "product"),
    ] {
        let live_count = app.scenario.published_count(content_type);
        let all_count = app.scenario.count(content_type);

        for (query, expected) in [
            ("", live_count),
            ("?publicationState=live", live_count),
            ("?publicationState=preview", all_count),
        ] {
            let body = app.get_ok(&format!("/api/{collection}{query}")).await;
            let data = body["data"].as_array().unwrap();
            assert_eq!(data.len(), expected, "{collection}{query}");
            assert_eq!(
                body["meta"]["pagination"]["total"],
                expected as u64,
                "{collection}{query}"
            );
        }
    }
}

#[tokio::test]
async fn default_mode_matches_live() {
    let app = TestApp::new();

    let default = app.get_ok(&format!("/api/products?{POPULATE}")).await;
    let live = app
        .get_ok(&format!("/api/products?publicationState=live&{POPULATE}"))
        .await;

    assert_eq!(default, live);
}

#[tokio::test]
async fn live_rows_are_all_published() {
    let app = TestApp::new();
    let body = app.get_ok("/api/products?publicationState=live").await;

    assert_eq!(names(&body["data"]), vec!["Computer", "Burger Drone"]);
    for row in body["data"].as_array().unwrap() {
        assert::is_iso_timestamp(&row["attributes"]["publishedAt"]);
    }
}

#[tokio::test]
async fn preview_includes_drafts_with_null_published_at() {
    let app = TestApp::new();
    let body = app.get_ok("/api/products?publicationState=preview").await;

    assert_eq!(
        names(&body["data"]),
        vec!["Bamboo Desk", "Computer", "Burger Drone"]
    );
    let desk = row(&body, "Bamboo Desk");
    assert_eq!(desk["attributes"]["publishedAt"], Value::Null);
    assert_eq!(desk["id"], app.scenario.id("Bamboo Desk").to_string());
}

#[tokio::test]
async fn unpopulated_relations_are_omitted() {
    let app = TestApp::new();
    let body = app.get_ok("/api/products").await;

    let computer = &row(&body, "Computer")["attributes"];
    assert::has_key(computer, "name");
    assert::has_key(computer, "publishedAt");
    assert::lacks_key(computer, "categories");
    assert::lacks_key(computer, "comp");
}

// =============================================================================
// Nested population
// =============================================================================

#[tokio::test]
async fn live_filters_nested_relations() {
    let app = TestApp::new();
    let body = app
        .get_ok(&format!("/api/products?publicationState=live&{POPULATE}"))
        .await;

    let computer = &row(&body, "Computer")["attributes"];
    assert_eq!(names(&computer["categories"]), vec!["Tech"]);
    assert_eq!(names(&computer["comp"]["countries"]), vec!["France", "Spain"]);

    let drone = &row(&body, "Burger Drone")["attributes"];
    assert_eq!(names(&drone["categories"]), vec!["Tech", "Food"]);
    assert_eq!(names(&drone["comp"]["countries"]), vec!["Spain"]);
}

#[tokio::test]
async fn preview_keeps_draft_relations() {
    let app = TestApp::new();
    let body = app
        .get_ok(&format!("/api/products?publicationState=preview&{POPULATE}"))
        .await;

    let desk = &row(&body, "Bamboo Desk")["attributes"];
    assert_eq!(names(&desk["categories"]), vec!["Home"]);
    assert_eq!(names(&desk["comp"]["countries"]), vec!["France"]);

    let computer = &row(&body, "Computer")["attributes"];
    assert_eq!(names(&computer["categories"]), vec!["Home", "Tech"]);
    assert_eq!(
        names(&computer["comp"]["countries"]),
        vec!["France", "Italy", "Spain"]
    );

    let drone = &row(&body, "Burger Drone")["attributes"];
    assert_eq!(names(&drone["categories"]), vec!["Tech", "Food"]);
    assert_eq!(names(&drone["comp"]["countries"]), vec!["Italy", "Spain"]);
}

#[tokio::test]
async fn live_drops_only_the_draft_among_all_categories() {
    let app = TestApp::new();
    let scenario = &app.scenario;
    let kit = test_entry("product", "Office Kit")
        .with_relation(
            "categories",
            &[scenario.id("Home"), scenario.id("Food"), scenario.id("Tech")],
        )
        .published()
        .created(10);
    app.store.insert(to_entry(&kit));

    let live = app
        .get_ok("/api/products?publicationState=live&populate=categories")
        .await;
    let categories = &row(&live, "Office Kit")["attributes"]["categories"];
    assert_eq!(names(categories), vec!["Food", "Tech"]);
    for category in categories.as_array().unwrap() {
        assert::is_iso_timestamp(&category["publishedAt"]);
    }

    let preview = app
        .get_ok("/api/products?publicationState=preview&populate=categories")
        .await;
    assert_eq!(
        names(&row(&preview, "Office Kit")["attributes"]["categories"]),
        vec!["Home", "Food", "Tech"]
    );
}

#[tokio::test]
async fn nested_entries_render_flat() {
    let app = TestApp::new();
    let body = app
        .get_ok(&format!("/api/products?publicationState=preview&{POPULATE}"))
        .await;

    let computer = &row(&body, "Computer")["attributes"];
    let home = &computer["categories"][0];
    assert_eq!(home["id"], app.scenario.id("Home").to_string());
    assert_eq!(home["name"], "Home");
    assert_eq!(home["publishedAt"], Value::Null);
    assert::lacks_key(home, "attributes");

    let spain = &computer["comp"]["countries"][2];
    assert_eq!(spain["code"], "es");
    assert::is_iso_timestamp(&spain["publishedAt"]);
    // Components carry no publication state of their own
    assert::lacks_key(&computer["comp"], "publishedAt");
}

#[tokio::test]
async fn populate_formats_are_equivalent() {
    let app = TestApp::new();
    let expected = app.get_ok(&format!("/api/products?{POPULATE}")).await;

    for query in [
        "populate=categories&populate=comp.countries",
        "populate[0]=categories&populate[1]=comp.countries",
        "populate%5B%5D=comp.countries&populate%5B%5D=categories",
    ] {
        let body = app.get_ok(&format!("/api/products?{query}")).await;
        assert_eq!(body, expected, "{query}");
    }
}

#[tokio::test]
async fn component_without_nested_populate_has_no_relations() {
    let app = TestApp::new();
    let body = app.get_ok("/api/products?populate=comp").await;

    let comp = &row(&body, "Computer")["attributes"]["comp"];
    assert!(comp.is_object(), "{comp}");
    assert::lacks_key(comp, "countries");
}

#[tokio::test]
async fn wildcard_populates_first_level() {
    let app = TestApp::new();
    let body = app.get_ok("/api/products?populate=*").await;

    let computer = &row(&body, "Computer")["attributes"];
    assert_eq!(names(&computer["categories"]), vec!["Tech"]);
    assert::has_key(computer, "comp");
    assert::lacks_key(&computer["comp"], "countries");
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn pagination_counts_before_slicing() {
    let app = TestApp::new();

    let body = app
        .get_ok("/api/products?publicationState=preview&pagination[page]=2&pagination[pageSize]=2")
        .await;
    assert_eq!(names(&body["data"]), vec!["Burger Drone"]);

    let meta = &body["meta"]["pagination"];
    assert_eq!(meta["page"], 2);
    assert_eq!(meta["pageSize"], 2);
    assert_eq!(meta["pageCount"], 2);
    assert_eq!(meta["total"], 3);
}

#[tokio::test]
async fn unbounded_pagination_meta() {
    let app = TestApp::new();
    let body = app.get_ok("/api/categories").await;

    let meta = &body["meta"]["pagination"];
    assert_eq!(meta["page"], 1);
    assert_eq!(meta["pageSize"], 2);
    assert_eq!(meta["pageCount"], 1);
    assert_eq!(meta["total"], 2);
}

// =============================================================================
// Single entry
// =============================================================================

#[tokio::test]
async fn single_entry_respects_publication_state() {
    let app = TestApp::new();
    let desk = app.scenario.id("Bamboo Desk");

    let (status, body) = app.get(&format!("/api/products/{desk}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["name"], "NotFoundError");

    let body = app
        .get_ok(&format!(
            "/api/products/{desk}?publicationState=preview&{POPULATE}"
        ))
        .await;
    assert_eq!(body["data"]["id"], desk.to_string());
    assert_eq!(names(&body["data"]["attributes"]["categories"]), vec!["Home"]);
}

#[tokio::test]
async fn single_entry_filters_nested() {
    let app = TestApp::new();
    let computer = app.scenario.id("Computer");

    let body = app
        .get_ok(&format!("/api/products/{computer}?{POPULATE}"))
        .await;
    let attrs = &body["data"]["attributes"];
    assert_eq!(names(&attrs["categories"]), vec!["Tech"]);
    assert_eq!(names(&attrs["comp"]["countries"]), vec!["France", "Spain"]);
}

#[tokio::test]
async fn single_entry_unknown_or_malformed_id() {
    let app = TestApp::new();

    let (status, _) = app
        .get(&format!("/api/products/{}", uuid::Uuid::now_v7()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/products/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Entries of another type aren't reachable through this collection
    let tech = app.scenario.id("Tech");
    let (status, _) = app.get(&format!("/api/products/{tech}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn invalid_publication_state_is_rejected() {
    let app = TestApp::new();

    for value in ["draft", "LIVE", "default", ""] {
        let (status, body) = app
            .get(&format!("/api/products?publicationState={value}"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{value:?}");
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["error"]["status"], 400);
        assert_eq!(body["error"]["name"], "ValidationError");
    }
}

#[tokio::test]
async fn unknown_populate_path_is_rejected() {
    let app = TestApp::new();

    for path in ["comp.cities", "tags", "name", "categories.name"] {
        let (status, body) = app.get(&format!("/api/products?populate={path}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert!(
            body["error"]["message"].as_str().unwrap().contains(path),
            "{body}"
        );
    }
}

#[tokio::test]
async fn unknown_collection_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/widgets").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["name"], "NotFoundError");

    let (status, _) = app.get("/api/widgets/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_pagination_is_rejected() {
    let app = TestApp::new();

    for query in ["pagination[page]=0", "pagination[pageSize]=many"] {
        let (status, _) = app.get(&format!("/api/products?{query}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
    }
}

#[tokio::test]
async fn health_reports_store() {
    let app = TestApp::new();
    let body = app.get_ok("/health").await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["content_types"], 3);
}
