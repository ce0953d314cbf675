//! Vellum test utilities.
//!
//! Helpers for integration testing: entry builders, the schema used by the
//! publication scenario, the scenario fixture itself, and JSON assertions.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Create a draft test entry with a `name` attribute.
pub fn test_entry(content_type: &str, name: &str) -> TestEntry {
    TestEntry {
        id: Uuid::now_v7(),
        content_type: content_type.to_string(),
        published_at: None,
        created: 0,
        fields: serde_json::json!({ "name": name }),
    }
}

/// A test entry builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub id: Uuid,
    pub content_type: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created: i64,
    pub fields: JsonValue,
}

impl TestEntry {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Mark as published at a fixed instant.
    pub fn published(self) -> Self {
        self.published_at(fixed_time())
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Mark as draft.
    pub fn draft(mut self) -> Self {
        self.published_at = None;
        self
    }

    /// Set the creation timestamp (controls listing order).
    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        if let Some(obj) = self.fields.as_object_mut() {
            obj.insert(name.to_string(), value);
        }
        self
    }

    /// Attach relation targets, in order.
    pub fn with_relation(self, name: &str, targets: &[Uuid]) -> Self {
        let ids: Vec<JsonValue> = targets
            .iter()
            .map(|id| JsonValue::String(id.to_string()))
            .collect();
        self.with_field(name, JsonValue::Array(ids))
    }

    /// Embed a component value.
    pub fn with_component(self, name: &str, value: JsonValue) -> Self {
        self.with_field(name, value)
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// Publication timestamp used by [`TestEntry::published`].
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Schema definitions for testing.
pub mod schema {
    use vellum_sdk::types::{
        ComponentDefinition, ContentTypeDefinition, FieldDefinition, FieldType, RelationKind,
    };

    /// Component uid embedded in products.
    pub const COMP: &str = "default.comp";

    pub fn category_type() -> ContentTypeDefinition {
        ContentTypeDefinition::new("category", "categories")
            .label("Category")
            .field(FieldDefinition::new("name", FieldType::text()))
    }

    pub fn country_type() -> ContentTypeDefinition {
        ContentTypeDefinition::new("country", "countries")
            .label("Country")
            .field(FieldDefinition::new("name", FieldType::text()))
            .field(FieldDefinition::new("code", FieldType::text()))
    }

    /// Component with a multi-valued relation to countries.
    pub fn comp_component() -> ComponentDefinition {
        ComponentDefinition::new(COMP).field(FieldDefinition::new(
            "countries",
            FieldType::relation("country", RelationKind::OneToMany),
        ))
    }

    pub fn product_type() -> ContentTypeDefinition {
        ContentTypeDefinition::new("product", "products")
            .label("Product")
            .field(FieldDefinition::new("name", FieldType::text()).required())
            .field(FieldDefinition::new(
                "categories",
                FieldType::relation("category", RelationKind::OneToMany),
            ))
            .field(FieldDefinition::new("comp", FieldType::component(COMP)))
    }

    /// All content types of the publication scenario.
    pub fn content_types() -> Vec<ContentTypeDefinition> {
        vec![category_type(), country_type(), product_type()]
    }

    pub fn components() -> Vec<ComponentDefinition> {
        vec![comp_component()]
    }
}

/// Fixture data for publication state tests.
pub mod fixtures {
    use super::*;

    /// Three categories, three countries and three products with a mix of
    /// drafts and published entries, cross-linked through relations and a
    /// component.
    ///
    /// | collection | entry        | state     | links                              |
    /// |------------|--------------|-----------|------------------------------------|
    /// | categories | Home         | draft     |                                    |
    /// | categories | Food         | published |                                    |
    /// | categories | Tech         | published |                                    |
    /// | countries  | France       | published |                                    |
    /// | countries  | Italy        | draft     |                                    |
    /// | countries  | Spain        | published |                                    |
    /// | products   | Bamboo Desk  | draft     | Home; comp: France                 |
    /// | products   | Computer     | published | Home, Tech; comp: France, Italy, Spain |
    /// | products   | Burger Drone | published | Tech, Food; comp: Italy, Spain     |
    #[derive(Debug, Clone)]
    pub struct PublicationScenario {
        pub entries: Vec<TestEntry>,
        ids: HashMap<String, Uuid>,
    }

    impl PublicationScenario {
        /// Id of the entry with the given `name`.
        ///
        /// # Panics
        ///
        /// Panics if no entry has that name.
        pub fn id(&self, name: &str) -> Uuid {
            match self.ids.get(name) {
                Some(id) => *id,
                None => panic!("no fixture entry named '{name}'"),
            }
        }

        /// Entries of one content type, in creation order.
        pub fn of_type<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a TestEntry> {
            self.entries
                .iter()
                .filter(move |e| e.content_type == content_type)
        }

        /// Entries of one content type a live read would show.
        pub fn published_count(&self, content_type: &str) -> usize {
            self.of_type(content_type).filter(|e| e.is_published()).count()
        }

        pub fn count(&self, content_type: &str) -> usize {
            self.of_type(content_type).count()
        }
    }

    pub fn publication_scenario() -> PublicationScenario {
        let mut created = 0;
        let mut next = || {
            created += 1;
            created
        };

        let home = test_entry("category", "Home").created(next());
        let food = test_entry("category", "Food").published().created(next());
        let tech = test_entry("category", "Tech").published().created(next());

        let france = test_entry("country", "France")
            .with_field("code", "fr".into())
            .published()
            .created(next());
        let italy = test_entry("country", "Italy")
            .with_field("code", "it".into())
            .created(next());
        let spain = test_entry("country", "Spain")
            .with_field("code", "es".into())
            .published()
            .created(next());

        let countries = |targets: &[&TestEntry]| {
            let ids: Vec<JsonValue> = targets
                .iter()
                .map(|e| JsonValue::String(e.id.to_string()))
                .collect();
            serde_json::json!({ "countries": ids })
        };

        let desk = test_entry("product", "Bamboo Desk")
            .with_relation("categories", &[home.id])
            .with_component("comp", countries(&[&france]))
            .created(next());
        let computer = test_entry("product", "Computer")
            .with_relation("categories", &[home.id, tech.id])
            .with_component("comp", countries(&[&france, &italy, &spain]))
            .published()
            .created(next());
        let drone = test_entry("product", "Burger Drone")
            .with_relation("categories", &[tech.id, food.id])
            .with_component("comp", countries(&[&italy, &spain]))
            .published()
            .created(next());

        let entries = vec![home, food, tech, france, italy, spain, desk, computer, drone];
        let ids = entries
            .iter()
            .filter_map(|e| {
                let name = e.fields.get("name")?.as_str()?;
                Some((name.to_string(), e.id))
            })
            .collect();

        PublicationScenario { entries, ids }
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value lacks a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to NOT have key '{key}', got: {value}"
        );
    }

    /// Assert that a value is an ISO-8601 UTC timestamp string.
    pub fn is_iso_timestamp(value: &Value) {
        let parsed = value
            .as_str()
            .map(chrono::DateTime::parse_from_rfc3339);
        assert!(
            matches!(parsed, Some(Ok(_))),
            "Expected an ISO-8601 timestamp, got: {value}"
        );
    }

    /// The `name` attribute of every object in a JSON array, in order.
    pub fn names(value: &Value) -> Vec<String> {
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        item.get("name")
                            .or_else(|| item.pointer("/attributes/name"))
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let target = Uuid::now_v7();
        let entry = test_entry("product", "Desk")
            .published()
            .with_relation("categories", &[target])
            .created(7);

        assert_eq!(entry.content_type, "product");
        assert!(entry.is_published());
        assert_eq!(entry.created, 7);
        assert_eq!(entry.fields["categories"][0], target.to_string());
        assert!(!entry.draft().is_published());
    }

    #[test]
    fn scenario_counts() {
        let scenario = fixtures::publication_scenario();
        for content_type in ["category", "country", "product"] {
            assert_eq!(scenario.count(content_type), 3);
            assert_eq!(scenario.published_count(content_type), 2);
        }
        assert_ne!(scenario.id("Home"), scenario.id("Tech"));
    }

    #[test]
    fn scenario_schema_references_resolve() {
        let types = schema::content_types();
        let comp = schema::comp_component();
        assert_eq!(comp.uid, schema::COMP);
        assert!(types.iter().any(|t| t.machine_name == "country"));
        assert!(types.iter().all(|t| t.draft_and_publish));
    }

    #[test]
    fn test_assertions() {
        let json = serde_json::json!({
            "name": "test",
            "publishedAt": "2024-01-01T12:00:00.000Z",
            "items": [{"name": "a"}, {"attributes": {"name": "b"}}]
        });
        assert::has_key(&json, "name");
        assert::lacks_key(&json, "missing");
        assert::is_iso_timestamp(&json["publishedAt"]);
        assert_eq!(assert::names(&json["items"]), vec!["a", "b"]);
    }
}
