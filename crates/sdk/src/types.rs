//! Schema types for content types and components.
//!
//! Definitions are plain serde structs so they can be loaded from YAML
//! definition files or built in code with the builder helpers below.

use serde::{Deserialize, Serialize};

/// Cardinality of a relation field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    /// Whether the owning side holds a list of targets.
    pub fn is_multiple(self) -> bool {
        matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
    }
}

/// Field type definitions for content types and components.
///
/// Scalars are stored inline on the entry. `Relation` values are target ids
/// (a single id, or an ordered list when the kind is multiple). `Component`
/// values are nested objects owned by the entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text {
        #[serde(default)]
        max_length: Option<usize>,
    },
    TextLong,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Email,
    Json,
    Relation {
        /// Machine name of the target content type.
        target: String,
        relation: RelationKind,
    },
    Component {
        /// Component uid (e.g. `default.comp`).
        component: String,
        #[serde(default)]
        repeatable: bool,
    },
}

impl FieldType {
    pub fn text() -> Self {
        FieldType::Text { max_length: None }
    }

    pub fn relation(target: &str, relation: RelationKind) -> Self {
        FieldType::Relation {
            target: target.into(),
            relation,
        }
    }

    pub fn component(component: &str) -> Self {
        FieldType::Component {
            component: component.into(),
            repeatable: false,
        }
    }

    pub fn repeatable_component(component: &str) -> Self {
        FieldType::Component {
            component: component.into(),
            repeatable: true,
        }
    }

    /// Scalar fields can't be populated.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            FieldType::Relation { .. } | FieldType::Component { .. }
        )
    }
}

/// A content type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTypeDefinition {
    /// Singular machine name (e.g. "product").
    pub machine_name: String,
    /// Plural name used in API routes (e.g. "products").
    pub plural_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// When false, every entry of this type counts as published.
    #[serde(default = "default_true")]
    pub draft_and_publish: bool,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

fn default_true() -> bool {
    true
}

impl ContentTypeDefinition {
    pub fn new(machine_name: &str, plural_name: &str) -> Self {
        Self {
            machine_name: machine_name.into(),
            plural_name: plural_name.into(),
            label: machine_name.into(),
            description: String::new(),
            draft_and_publish: true,
            fields: Vec::new(),
        }
    }

    pub fn draft_and_publish(mut self, enabled: bool) -> Self {
        self.draft_and_publish = enabled;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.field_name == name)
    }
}

/// A reusable component definition embedded in entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Category-qualified uid (e.g. "default.comp").
    pub uid: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ComponentDefinition {
    pub fn new(uid: &str) -> Self {
        Self {
            uid: uid.into(),
            label: uid.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.field_name == name)
    }
}

/// A single field definition within a content type or component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            field_name: name.into(),
            field_type,
            label: name.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }
}
