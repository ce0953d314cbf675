//! Populate execution.
//!
//! A request's [`PopulateTree`] is first checked against the schema and
//! turned into a [`PopulatePlan`]; nothing is fetched until the whole tree
//! resolves. Execution then walks the plan one level at a time, for all
//! sibling entries together:
//!
//! - relations collect the target ids of every parent, fetch them in one
//!   batch, drop the ones the publication filter rejects, and recurse into
//!   the survivors
//! - components are inline objects; they are never filtered themselves,
//!   only the relations inside them are
//!
//! Sibling attributes are expanded concurrently. Each parent gets its
//! targets back in its own attachment order.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use super::path::{POPULATE_PARAM, PopulateTree};
use crate::content::{ContentTypeRegistry, SchemaOwner};
use crate::error::AppError;
use crate::models::Entry;
use crate::publication::PublicationFilter;
use crate::store::{EntryStore, relation_ids};
use vellum_sdk::types::{ContentTypeDefinition, FieldType};

/// Attribute name carrying an entry's publication timestamp.
pub const PUBLISHED_AT: &str = "publishedAt";

/// A validated populate request for one schema level.
#[derive(Debug, Clone, Default)]
pub struct PopulatePlan {
    /// Output attributes in schema order.
    layout: Vec<Slot>,
    steps: Vec<PlanStep>,
}

#[derive(Debug, Clone)]
enum Slot {
    Scalar(String),
    /// Index into `steps`.
    Step(usize),
}

#[derive(Debug, Clone)]
struct PlanStep {
    field: String,
    /// Full dotted path, for logs.
    path: String,
    kind: StepKind,
    nested: PopulatePlan,
}

#[derive(Debug, Clone)]
enum StepKind {
    Relation {
        target: ContentTypeDefinition,
        multiple: bool,
    },
    Component {
        repeatable: bool,
    },
}

impl PopulatePlan {
    /// Names of the populated attributes at this level.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.field.as_str())
    }

    /// Deepest populated level below this one.
    pub fn depth(&self) -> usize {
        self.steps
            .iter()
            .map(|s| s.nested.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// An entry rendered for the API: id plus its attribute map.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PopulatedEntry {
    pub id: Uuid,
    pub attributes: Map<String, Value>,
}

impl PopulatedEntry {
    /// Nested form: `{ "id": …, ...attributes }`.
    pub fn into_flat(self) -> Value {
        let mut obj = Map::with_capacity(self.attributes.len() + 1);
        obj.insert("id".to_string(), Value::String(self.id.to_string()));
        obj.extend(self.attributes);
        Value::Object(obj)
    }
}

type LevelFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Map<String, Value>>, AppError>> + Send + 'a>>;

/// Expands relations and components of root entries.
#[derive(Clone)]
pub struct PopulationEngine {
    registry: ContentTypeRegistry,
    store: Arc<dyn EntryStore>,
    max_depth: usize,
}

impl PopulationEngine {
    pub fn new(registry: ContentTypeRegistry, store: Arc<dyn EntryStore>, max_depth: usize) -> Self {
        Self {
            registry,
            store,
            max_depth,
        }
    }

    /// Check `tree` against the schema of `content_type`.
    ///
    /// Fails with `UnknownAttributePath` when a segment isn't an attribute,
    /// or names a scalar. Fails with `InvalidQueryParameter` when a path
    /// is deeper than the configured maximum.
    pub fn plan(
        &self,
        content_type: &ContentTypeDefinition,
        tree: &PopulateTree,
    ) -> Result<PopulatePlan, AppError> {
        self.build_plan(SchemaOwner::ContentType(&content_type.machine_name), tree, "", 1)
    }

    fn build_plan(
        &self,
        owner: SchemaOwner<'_>,
        tree: &PopulateTree,
        prefix: &str,
        depth: usize,
    ) -> Result<PopulatePlan, AppError> {
        let fields = self.registry.fields_of(owner).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("schema for {owner:?} is not registered"))
        })?;

        let empty = PopulateTree::new();
        let mut requested: Vec<(&str, &PopulateTree)> = tree.children().collect();
        if tree.is_wildcard() {
            for field in fields.iter().filter(|f| !f.field_type.is_scalar()) {
                if tree.child(&field.field_name).is_none() {
                    requested.push((field.field_name.as_str(), &empty));
                }
            }
        }

        let mut steps = Vec::with_capacity(requested.len());
        for (name, subtree) in requested {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };

            if depth > self.max_depth {
                return Err(AppError::invalid_param(POPULATE_PARAM, path));
            }

            let field = fields
                .iter()
                .find(|f| f.field_name == name)
                .ok_or_else(|| AppError::UnknownAttributePath(path.clone()))?;

            let (kind, nested) = match &field.field_type {
                FieldType::Relation { target, relation } => {
                    let target_def = self.registry.get(target).ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "relation '{path}' targets unregistered content type '{target}'"
                        ))
                    })?;
                    let nested =
                        self.build_plan(SchemaOwner::ContentType(target), subtree, &path, depth + 1)?;
                    (
                        StepKind::Relation {
                            target: target_def,
                            multiple: relation.is_multiple(),
                        },
                        nested,
                    )
                }
                FieldType::Component {
                    component,
                    repeatable,
                } => {
                    let nested =
                        self.build_plan(SchemaOwner::Component(component), subtree, &path, depth + 1)?;
                    (
                        StepKind::Component {
                            repeatable: *repeatable,
                        },
                        nested,
                    )
                }
                _ => return Err(AppError::UnknownAttributePath(path)),
            };

            steps.push(PlanStep {
                field: name.to_string(),
                path,
                kind,
                nested,
            });
        }

        // Scalars always render; populated attributes take their schema slot
        let layout = fields
            .iter()
            .filter_map(|f| {
                if f.field_type.is_scalar() {
                    Some(Slot::Scalar(f.field_name.clone()))
                } else {
                    steps
                        .iter()
                        .position(|s| s.field == f.field_name)
                        .map(Slot::Step)
                }
            })
            .collect();

        Ok(PopulatePlan { layout, steps })
    }

    /// Plan and execute in one go.
    pub async fn populate(
        &self,
        content_type: &ContentTypeDefinition,
        roots: Vec<Entry>,
        tree: &PopulateTree,
        filter: PublicationFilter,
    ) -> Result<Vec<PopulatedEntry>, AppError> {
        let plan = self.plan(content_type, tree)?;
        self.populate_planned(roots, &plan, filter).await
    }

    /// Execute a plan over root entries, keeping their order.
    pub async fn populate_planned(
        &self,
        roots: Vec<Entry>,
        plan: &PopulatePlan,
        filter: PublicationFilter,
    ) -> Result<Vec<PopulatedEntry>, AppError> {
        let parents: Vec<&Value> = roots.iter().map(|e| &e.fields).collect();
        let levels = self.expand_level(&parents, plan, filter).await?;

        Ok(roots
            .iter()
            .zip(levels)
            .map(|(entry, mut attributes)| {
                attributes.insert(PUBLISHED_AT.to_string(), entry.published_at_value());
                PopulatedEntry {
                    id: entry.id,
                    attributes,
                }
            })
            .collect())
    }

    /// Render one attribute level for every sibling parent at once: scalars
    /// copied, each plan step expanded with a single batched fetch.
    fn expand_level<'a>(
        &'a self,
        parents: &'a [&'a Value],
        plan: &'a PopulatePlan,
        filter: PublicationFilter,
    ) -> LevelFuture<'a> {
        Box::pin(async move {
            // columns[step][parent]
            let mut columns = try_join_all(
                plan.steps
                    .iter()
                    .map(|step| self.expand_step(parents, step, filter)),
            )
            .await?;

            let mut out = Vec::with_capacity(parents.len());
            for (index, fields) in parents.iter().copied().enumerate() {
                let mut attributes = Map::with_capacity(plan.layout.len());
                for slot in &plan.layout {
                    match slot {
                        Slot::Scalar(name) => {
                            attributes.insert(name.clone(), fields.get(name).cloned().unwrap_or(Value::Null));
                        }
                        Slot::Step(step) => {
                            let value = std::mem::take(&mut columns[*step][index]);
                            attributes.insert(plan.steps[*step].field.clone(), value);
                        }
                    }
                }
                out.push(attributes);
            }
            Ok(out)
        })
    }

    /// One value per parent for `step`, in parent order.
    async fn expand_step(
        &self,
        parents: &[&Value],
        step: &PlanStep,
        filter: PublicationFilter,
    ) -> Result<Vec<Value>, AppError> {
        match &step.kind {
            StepKind::Relation { target, multiple } => {
                // Attachment order per parent, deduplicated
                let linked: Vec<Vec<Uuid>> = parents
                    .iter()
                    .map(|fields| {
                        let mut ids = relation_ids(fields.get(&step.field));
                        if !*multiple {
                            ids.truncate(1);
                        }
                        let mut seen = HashSet::new();
                        ids.retain(|id| seen.insert(*id));
                        ids
                    })
                    .collect();

                let mut seen = HashSet::new();
                let unique: Vec<Uuid> = linked
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|id| seen.insert(*id))
                    .collect();

                let fetched = if unique.is_empty() {
                    Vec::new()
                } else {
                    self.store.fetch_by_ids(&target.machine_name, &unique).await?
                };
                let found = fetched.len();
                let visible = filter.retain(target, fetched);
                debug!(
                    path = %step.path,
                    parents = parents.len(),
                    requested = unique.len(),
                    found,
                    visible = visible.len(),
                    "populated relation"
                );

                let rendered: HashMap<Uuid, Value> = self
                    .populate_planned(visible, &step.nested, filter)
                    .await?
                    .into_iter()
                    .map(|e| (e.id, e.into_flat()))
                    .collect();

                Ok(linked
                    .iter()
                    .map(|ids| {
                        let mut targets = ids.iter().filter_map(|id| rendered.get(id).cloned());
                        if *multiple {
                            Value::Array(targets.collect())
                        } else {
                            targets.next().unwrap_or(Value::Null)
                        }
                    })
                    .collect())
            }
            StepKind::Component { repeatable } => {
                // Every parent's component objects form one nested level
                let mut items: Vec<&Value> = Vec::new();
                let spans: Vec<Option<usize>> = parents
                    .iter()
                    .copied()
                    .map(|fields| match fields.get(&step.field) {
                        Some(Value::Array(list)) if *repeatable => {
                            let before = items.len();
                            items.extend(list.iter().filter(|item| item.is_object()));
                            Some(items.len() - before)
                        }
                        Some(obj @ Value::Object(_)) if !*repeatable => {
                            items.push(obj);
                            Some(1)
                        }
                        None | Some(Value::Null) => None,
                        Some(_) => {
                            warn!(path = %step.path, "component value has unexpected shape, rendering empty");
                            None
                        }
                    })
                    .collect();

                let mut expanded = self
                    .expand_level(&items, &step.nested, filter)
                    .await?
                    .into_iter()
                    .map(Value::Object);

                Ok(spans
                    .into_iter()
                    .map(|span| match span {
                        Some(len) if *repeatable => Value::Array(expanded.by_ref().take(len).collect()),
                        Some(_) => expanded.next().unwrap_or(Value::Null),
                        None if *repeatable => Value::Array(Vec::new()),
                        None => Value::Null,
                    })
                    .collect())
            }
        }
    }
}
