//! Tool dispatch over both stores
//!
//! A tool call is a name plus a JSON object of arguments. [`Toolkit::invoke`]
//! decodes the arguments into the store's typed inputs, runs the operation
//! and renders a JSON summary:
//!
//! ```text
//! {"name": "experiment_search", "arguments": {"tags": ["lora"]}}
//!     -> {"success": true, "results": [...], "returned": 1, "total": 1}
//! {"name": "experiment_get", "arguments": {"experimentId": "EXP-bad"}}
//!     -> {"success": false, "error": "Invalid experiment ID format: EXP-bad"}
//! ```
//!
//! Store failures become `success: false` payloads; only an unknown tool
//! name is returned as an [`Error`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::experiment::{ExperimentFilters, ExperimentStore, ExperimentUpdate, NewExperiment};
use crate::knowledge::{
    AddKnowledge, KnowledgeFilters, KnowledgeRecord, KnowledgeStore, RelateKnowledge,
    UpdateKnowledge,
};
use crate::{Error, Result};

const SUMMARY_DESCRIPTION_CHARS: usize = 100;

/// Name and description of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    /// Tool name used in calls.
    pub name: &'static str,
    /// What the tool does.
    pub description: &'static str,
}

const DEFINITIONS: &[ToolDefinition] = &[
    ToolDefinition {
        name: "experiment_create",
        description: "Create a new experiment log to record research activities and assistant interactions",
    },
    ToolDefinition {
        name: "experiment_update",
        description: "Update an existing experiment log with new data, observations, or conclusions",
    },
    ToolDefinition {
        name: "experiment_search",
        description: "Search for experiment logs by query, tags, category, or date range",
    },
    ToolDefinition {
        name: "experiment_get",
        description: "Read a full experiment log by its experiment ID",
    },
    ToolDefinition {
        name: "knowledge_add",
        description: "Add a new knowledge entity (concept, method, finding, or relation) to the knowledge base",
    },
    ToolDefinition {
        name: "knowledge_search",
        description: "Search the knowledge base for entities and relations matching the query",
    },
    ToolDefinition {
        name: "knowledge_relate",
        description: "Add a relation between two knowledge entities",
    },
    ToolDefinition {
        name: "knowledge_update",
        description: "Update the description, aliases, or tags of an existing knowledge entity",
    },
    ToolDefinition {
        name: "knowledge_get",
        description: "Look up a knowledge entity by short ID, name, or alias",
    },
    ToolDefinition {
        name: "knowledge_relations",
        description: "List every relation that starts or ends at the given entity name",
    },
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExperimentIdArgs {
    experiment_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExperimentUpdateArgs {
    experiment_id: String,
    #[serde(flatten)]
    patch: ExperimentUpdate,
}

#[derive(Deserialize)]
struct ExperimentSearchArgs {
    #[serde(flatten)]
    filters: ExperimentFilters,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeGetArgs {
    name_or_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeRelationsArgs {
    entity_name: String,
}

/// Both stores behind one tool-call surface.
#[derive(Debug)]
pub struct Toolkit {
    experiments: ExperimentStore,
    knowledge: KnowledgeStore,
    search_limit: usize,
}

impl Toolkit {
    /// Toolkit over existing stores, with the default search limit.
    #[must_use]
    pub fn new(experiments: ExperimentStore, knowledge: KnowledgeStore) -> Self {
        Self {
            experiments,
            knowledge,
            search_limit: crate::config::DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Toolkit over the configured storage root.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            experiments: ExperimentStore::from_config(config),
            knowledge: KnowledgeStore::from_config(config),
            search_limit: config.search_limit,
        }
    }

    /// Get the experiment store.
    #[must_use]
    pub const fn experiments(&self) -> &ExperimentStore {
        &self.experiments
    }

    /// Get the knowledge store.
    #[must_use]
    pub const fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// Every tool this toolkit answers to.
    #[must_use]
    pub const fn definitions() -> &'static [ToolDefinition] {
        DEFINITIONS
    }

    /// Run tool `name` and return its JSON result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTool`] if `name` is not a known tool. Every
    /// other failure is rendered as `{"success": false, "error": ...}`.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value> {
        if !DEFINITIONS.iter().any(|d| d.name == name) {
            return Err(Error::UnknownTool(name.to_string()));
        }

        info!(tool = name, "tool call");
        match self.dispatch(name, arguments).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(tool = name, kind = ?e.kind(), error = %e, "tool call failed");
                Ok(json!({ "success": false, "error": e.to_string() }))
            }
        }
    }

    /// Run tool `name` and render its result as pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub async fn call(&self, name: &str, arguments: Value) -> Result<String> {
        let response = self.invoke(name, arguments).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value> {
        match name {
            "experiment_create" => self.experiment_create(decode(arguments)?).await,
            "experiment_update" => self.experiment_update(decode(arguments)?).await,
            "experiment_search" => self.experiment_search(decode(arguments)?).await,
            "experiment_get" => self.experiment_get(decode(arguments)?).await,
            "knowledge_add" => self.knowledge_add(decode(arguments)?).await,
            "knowledge_search" => self.knowledge_search(decode(arguments)?).await,
            "knowledge_relate" => self.knowledge_relate(decode(arguments)?).await,
            "knowledge_update" => self.knowledge_update(decode(arguments)?).await,
            "knowledge_get" => self.knowledge_get(decode(arguments)?).await,
            "knowledge_relations" => self.knowledge_relations(decode(arguments)?).await,
            other => Err(Error::UnknownTool(other.to_string())),
        }
    }

    async fn experiment_create(&self, input: NewExperiment) -> Result<Value> {
        let log = self.experiments.create(input).await?;
        let path = self.experiments.path_for(log.experiment_id())?;
        Ok(json!({
            "success": true,
            "experimentId": log.experiment_id(),
            "title": log.title(),
            "category": log.category(),
            "tags": log.tags(),
            "createdAt": log.created_at(),
            "message": format!("Experiment \"{}\" created successfully", log.title()),
            "path": path.display().to_string(),
        }))
    }

    async fn experiment_update(&self, args: ExperimentUpdateArgs) -> Result<Value> {
        let log = self.experiments.update(&args.experiment_id, args.patch).await?;
        Ok(json!({
            "success": true,
            "experimentId": log.experiment_id(),
            "title": log.title(),
            "version": log.version(),
            "updatedAt": log.updated_at(),
            "updated": {
                "inputs": log.inputs().len(),
                "outputs": log.outputs().len(),
                "observations": log.observations().len(),
                "interactions": log.interactions().len(),
                "hasConclusions": log.conclusions().is_some_and(|c| !c.is_empty()),
            },
            "message": format!("Experiment {} updated successfully", args.experiment_id),
        }))
    }

    async fn experiment_search(&self, args: ExperimentSearchArgs) -> Result<Value> {
        let limit = args.limit.unwrap_or(self.search_limit);
        let result = self.experiments.search(&args.filters, limit).await?;

        let summaries: Vec<Value> = result
            .experiments
            .iter()
            .map(|log| {
                json!({
                    "experimentId": log.experiment_id(),
                    "title": log.title(),
                    "category": log.category(),
                    "date": log.date(),
                    "tags": log.tags(),
                    "hasConclusions": log.conclusions().is_some_and(|c| !c.is_empty()),
                    "observationCount": log.observations().len(),
                })
            })
            .collect();

        Ok(json!({
            "success": true,
            "query": args.filters.query.as_deref().unwrap_or("*"),
            "filters": {
                "tags": args.filters.tags,
                "category": args.filters.category,
                "dateFrom": args.filters.date_from,
                "dateTo": args.filters.date_to,
            },
            "returned": summaries.len(),
            "results": summaries,
            "total": result.total,
        }))
    }

    async fn experiment_get(&self, args: ExperimentIdArgs) -> Result<Value> {
        let log = self.experiments.get(&args.experiment_id).await?;
        Ok(json!({ "success": true, "experiment": log }))
    }

    async fn knowledge_add(&self, input: AddKnowledge) -> Result<Value> {
        let record = self.knowledge.add(input).await?;
        let name = match &record {
            KnowledgeRecord::Entity(entity) => entity.name().to_string(),
            KnowledgeRecord::Relation(relation) => {
                format!("{} -> {}", relation.from_entity, relation.to_entity)
            }
        };
        Ok(json!({
            "success": true,
            "type": record.kind(),
            "id": record.id(),
            "createdAt": record.created_at(),
            "message": format!("Knowledge entity \"{name}\" added successfully"),
            "name": name,
        }))
    }

    async fn knowledge_search(&self, mut filters: KnowledgeFilters) -> Result<Value> {
        let limit = *filters.limit.get_or_insert(self.search_limit);
        let result = self.knowledge.search(&filters).await?;

        let entities: Vec<Value> = result
            .entities
            .iter()
            .map(|entity| {
                json!({
                    "id": entity.id(),
                    "type": entity.kind(),
                    "name": entity.name(),
                    "description": summarize(&entity.base().description),
                    "tags": entity.base().tags,
                })
            })
            .collect();
        let relations: Vec<Value> = result
            .relations
            .iter()
            .map(|relation| {
                json!({
                    "id": relation.id,
                    "from": relation.from_entity,
                    "to": relation.to_entity,
                    "type": relation.relation_type,
                })
            })
            .collect();

        Ok(json!({
            "success": true,
            "query": filters.query,
            "filters": {
                "types": filters.types,
                "tags": filters.tags,
            },
            "limit": limit,
            "entities": entities,
            "relations": relations,
            "total": result.total,
        }))
    }

    async fn knowledge_relate(&self, input: RelateKnowledge) -> Result<Value> {
        let relation = self.knowledge.relate(input).await?;
        Ok(json!({
            "success": true,
            "relation": {
                "id": relation.id,
                "from": relation.from_entity,
                "to": relation.to_entity,
                "type": relation.relation_type,
                "bidirectional": relation.bidirectional,
            },
            "createdAt": relation.created_at,
            "message": format!(
                "Relation \"{}\" --[{}]--> \"{}\" added successfully",
                relation.from_entity,
                relation.relation_type.as_str(),
                relation.to_entity
            ),
        }))
    }

    async fn knowledge_update(&self, input: UpdateKnowledge) -> Result<Value> {
        let entity = self.knowledge.update(input).await?;
        Ok(json!({
            "success": true,
            "id": entity.id(),
            "name": entity.name(),
            "updatedAt": entity.base().updated_at,
            "message": format!("Knowledge entity \"{}\" updated successfully", entity.name()),
        }))
    }

    async fn knowledge_get(&self, args: KnowledgeGetArgs) -> Result<Value> {
        let entity = self
            .knowledge
            .get(&args.name_or_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Entity not found: {}", args.name_or_id)))?;
        Ok(json!({ "success": true, "entity": entity }))
    }

    async fn knowledge_relations(&self, args: KnowledgeRelationsArgs) -> Result<Value> {
        let relations = self.knowledge.get_relations(&args.entity_name).await?;
        Ok(json!({
            "success": true,
            "entity": args.entity_name,
            "total": relations.len(),
            "relations": relations,
        }))
    }
}

fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// First 100 characters, with `...` appended when cut.
fn summarize(description: &str) -> String {
    let mut chars = description.chars();
    let head: String = chars.by_ref().take(SUMMARY_DESCRIPTION_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
