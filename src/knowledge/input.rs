//! Inputs accepted by the knowledge store

use serde::{Deserialize, Serialize};

use super::entity::{Confidence, KnowledgeEntity, KnowledgeType, RelationEntity, RelationType, SourceType};

/// Input of [`KnowledgeStore::add`](super::KnowledgeStore::add).
///
/// Variant-specific fields are ignored for other kinds. Relation inputs
/// must carry `from_entity`, `to_entity` and `relation_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddKnowledge {
    /// Record kind.
    #[serde(rename = "type")]
    pub kind: KnowledgeType,
    /// Entity name.
    #[serde(default)]
    pub name: String,
    /// Entity (or relation) description.
    #[serde(default)]
    pub description: String,
    /// Alternate names.
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    /// Source reference.
    #[serde(default)]
    pub source: Option<String>,
    /// Source kind.
    #[serde(default)]
    pub source_type: Option<SourceType>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Concept category.
    #[serde(default)]
    pub category: Option<String>,
    /// Method purpose.
    #[serde(default)]
    pub purpose: Option<String>,
    /// Method steps.
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    /// Finding evidence.
    #[serde(default)]
    pub evidence: Option<String>,
    /// Finding conditions.
    #[serde(default)]
    pub conditions: Option<String>,
    /// Finding confidence.
    #[serde(default)]
    pub confidence: Option<Confidence>,

    /// Relation source endpoint.
    #[serde(default)]
    pub from_entity: Option<String>,
    /// Relation target endpoint.
    #[serde(default)]
    pub to_entity: Option<String>,
    /// Relation kind.
    #[serde(default)]
    pub relation_type: Option<RelationType>,
}

impl AddKnowledge {
    fn entity(kind: KnowledgeType, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            aliases: None,
            source: None,
            source_type: None,
            tags: Vec::new(),
            category: None,
            purpose: None,
            steps: None,
            evidence: None,
            conditions: None,
            confidence: None,
            from_entity: None,
            to_entity: None,
            relation_type: None,
        }
    }

    /// Concept input.
    #[must_use]
    pub fn concept(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::entity(KnowledgeType::Concept, name, description)
    }

    /// Method input.
    #[must_use]
    pub fn method(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::entity(KnowledgeType::Method, name, description)
    }

    /// Finding input.
    #[must_use]
    pub fn finding(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::entity(KnowledgeType::Finding, name, description)
    }

    /// Relation input.
    #[must_use]
    pub fn relation(
        from_entity: impl Into<String>,
        to_entity: impl Into<String>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            from_entity: Some(from_entity.into()),
            to_entity: Some(to_entity.into()),
            relation_type: Some(relation_type),
            ..Self::entity(KnowledgeType::Relation, "", "")
        }
    }

    /// Set aliases.
    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    /// Set tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set source and source kind.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>, source_type: SourceType) -> Self {
        self.source = Some(source.into());
        self.source_type = Some(source_type);
        self
    }
}

/// Input of [`KnowledgeStore::relate`](super::KnowledgeStore::relate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelateKnowledge {
    /// Source endpoint.
    pub from_entity: String,
    /// Target endpoint.
    pub to_entity: String,
    /// Relation kind.
    pub relation_type: RelationType,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to `false`.
    #[serde(default)]
    pub bidirectional: Option<bool>,
    /// Source reference.
    #[serde(default)]
    pub source: Option<String>,
    /// Source kind.
    #[serde(default)]
    pub source_type: Option<SourceType>,
}

impl RelateKnowledge {
    /// Relation with no description or source.
    #[must_use]
    pub fn new(
        from_entity: impl Into<String>,
        to_entity: impl Into<String>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            relation_type,
            description: None,
            bidirectional: None,
            source: None,
            source_type: None,
        }
    }
}

/// Input of [`KnowledgeStore::update`](super::KnowledgeStore::update).
///
/// The entity is looked up by `id` if given, otherwise by `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKnowledge {
    /// Short id (`KN-…`), opaque id, name or alias to look up.
    #[serde(default)]
    pub id: Option<String>,
    /// Name or alias to look up when `id` is absent.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement aliases.
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    /// Replacement tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Filters for [`KnowledgeStore::search`](super::KnowledgeStore::search).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeFilters {
    /// Free-text query (case-insensitive substring).
    #[serde(default)]
    pub query: Option<String>,
    /// Kinds to search; all kinds when absent.
    #[serde(default)]
    pub types: Option<Vec<KnowledgeType>>,
    /// Entities must carry at least one of these tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Result cap, default 10.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl KnowledgeFilters {
    /// Filters with only a query.
    #[must_use]
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub(crate) fn entity_types(&self) -> Vec<KnowledgeType> {
        self.types.as_ref().map_or_else(
            || KnowledgeType::ENTITY_TYPES.to_vec(),
            |types| {
                types
                    .iter()
                    .copied()
                    .filter(|t| *t != KnowledgeType::Relation)
                    .collect()
            },
        )
    }

    pub(crate) fn includes_relations(&self) -> bool {
        self.types
            .as_ref()
            .map_or(true, |types| types.contains(&KnowledgeType::Relation))
    }

    fn lowered_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Entity filter: any requested tag, then the query.
    #[must_use]
    pub fn matches_entity(&self, entity: &KnowledgeEntity) -> bool {
        if let Some(tags) = self.tags.as_deref().filter(|t| !t.is_empty()) {
            if !entity.has_any_tag(tags) {
                return false;
            }
        }
        self.lowered_query()
            .map_or(true, |query| entity.search_text().contains(&query))
    }

    /// Relation filter: the query only; tags do not apply.
    #[must_use]
    pub fn matches_relation(&self, relation: &RelationEntity) -> bool {
        self.lowered_query()
            .map_or(true, |query| relation.search_text().contains(&query))
    }
}

/// Result of a knowledge search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSearchResult {
    /// Matching entities sorted by name, at most `limit`.
    pub entities: Vec<KnowledgeEntity>,
    /// Matching relations filling the remainder of `limit`.
    pub relations: Vec<RelationEntity>,
    /// All matched entities plus all matched relations.
    pub total: usize,
}
