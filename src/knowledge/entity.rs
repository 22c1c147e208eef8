//! Knowledge entities and relations
//!
//! Concepts, methods and findings share [`EntityBase`] and are stored as one
//! sum type discriminated by a `type` field. Relations are a separate record
//! kind with their own directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of knowledge record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeType {
    /// A named idea or term.
    Concept,
    /// A technique or procedure.
    Method,
    /// A result or empirical claim.
    Finding,
    /// An edge between two entities.
    Relation,
}

impl KnowledgeType {
    /// The three entity kinds, in probe order.
    pub const ENTITY_TYPES: [Self; 3] = [Self::Concept, Self::Method, Self::Finding];

    /// On-disk name, also the entity directory name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Method => "method",
            Self::Finding => "finding",
            Self::Relation => "relation",
        }
    }
}

/// Where a piece of knowledge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A paper.
    Paper,
    /// An experiment log.
    Experiment,
    /// An assistant conversation.
    Conversation,
    /// A web page.
    Url,
    /// Entered by hand.
    Manual,
}

/// Closed set of relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// `A` is a kind of `B`.
    IsA,
    /// `A` is a variant of `B`.
    VariantOf,
    /// `A` is a component of `B`.
    PartOf,
    /// `A` uses `B`.
    Uses,
    /// Unspecified association.
    RelatedTo,
    /// `A` comes before `B`.
    Precedes,
    /// `A` comes after `B`.
    Follows,
    /// `A` contradicts `B`.
    Contradicts,
    /// `A` supports `B`.
    Supports,
    /// `A` is derived from `B`.
    DerivedFrom,
}

impl RelationType {
    /// On-disk name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IsA => "is_a",
            Self::VariantOf => "variant_of",
            Self::PartOf => "part_of",
            Self::Uses => "uses",
            Self::RelatedTo => "related_to",
            Self::Precedes => "precedes",
            Self::Follows => "follows",
            Self::Contradicts => "contradicts",
            Self::Supports => "supports",
            Self::DerivedFrom => "derived_from",
        }
    }
}

/// Confidence attached to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Well supported.
    High,
    /// Partially supported.
    Medium,
    /// Preliminary.
    Low,
}

/// Fields shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBase {
    /// Opaque id (UUID).
    pub id: String,
    /// Display name; indexed lower-cased.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Alternate names; each indexed lower-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    /// Source reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Source kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl EntityBase {
    /// Lower-cased keys under which this entity is indexed: name, then aliases.
    #[must_use]
    pub fn index_keys(&self) -> Vec<String> {
        std::iter::once(&self.name)
            .chain(self.aliases.iter().flatten())
            .map(|s| s.to_lowercase())
            .collect()
    }
}

/// A concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Shared fields.
    #[serde(flatten)]
    pub base: EntityBase,
    /// Free-form grouping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    /// Shared fields.
    #[serde(flatten)]
    pub base: EntityBase,
    /// What the method is for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Ordered procedure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    /// Required inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// Produced outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<String>>,
    /// What must hold first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,
    /// Known limitations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitations: Option<Vec<String>>,
}

/// A finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Shared fields.
    #[serde(flatten)]
    pub base: EntityBase,
    /// Supporting evidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Conditions under which it holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    /// Consequences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implications: Option<Vec<String>>,
    /// Confidence level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

/// A knowledge entity of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KnowledgeEntity {
    /// A concept.
    Concept(Concept),
    /// A method.
    Method(Method),
    /// A finding.
    Finding(Finding),
}

impl KnowledgeEntity {
    /// Shared fields.
    #[must_use]
    pub const fn base(&self) -> &EntityBase {
        match self {
            Self::Concept(c) => &c.base,
            Self::Method(m) => &m.base,
            Self::Finding(f) => &f.base,
        }
    }

    /// Shared fields, mutably.
    pub fn base_mut(&mut self) -> &mut EntityBase {
        match self {
            Self::Concept(c) => &mut c.base,
            Self::Method(m) => &mut m.base,
            Self::Finding(f) => &mut f.base,
        }
    }

    /// Entity kind.
    #[must_use]
    pub const fn kind(&self) -> KnowledgeType {
        match self {
            Self::Concept(_) => KnowledgeType::Concept,
            Self::Method(_) => KnowledgeType::Method,
            Self::Finding(_) => KnowledgeType::Finding,
        }
    }

    /// Opaque id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// True if any of `tags` is on this entity.
    #[must_use]
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.base().tags.contains(tag))
    }

    /// Name, description, aliases and tags, space-joined and lower-cased.
    #[must_use]
    pub fn search_text(&self) -> String {
        let base = self.base();
        std::iter::once(base.name.as_str())
            .chain(std::iter::once(base.description.as_str()))
            .chain(base.aliases.iter().flatten().map(String::as_str))
            .chain(base.tags.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// A directed edge between two entities, addressed by name or id.
///
/// Endpoints are not checked for existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "relation", rename_all = "camelCase")]
pub struct RelationEntity {
    /// Opaque id (UUID).
    pub id: String,
    /// Source endpoint.
    pub from_entity: String,
    /// Target endpoint.
    pub to_entity: String,
    /// Relation kind.
    pub relation_type: RelationType,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the edge reads both ways. Informational only.
    #[serde(default)]
    pub bidirectional: bool,
    /// Source reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Source kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RelationEntity {
    /// True if `name` is either endpoint.
    #[must_use]
    pub fn touches(&self, name: &str) -> bool {
        self.from_entity == name || self.to_entity == name
    }

    /// Endpoints, relation kind and description, space-joined and
    /// lower-cased.
    #[must_use]
    pub fn search_text(&self) -> String {
        [
            self.from_entity.as_str(),
            self.to_entity.as_str(),
            self.relation_type.as_str(),
            self.description.as_deref().unwrap_or(""),
        ]
        .join(" ")
        .to_lowercase()
    }
}

/// Record returned by [`KnowledgeStore::add`](super::KnowledgeStore::add).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KnowledgeRecord {
    /// A concept, method or finding.
    Entity(KnowledgeEntity),
    /// A relation.
    Relation(RelationEntity),
}

impl KnowledgeRecord {
    /// Record kind.
    #[must_use]
    pub const fn kind(&self) -> KnowledgeType {
        match self {
            Self::Entity(e) => e.kind(),
            Self::Relation(_) => KnowledgeType::Relation,
        }
    }

    /// Opaque id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Entity(e) => e.id(),
            Self::Relation(r) => &r.id,
        }
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Entity(e) => e.base().created_at,
            Self::Relation(r) => r.created_at,
        }
    }
}
