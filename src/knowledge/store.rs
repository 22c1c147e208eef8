//! Knowledge Store - JSON files per entity and relation, plus a name index
//!
//! ```text
//! {base}/entities/{concept|method|finding}/KN-xxxxxxxx.json
//! {base}/relations/REL-xxxxxxxx.json
//! {base}/index.json        lower-cased name/alias -> KN-xxxxxxxx
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};

use super::entity::{
    Concept, EntityBase, Finding, KnowledgeEntity, KnowledgeRecord, KnowledgeType, Method,
    RelationEntity,
};
use super::index::{IndexMap, NameIndex};
use super::input::{AddKnowledge, KnowledgeFilters, KnowledgeSearchResult, RelateKnowledge, UpdateKnowledge};
use crate::config::{StorageConfig, DEFAULT_SEARCH_LIMIT};
use crate::{id, persist, Error, Result};

const EXTENSION: &str = "json";
const MAX_ID_ATTEMPTS: usize = 8;

/// A located entity file.
struct Located {
    short_id: String,
    path: PathBuf,
    entity: KnowledgeEntity,
}

/// File-backed store for knowledge entities and relations.
///
/// Entity writes precede index writes. If a process dies in between, the
/// entity is still found by a name lookup: an index miss falls back to a
/// directory scan, which repairs the index on a hit. [`rebuild_index`]
/// rewrites the index from scratch.
///
/// [`rebuild_index`]: KnowledgeStore::rebuild_index
#[derive(Debug)]
pub struct KnowledgeStore {
    base_path: PathBuf,
    index: NameIndex,
}

impl KnowledgeStore {
    /// Create a store rooted at `base_path`. Nothing is created on disk
    /// until the first write.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        let index = NameIndex::new(base_path.join(format!("index.{EXTENSION}")));
        Self { base_path, index }
    }

    /// Create a store at the configured knowledge directory.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.knowledge_dir())
    }

    /// Get the base directory.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entity_dir(&self, kind: KnowledgeType) -> PathBuf {
        self.base_path.join("entities").join(kind.as_str())
    }

    fn relations_dir(&self) -> PathBuf {
        self.base_path.join("relations")
    }

    /// Add an entity or relation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an entity with a blank name or a
    /// relation missing an endpoint or its kind, or an IO/JSON error.
    pub async fn add(&self, input: AddKnowledge) -> Result<KnowledgeRecord> {
        if input.kind != KnowledgeType::Relation && input.name.trim().is_empty() {
            return Err(Error::InvalidInput("Entity requires a name".to_string()));
        }

        let now = Utc::now();
        let base = EntityBase {
            id: id::new_opaque_id(),
            name: input.name,
            description: input.description,
            aliases: input.aliases,
            source: input.source,
            source_type: input.source_type,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        let entity = match input.kind {
            KnowledgeType::Concept => KnowledgeEntity::Concept(Concept {
                base,
                category: input.category,
            }),
            KnowledgeType::Method => KnowledgeEntity::Method(Method {
                base,
                purpose: input.purpose,
                steps: input.steps,
                inputs: None,
                outputs: None,
                prerequisites: None,
                limitations: None,
            }),
            KnowledgeType::Finding => KnowledgeEntity::Finding(Finding {
                base,
                evidence: input.evidence,
                conditions: input.conditions,
                implications: None,
                confidence: input.confidence,
            }),
            KnowledgeType::Relation => {
                let (Some(from_entity), Some(to_entity), Some(relation_type)) =
                    (input.from_entity, input.to_entity, input.relation_type)
                else {
                    return Err(Error::InvalidInput(
                        "Relation requires fromEntity, toEntity, and relationType".to_string(),
                    ));
                };
                let relation = self
                    .relate(RelateKnowledge {
                        from_entity,
                        to_entity,
                        relation_type,
                        description: Some(base.description).filter(|d| !d.is_empty()),
                        bidirectional: Some(false),
                        source: base.source,
                        source_type: base.source_type,
                    })
                    .await?;
                return Ok(KnowledgeRecord::Relation(relation));
            }
        };

        let json = serde_json::to_string_pretty(&entity)?;
        let entity_dirs: Vec<PathBuf> = KnowledgeType::ENTITY_TYPES
            .iter()
            .map(|kind| self.entity_dir(*kind))
            .collect();
        let short_id = write_fresh(
            id::KNOWLEDGE_PREFIX,
            &self.entity_dir(entity.kind()),
            &entity_dirs,
            json.as_bytes(),
        )
        .await?;

        self.index
            .assign(&entity.base().index_keys(), &[], &short_id)
            .await?;

        info!(short_id, kind = entity.kind().as_str(), name = entity.name(), "knowledge entity added");
        Ok(KnowledgeRecord::Entity(entity))
    }

    /// Look up an entity by short id (`KN-…`), name or alias.
    ///
    /// Returns `Ok(None)` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns an IO/JSON error if a file cannot be read or parsed.
    pub async fn get(&self, name_or_id: &str) -> Result<Option<KnowledgeEntity>> {
        Ok(self.locate(name_or_id).await?.map(|found| found.entity))
    }

    async fn locate(&self, name_or_id: &str) -> Result<Option<Located>> {
        if id::is_short_id(id::KNOWLEDGE_PREFIX, name_or_id) {
            if let Some(found) = self.probe(name_or_id).await? {
                return Ok(Some(found));
            }
        }

        if let Some(short_id) = self.index.lookup(name_or_id).await? {
            if let Some(found) = self.probe(&short_id).await? {
                return Ok(Some(found));
            }
            warn!(name = name_or_id, short_id, "name index points at a missing file");
        }

        let Some(found) = self.scan_for(name_or_id).await? else {
            return Ok(None);
        };
        let keys = found.entity.base().index_keys();
        if !self.index.covers(&keys, &found.short_id).await? {
            warn!(name = name_or_id, short_id = found.short_id, "entity missing from name index, repairing");
            self.index.assign(&keys, &[], &found.short_id).await?;
        }
        Ok(Some(found))
    }

    /// Find `{short_id}.json` in the first entity directory that has it.
    async fn probe(&self, short_id: &str) -> Result<Option<Located>> {
        if !id::is_short_id(id::KNOWLEDGE_PREFIX, short_id) {
            warn!(short_id, "malformed entity short id");
            return Ok(None);
        }
        for kind in KnowledgeType::ENTITY_TYPES {
            let path = self.entity_dir(kind).join(format!("{short_id}.{EXTENSION}"));
            if let Some(content) = persist::read_optional(&path).await? {
                debug!(short_id, kind = kind.as_str(), "entity file found");
                return Ok(Some(Located {
                    short_id: short_id.to_string(),
                    path,
                    entity: serde_json::from_str(&content)?,
                }));
            }
        }
        Ok(None)
    }

    /// Full scan for an entity whose name or alias (case-insensitive) or
    /// opaque id equals `key`. Files that cannot be read or parsed are
    /// logged and skipped.
    async fn scan_for(&self, key: &str) -> Result<Option<Located>> {
        let lowered = key.to_lowercase();
        for kind in KnowledgeType::ENTITY_TYPES {
            for (name, path) in persist::files_with_extension(&self.entity_dir(kind), EXTENSION).await? {
                let entity = match read_entity(&path).await {
                    Ok(entity) => entity,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable entity file");
                        continue;
                    }
                };
                if entity.id() == key || entity.base().index_keys().contains(&lowered) {
                    return Ok(Some(Located {
                        short_id: short_id_of(&name),
                        path,
                        entity,
                    }));
                }
            }
        }
        Ok(None)
    }

    async fn read_entities(&self, kind: KnowledgeType) -> Result<Vec<(String, PathBuf, KnowledgeEntity)>> {
        let mut entities = Vec::new();
        for (name, path) in persist::files_with_extension(&self.entity_dir(kind), EXTENSION).await? {
            let entity = read_entity(&path).await?;
            entities.push((short_id_of(&name), path, entity));
        }
        Ok(entities)
    }

    async fn read_relations(&self) -> Result<Vec<RelationEntity>> {
        let mut relations = Vec::new();
        for (_, path) in persist::files_with_extension(&self.relations_dir(), EXTENSION).await? {
            let content = fs::read_to_string(&path).await?;
            relations.push(serde_json::from_str(&content)?);
        }
        Ok(relations)
    }

    /// Search entities and relations.
    ///
    /// Entities match on any requested tag and on the query over name,
    /// description, aliases and tags; they are sorted by name and capped at
    /// `limit`. Relations match on the query over endpoints, kind and
    /// description, and only fill whatever room the *matched* entities left
    /// under `limit`. `total` counts every match of both kinds.
    ///
    /// # Errors
    ///
    /// Returns an IO/JSON error if a file cannot be read or parsed.
    pub async fn search(&self, filters: &KnowledgeFilters) -> Result<KnowledgeSearchResult> {
        let limit = filters.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

        let mut entities = Vec::new();
        for kind in filters.entity_types() {
            for (_, _, entity) in self.read_entities(kind).await? {
                if filters.matches_entity(&entity) {
                    entities.push(entity);
                }
            }
        }
        entities.sort_by(|a, b| a.name().cmp(b.name()));

        let mut relations = Vec::new();
        if filters.includes_relations() {
            relations = self
                .read_relations()
                .await?
                .into_iter()
                .filter(|relation| filters.matches_relation(relation))
                .collect();
        }

        let total = entities.len() + relations.len();
        relations.truncate(limit.saturating_sub(entities.len()));
        entities.truncate(limit);

        debug!(total, entities = entities.len(), relations = relations.len(), "knowledge search");
        Ok(KnowledgeSearchResult {
            entities,
            relations,
            total,
        })
    }

    /// Add a relation. Endpoints are not checked for existence.
    ///
    /// # Errors
    ///
    /// Returns an IO/JSON error if the file cannot be written.
    pub async fn relate(&self, input: RelateKnowledge) -> Result<RelationEntity> {
        let now = Utc::now();
        let relation = RelationEntity {
            id: id::new_opaque_id(),
            from_entity: input.from_entity,
            to_entity: input.to_entity,
            relation_type: input.relation_type,
            description: input.description,
            bidirectional: input.bidirectional.unwrap_or(false),
            source: input.source,
            source_type: input.source_type,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string_pretty(&relation)?;
        let dir = self.relations_dir();
        let short_id = write_fresh(id::RELATION_PREFIX, &dir, std::slice::from_ref(&dir), json.as_bytes()).await?;

        info!(
            short_id,
            from = relation.from_entity,
            to = relation.to_entity,
            relation_type = relation.relation_type.as_str(),
            "relation added"
        );
        Ok(relation)
    }

    /// Update an entity's description, aliases or tags in place.
    ///
    /// The entity is resolved by `id` (else `name`); its file is then found
    /// through the index entry of its *current* name. A change of aliases
    /// re-indexes the name and new aliases and drops old aliases that
    /// pointed at this entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if neither `id` nor `name` is given,
    /// [`Error::NotFound`] if the entity does not resolve, [`Error::Other`]
    /// if the index has no entry for its name, or an IO/JSON error.
    pub async fn update(&self, input: UpdateKnowledge) -> Result<KnowledgeEntity> {
        let key = input
            .id
            .as_deref()
            .or(input.name.as_deref())
            .ok_or_else(|| Error::InvalidInput("Either id or name is required".to_string()))?;

        let mut entity = self
            .get(key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Entity not found: {key}")))?;
        let old_keys = entity.base().index_keys();

        let base = entity.base_mut();
        if let Some(description) = input.description {
            base.description = description;
        }
        let aliases_changed = input.aliases.is_some();
        if input.aliases.is_some() {
            base.aliases = input.aliases;
        }
        if let Some(tags) = input.tags {
            base.tags = tags;
        }
        base.updated_at = Utc::now().max(base.updated_at);

        let short_id = self
            .index
            .lookup(entity.name())
            .await?
            .ok_or_else(|| Error::Other("Could not find entity file".to_string()))?;
        let Some(located) = self.probe(&short_id).await? else {
            return Err(Error::Other("Entity file not found".to_string()));
        };

        let json = serde_json::to_string_pretty(&entity)?;
        persist::write_atomic(&located.path, json.as_bytes()).await?;

        if aliases_changed {
            let keys = entity.base().index_keys();
            let stale: Vec<String> = old_keys.into_iter().filter(|k| !keys.contains(k)).collect();
            self.index.assign(&keys, &stale, &short_id).await?;
        }

        info!(short_id, name = entity.name(), "knowledge entity updated");
        Ok(entity)
    }

    /// Every relation whose `from_entity` or `to_entity` equals `entity_name`.
    ///
    /// The `bidirectional` flag plays no part in matching.
    ///
    /// # Errors
    ///
    /// Returns an IO/JSON error if a file cannot be read or parsed.
    pub async fn get_relations(&self, entity_name: &str) -> Result<Vec<RelationEntity>> {
        let relations: Vec<RelationEntity> = self
            .read_relations()
            .await?
            .into_iter()
            .filter(|relation| relation.touches(entity_name))
            .collect();
        debug!(entity_name, count = relations.len(), "relations collected");
        Ok(relations)
    }

    /// Rewrite the name index from the entity files. Returns the number of
    /// index entries written.
    ///
    /// # Errors
    ///
    /// Returns an IO/JSON error if a file cannot be read or the index
    /// cannot be written.
    pub async fn rebuild_index(&self) -> Result<usize> {
        let mut map = IndexMap::new();
        for kind in KnowledgeType::ENTITY_TYPES {
            for (short_id, _, entity) in self.read_entities(kind).await? {
                for key in entity.base().index_keys() {
                    map.insert(key, short_id.clone());
                }
            }
        }
        let entries = map.len();
        self.index.replace(map).await?;
        info!(entries, "name index rebuilt");
        Ok(entries)
    }

    /// Copy of the name index (lower-cased name/alias -> short id).
    ///
    /// # Errors
    ///
    /// Returns an IO/JSON error if the index cannot be read.
    pub async fn index_snapshot(&self) -> Result<BTreeMap<String, String>> {
        self.index.snapshot().await
    }
}

async fn read_entity(path: &Path) -> Result<KnowledgeEntity> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

fn short_id_of(file_name: &str) -> String {
    file_name.trim_end_matches(&format!(".{EXTENSION}")).to_string()
}

/// Write `contents` under a freshly generated `{prefix}-xxxxxxxx.json` name
/// in `dir`, regenerating the id while it exists in any of `probe_dirs`.
async fn write_fresh(prefix: &str, dir: &Path, probe_dirs: &[PathBuf], contents: &[u8]) -> Result<String> {
    fs::create_dir_all(dir).await?;

    for _ in 0..MAX_ID_ATTEMPTS {
        let short_id = id::short_id(prefix);
        let file_name = format!("{short_id}.{EXTENSION}");

        let mut taken = false;
        for probe in probe_dirs {
            if fs::try_exists(probe.join(&file_name)).await? {
                taken = true;
                break;
            }
        }
        if taken {
            warn!(short_id, "short id collision, regenerating");
            continue;
        }

        match persist::write_new(&dir.join(&file_name), contents).await {
            Ok(()) => return Ok(short_id),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(short_id, "short id collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Other(format!(
        "Failed to allocate a unique {prefix} id after {MAX_ID_ATTEMPTS} attempts"
    )))
}
