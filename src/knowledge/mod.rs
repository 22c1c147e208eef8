//! Knowledge graph storage
//!
//! Concepts, methods and findings are entities addressed by a short id
//! (`KN-xxxxxxxx`), by name, or by alias. Relations are directed edges
//! between entity names and are not indexed.
//!
//! ## Layout
//!
//! ```text
//! knowledge/
//!     ├── entities/
//!     │     ├── concept/KN-xxxxxxxx.json
//!     │     ├── method/KN-xxxxxxxx.json
//!     │     └── finding/KN-xxxxxxxx.json
//!     ├── relations/REL-xxxxxxxx.json
//!     └── index.json                     name/alias (lower-cased) -> KN-…
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aria_store::knowledge::{AddKnowledge, KnowledgeStore, RelateKnowledge, RelationType};
//!
//! # async fn example() -> aria_store::Result<()> {
//! let store = KnowledgeStore::new("storage/knowledge");
//! store.add(AddKnowledge::concept("Transformer", "Attention-only sequence model")).await?;
//! store.add(AddKnowledge::concept("BERT", "Bidirectional encoder")).await?;
//! store.relate(RelateKnowledge::new("BERT", "Transformer", RelationType::DerivedFrom)).await?;
//!
//! let bert = store.get("bert").await?;
//! assert!(bert.is_some());
//! # Ok(())
//! # }
//! ```

mod entity;
mod index;
mod input;
mod store;

pub use entity::{
    Concept, Confidence, EntityBase, Finding, KnowledgeEntity, KnowledgeRecord, KnowledgeType,
    Method, RelationEntity, RelationType, SourceType,
};
pub use input::{
    AddKnowledge, KnowledgeFilters, KnowledgeSearchResult, RelateKnowledge, UpdateKnowledge,
};
pub use store::KnowledgeStore;
