//! Knowledge Store Tests

use aria_store::knowledge::{
    AddKnowledge, Confidence, KnowledgeEntity, KnowledgeFilters, KnowledgeRecord,
    KnowledgeStore, KnowledgeType, RelateKnowledge, RelationType, SourceType, UpdateKnowledge,
};
use aria_store::{Error, ErrorKind};
use tempfile::TempDir;

fn store() -> (TempDir, KnowledgeStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = KnowledgeStore::new(dir.path().join("knowledge"));
    (dir, store)
}

fn entity(record: KnowledgeRecord) -> KnowledgeEntity {
    match record {
        KnowledgeRecord::Entity(entity) => entity,
        KnowledgeRecord::Relation(relation) => panic!("expected entity, got {relation:?}"),
    }
}

fn names(entities: &[KnowledgeEntity]) -> Vec<&str> {
    entities.iter().map(KnowledgeEntity::name).collect()
}

/// Short id of the only file in `entities/{kind}`.
fn only_short_id(dir: &TempDir, kind: &str) -> String {
    let files: Vec<_> = std::fs::read_dir(dir.path().join("knowledge/entities").join(kind))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    files[0].trim_end_matches(".json").to_string()
}

// =============================================================================
// Add / Get
// =============================================================================

#[tokio::test]
async fn test_add_each_entity_kind() {
    let (_dir, store) = store();

    let concept = entity(
        store
            .add(AddKnowledge {
                category: Some("architecture".into()),
                ..AddKnowledge::concept("Transformer", "Attention-only sequence model")
            })
            .await
            .unwrap(),
    );
    let method = entity(
        store
            .add(AddKnowledge {
                purpose: Some("stabilise early training".into()),
                steps: Some(vec!["ramp lr".into(), "hold".into()]),
                ..AddKnowledge::method("Warmup", "Linear learning-rate warmup")
            })
            .await
            .unwrap(),
    );
    let finding = entity(
        store
            .add(AddKnowledge {
                confidence: Some(Confidence::High),
                evidence: Some("Table 3".into()),
                ..AddKnowledge::finding("Scaling law", "Loss falls as a power law")
                    .source("arXiv:2001.08361", SourceType::Paper)
            })
            .await
            .unwrap(),
    );

    assert_eq!(concept.kind(), KnowledgeType::Concept);
    assert_eq!(method.kind(), KnowledgeType::Method);
    assert_eq!(finding.kind(), KnowledgeType::Finding);

    match store.get("warmup").await.unwrap() {
        Some(KnowledgeEntity::Method(m)) => {
            assert_eq!(m.steps.as_deref().map(<[String]>::len), Some(2));
            assert_eq!(m.purpose.as_deref(), Some("stabilise early training"));
        }
        other => panic!("unexpected {other:?}"),
    }
    match store.get("Scaling law").await.unwrap() {
        Some(KnowledgeEntity::Finding(f)) => {
            assert_eq!(f.confidence, Some(Confidence::High));
            assert_eq!(f.base.source_type, Some(SourceType::Paper));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_get_by_short_id_name_and_alias_agree() {
    let (dir, store) = store();
    let added = entity(
        store
            .add(
                AddKnowledge::concept("Transformer", "Attention-only sequence model")
                    .aliases(["Attention Model", "TF"]),
            )
            .await
            .unwrap(),
    );
    let short_id = only_short_id(&dir, "concept");
    assert!(short_id.starts_with("KN-"));
    assert_eq!(short_id.len(), 11);

    for key in [short_id.as_str(), "Transformer", "transformer", "attention model", "tf"] {
        let found = store.get(key).await.unwrap();
        assert_eq!(found.as_ref().map(KnowledgeEntity::id), Some(added.id()), "{key}");
    }
}

#[tokio::test]
async fn test_get_unknown_is_none() {
    let (_dir, store) = store();
    assert!(store.get("nothing").await.unwrap().is_none());
    assert!(store.get("KN-00000000").await.unwrap().is_none());
}

#[tokio::test]
async fn test_entity_name_must_not_be_blank() {
    let (dir, store) = store();
    for input in [
        AddKnowledge::concept("", "no name"),
        AddKnowledge::method("   ", "whitespace name"),
    ] {
        let err = store.add(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "Invalid input: Entity requires a name");
    }
    assert!(!dir.path().join("knowledge/entities").exists());
    assert!(store.index_snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_relation_requires_endpoints_and_kind() {
    let (_dir, store) = store();
    let input = AddKnowledge {
        relation_type: None,
        ..AddKnowledge::relation("A", "B", RelationType::Uses)
    };
    let err = store.add(input).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("fromEntity, toEntity, and relationType"));
}

#[tokio::test]
async fn test_add_relation_through_add() {
    let (_dir, store) = store();
    let record = store
        .add(AddKnowledge::relation("BERT", "Transformer", RelationType::DerivedFrom))
        .await
        .unwrap();
    assert_eq!(record.kind(), KnowledgeType::Relation);
    let relations = store.get_relations("BERT").await.unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].id, record.id());
}

// =============================================================================
// Relations
// =============================================================================

#[tokio::test]
async fn test_relation_visible_from_both_ends() {
    let (_dir, store) = store();
    let relation = store
        .relate(RelateKnowledge::new("A", "B", RelationType::Uses))
        .await
        .unwrap();
    assert!(!relation.bidirectional);

    let from_a = store.get_relations("A").await.unwrap();
    let from_b = store.get_relations("B").await.unwrap();
    assert_eq!(from_a, vec![relation.clone()]);
    assert_eq!(from_b, vec![relation]);
    assert!(store.get_relations("C").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_relations_do_not_need_existing_entities() {
    let (_dir, store) = store();
    store
        .relate(RelateKnowledge {
            description: Some("ghost edge".into()),
            bidirectional: Some(true),
            ..RelateKnowledge::new("Nowhere", "Nothing", RelationType::RelatedTo)
        })
        .await
        .unwrap();
    let relations = store.get_relations("Nothing").await.unwrap();
    assert_eq!(relations.len(), 1);
    assert!(relations[0].bidirectional);
}

// =============================================================================
// Search
// =============================================================================

async fn seeded() -> (TempDir, KnowledgeStore) {
    let (dir, store) = store();
    store
        .add(AddKnowledge::concept("Transformer", "Attention-only model").tags(["nlp", "architecture"]))
        .await
        .unwrap();
    store
        .add(AddKnowledge::concept("ResNet", "Residual conv network").tags(["cv", "architecture"]))
        .await
        .unwrap();
    store
        .add(AddKnowledge::method("Dropout", "Randomly zero activations").tags(["regularization"]))
        .await
        .unwrap();
    store
        .add(AddKnowledge::finding("Attention is enough", "Attention replaces recurrence").tags(["nlp"]))
        .await
        .unwrap();
    store
        .relate(RelateKnowledge::new("Transformer", "Attention", RelationType::Uses))
        .await
        .unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_search_entities_sorted_by_name() {
    let (_dir, store) = seeded().await;
    let result = store.search(&KnowledgeFilters::default()).await.unwrap();
    assert_eq!(
        names(&result.entities),
        ["Attention is enough", "Dropout", "ResNet", "Transformer"]
    );
    assert_eq!(result.total, 5);
    assert_eq!(result.relations.len(), 1);
}

#[tokio::test]
async fn test_search_tags_match_any() {
    let (_dir, store) = seeded().await;
    let filters = KnowledgeFilters {
        tags: Some(vec!["cv".into(), "regularization".into()]),
        types: Some(KnowledgeType::ENTITY_TYPES.to_vec()),
        ..KnowledgeFilters::default()
    };
    let result = store.search(&filters).await.unwrap();
    assert_eq!(names(&result.entities), ["Dropout", "ResNet"]);
    assert!(result.relations.is_empty());
}

#[tokio::test]
async fn test_search_query_covers_entities_and_relations() {
    let (_dir, store) = seeded().await;
    let result = store.search(&KnowledgeFilters::query("attention")).await.unwrap();
    assert_eq!(names(&result.entities), ["Attention is enough", "Transformer"]);
    assert_eq!(result.relations.len(), 1);
    assert_eq!(result.total, 3);
}

#[tokio::test]
async fn test_search_relations_fill_remaining_limit() {
    let (_dir, store) = seeded().await;

    let tight = KnowledgeFilters {
        limit: Some(2),
        ..KnowledgeFilters::query("attention")
    };
    let result = store.search(&tight).await.unwrap();
    assert_eq!(result.entities.len(), 2);
    assert!(result.relations.is_empty());
    assert_eq!(result.total, 3);

    let roomy = KnowledgeFilters {
        limit: Some(3),
        ..KnowledgeFilters::query("attention")
    };
    let result = store.search(&roomy).await.unwrap();
    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.relations.len(), 1);

    let one = KnowledgeFilters {
        limit: Some(1),
        ..KnowledgeFilters::query("attention")
    };
    let result = store.search(&one).await.unwrap();
    assert_eq!(names(&result.entities), ["Attention is enough"]);
    assert!(result.relations.is_empty());
    assert_eq!(result.total, 3);
}

#[tokio::test]
async fn test_search_restricted_to_relations() {
    let (_dir, store) = seeded().await;
    let filters = KnowledgeFilters {
        types: Some(vec![KnowledgeType::Relation]),
        ..KnowledgeFilters::query("uses")
    };
    let result = store.search(&filters).await.unwrap();
    assert!(result.entities.is_empty());
    assert_eq!(result.relations.len(), 1);
    assert_eq!(result.total, 1);
}

#[tokio::test]
async fn test_search_default_limit_is_ten() {
    let (_dir, store) = store();
    for i in 0..12 {
        store
            .add(AddKnowledge::concept(format!("Concept {i:02}"), "filler"))
            .await
            .unwrap();
    }
    let result = store.search(&KnowledgeFilters::default()).await.unwrap();
    assert_eq!(result.entities.len(), 10);
    assert_eq!(result.total, 12);
    assert_eq!(result.entities[0].name(), "Concept 00");
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_description_and_tags_by_name() {
    let (_dir, store) = seeded().await;
    let before = store.get("Dropout").await.unwrap().unwrap();

    let updated = store
        .update(UpdateKnowledge {
            name: Some("dropout".into()),
            description: Some("Zero activations with probability p".into()),
            tags: Some(vec!["regularization".into(), "training".into()]),
            ..UpdateKnowledge::default()
        })
        .await
        .unwrap();

    assert_eq!(updated.id(), before.id());
    assert_eq!(updated.base().description, "Zero activations with probability p");
    assert!(updated.base().updated_at >= before.base().updated_at);
    assert_eq!(updated.base().created_at, before.base().created_at);
    assert_eq!(store.get("Dropout").await.unwrap(), Some(updated));
}

#[tokio::test]
async fn test_update_aliases_reindexes() {
    let (_dir, store) = store();
    let added = entity(
        store
            .add(AddKnowledge::concept("Transformer", "x").aliases(["TF"]))
            .await
            .unwrap(),
    );

    store
        .update(UpdateKnowledge {
            id: Some("Transformer".into()),
            aliases: Some(vec!["Vaswani model".into()]),
            ..UpdateKnowledge::default()
        })
        .await
        .unwrap();

    let by_new_alias = store.get("vaswani MODEL").await.unwrap();
    assert_eq!(by_new_alias.as_ref().map(KnowledgeEntity::id), Some(added.id()));

    let index = store.index_snapshot().await.unwrap();
    assert!(!index.contains_key("tf"));
    assert!(index.contains_key("transformer"));
}

#[tokio::test]
async fn test_update_requires_a_key() {
    let (_dir, store) = store();
    let err = store.update(UpdateKnowledge::default()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_unknown_is_not_found() {
    let (_dir, store) = store();
    let err = store
        .update(UpdateKnowledge {
            name: Some("ghost".into()),
            ..UpdateKnowledge::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Entity not found: ghost");
}

// =============================================================================
// Index recovery
// =============================================================================

#[tokio::test]
async fn test_rebuild_index_from_files() {
    let (dir, store) = seeded().await;
    store
        .update(UpdateKnowledge {
            name: Some("ResNet".into()),
            aliases: Some(vec!["Residual Network".into()]),
            ..UpdateKnowledge::default()
        })
        .await
        .unwrap();
    let before = store.index_snapshot().await.unwrap();

    std::fs::write(dir.path().join("knowledge/index.json"), "{}").unwrap();
    let fresh = KnowledgeStore::new(dir.path().join("knowledge"));
    assert_eq!(fresh.rebuild_index().await.unwrap(), before.len());
    assert_eq!(fresh.index_snapshot().await.unwrap(), before);

    let reloaded = KnowledgeStore::new(dir.path().join("knowledge"));
    assert!(reloaded.get("residual network").await.unwrap().is_some());
}

#[tokio::test]
async fn test_get_by_opaque_id_scans() {
    let (_dir, store) = seeded().await;
    let resnet = store.get("ResNet").await.unwrap().unwrap();
    let found = store.get(resnet.id()).await.unwrap();
    assert_eq!(found.as_ref().map(KnowledgeEntity::name), Some("ResNet"));
}

#[tokio::test]
async fn test_corrupt_entity_file_does_not_break_lookup() {
    let (dir, store) = seeded().await;
    std::fs::write(
        dir.path().join("knowledge/entities/concept/KN-deadbeef.json"),
        "{not json",
    )
    .unwrap();

    assert!(store.get("nothing-here").await.unwrap().is_none());
    assert!(store.get("Transformer").await.unwrap().is_some());

    std::fs::remove_file(dir.path().join("knowledge/index.json")).unwrap();
    let fresh = KnowledgeStore::new(dir.path().join("knowledge"));
    let found = fresh.get("dropout").await.unwrap();
    assert_eq!(found.as_ref().map(KnowledgeEntity::name), Some("Dropout"));
}

#[tokio::test]
async fn test_opaque_id_lookup_leaves_current_index_untouched() {
    let (dir, store) = seeded().await;
    let resnet = store.get("ResNet").await.unwrap().unwrap();

    let index_path = dir.path().join("knowledge/index.json");
    let compact = serde_json::to_string(&store.index_snapshot().await.unwrap()).unwrap();
    std::fs::write(&index_path, &compact).unwrap();

    let fresh = KnowledgeStore::new(dir.path().join("knowledge"));
    let found = fresh.get(resnet.id()).await.unwrap();
    assert_eq!(found.as_ref().map(KnowledgeEntity::name), Some("ResNet"));
    assert_eq!(std::fs::read_to_string(&index_path).unwrap(), compact);
}

#[tokio::test]
async fn test_short_id_lookup_stays_inside_entity_dirs() {
    let (dir, store) = seeded().await;
    let knowledge = dir.path().join("knowledge");
    let resnet = store.get("ResNet").await.unwrap().unwrap();

    // A valid entity file outside the entity directories, reachable only
    // through `..` segments.
    std::fs::create_dir_all(knowledge.join("entities/concept/KN-")).unwrap();
    std::fs::write(
        knowledge.join("outside.json"),
        serde_json::to_string(&resnet).unwrap(),
    )
    .unwrap();

    let fresh = KnowledgeStore::new(&knowledge);
    assert!(fresh.get("KN-/../../../outside").await.unwrap().is_none());
}
