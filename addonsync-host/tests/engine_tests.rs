//! End-to-end tests: config on disk, engine startup, background tasks.

use addonsync_host::*;
use addonsync_pack::ArchiveBuilder;
use addonsync_protocol::PacketKind;
use addonsync_types::{ContentId, EntityTypeId, PropertyValue, RuntimeId};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

const GOLEM: &str = r#"{
    "format_version": "1.21.0",
    "minecraft:entity": {
        "description": {
            "identifier": "demo:golem",
            "spawn_category": "creature",
            "properties": {
                "demo:phase": { "type": "int", "range": [0, 4], "default": 1 },
                "demo:glow": { "type": "float", "range": [0.0, 1.0], "default": 0.5 },
                "demo:broken": { "type": "int", "range": [0, 1], "default": 5 }
            }
        }
    }
}"#;

struct NoEntities;

impl EntityDirectory for NoEntities {
    fn entity_type_of(&self, _runtime_id: RuntimeId) -> Option<EntityTypeId> {
        None
    }

    fn entities_visible_to(&self, _viewer: RuntimeId, _entity_type: &EntityTypeId) -> Vec<RuntimeId> {
        Vec::new()
    }

    fn resend_actor_data(&self, _runtime_id: RuntimeId, _recipient: Option<RuntimeId>) {}
}

fn packs_dir() -> (TempDir, ContentId, ContentId) {
    let dir = TempDir::new().unwrap();
    let (golems, plain) = (ContentId::random(), ContentId::random());
    ArchiveBuilder::new("Golems", golems)
        .script("javascript", "scripts/main.js")
        .entity("golem.json", GOLEM)
        .write_to(dir.path().join("golems.mcpack"))
        .unwrap();
    ArchiveBuilder::new("Plain", plain)
        .write_to(dir.path().join("plain.zip"))
        .unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        "[addons]\nbehavior_stack = [\"golems.mcpack\", \"plain.zip\"]\n",
    )
    .unwrap();
    (dir, golems, plain)
}

fn start(dir: &TempDir) -> (AddonEngine, Arc<InMemoryPackManager>) {
    let manager = Arc::new(InMemoryPackManager::new());
    let engine = AddonEngine::start(
        dir.path(),
        Arc::clone(&manager) as Arc<dyn ResourcePackManager>,
        Arc::new(NoEntities),
    )
    .unwrap();
    (engine, manager)
}

// ================================================================
// Config
// ================================================================

#[test]
fn first_start_creates_directory_and_default_config() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("behavior_packs");

    let config = AddonConfig::load_or_init(&dir).unwrap();
    assert_eq!(config, AddonConfig::default());
    assert!(dir.join(CONFIG_FILE).is_file());

    std::fs::write(
        dir.join(CONFIG_FILE),
        "[addons]\nbehavior_stack = [\"x.mcpack\"]\n",
    )
    .unwrap();
    let edited = AddonConfig::load_or_init(&dir).unwrap();
    assert_eq!(edited.addons.behavior_stack, vec!["x.mcpack"]);
}

#[test]
fn packs_path_that_is_a_file_is_rejected() {
    let root = TempDir::new().unwrap();
    let file = root.path().join("packs");
    std::fs::write(&file, b"").unwrap();
    assert!(matches!(
        AddonConfig::load_or_init(&file),
        Err(ConfigError::NotADirectory(_))
    ));
}

#[test]
fn malformed_config_fails_startup() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE), "[addons\n").unwrap();
    let result = AddonEngine::start(
        dir.path(),
        Arc::new(InMemoryPackManager::new()),
        Arc::new(NoEntities),
    );
    assert!(matches!(
        result,
        Err(HostError::Config(ConfigError::Parse { .. }))
    ));
}

// ================================================================
// Engine
// ================================================================

#[test]
fn engine_loads_packages_and_declared_properties() {
    let (dir, golems, plain) = packs_dir();
    let (engine, manager) = start(&dir);

    assert_eq!(manager.stack_ids(), vec![golems, plain]);
    assert_eq!(engine.packages().len(), 2);
    assert_eq!(engine.config().protocol.experiments, vec!["gametest"]);

    let golem = EntityTypeId::new("demo:golem").unwrap();
    let names: Vec<_> = engine
        .properties()
        .schema()
        .slots(&golem)
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["demo:phase", "demo:glow"]);
    assert_eq!(
        engine
            .properties()
            .get_client_property(RuntimeId(1), &golem, "demo:glow"),
        PropertyValue::Float(0.5)
    );

    let pipeline = engine.pipeline();
    assert_eq!(pipeline.handler_count(PacketKind::StartGame), 2);
    assert_eq!(pipeline.handler_count(PacketKind::ResourcePacksInfo), 1);
    assert_eq!(pipeline.handler_count(PacketKind::SetActorData), 1);
    assert_eq!(pipeline.handler_count(PacketKind::PlayStatus), 1);
}

#[test]
fn engine_without_packages_installs_only_property_hooks() {
    let dir = TempDir::new().unwrap();
    let (engine, manager) = start(&dir);

    assert!(engine.packages().is_empty());
    assert!(manager.stack_ids().is_empty());
    assert_eq!(engine.pipeline().handler_count(PacketKind::ResourcePackStack), 0);
    assert_eq!(engine.pipeline().handler_count(PacketKind::StartGame), 1);
}

#[tokio::test]
async fn warm_hashes_matches_direct_digest() {
    let (dir, _, _) = packs_dir();
    let (engine, _) = start(&dir);
    let pool = TaskPool::current().unwrap();

    assert_eq!(engine.warm_hashes(&pool).await, 2);
    let listed = engine.packages().list_loaded_packages().unwrap();
    for (info, package) in listed.iter().zip(engine.packages().packages()) {
        assert_eq!(info.hash, hex::encode(package.sha256_uncached().unwrap()));
    }
}

// ================================================================
// Task pool
// ================================================================

#[tokio::test]
async fn load_task_resolves_with_package() {
    let (dir, golems, _) = packs_dir();
    let pool = TaskPool::current().unwrap();

    let promise = pool.submit(Task::LoadPackage(dir.path().join("golems.mcpack")));
    let output = promise.settled().await.unwrap();
    let TaskOutput::Loaded(package) = &*output else {
        panic!("unexpected output {output:?}");
    };
    assert_eq!(package.content_id(), golems);
    assert!(promise.is_settled());
}

#[tokio::test]
async fn failing_task_rejects_and_runs_catch() {
    let dir = TempDir::new().unwrap();
    let pool = TaskPool::current().unwrap();

    let promise = pool.submit(Task::LoadPackage(dir.path().join("missing.mcpack")));
    let failure = promise.settled().await.unwrap_err();
    assert!(failure.message.contains("missing.mcpack"));

    let (tx, rx) = tokio::sync::oneshot::channel();
    promise.catch(move |f| {
        let _ = tx.send(f.clone());
    });
    assert_eq!(rx.await.unwrap(), failure);
}

#[tokio::test]
async fn chunk_task_reads_requested_range() {
    let (dir, _, _) = packs_dir();
    let (engine, _) = start(&dir);
    let package = Arc::clone(&engine.packages().packages()[1]);
    let pool = TaskPool::current().unwrap();

    let output = pool
        .submit(Task::ReadChunk {
            package: Arc::clone(&package),
            start: 0,
            length: 4,
        })
        .settled()
        .await
        .unwrap();
    let TaskOutput::Chunk(bytes) = &*output else {
        panic!("unexpected output {output:?}");
    };
    assert_eq!(bytes.as_slice(), b"PK\x03\x04");

    let rejected = pool
        .submit(Task::ReadChunk {
            package,
            start: 0,
            length: 0,
        })
        .settled()
        .await;
    assert!(rejected.is_err());
}
