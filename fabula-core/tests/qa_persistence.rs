//! QA tests for session persistence round trips.

use fabula_core::persist::{self, SavedSession, SessionExport};
use fabula_core::world::NarrativeEntry;
use fabula_core::{ActionKind, NarrativeStyle, PersistError, SessionId, SessionStore};
use tempfile::TempDir;

fn seeded_store() -> (SessionStore, SessionId) {
    let store = SessionStore::default();
    let id = store.create_session("Arden", "fantasy", NarrativeStyle::Gritty);
    store.update_stats(id, &[("health", -12)]).unwrap();
    store.update_npc_relationship(id, "Mirela", 0.4).unwrap();
    store
        .add_narrative_entry(id, NarrativeEntry::user_action("attaque", ActionKind::Combat))
        .unwrap();
    (store, id)
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let (store, id) = seeded_store();

    let state = store.export_state(id).unwrap();
    let path = persist::save(dir.path(), state, "auto").await.unwrap();
    assert!(path.exists());

    let loaded = persist::load(dir.path(), id, "auto").await.unwrap();
    assert_eq!(loaded.session_id, id);
    assert_eq!(loaded.player.stats.health, 88);
    assert_eq!(loaded.narrative_history.len(), 1);
    let mirela = loaded
        .world
        .npcs
        .values()
        .find(|n| n.name == "Mirela")
        .unwrap();
    assert!((mirela.relationship_with_player - 0.4).abs() < 1e-6);
    assert_eq!(loaded.settings.narrative_style, NarrativeStyle::Gritty);
}

#[tokio::test]
async fn test_loaded_state_installs_into_a_store() {
    let dir = TempDir::new().expect("temp dir");
    let (store, id) = seeded_store();

    let state = store.export_state(id).unwrap();
    persist::save(dir.path(), state, "manual").await.unwrap();

    // A fresh store resumes the session from disk.
    let restored = SessionStore::default();
    let loaded = persist::load(dir.path(), id, "manual").await.unwrap();
    let installed = restored.install_state(loaded);
    assert_eq!(installed, id);
    assert_eq!(
        restored.export_state(id).unwrap().player.stats.health,
        88
    );
    // Rollback history does not survive persistence.
    assert_eq!(restored.snapshot_count(id).unwrap(), 0);
}

#[tokio::test]
async fn test_missing_save_is_not_found() {
    let dir = TempDir::new().expect("temp dir");
    let ghost = SessionId::new();

    let result = persist::load(dir.path(), ghost, "auto").await;
    assert!(matches!(result, Err(PersistError::NotFound { .. })));
}

#[tokio::test]
async fn test_tags_do_not_clobber_each_other() {
    let dir = TempDir::new().expect("temp dir");
    let (store, id) = seeded_store();

    persist::save(dir.path(), store.export_state(id).unwrap(), "auto")
        .await
        .unwrap();
    store.update_stats(id, &[("health", -50)]).unwrap();
    persist::save(dir.path(), store.export_state(id).unwrap(), "manual")
        .await
        .unwrap();

    let auto = persist::load(dir.path(), id, "auto").await.unwrap();
    let manual = persist::load(dir.path(), id, "manual").await.unwrap();
    assert_eq!(auto.player.stats.health, 88);
    assert_eq!(manual.player.stats.health, 38);
}

#[tokio::test]
async fn test_peek_reads_metadata_only() {
    let dir = TempDir::new().expect("temp dir");
    let (store, id) = seeded_store();
    let path = persist::save(dir.path(), store.export_state(id).unwrap(), "auto")
        .await
        .unwrap();

    let metadata = SavedSession::peek_metadata(&path).await.unwrap();
    assert_eq!(metadata.session_id, id);
    assert_eq!(metadata.player_name, "Arden");
    assert_eq!(metadata.history_entries, 1);
}

#[tokio::test]
async fn test_list_and_delete_session_saves() {
    let dir = TempDir::new().expect("temp dir");
    let (store, id) = seeded_store();
    let other = store.create_session("Brielle", "fantasy", NarrativeStyle::Epic);

    persist::save(dir.path(), store.export_state(id).unwrap(), "auto")
        .await
        .unwrap();
    persist::save(dir.path(), store.export_state(id).unwrap(), "manual")
        .await
        .unwrap();
    persist::save(dir.path(), store.export_state(other).unwrap(), "auto")
        .await
        .unwrap();

    let all = persist::list_saves(dir.path()).await.unwrap();
    assert_eq!(all.len(), 3);

    let mine = persist::list_session_saves(dir.path(), id).await.unwrap();
    assert_eq!(mine.len(), 2);

    let removed = persist::delete_session_saves(dir.path(), id).await.unwrap();
    assert_eq!(removed, 2);
    let remaining = persist::list_saves(dir.path()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].metadata.player_name, "Brielle");
}

#[tokio::test]
async fn test_export_summary() {
    let dir = TempDir::new().expect("temp dir");
    let (store, id) = seeded_store();
    let path = persist::save(dir.path(), store.export_state(id).unwrap(), "auto")
        .await
        .unwrap();

    let saved = SavedSession::load_json(&path).await.unwrap();
    let export = SessionExport::from_saved(&saved);
    assert_eq!(export.player_name, "Arden");
    assert_eq!(export.location, "Starting Village");
    assert_eq!(export.recent_events.len(), 1);
}
