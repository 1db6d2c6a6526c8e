//! Session persistence for save/load functionality.
//!
//! Serializes complete game states to tagged JSON files (one file per
//! session and tag, so an "auto" save never clobbers a "manual" one).
//! Save files carry a format version and a small metadata header that
//! can be read without parsing the full state.

use crate::world::{GameState, SessionId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no {tag} save found for session {session_id}")]
    NotFound { session_id: SessionId, tag: String },

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved session with everything needed to resume play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// Unix seconds when the save was written.
    pub saved_at: u64,

    /// The complete game state.
    pub state: GameState,

    /// Metadata about the save.
    pub metadata: SaveMetadata,
}

/// Quick-access facts about a save, readable without the full state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub session_id: SessionId,
    pub player_name: String,
    pub universe: String,
    pub level: i32,
    pub location: String,
    pub day: u32,
    pub history_entries: usize,
    pub saved_at: u64,
}

impl SavedSession {
    /// Wrap a game state for saving.
    pub fn new(state: GameState) -> Self {
        let saved_at = crate::world::unix_now();
        let metadata = SaveMetadata {
            session_id: state.session_id,
            player_name: state.player.name.clone(),
            universe: state.settings.universe.clone(),
            level: state.player.stats.level,
            location: state
                .world
                .locations
                .get(&state.world.current_location)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            day: state.world.clock.day,
            history_entries: state.narrative_history.len(),
            saved_at,
        };

        Self {
            version: SAVE_VERSION,
            saved_at,
            state,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read just the metadata header of a save file.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SaveMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// Path of a session's save file for a tag.
pub fn save_path(dir: impl AsRef<Path>, session_id: SessionId, tag: &str) -> PathBuf {
    let sanitized: String = tag
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    dir.as_ref().join(format!("{session_id}_{sanitized}.json"))
}

/// Save a game state under a tag ("auto", "manual", ...).
pub async fn save(
    dir: impl AsRef<Path>,
    state: GameState,
    tag: &str,
) -> Result<PathBuf, PersistError> {
    let path = save_path(&dir, state.session_id, tag);
    SavedSession::new(state).save_json(&path).await?;
    Ok(path)
}

/// Load a session's state back from a tagged save.
pub async fn load(
    dir: impl AsRef<Path>,
    session_id: SessionId,
    tag: &str,
) -> Result<GameState, PersistError> {
    let path = save_path(&dir, session_id, tag);
    if !path.exists() {
        return Err(PersistError::NotFound {
            session_id,
            tag: tag.to_string(),
        });
    }
    let saved = SavedSession::load_json(&path).await?;
    Ok(saved.state)
}

/// Information about one save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub path: PathBuf,
    pub metadata: SaveMetadata,
}

/// List all readable saves in a directory, most recent first.
pub async fn list_saves(dir: impl AsRef<Path>) -> Result<Vec<SaveInfo>, PersistError> {
    let dir = dir.as_ref();
    let mut saves = Vec::new();

    if !dir.exists() {
        return Ok(saves);
    }

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(metadata) = SavedSession::peek_metadata(&path).await {
                saves.push(SaveInfo { path, metadata });
            }
        }
    }

    saves.sort_by(|a, b| b.metadata.saved_at.cmp(&a.metadata.saved_at));
    Ok(saves)
}

/// List a single session's saves across tags.
pub async fn list_session_saves(
    dir: impl AsRef<Path>,
    session_id: SessionId,
) -> Result<Vec<SaveInfo>, PersistError> {
    let mut saves = list_saves(dir).await?;
    saves.retain(|s| s.metadata.session_id == session_id);
    Ok(saves)
}

/// Delete every save belonging to a session. Returns how many files
/// were removed.
pub async fn delete_session_saves(
    dir: impl AsRef<Path>,
    session_id: SessionId,
) -> Result<usize, PersistError> {
    let saves = list_session_saves(&dir, session_id).await?;
    let mut removed = 0;
    for save in saves {
        fs::remove_file(&save.path).await?;
        removed += 1;
    }
    Ok(removed)
}

/// A shareable summary of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExport {
    pub player_name: String,
    pub level: i32,
    pub location: String,
    pub days_played: u32,
    pub completed_quests: Vec<String>,
    pub recent_events: Vec<String>,
}

impl SessionExport {
    /// Build an export summary from a saved session.
    pub fn from_saved(saved: &SavedSession) -> Self {
        let completed_quests = saved
            .state
            .quests
            .iter()
            .filter(|q| q.status == crate::world::QuestStatus::Completed)
            .map(|q| q.title.clone())
            .collect();

        let recent_events = saved
            .state
            .narrative_history
            .iter()
            .rev()
            .take(20)
            .map(|entry| {
                let char_count = entry.content.chars().count();
                if char_count > 100 {
                    let truncated: String = entry.content.chars().take(100).collect();
                    format!("{truncated}...")
                } else {
                    entry.content.clone()
                }
            })
            .collect();

        Self {
            player_name: saved.metadata.player_name.clone(),
            level: saved.metadata.level,
            location: saved.metadata.location.clone(),
            days_played: saved.metadata.day,
            completed_quests,
            recent_events,
        }
    }
}
