//! Session store - the single source of truth for game state.
//!
//! Owns one canonical `GameState` per active session, reachable only
//! through this API. Every mutating call first captures a snapshot of
//! the pre-mutation state into a bounded FIFO ring, which is what
//! `rollback` restores from. Read access goes through per-consumer
//! projection types so each engine sees exactly the fields it needs.
//!
//! Critical sections are pure CPU and never await; the per-session
//! mutex is released before any network I/O happens elsewhere.

use crate::world::{
    ActionKind, EntryKind, GameSettings, GameState, InventoryItem, LocationKind, NarrativeEntry,
    NarrativeStyle, Npc, PlayerStats, Quest, QuestId, QuestStatus, SessionId, Weather, WorldClock,
    WorldEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

/// How many recent narrative entries survive a compression pass intact.
const COMPRESSION_KEEP_RECENT: usize = 10;

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("rollback history exhausted: requested {requested}, available {available}")]
    HistoryExhausted { requested: usize, available: usize },
}

/// Store tuning knobs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum retained snapshots per session (FIFO eviction).
    pub max_history_size: usize,

    /// User actions between narrative compression passes.
    pub compression_threshold: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history_size: 10,
            compression_threshold: 15,
        }
    }
}

/// Per-session live state plus rollback ring.
struct SessionSlot {
    state: GameState,
    /// Pre-mutation snapshots, oldest first.
    snapshots: Vec<GameState>,
    actions_since_compression: u32,
}

/// The session store.
pub struct SessionStore {
    config: StoreConfig,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionSlot>>>>,
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create a new session and return its id.
    pub fn create_session(
        &self,
        player_name: impl Into<String>,
        universe: impl Into<String>,
        style: NarrativeStyle,
    ) -> SessionId {
        let settings = GameSettings {
            universe: universe.into(),
            narrative_style: style,
        };
        let state = GameState::new(player_name, settings);
        let id = state.session_id;

        let slot = SessionSlot {
            state,
            snapshots: Vec::new(),
            actions_since_compression: 0,
        };

        self.sessions
            .write()
            .expect("session map poisoned")
            .insert(id, Arc::new(Mutex::new(slot)));

        tracing::info!(session = %id, "session created");
        id
    }

    /// All live session ids.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .expect("session map poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Drop a session and its history.
    pub fn remove_session(&self, id: SessionId) -> Result<(), StoreError> {
        self.sessions
            .write()
            .expect("session map poisoned")
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    // ========================================================================
    // Read projections
    // ========================================================================

    /// Read-only context, containing only the requested slices.
    pub fn context(&self, id: SessionId, subsystems: &[Subsystem]) -> Result<ContextBundle, StoreError> {
        self.with_slot(id, |slot| {
            let mut bundle = ContextBundle::default();
            for subsystem in subsystems {
                match subsystem {
                    Subsystem::Interpreter => {
                        bundle.interpreter = Some(InterpreterContext::project(&slot.state))
                    }
                    Subsystem::Simulation => {
                        bundle.simulation = Some(SimulationView::project(&slot.state))
                    }
                    Subsystem::Narrative => {
                        bundle.narrative = Some(DirectorView::project(&slot.state))
                    }
                }
            }
            bundle
        })
    }

    /// Full state copy, for the persistence collaborator.
    pub fn export_state(&self, id: SessionId) -> Result<GameState, StoreError> {
        self.with_slot(id, |slot| slot.state.clone())
    }

    /// Replace a session's live state with a loaded one. Registers the
    /// session if it is not already live. History starts empty.
    pub fn install_state(&self, state: GameState) -> SessionId {
        let id = state.session_id;
        let slot = SessionSlot {
            state,
            snapshots: Vec::new(),
            actions_since_compression: 0,
        };
        self.sessions
            .write()
            .expect("session map poisoned")
            .insert(id, Arc::new(Mutex::new(slot)));
        id
    }

    /// Number of rollback snapshots currently held.
    pub fn snapshot_count(&self, id: SessionId) -> Result<usize, StoreError> {
        self.with_slot(id, |slot| slot.snapshots.len())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Apply stat deltas, clamping each touched stat. Unknown keys are
    /// ignored.
    pub fn update_stats(&self, id: SessionId, deltas: &[(&str, i32)]) -> Result<(), StoreError> {
        self.mutate(id, |state| {
            for (key, delta) in deltas {
                state.player.stats.apply_delta(key, *delta);
            }
        })
    }

    /// Add an item to the player inventory.
    pub fn add_inventory_item(&self, id: SessionId, item: InventoryItem) -> Result<(), StoreError> {
        self.mutate(id, |state| state.player.inventory.push(item))
    }

    /// Shift the relationship with a named NPC, clamped to [-1, 1].
    ///
    /// The name is matched case-insensitively. An unknown NPC is a
    /// skipped no-op, not an error; returns whether anything changed.
    pub fn update_npc_relationship(
        &self,
        id: SessionId,
        npc_name: &str,
        delta: f32,
    ) -> Result<bool, StoreError> {
        let needle = npc_name.to_lowercase();
        self.with_slot(id, |slot| {
            let found = slot
                .state
                .world
                .npcs
                .values()
                .any(|n| n.name.to_lowercase() == needle);
            if !found {
                tracing::warn!(session = %id, npc = npc_name, "relationship update for unknown NPC skipped");
                return false;
            }
            Self::push_snapshot(slot, &self.config);
            for npc in slot.state.world.npcs.values_mut() {
                if npc.name.to_lowercase() == needle {
                    npc.relationship_with_player =
                        (npc.relationship_with_player + delta).clamp(-1.0, 1.0);
                }
            }
            slot.state.updated_at = crate::world::unix_now();
            true
        })
    }

    /// Shift the player's standing with a faction, clamped to [-1, 1].
    pub fn update_reputation(&self, id: SessionId, faction: &str, delta: f32) -> Result<(), StoreError> {
        self.mutate(id, |state| {
            let standing = state.reputation.entry(faction.to_string()).or_insert(0.0);
            *standing = (*standing + delta).clamp(-1.0, 1.0);
        })
    }

    /// Append a narrative entry. User actions count toward the
    /// compression threshold; crossing it condenses older history.
    pub fn add_narrative_entry(&self, id: SessionId, entry: NarrativeEntry) -> Result<(), StoreError> {
        let threshold = self.config.compression_threshold;
        self.with_slot(id, |slot| {
            Self::push_snapshot(slot, &self.config);
            let is_user_action = entry.kind == EntryKind::UserAction;
            slot.state.narrative_history.push(entry);
            if is_user_action {
                slot.actions_since_compression += 1;
                if slot.actions_since_compression >= threshold {
                    Self::compress_history(slot);
                    slot.actions_since_compression = 0;
                }
            }
            slot.state.updated_at = crate::world::unix_now();
        })
    }

    /// Add a quest.
    pub fn add_quest(&self, id: SessionId, quest: Quest) -> Result<(), StoreError> {
        self.mutate(id, |state| state.quests.push(quest))
    }

    /// Add an NPC to the world and its location's resident list.
    pub fn add_npc(&self, id: SessionId, npc: Npc) -> Result<(), StoreError> {
        self.mutate(id, |state| {
            if let Some(location) = state.world.locations.get_mut(&npc.location) {
                location.npcs_present.push(npc.id);
            }
            state.world.npcs.insert(npc.id, npc);
        })
    }

    /// Add a location to the world map.
    pub fn add_location(&self, id: SessionId, location: crate::world::Location) -> Result<(), StoreError> {
        self.mutate(id, |state| {
            state.world.locations.insert(location.id, location);
        })
    }

    /// Move the player to a known location. Returns false (and changes
    /// nothing) when the destination is unknown.
    pub fn move_player(
        &self,
        id: SessionId,
        destination: crate::world::LocationId,
    ) -> Result<bool, StoreError> {
        self.with_slot(id, |slot| {
            if !slot.state.world.locations.contains_key(&destination) {
                return false;
            }
            Self::push_snapshot(slot, &self.config);
            slot.state.world.current_location = destination;
            slot.state.updated_at = crate::world::unix_now();
            true
        })
    }

    /// Set the current weather.
    pub fn set_weather(&self, id: SessionId, weather: Weather) -> Result<(), StoreError> {
        self.mutate(id, |state| state.world.weather = weather)
    }

    /// Record a world event in the global log.
    pub fn record_world_event(&self, id: SessionId, event: WorldEvent) -> Result<(), StoreError> {
        self.mutate(id, |state| state.world.global_events.push(event))
    }

    /// Advance the world clock.
    pub fn advance_time(&self, id: SessionId, hours: f32) -> Result<(), StoreError> {
        self.mutate(id, |state| state.world.clock.advance_hours(hours))
    }

    /// Decrement quest timers by elapsed hours; quests whose remaining
    /// time reaches zero are failed. Returns the expired quest ids.
    pub fn advance_quest_clock(&self, id: SessionId, hours: f32) -> Result<Vec<QuestId>, StoreError> {
        self.mutate_with(id, |state| {
            let mut expired = Vec::new();
            for quest in &mut state.quests {
                if quest.status != QuestStatus::Active {
                    continue;
                }
                if let Some(remaining) = quest.time_limit.as_mut() {
                    *remaining -= hours;
                    if *remaining <= 0.0 {
                        quest.status = QuestStatus::Failed;
                        quest.time_limit = Some(0.0);
                        expired.push(quest.id);
                    }
                }
            }
            expired
        })
    }

    /// Set the narrative arc phase cursor.
    pub fn set_arc_phase(&self, id: SessionId, phase: &str) -> Result<(), StoreError> {
        self.mutate(id, |state| state.narrative_phase = Some(phase.to_string()))
    }

    /// Restore the state from exactly `steps` mutations back, atomically.
    ///
    /// Fails without touching anything when the request exceeds the
    /// recorded history (or is zero).
    pub fn rollback(&self, id: SessionId, steps: usize) -> Result<(), StoreError> {
        let slot = self.slot(id)?;
        let mut slot = slot.lock().expect("session slot poisoned");

        let available = slot.snapshots.len();
        if steps == 0 || steps > available {
            return Err(StoreError::HistoryExhausted {
                requested: steps,
                available,
            });
        }

        let target_index = available - steps;
        let target = slot.snapshots[target_index].clone();
        slot.snapshots.truncate(target_index);
        slot.state = target;

        tracing::info!(session = %id, steps, remaining = slot.snapshots.len(), "state rolled back");
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn slot(&self, id: SessionId) -> Result<Arc<Mutex<SessionSlot>>, StoreError> {
        self.sessions
            .read()
            .expect("session map poisoned")
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn with_slot<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SessionSlot) -> T,
    ) -> Result<T, StoreError> {
        let slot = self.slot(id)?;
        let mut slot = slot.lock().expect("session slot poisoned");
        Ok(f(&mut slot))
    }

    /// Snapshot the pre-mutation state, then apply the mutation.
    fn mutate(&self, id: SessionId, f: impl FnOnce(&mut GameState)) -> Result<(), StoreError> {
        self.mutate_with(id, |state| f(state))
    }

    fn mutate_with<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut GameState) -> T,
    ) -> Result<T, StoreError> {
        self.with_slot(id, |slot| {
            Self::push_snapshot(slot, &self.config);
            let out = f(&mut slot.state);
            slot.state.updated_at = crate::world::unix_now();
            out
        })
    }

    fn push_snapshot(slot: &mut SessionSlot, config: &StoreConfig) {
        slot.snapshots.push(slot.state.clone());
        if slot.snapshots.len() > config.max_history_size {
            slot.snapshots.remove(0);
        }
    }

    /// Fold all but the most recent entries into one summary entry that
    /// keeps the action-kind stream and folded entry count intact.
    fn compress_history(slot: &mut SessionSlot) {
        let history = &mut slot.state.narrative_history;
        if history.len() <= COMPRESSION_KEEP_RECENT {
            return;
        }

        let recent = history.split_off(history.len() - COMPRESSION_KEEP_RECENT);
        let folded: Vec<NarrativeEntry> = std::mem::take(history);

        let mut summarized_actions = Vec::new();
        let mut summarized_entries = 0usize;
        let mut counts: HashMap<ActionKind, usize> = HashMap::new();
        for entry in &folded {
            summarized_actions.extend(entry.summarized_actions.iter().copied());
            summarized_entries += entry.weight();
            if let Some(kind) = entry.action {
                summarized_actions.push(kind);
            }
        }
        for kind in &summarized_actions {
            *counts.entry(*kind).or_insert(0) += 1;
        }

        let mut breakdown: Vec<String> = ActionKind::all()
            .iter()
            .filter_map(|kind| counts.get(kind).map(|n| format!("{} x{n}", kind.name())))
            .collect();
        if breakdown.is_empty() {
            breakdown.push("no player actions".to_string());
        }

        let mut summary = NarrativeEntry::system(format!(
            "Earlier events condensed ({summarized_entries} entries: {}).",
            breakdown.join(", ")
        ));
        summary.summarized_actions = summarized_actions;
        summary.summarized_entries = summarized_entries;

        history.push(summary);
        history.extend(recent);

        tracing::debug!(
            folded = summarized_entries,
            kept = COMPRESSION_KEEP_RECENT,
            "narrative history compressed"
        );
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

// ============================================================================
// Context projections
// ============================================================================

/// Which consumer a context slice is projected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Interpreter,
    Simulation,
    Narrative,
}

/// Bundle of requested read-only slices.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    pub interpreter: Option<InterpreterContext>,
    pub simulation: Option<SimulationView>,
    pub narrative: Option<DirectorView>,
}

/// Exactly what the action interpreter may read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterContext {
    pub npc_names: Vec<String>,
    pub stats: PlayerStats,
    pub inventory_names: Vec<String>,
}

impl InterpreterContext {
    fn project(state: &GameState) -> Self {
        Self {
            npc_names: state.world.npcs.values().map(|n| n.name.clone()).collect(),
            stats: state.player.stats.clone(),
            inventory_names: state
                .player
                .inventory
                .iter()
                .map(|i| i.name.clone())
                .collect(),
        }
    }
}

/// Exactly what the world simulator may read.
#[derive(Debug, Clone)]
pub struct SimulationView {
    pub npcs: Vec<Npc>,
    pub clock: WorldClock,
    pub weather: Weather,
    pub threat_level: f32,
    pub economy: f32,
    pub player_location: crate::world::LocationId,
    pub location_kind: LocationKind,
    pub active_quests: Vec<Quest>,
    pub general_reputation: f32,
}

impl SimulationView {
    fn project(state: &GameState) -> Self {
        Self {
            npcs: state.world.npcs.values().cloned().collect(),
            clock: state.world.clock.clone(),
            weather: state.world.weather,
            threat_level: state.world.threat_level,
            economy: state.world.economy,
            player_location: state.world.current_location,
            location_kind: state.world.current_location_kind(),
            active_quests: state
                .quests
                .iter()
                .filter(|q| q.status == QuestStatus::Active)
                .cloned()
                .collect(),
            general_reputation: state.reputation.get("general").copied().unwrap_or(0.0),
        }
    }
}

/// Exactly what the narrative director may read.
#[derive(Debug, Clone)]
pub struct DirectorView {
    pub player_name: String,
    pub player_level: i32,
    pub location_name: String,
    pub universe: String,
    pub narrative_style: NarrativeStyle,
    pub arc_phase: Option<String>,
    pub history: Vec<NarrativeEntry>,
    pub history_len: usize,
    pub action_stream: Vec<ActionKind>,
}

impl DirectorView {
    fn project(state: &GameState) -> Self {
        Self {
            player_name: state.player.name.clone(),
            player_level: state.player.stats.level,
            location_name: state
                .world
                .locations
                .get(&state.world.current_location)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            universe: state.settings.universe.clone(),
            narrative_style: state.settings.narrative_style,
            arc_phase: state.narrative_phase.clone(),
            history: state.narrative_history.clone(),
            history_len: state.history_len(),
            action_stream: state.action_stream(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ActionKind;

    fn store() -> SessionStore {
        SessionStore::default()
    }

    fn new_session(store: &SessionStore) -> SessionId {
        store.create_session("Arden", "fantasy", NarrativeStyle::Epic)
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let store = store();
        let ghost = SessionId::new();
        assert!(matches!(
            store.update_stats(ghost, &[("health", -5)]),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.context(ghost, &[Subsystem::Interpreter]),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_stat_deltas_clamp_and_commute() {
        let store = store();
        let id = new_session(&store);

        store.update_stats(id, &[("health", -30)]).unwrap();
        store.update_stats(id, &[("health", -90)]).unwrap();
        let state = store.export_state(id).unwrap();
        assert_eq!(state.player.stats.health, 0);

        // Same-key deltas in one call land on the same clamped result
        // regardless of order.
        let id2 = new_session(&store);
        store
            .update_stats(id2, &[("health", -90), ("health", -30)])
            .unwrap();
        let state2 = store.export_state(id2).unwrap();
        assert_eq!(state2.player.stats.health, 0);
    }

    #[test]
    fn test_unknown_stat_key_is_ignored() {
        let store = store();
        let id = new_session(&store);
        store
            .update_stats(id, &[("charm", 5), ("health", -10)])
            .unwrap();
        let state = store.export_state(id).unwrap();
        assert_eq!(state.player.stats.health, 90);
    }

    #[test]
    fn test_relationship_clamps_both_ends() {
        let store = store();
        let id = new_session(&store);

        assert!(store.update_npc_relationship(id, "Mirela", 5.0).unwrap());
        let state = store.export_state(id).unwrap();
        let mirela = state
            .world
            .npcs
            .values()
            .find(|n| n.name == "Mirela")
            .unwrap();
        assert_eq!(mirela.relationship_with_player, 1.0);

        assert!(store.update_npc_relationship(id, "mirela", -7.5).unwrap());
        let state = store.export_state(id).unwrap();
        let mirela = state
            .world
            .npcs
            .values()
            .find(|n| n.name == "Mirela")
            .unwrap();
        assert_eq!(mirela.relationship_with_player, -1.0);
    }

    #[test]
    fn test_unknown_npc_relationship_is_noop() {
        let store = store();
        let id = new_session(&store);
        let before = store.snapshot_count(id).unwrap();
        assert!(!store.update_npc_relationship(id, "Nobody", 0.5).unwrap());
        assert_eq!(store.snapshot_count(id).unwrap(), before);
    }

    #[test]
    fn test_reputation_clamps() {
        let store = store();
        let id = new_session(&store);
        store.update_reputation(id, "general", -3.0).unwrap();
        let state = store.export_state(id).unwrap();
        assert_eq!(state.reputation["general"], -1.0);
    }

    #[test]
    fn test_snapshot_ring_is_bounded() {
        let store = store();
        let id = new_session(&store);
        for i in 0..25 {
            store.update_stats(id, &[("experience", i)]).unwrap();
        }
        assert_eq!(store.snapshot_count(id).unwrap(), 10);
    }

    #[test]
    fn test_rollback_restores_exactly() {
        let store = store();
        let id = new_session(&store);

        store.update_stats(id, &[("health", -10)]).unwrap();
        store.update_stats(id, &[("health", -20)]).unwrap();
        store.update_stats(id, &[("mana", -5)]).unwrap();

        store.rollback(id, 2).unwrap();
        let state = store.export_state(id).unwrap();
        assert_eq!(state.player.stats.health, 90);
        assert_eq!(state.player.stats.mana, 100);
        assert_eq!(store.snapshot_count(id).unwrap(), 1);
    }

    #[test]
    fn test_rollback_full_history_restores_creation_state() {
        let store = store();
        let id = new_session(&store);

        store.update_stats(id, &[("health", -10)]).unwrap();
        store.update_stats(id, &[("health", -5)]).unwrap();
        store.update_reputation(id, "general", 0.2).unwrap();

        let count = store.snapshot_count(id).unwrap();
        assert_eq!(count, 3);
        store.rollback(id, count).unwrap();

        let state = store.export_state(id).unwrap();
        assert_eq!(state.player.stats.health, 100);
        assert!(state.reputation.is_empty());
        assert_eq!(store.snapshot_count(id).unwrap(), 0);
    }

    #[test]
    fn test_rollback_past_history_fails_unchanged() {
        let store = store();
        let id = new_session(&store);
        store.update_stats(id, &[("health", -10)]).unwrap();

        let result = store.rollback(id, 2);
        assert!(matches!(
            result,
            Err(StoreError::HistoryExhausted {
                requested: 2,
                available: 1
            })
        ));

        let state = store.export_state(id).unwrap();
        assert_eq!(state.player.stats.health, 90);
        assert_eq!(store.snapshot_count(id).unwrap(), 1);
    }

    #[test]
    fn test_context_contains_only_requested_slices() {
        let store = store();
        let id = new_session(&store);

        let bundle = store.context(id, &[Subsystem::Interpreter]).unwrap();
        assert!(bundle.interpreter.is_some());
        assert!(bundle.simulation.is_none());
        assert!(bundle.narrative.is_none());

        let ictx = bundle.interpreter.unwrap();
        assert!(ictx.npc_names.iter().any(|n| n == "Mirela"));
        assert_eq!(ictx.stats.health, 100);
    }

    #[test]
    fn test_compression_preserves_action_stream() {
        let store = store();
        let id = new_session(&store);

        for i in 0..15 {
            let kind = if i % 2 == 0 {
                ActionKind::Combat
            } else {
                ActionKind::Dialogue
            };
            store
                .add_narrative_entry(id, NarrativeEntry::user_action(format!("action {i}"), kind))
                .unwrap();
            store
                .add_narrative_entry(id, NarrativeEntry::response(format!("response {i}")))
                .unwrap();
        }

        let state = store.export_state(id).unwrap();
        // 30 entries were appended; compression fired at the 15th user
        // action and folded everything but the most recent 10.
        assert!(state.narrative_history.len() < 30);
        assert_eq!(state.history_len(), 30);

        let stream = state.action_stream();
        assert_eq!(stream.len(), 15);
        assert_eq!(stream[0], ActionKind::Combat);
        assert_eq!(stream[1], ActionKind::Dialogue);
    }

    #[test]
    fn test_quest_clock_expires_timed_quests() {
        let store = store();
        let id = new_session(&store);
        store
            .add_quest(id, Quest::new("Courier", "Deliver before dusk").with_time_limit(2.0))
            .unwrap();
        store
            .add_quest(id, Quest::new("Open task", "No deadline"))
            .unwrap();

        let expired = store.advance_quest_clock(id, 1.0).unwrap();
        assert!(expired.is_empty());

        let expired = store.advance_quest_clock(id, 1.5).unwrap();
        assert_eq!(expired.len(), 1);

        let state = store.export_state(id).unwrap();
        let courier = state.quests.iter().find(|q| q.title == "Courier").unwrap();
        assert_eq!(courier.status, QuestStatus::Failed);
        let open = state.quests.iter().find(|q| q.title == "Open task").unwrap();
        assert_eq!(open.status, QuestStatus::Active);
    }
}
