//! Game engine - the per-turn orchestration layer.
//!
//! Wires the four subsystems together for one turn: interpret the
//! command, advance the autonomous world, apply consequences through
//! the store, then narrate. Turns for one session are serialized by a
//! per-session guard; turns for different sessions run in parallel.
//! The only await that leaves the process is the narrative generation
//! call, and no store lock is held while it runs.

use crate::consequence;
use crate::director::{DirectorConfig, Generate, GenerationLimits, NarrativeDirector, NarrativeReport};
use crate::interpreter::{ActionInterpreter, ParsedAction, ValidationOutcome};
use crate::simulator::{StepSummary, WorldSimulator};
use crate::store::{SessionStore, StoreConfig, StoreError, Subsystem};
use crate::world::{NarrativeEntry, NarrativeStyle, SessionId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors from turn processing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// In-game hours one action takes.
    pub hours_per_action: f32,

    /// Narrative generation settings.
    pub director: DirectorConfig,

    /// Seed for the simulation rng; None draws from entropy.
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hours_per_action(mut self, hours: f32) -> Self {
        self.hours_per_action = hours;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_generation_limits(mut self, limits: GenerationLimits) -> Self {
        self.director.limits = limits;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.director.timeout = timeout;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hours_per_action: 0.25,
            director: DirectorConfig::default(),
            seed: None,
        }
    }
}

/// Everything one processed turn produced.
#[derive(Debug)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub parsed: ParsedAction,
    pub validation: ValidationOutcome,
    pub simulation: StepSummary,
    pub state_changes: Vec<String>,
    pub narrative: NarrativeReport,
}

/// The turn engine. Owns the session store and the three engines
/// around it; construct one per process and share it.
pub struct GameEngine<G: Generate> {
    store: Arc<SessionStore>,
    interpreter: ActionInterpreter,
    simulator: WorldSimulator,
    director: NarrativeDirector<G>,
    config: EngineConfig,
    rng: Mutex<StdRng>,
    turn_guards: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<G: Generate> GameEngine<G> {
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, EngineConfig::default())
    }

    pub fn with_config(generator: G, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            store: Arc::new(SessionStore::new(StoreConfig::default())),
            interpreter: ActionInterpreter::new(),
            simulator: WorldSimulator::new(),
            director: NarrativeDirector::new(generator).with_config(config.director.clone()),
            config,
            rng: Mutex::new(rng),
            turn_guards: Mutex::new(HashMap::new()),
        }
    }

    /// Use an existing store instead of a fresh one.
    pub fn with_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// The underlying session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Create a new session.
    pub fn create_session(
        &self,
        player_name: impl Into<String>,
        universe: impl Into<String>,
        style: NarrativeStyle,
    ) -> SessionId {
        self.store.create_session(player_name, universe, style)
    }

    /// Drop a session, its history and its turn guard.
    pub fn remove_session(&self, id: SessionId) -> Result<(), EngineError> {
        self.store.remove_session(id)?;
        self.turn_guards
            .lock()
            .expect("turn guard map poisoned")
            .remove(&id);
        Ok(())
    }

    /// Process one player turn.
    ///
    /// Degrades rather than fails: a simulator error yields an empty
    /// step summary, a generation error yields fallback narration.
    /// Only malformed input and an unknown session abort the turn.
    pub async fn process_turn(
        &self,
        id: SessionId,
        text: &str,
    ) -> Result<TurnOutcome, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::InvalidInput("empty action text".to_string()));
        }

        // Existence check before allocating a guard for the id.
        self.store.snapshot_count(id)?;

        let guard = self.turn_guard(id);
        let _turn = guard.lock().await;

        tracing::debug!(session = %id, action = text, "turn started");

        // 1. Interpret.
        let ictx = self
            .store
            .context(id, &[Subsystem::Interpreter])?
            .interpreter
            .expect("interpreter slice requested");
        let parsed = self.interpreter.classify(text, &ictx);
        let validation = self.interpreter.validate(&parsed, &ictx);

        // 2. Record the action.
        self.store
            .add_narrative_entry(id, NarrativeEntry::user_action(text, parsed.kind))?;

        // 3. Advance the world. Best-effort: a failed step leaves an
        // empty summary rather than aborting the turn.
        let simulation = {
            let mut rng = self.rng.lock().expect("rng poisoned");
            self.simulator
                .simulate_step(&self.store, id, self.config.hours_per_action, &mut *rng)
        }
        .unwrap_or_else(|error| {
            tracing::warn!(session = %id, %error, "simulation step failed, continuing turn");
            StepSummary {
                hours_elapsed: self.config.hours_per_action,
                ..StepSummary::default()
            }
        });

        // 4. Apply consequences of a feasible action.
        let state_changes = if validation.feasible {
            consequence::apply_consequences(&self.store, id, &parsed, &validation)?
        } else {
            Vec::new()
        };

        // 5. Narrate. All store mutations for this turn are already
        // committed; the generation await holds no store lock.
        let view = self
            .store
            .context(id, &[Subsystem::Narrative])?
            .narrative
            .expect("narrative slice requested");
        let narrative = self
            .director
            .narrate(&self.store, id, &view, &parsed, &validation)
            .await?;

        self.store
            .add_narrative_entry(id, NarrativeEntry::response(narrative.text.clone()))?;

        tracing::debug!(session = %id, kind = parsed.kind.name(), feasible = validation.feasible, "turn finished");

        Ok(TurnOutcome {
            session_id: id,
            parsed,
            validation,
            simulation,
            state_changes,
            narrative,
        })
    }

    fn turn_guard(&self, id: SessionId) -> Arc<tokio::sync::Mutex<()>> {
        self.turn_guards
            .lock()
            .expect("turn guard map poisoned")
            .entry(id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::GenerateError;
    use crate::world::{ActionKind, EntryKind};
    use std::future::Future;

    struct Canned(&'static str);

    impl Generate for Canned {
        fn generate(
            &self,
            _prompt: &str,
            _limits: &GenerationLimits,
        ) -> impl Future<Output = Result<String, GenerateError>> + Send {
            let line = self.0;
            async move { Ok(line.to_string()) }
        }
    }

    fn engine() -> GameEngine<Canned> {
        GameEngine::with_config(
            Canned("La porte s'ouvre sur un couloir sombre."),
            EngineConfig::new().with_seed(7),
        )
    }

    #[tokio::test]
    async fn test_turn_records_action_and_response() {
        let engine = engine();
        let id = engine.create_session("Arden", "fantasy", NarrativeStyle::Epic);

        let outcome = engine.process_turn(id, "regarde la porte").await.unwrap();
        assert_eq!(outcome.parsed.kind, ActionKind::Exploration);
        assert!(outcome.validation.feasible);
        assert!(!outcome.narrative.fallback_used);

        let state = engine.store().export_state(id).unwrap();
        let kinds: Vec<EntryKind> = state.narrative_history.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&EntryKind::UserAction));
        assert!(kinds.contains(&EntryKind::NarrativeResponse));
        // The user action precedes the response.
        let action_pos = kinds.iter().position(|k| *k == EntryKind::UserAction).unwrap();
        let response_pos = kinds
            .iter()
            .position(|k| *k == EntryKind::NarrativeResponse)
            .unwrap();
        assert!(action_pos < response_pos);
    }

    #[tokio::test]
    async fn test_blank_input_rejected_before_state_changes() {
        let engine = engine();
        let id = engine.create_session("Arden", "fantasy", NarrativeStyle::Epic);

        let result = engine.process_turn(id, "   ").await;
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));

        let state = engine.store().export_state(id).unwrap();
        assert!(state.narrative_history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_surfaces_not_found() {
        let engine = engine();
        let ghost = SessionId::new();
        let result = engine.process_turn(ghost, "regarde").await;
        assert!(matches!(
            result,
            Err(EngineError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_infeasible_action_mutates_nothing_but_narrates() {
        let engine = engine();
        let id = engine.create_session("Arden", "fantasy", NarrativeStyle::Epic);
        engine.store().update_stats(id, &[("mana", -95)]).unwrap();

        let outcome = engine.process_turn(id, "lance un sort").await.unwrap();
        assert!(!outcome.validation.feasible);
        assert!(outcome.state_changes.is_empty());
        assert!(!outcome.narrative.text.is_empty());

        // Mana untouched by the failed cast.
        let state = engine.store().export_state(id).unwrap();
        assert_eq!(state.player.stats.mana, 5);
    }

    #[tokio::test]
    async fn test_turn_advances_world_clock() {
        let engine = engine();
        let id = engine.create_session("Arden", "fantasy", NarrativeStyle::Epic);

        for _ in 0..4 {
            engine.process_turn(id, "explore les environs").await.unwrap();
        }

        let state = engine.store().export_state(id).unwrap();
        assert_eq!(state.world.clock.hour, 11);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let engine = engine();
        let a = engine.create_session("Arden", "fantasy", NarrativeStyle::Epic);
        let b = engine.create_session("Brielle", "fantasy", NarrativeStyle::Gritty);

        engine.process_turn(a, "attaque le bandit").await.unwrap();

        let state_a = engine.store().export_state(a).unwrap();
        let state_b = engine.store().export_state(b).unwrap();
        assert!(state_a.player.stats.health < 100);
        assert_eq!(state_b.player.stats.health, 100);
    }
}
