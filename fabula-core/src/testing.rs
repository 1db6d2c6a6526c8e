//! Testing utilities.
//!
//! Provides a scripted stand-in for the text generation collaborator
//! and a `TestHarness` that wires a seeded engine to a fresh session,
//! so full turns run deterministically without network access.

use crate::director::{Generate, GenerateError, GenerationLimits};
use crate::engine::{EngineConfig, EngineError, GameEngine, TurnOutcome};
use crate::world::{NarrativeStyle, SessionId};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Line returned once a scripted generator runs out of responses.
const EXHAUSTED_LINE: &str = "Le récit suit son cours.";

/// A generator that returns queued responses in order.
///
/// Clones share the queue, so a harness can keep queueing responses
/// after the engine has taken ownership of its copy.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    queue: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<&str>) -> Self {
        let generator = Self::new();
        for response in responses {
            generator.queue_response(response);
        }
        generator
    }

    /// Queue one response.
    pub fn queue_response(&self, response: impl Into<String>) {
        self.queue
            .lock()
            .expect("script queue poisoned")
            .push_back(response.into());
    }

    /// Responses still queued.
    pub fn remaining(&self) -> usize {
        self.queue.lock().expect("script queue poisoned").len()
    }
}

impl Generate for ScriptedGenerator {
    fn generate(
        &self,
        _prompt: &str,
        _limits: &GenerationLimits,
    ) -> impl Future<Output = Result<String, GenerateError>> + Send {
        let next = self
            .queue
            .lock()
            .expect("script queue poisoned")
            .pop_front()
            .unwrap_or_else(|| EXHAUSTED_LINE.to_string());
        async move { Ok(next) }
    }
}

/// A generator that always fails, for exercising fallback paths.
#[derive(Clone, Copy, Default)]
pub struct FailingGenerator;

impl Generate for FailingGenerator {
    fn generate(
        &self,
        _prompt: &str,
        _limits: &GenerationLimits,
    ) -> impl Future<Output = Result<String, GenerateError>> + Send {
        async { Err(GenerateError::Provider("scripted failure".to_string())) }
    }
}

/// Test harness running full turns against a seeded engine.
pub struct TestHarness {
    /// The engine under test.
    pub engine: GameEngine<ScriptedGenerator>,
    /// The harness's session.
    pub session_id: SessionId,
    script: ScriptedGenerator,
}

impl TestHarness {
    /// Create a harness with a fresh session and a fixed rng seed.
    pub fn new() -> Self {
        let script = ScriptedGenerator::new();
        let engine =
            GameEngine::with_config(script.clone(), EngineConfig::new().with_seed(42));
        let session_id = engine.create_session("Test Hero", "fantasy", NarrativeStyle::Epic);

        Self {
            engine,
            session_id,
            script,
        }
    }

    /// Queue a narrative response.
    pub fn expect_narrative(&mut self, text: impl Into<String>) -> &mut Self {
        self.script.queue_response(text);
        self
    }

    /// Send player input and get the turn outcome.
    pub async fn input(&mut self, text: &str) -> Result<TurnOutcome, EngineError> {
        self.engine.process_turn(self.session_id, text).await
    }

    /// Current player (health, mana).
    pub fn player_vitals(&self) -> (i32, i32) {
        let state = self
            .engine
            .store()
            .export_state(self.session_id)
            .expect("harness session exists");
        (state.player.stats.health, state.player.stats.mana)
    }

    /// Number of rollback snapshots held for the session.
    pub fn snapshot_count(&self) -> usize {
        self.engine
            .store()
            .snapshot_count(self.session_id)
            .expect("harness session exists")
    }

    /// The last narrative entry's content, if any.
    pub fn last_narrative(&self) -> Option<String> {
        let state = self
            .engine
            .store()
            .export_state(self.session_id)
            .expect("harness session exists");
        state.narrative_history.last().map(|e| e.content.clone())
    }

    /// Total narrative entries (not counting folded ones).
    pub fn narrative_len(&self) -> usize {
        let state = self
            .engine
            .store()
            .export_state(self.session_id)
            .expect("harness session exists");
        state.narrative_history.len()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert the player's current health.
#[track_caller]
pub fn assert_health(harness: &TestHarness, expected: i32) {
    let (health, _) = harness.player_vitals();
    assert_eq!(health, expected, "Expected health {expected}, got {health}");
}

/// Assert the player's current mana.
#[track_caller]
pub fn assert_mana(harness: &TestHarness, expected: i32) {
    let (_, mana) = harness.player_vitals();
    assert_eq!(mana, expected, "Expected mana {expected}, got {mana}");
}

/// Assert the last narrative entry contains a fragment.
#[track_caller]
pub fn assert_narrative_contains(harness: &TestHarness, fragment: &str) {
    let last = harness.last_narrative().unwrap_or_default();
    assert!(
        last.contains(fragment),
        "Expected last narrative to contain '{fragment}', got '{last}'"
    );
}
