//! Persistent text-RPG turn engine with an AI narrator.
//!
//! This crate provides:
//! - A versioned session store with snapshot/rollback and bounded history
//! - A rule-based action classifier and validator
//! - An autonomous world simulator driven by scored candidate selection
//! - A narrative director tracking long-horizon story arcs and composing
//!   generation requests for a pluggable text provider
//!
//! # Quick Start
//!
//! ```ignore
//! use fabula_core::{EngineConfig, GameEngine, NarrativeStyle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = textgen::Client::from_env()?;
//!     let engine = GameEngine::new(generator);
//!
//!     let session = engine.create_session("Arden", "fantasy", NarrativeStyle::Epic);
//!     let outcome = engine.process_turn(session, "regarde la porte").await?;
//!     println!("{}", outcome.narrative.text);
//!     Ok(())
//! }
//! ```

pub mod consequence;
pub mod director;
pub mod engine;
pub mod interpreter;
pub mod persist;
pub mod simulator;
pub mod store;
pub mod testing;
pub mod world;

// Primary public API
pub use director::{
    ArcAnalysis, ArcKind, DirectorConfig, EmotionalTone, Generate, GenerateError,
    GenerationLimits, NarrativeDirector, NarrativeReport,
};
pub use engine::{EngineConfig, EngineError, GameEngine, TurnOutcome};
pub use interpreter::{
    ActionInterpreter, ActionParams, Complexity, ConsequenceTag, Entities, ParsedAction,
    ValidationOutcome,
};
pub use persist::{PersistError, SavedSession, SessionExport};
pub use simulator::{StepSummary, WorldSimulator};
pub use store::{
    ContextBundle, DirectorView, InterpreterContext, SessionStore, SimulationView, StoreConfig,
    StoreError, Subsystem,
};
pub use testing::{FailingGenerator, ScriptedGenerator, TestHarness};
pub use world::{
    ActionKind, GameSettings, GameState, NarrativeStyle, Npc, NpcKind, SessionId, Weather,
};
