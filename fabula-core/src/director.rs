//! Narrative director - long-horizon story tracking and narration.
//!
//! Infers the current narrative arc from the action history, selects a
//! style, composes the generation request and post-processes the
//! result. This is the only component allowed to call the text
//! generation collaborator, and any failure there degrades to a fixed
//! per-action fallback line; narration never fails a turn.
//!
//! The arc itself is a linear state machine per arc type. A transition
//! advances the stored phase by exactly one step and is written back
//! through the session store.

use crate::interpreter::{Complexity, ParsedAction, ValidationOutcome};
use crate::store::{DirectorView, SessionStore, StoreError};
use crate::world::{ActionKind, NarrativeStyle, SessionId};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub use textgen::GenerationLimits;

/// History entries longer than this are truncated in prompts.
const PROMPT_EXCERPT_CHARS: usize = 200;
/// Recent exchanges included in a prompt.
const PROMPT_RECENT_ENTRIES: usize = 3;
/// Full-history length considered a complete arc.
const ARC_LENGTH: f32 = 20.0;
/// Recent actions examined for the tension formula.
const TENSION_WINDOW: usize = 5;

/// Errors from the generation collaborator, as seen by the director.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation provider error: {0}")]
    Provider(String),

    #[error("generation timed out")]
    Timeout,
}

/// The text-generation seam. Any provider implementing this single
/// call is acceptable; `textgen::Client` is the production one.
pub trait Generate: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        limits: &GenerationLimits,
    ) -> impl Future<Output = Result<String, GenerateError>> + Send;
}

impl Generate for textgen::Client {
    fn generate(
        &self,
        prompt: &str,
        limits: &GenerationLimits,
    ) -> impl Future<Output = Result<String, GenerateError>> + Send {
        let client = self.clone();
        let prompt = prompt.to_string();
        let limits = limits.clone();
        async move {
            client
                .complete(&prompt, &limits)
                .await
                .map_err(|e| GenerateError::Provider(e.to_string()))
        }
    }
}

// ============================================================================
// Arcs
// ============================================================================

/// Long-horizon narrative arc types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcKind {
    HeroJourney,
    Mystery,
    Exploration,
}

impl ArcKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArcKind::HeroJourney => "hero_journey",
            ArcKind::Mystery => "mystery",
            ArcKind::Exploration => "exploration",
        }
    }

    /// Ordered phase list. Transitions are strictly linear over this
    /// list; the terminal phase has no successor.
    pub fn phases(&self) -> &'static [&'static str] {
        match self {
            ArcKind::HeroJourney => &[
                "call_to_adventure",
                "refusal",
                "mentor",
                "threshold",
                "trials",
                "revelation",
                "transformation",
                "return",
            ],
            ArcKind::Mystery => &[
                "setup",
                "investigation",
                "complications",
                "revelation",
                "resolution",
            ],
            ArcKind::Exploration => &[
                "departure",
                "discovery",
                "challenges",
                "mastery",
                "return",
            ],
        }
    }

    /// The phase after `current`, or None at the terminal phase (arcs
    /// freeze there; they do not wrap).
    pub fn next_phase(&self, current: &str) -> Option<&'static str> {
        let phases = self.phases();
        let index = phases.iter().position(|p| *p == current)?;
        phases.get(index + 1).copied()
    }

    pub fn has_phase(&self, phase: &str) -> bool {
        self.phases().contains(&phase)
    }
}

/// Tension contribution of a phase.
fn phase_modifier(phase: &str) -> f32 {
    match phase {
        "call_to_adventure" => 0.2,
        "threshold" => 0.6,
        "trials" => 0.8,
        "revelation" => 0.9,
        "complications" => 0.7,
        "challenges" => 0.6,
        _ => 0.3,
    }
}

/// The inferred state of the story.
#[derive(Debug, Clone, Serialize)]
pub struct ArcAnalysis {
    pub kind: ArcKind,
    pub phase: &'static str,
    pub progress: f32,
    pub tension: f32,
}

// ============================================================================
// Style profiles
// ============================================================================

struct StyleProfile {
    tone: &'static str,
    vocabulary: &'static str,
    pacing: &'static str,
    perspective: &'static str,
}

lazy_static! {
    static ref STYLE_PROFILES: HashMap<NarrativeStyle, StyleProfile> = {
        let mut map = HashMap::new();
        map.insert(
            NarrativeStyle::Epic,
            StyleProfile {
                tone: "grand and heroic",
                vocabulary: "elevated and dramatic",
                pacing: "rhythmic, building to moments of tension",
                perspective: "focused on what is at stake",
            },
        );
        map.insert(
            NarrativeStyle::Gritty,
            StyleProfile {
                tone: "dark and realistic",
                vocabulary: "direct and raw",
                pacing: "slow and contemplative",
                perspective: "focused on visceral detail",
            },
        );
        map.insert(
            NarrativeStyle::Whimsical,
            StyleProfile {
                tone: "light and fanciful",
                vocabulary: "colourful and imaginative",
                pacing: "brisk and playful",
                perspective: "focused on wonder",
            },
        );
        map.insert(
            NarrativeStyle::Mysterious,
            StyleProfile {
                tone: "enigmatic and intriguing",
                vocabulary: "evocative and ambiguous",
                pacing: "gradual, with revelations",
                perspective: "focused on the unknown",
            },
        );
        map
    };
}

/// Emotional tone words. The game narrates in French.
static POSITIVE_WORDS: &[&str] = &["succès", "victoire", "joie", "espoir", "triomphe"];
static NEGATIVE_WORDS: &[&str] = &["échec", "défaite", "peur", "danger", "mort"];
static TENSION_WORDS: &[&str] = &["danger", "combat", "mort", "peur", "urgence"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionalTone {
    Positive,
    Negative,
    Neutral,
}

// ============================================================================
// Director
// ============================================================================

/// Director configuration.
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// Limits passed to the generation collaborator.
    pub limits: GenerationLimits,

    /// Hard deadline on one generation call.
    pub timeout: Duration,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            limits: GenerationLimits::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The narration produced for one turn.
#[derive(Debug, Clone)]
pub struct NarrativeReport {
    pub text: String,
    pub style: NarrativeStyle,
    pub arc: ArcAnalysis,
    pub emotional_tone: EmotionalTone,
    pub response_tension: f32,
    pub fallback_used: bool,
}

/// The narrative director.
pub struct NarrativeDirector<G: Generate> {
    generator: G,
    config: DirectorConfig,
}

impl<G: Generate> NarrativeDirector<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            config: DirectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DirectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Produce the narration for one turn and advance the arc state
    /// machine when warranted. The store is only touched for the phase
    /// write-back; no lock is held while the generator runs.
    pub async fn narrate(
        &self,
        store: &SessionStore,
        id: SessionId,
        view: &DirectorView,
        action: &ParsedAction,
        validation: &ValidationOutcome,
    ) -> Result<NarrativeReport, StoreError> {
        let arc = self.analyze_arc(view);
        let style = self.select_style(view, action);
        let prompt = self.compose_prompt(view, action, validation, &arc, style);

        let (text, fallback_used) = match self.generate_bounded(&prompt).await {
            Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), false),
            Ok(_) => (fallback_line(action.kind).to_string(), true),
            Err(error) => {
                tracing::warn!(session = %id, %error, "generation failed, using fallback");
                (fallback_line(action.kind).to_string(), true)
            }
        };

        let emotional_tone = analyze_emotional_tone(&text);
        let response_tension = response_tension(&text, action.kind);

        if arc.progress > 0.8 || response_tension > 0.9 {
            self.advance_arc(store, id, view, &arc)?;
        }

        Ok(NarrativeReport {
            text,
            style,
            arc,
            emotional_tone,
            response_tension,
            fallback_used,
        })
    }

    /// Infer arc type, phase, progress and tension from history alone.
    pub fn analyze_arc(&self, view: &DirectorView) -> ArcAnalysis {
        let stream = &view.action_stream;
        let kind = dominant_arc(stream);

        let progress = (view.history_len as f32 / ARC_LENGTH).min(1.0);

        let phases = kind.phases();
        let index = ((progress * phases.len() as f32) as usize).min(phases.len() - 1);
        let phase = phases[index];

        let recent = if stream.len() > TENSION_WINDOW {
            &stream[stream.len() - TENSION_WINDOW..]
        } else {
            &stream[..]
        };
        let combat_fraction = if recent.is_empty() {
            0.0
        } else {
            recent.iter().filter(|k| **k == ActionKind::Combat).count() as f32
                / recent.len() as f32
        };

        let tension =
            (progress * 0.5 + phase_modifier(phase) + combat_fraction * 0.3).min(1.0);

        ArcAnalysis {
            kind,
            phase,
            progress,
            tension,
        }
    }

    /// Pick the narration style for this action.
    pub fn select_style(&self, view: &DirectorView, action: &ParsedAction) -> NarrativeStyle {
        match (action.kind, action.complexity) {
            (ActionKind::Combat, Complexity::Complex) => NarrativeStyle::Epic,
            (ActionKind::Dialogue, _) => NarrativeStyle::Mysterious,
            _ => view.narrative_style,
        }
    }

    /// Assemble the full generation request.
    pub fn compose_prompt(
        &self,
        view: &DirectorView,
        action: &ParsedAction,
        validation: &ValidationOutcome,
        arc: &ArcAnalysis,
        style: NarrativeStyle,
    ) -> String {
        let profile = &STYLE_PROFILES[&style];

        let mut prompt = String::new();
        prompt.push_str(&format!(
            "You are an expert Game Master for a {} role-playing game.\n\n",
            view.universe
        ));

        prompt.push_str("## Game context\n");
        prompt.push_str(&format!(
            "- Player: {} (level {})\n",
            view.player_name, view.player_level
        ));
        prompt.push_str(&format!("- Current location: {}\n", view.location_name));
        prompt.push_str(&format!(
            "- Narrative arc: {} - phase: {}\n",
            arc.kind.name(),
            arc.phase
        ));
        prompt.push_str(&format!("- Tension level: {:.1}/1.0\n", arc.tension));

        prompt.push_str(&format!("\n## Narrative style ({})\n", style.name()));
        prompt.push_str(&format!("- Tone: {}\n", profile.tone));
        prompt.push_str(&format!("- Vocabulary: {}\n", profile.vocabulary));
        prompt.push_str(&format!("- Pacing: {}\n", profile.pacing));
        prompt.push_str(&format!("- Perspective: {}\n", profile.perspective));

        prompt.push_str("\n## Recent history\n");
        prompt.push_str(&recent_history_excerpt(view));

        prompt.push_str("\n## Player action\n");
        prompt.push_str(&format!("Type: {}\n", action.kind.name()));
        prompt.push_str(&format!("Action: {}\n", action.raw));
        prompt.push_str(&format!("Complexity: {:?}\n", action.complexity));
        let named: Vec<&str> = action
            .entities
            .npcs
            .iter()
            .chain(action.entities.objects.iter())
            .map(|s| s.as_str())
            .collect();
        if !named.is_empty() {
            prompt.push_str(&format!("Entities involved: {}\n", named.join(", ")));
        }

        prompt.push_str("\n## Validation\n");
        prompt.push_str(&format!("Feasible: {}\n", validation.feasible));
        if !validation.consequences.is_empty() {
            let tags: Vec<String> = validation
                .consequences
                .iter()
                .map(|c| c.to_string())
                .collect();
            prompt.push_str(&format!("Consequences: {}\n", tags.join(", ")));
        }
        for warning in &validation.warnings {
            prompt.push_str(&format!("Warning: {warning}\n"));
        }

        prompt.push_str(
            "\n## Instructions\n\
             1. Write an immersive narrative response of 2-3 paragraphs, in French.\n\
             2. Respect the requested narrative style.\n\
             3. Weave in the consequences of the action.\n\
             4. Stay consistent with the recent history.\n\
             5. Match the intensity to the arc phase and tension level.\n\
             6. End with a question or situation that invites the next action.\n\
             \nNarrative response:",
        );

        prompt
    }

    async fn generate_bounded(&self, prompt: &str) -> Result<String, GenerateError> {
        match tokio::time::timeout(
            self.config.timeout,
            self.generator.generate(prompt, &self.config.limits),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerateError::Timeout),
        }
    }

    /// Advance the stored arc phase by exactly one step.
    fn advance_arc(
        &self,
        store: &SessionStore,
        id: SessionId,
        view: &DirectorView,
        arc: &ArcAnalysis,
    ) -> Result<(), StoreError> {
        // Continue from the stored cursor when it belongs to the
        // current arc; otherwise start from the analyzed phase.
        let current = view
            .arc_phase
            .as_deref()
            .filter(|p| arc.kind.has_phase(p))
            .unwrap_or(arc.phase);

        if let Some(next) = arc.kind.next_phase(current) {
            store.set_arc_phase(id, next)?;
            tracing::debug!(session = %id, arc = arc.kind.name(), from = current, to = next, "arc phase advanced");
        }
        Ok(())
    }
}

// ============================================================================
// Pure helpers
// ============================================================================

/// Arc type from the plurality action kind over the whole history.
fn dominant_arc(stream: &[ActionKind]) -> ArcKind {
    if stream.is_empty() {
        return ArcKind::Exploration;
    }

    let mut counts: HashMap<ActionKind, usize> = HashMap::new();
    for kind in stream {
        *counts.entry(*kind).or_insert(0) += 1;
    }

    // Fixed enumeration order; earliest kind wins ties.
    let mut dominant = ActionKind::Combat;
    let mut best = 0usize;
    for kind in ActionKind::all() {
        let count = counts.get(kind).copied().unwrap_or(0);
        if count > best {
            best = count;
            dominant = *kind;
        }
    }

    match dominant {
        ActionKind::Combat => ArcKind::HeroJourney,
        ActionKind::Dialogue => ArcKind::Mystery,
        _ => ArcKind::Exploration,
    }
}

/// Condensed excerpt of the most recent exchanges.
fn recent_history_excerpt(view: &DirectorView) -> String {
    if view.history.is_empty() {
        return "The adventure begins.\n".to_string();
    }

    let mut lines = Vec::new();
    let start = view.history.len().saturating_sub(PROMPT_RECENT_ENTRIES);
    for entry in &view.history[start..] {
        let speaker = match entry.kind {
            crate::world::EntryKind::UserAction => "Player",
            crate::world::EntryKind::NarrativeResponse => "GM",
            crate::world::EntryKind::SystemEvent => "World",
        };
        lines.push(format!("{speaker}: {}", truncate_chars(&entry.content, PROMPT_EXCERPT_CHARS)));
    }
    let mut excerpt = lines.join("\n");
    excerpt.push('\n');
    excerpt
}

/// Unicode-safe truncation with an ellipsis marker.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let truncated: String = text.chars().take(limit).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

/// Tone by counting fixed word lists; ties are neutral.
fn analyze_emotional_tone(text: &str) -> EmotionalTone {
    let lowered = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lowered.contains(**w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lowered.contains(**w)).count();

    if positive > negative {
        EmotionalTone::Positive
    } else if negative > positive {
        EmotionalTone::Negative
    } else {
        EmotionalTone::Neutral
    }
}

/// Tension of a generated response.
fn response_tension(text: &str, kind: ActionKind) -> f32 {
    let mut tension = 0.3;
    match kind {
        ActionKind::Combat => tension += 0.4,
        ActionKind::Dialogue => tension += 0.1,
        _ => {}
    }

    let lowered = text.to_lowercase();
    let hits = TENSION_WORDS.iter().filter(|w| lowered.contains(**w)).count();
    (tension + hits as f32 * 0.1).min(1.0)
}

/// Deterministic fallback narration, keyed by action kind.
fn fallback_line(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Exploration => "Vous explorez les environs avec attention.",
        ActionKind::Combat => "Le combat fait rage autour de vous.",
        ActionKind::Dialogue => "La conversation se poursuit.",
        ActionKind::Magic => "Vous ressentez l'énergie magique qui vous entoure.",
        ActionKind::Inventory => "Vous réorganisez votre équipement.",
        ActionKind::Social => "Vous interagissez avec votre entourage.",
    }
}
