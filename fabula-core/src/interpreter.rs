//! Action interpreter - classifies and validates free-text commands.
//!
//! Classification is rule-based: fixed keyword tables per category
//! (the game accepts French and English command verbs), boolean
//! complexity indicators, substring entity extraction against the
//! session's known NPCs and fixed object/spell catalogs. Validation is
//! a pure function of the parsed action and a read projection; an
//! infeasible action is a normal outcome, not an error.

use crate::store::InterpreterContext;
use crate::world::ActionKind;
use serde::{Deserialize, Serialize};

/// Keyword table, in fixed classification order. Earlier categories win
/// score ties.
static KEYWORDS: [(ActionKind, &[&str]); 6] = [
    (
        ActionKind::Combat,
        &[
            "attaque", "combat", "frappe", "tue", "bataille", "fight", "attack", "kill",
        ],
    ),
    (
        ActionKind::Exploration,
        &[
            "examine", "regarde", "cherche", "fouille", "explore", "va", "marche", "entre",
            "sort", "ouvre", "ferme",
        ],
    ),
    (
        ActionKind::Dialogue,
        &[
            "parle", "dit", "demande", "répond", "salue", "discute", "conversation", "talk",
            "speak", "ask",
        ],
    ),
    (
        ActionKind::Inventory,
        &[
            "prend", "ramasse", "utilise", "équipe", "range", "donne", "jette", "inventaire",
            "take", "use", "equip",
        ],
    ),
    (
        ActionKind::Magic,
        &[
            "lance", "incante", "sort", "magie", "enchante", "cast", "spell", "magic",
        ],
    ),
    (
        ActionKind::Social,
        &[
            "persuade", "intimide", "négocie", "marchande", "séduit", "intimidate", "negotiate",
        ],
    ),
];

/// Objects recognized without context.
static OBJECT_CATALOG: &[&str] = &[
    "épée", "bouclier", "potion", "clé", "livre", "coffre", "porte", "fenêtre",
];

/// Spells recognized without context.
static SPELL_CATALOG: &[&str] = &[
    "boule de feu",
    "soin",
    "téléportation",
    "invisibilité",
    "protection",
];

/// Simultaneity markers pushing an action toward complex.
static SIMULTANEITY_MARKERS: &[&str] = &["simultanément", "en même temps"];

/// Mana cost of a complex spell.
const MANA_COST_COMPLEX: i32 = 15;
/// Mana cost of any other spell.
const MANA_COST_SIMPLE: i32 = 8;

// ============================================================================
// Parsed action
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackType {
    Melee,
    Ranged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueTone {
    Polite,
    Aggressive,
    Friendly,
    Persuasive,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerLevel {
    Low,
    Medium,
    High,
}

/// Per-kind action parameters, presence-based.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionParams {
    pub attack_type: Option<AttackType>,
    pub defensive: bool,
    pub stealth: bool,
    pub fast: bool,
    pub tone: Option<DialogueTone>,
    pub power_level: Option<PowerLevel>,
}

impl ActionParams {
    /// Number of parameters that were set.
    pub fn count_set(&self) -> usize {
        let mut count = 0;
        count += self.attack_type.is_some() as usize;
        count += self.defensive as usize;
        count += self.stealth as usize;
        count += self.fast as usize;
        count += self.tone.is_some() as usize;
        count += self.power_level.is_some() as usize;
        count
    }
}

/// Entities resolved from the command text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    pub npcs: Vec<String>,
    pub objects: Vec<String>,
    pub spells: Vec<String>,
}

impl Entities {
    pub fn total(&self) -> usize {
        self.npcs.len() + self.objects.len() + self.spells.len()
    }
}

/// A classified player command. Ephemeral - lives for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedAction {
    pub kind: ActionKind,
    pub complexity: Complexity,
    pub raw: String,
    pub entities: Entities,
    pub params: ActionParams,
    pub confidence: f32,
}

/// Tags describing the expected downstream effect of a validated
/// action; consumed during state mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsequenceTag {
    Damage,
    Experience,
    ManaCost(i32),
    Discovery,
    TimePassed,
    RelationshipShift,
    InventoryChange,
    ReputationShift,
    SocialInfluence,
}

impl std::fmt::Display for ConsequenceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsequenceTag::Damage => write!(f, "possible damage taken"),
            ConsequenceTag::Experience => write!(f, "combat experience gained"),
            ConsequenceTag::ManaCost(cost) => write!(f, "mana spent: {cost}"),
            ConsequenceTag::Discovery => write!(f, "possible discovery"),
            ConsequenceTag::TimePassed => write!(f, "time passes"),
            ConsequenceTag::RelationshipShift => write!(f, "relationship change with an NPC"),
            ConsequenceTag::InventoryChange => write!(f, "inventory change"),
            ConsequenceTag::ReputationShift => write!(f, "reputation change"),
            ConsequenceTag::SocialInfluence => write!(f, "influence on social standing"),
        }
    }
}

/// Result of validating a parsed action. Ephemeral - lives for one
/// turn. `feasible: false` is a normal outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub feasible: bool,
    pub confidence: f32,
    pub consequences: Vec<ConsequenceTag>,
    pub warnings: Vec<String>,
    pub requirements_met: bool,
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self {
            feasible: true,
            confidence: 0.8,
            consequences: Vec::new(),
            warnings: Vec::new(),
            requirements_met: true,
        }
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// The action interpreter. Stateless; all tables are fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionInterpreter;

impl ActionInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Classify raw command text into a structured action.
    pub fn classify(&self, text: &str, ctx: &InterpreterContext) -> ParsedAction {
        let lowered = text.to_lowercase();
        let lowered = lowered.trim();

        let kind = self.determine_kind(lowered);
        let complexity = self.determine_complexity(lowered, kind);
        let entities = self.extract_entities(lowered, ctx);
        let params = self.extract_params(lowered, kind);
        let confidence = self.confidence(kind, &entities, &params);

        ParsedAction {
            kind,
            complexity,
            raw: text.to_string(),
            entities,
            params,
            confidence,
        }
    }

    /// Validate the feasibility of a parsed action. Pure.
    pub fn validate(&self, action: &ParsedAction, ctx: &InterpreterContext) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        match action.kind {
            ActionKind::Combat => {
                if ctx.stats.health < 20 {
                    outcome
                        .warnings
                        .push("Low health - combat is risky".to_string());
                    outcome.confidence *= 0.7;
                }
                outcome.consequences.push(ConsequenceTag::Damage);
                outcome.consequences.push(ConsequenceTag::Experience);
            }
            ActionKind::Magic => {
                let cost = if action.complexity == Complexity::Complex {
                    MANA_COST_COMPLEX
                } else {
                    MANA_COST_SIMPLE
                };
                if ctx.stats.mana < cost {
                    outcome.feasible = false;
                    outcome.requirements_met = false;
                    outcome.warnings.push("Insufficient mana".to_string());
                } else {
                    outcome.consequences.push(ConsequenceTag::ManaCost(cost));
                }
            }
            ActionKind::Exploration => {
                outcome.consequences.push(ConsequenceTag::Discovery);
                outcome.consequences.push(ConsequenceTag::TimePassed);
            }
            ActionKind::Dialogue => {
                if action.entities.npcs.is_empty() {
                    outcome
                        .warnings
                        .push("No NPC identified for the dialogue".to_string());
                    outcome.confidence *= 0.8;
                }
                outcome.consequences.push(ConsequenceTag::RelationshipShift);
            }
            ActionKind::Inventory => {
                let raw = action.raw.to_lowercase();
                let wants_use = raw.contains("utilise") || raw.contains("use");
                if wants_use && action.entities.objects.is_empty() {
                    outcome
                        .warnings
                        .push("No object specified to use".to_string());
                    outcome.confidence *= 0.7;
                }
                outcome.consequences.push(ConsequenceTag::InventoryChange);
            }
            ActionKind::Social => {
                outcome.consequences.push(ConsequenceTag::ReputationShift);
                outcome.consequences.push(ConsequenceTag::SocialInfluence);
            }
        }

        outcome
    }

    fn determine_kind(&self, lowered: &str) -> ActionKind {
        let mut best = ActionKind::Exploration;
        let mut best_score = 0u32;

        for (kind, keywords) in &KEYWORDS {
            let mut score = 0u32;
            for keyword in *keywords {
                if lowered.contains(keyword) {
                    score += 1;
                    if starts_with_keyword(lowered, keyword) {
                        score += 1;
                    }
                }
            }
            // Strictly-greater keeps the earliest category on ties.
            if score > best_score {
                best_score = score;
                best = *kind;
            }
        }

        if best_score == 0 {
            ActionKind::Exploration
        } else {
            best
        }
    }

    fn determine_complexity(&self, lowered: &str, kind: ActionKind) -> Complexity {
        let words = lowered.split_whitespace().count();

        let simple_score = [
            words <= 3,
            matches!(kind, ActionKind::Exploration | ActionKind::Inventory),
            lowered.contains("regarde") || lowered.contains("examine"),
        ]
        .iter()
        .filter(|&&b| b)
        .count();

        let complex_score = [
            words > 8,
            matches!(kind, ActionKind::Combat | ActionKind::Magic),
            SIMULTANEITY_MARKERS.iter().any(|m| lowered.contains(m)),
        ]
        .iter()
        .filter(|&&b| b)
        .count();

        if complex_score > simple_score {
            Complexity::Complex
        } else if simple_score > 0 {
            Complexity::Simple
        } else {
            Complexity::Moderate
        }
    }

    fn extract_entities(&self, lowered: &str, ctx: &InterpreterContext) -> Entities {
        let mut entities = Entities::default();

        // Known NPCs from the session context. Substring matching only;
        // a name inside an unrelated word is an accepted false match.
        for name in &ctx.npc_names {
            let needle = name.to_lowercase();
            if !needle.is_empty() && lowered.contains(&needle) {
                entities.npcs.push(needle);
            }
        }

        for object in OBJECT_CATALOG {
            if lowered.contains(object) {
                entities.objects.push((*object).to_string());
            }
        }

        for spell in SPELL_CATALOG {
            if lowered.contains(spell) {
                entities.spells.push((*spell).to_string());
            }
        }

        entities
    }

    fn extract_params(&self, lowered: &str, kind: ActionKind) -> ActionParams {
        let mut params = ActionParams::default();

        match kind {
            ActionKind::Combat => {
                if lowered.contains("attaque") {
                    params.attack_type = Some(AttackType::Melee);
                } else if lowered.contains("tire") || lowered.contains("arc") {
                    params.attack_type = Some(AttackType::Ranged);
                }
                if lowered.contains("défense") || lowered.contains("bloque") {
                    params.defensive = true;
                }
            }
            ActionKind::Exploration => {
                if lowered.contains("discrètement") || lowered.contains("silencieusement") {
                    params.stealth = true;
                }
                if lowered.contains("rapidement") || lowered.contains("vite") {
                    params.fast = true;
                }
            }
            ActionKind::Dialogue => {
                params.tone = Some(if lowered.contains("poliment") || lowered.contains("respectueusement") {
                    DialogueTone::Polite
                } else if lowered.contains("agressif") || lowered.contains("colère") {
                    DialogueTone::Aggressive
                } else if lowered.contains("amical") || lowered.contains("gentil") {
                    DialogueTone::Friendly
                } else if lowered.contains("persuasif") {
                    DialogueTone::Persuasive
                } else {
                    DialogueTone::Neutral
                });
            }
            ActionKind::Magic => {
                params.power_level = Some(if lowered.contains("puissant") || lowered.contains("fort") {
                    PowerLevel::High
                } else if lowered.contains("faible") || lowered.contains("léger") {
                    PowerLevel::Low
                } else {
                    PowerLevel::Medium
                });
            }
            _ => {}
        }

        params
    }

    fn confidence(&self, kind: ActionKind, entities: &Entities, params: &ActionParams) -> f32 {
        let mut confidence = 0.5;

        if kind != ActionKind::Exploration {
            confidence += 0.2;
        }
        confidence += (entities.total() as f32 * 0.1).min(0.2);
        confidence += (params.count_set() as f32 * 0.05).min(0.1);

        confidence.min(1.0)
    }
}

/// Whether the text starts with the keyword, allowing for a French
/// elided pronoun in the first word («j'attaque» starts with «attaque»).
fn starts_with_keyword(lowered: &str, keyword: &str) -> bool {
    if lowered.starts_with(keyword) {
        return true;
    }
    let first = lowered.split_whitespace().next().unwrap_or("");
    first
        .rsplit(['\'', '’'])
        .next()
        .map(|tail| tail.starts_with(keyword))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PlayerStats;

    fn ctx() -> InterpreterContext {
        InterpreterContext {
            npc_names: vec!["Garde".to_string(), "Mirela".to_string()],
            stats: PlayerStats::default(),
            inventory_names: vec![],
        }
    }

    fn ctx_with_stats(health: i32, mana: i32) -> InterpreterContext {
        let mut c = ctx();
        c.stats.health = health;
        c.stats.mana = mana;
        c
    }

    #[test]
    fn test_classify_simple_exploration() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("regarde la porte", &ctx());

        assert_eq!(parsed.kind, ActionKind::Exploration);
        assert_eq!(parsed.complexity, Complexity::Simple);
        assert!(parsed.entities.objects.contains(&"porte".to_string()));
    }

    #[test]
    fn test_classify_complex_combat_with_elision() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify(
            "J'attaque le garde avec mon épée en même temps que je lance un sort",
            &ctx(),
        );

        // «j'attaque» earns the start-of-string bonus, which lifts
        // combat over the magic keywords also present.
        assert_eq!(parsed.kind, ActionKind::Combat);
        assert_eq!(parsed.complexity, Complexity::Complex);
        assert!(parsed.entities.npcs.contains(&"garde".to_string()));
        assert!(parsed.entities.objects.contains(&"épée".to_string()));
        assert_eq!(parsed.params.attack_type, Some(AttackType::Melee));
    }

    #[test]
    fn test_classify_defaults_to_exploration() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("hmm", &ctx());
        assert_eq!(parsed.kind, ActionKind::Exploration);
        assert_eq!(parsed.complexity, Complexity::Simple);
    }

    #[test]
    fn test_dialogue_tone_always_set() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("parle au marchand", &ctx());
        assert_eq!(parsed.kind, ActionKind::Dialogue);
        assert_eq!(parsed.params.tone, Some(DialogueTone::Neutral));

        let parsed = interpreter.classify("parle poliment à mirela", &ctx());
        assert_eq!(parsed.params.tone, Some(DialogueTone::Polite));
    }

    #[test]
    fn test_magic_power_level_defaults_medium() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("incante une protection", &ctx());
        assert_eq!(parsed.kind, ActionKind::Magic);
        assert_eq!(parsed.params.power_level, Some(PowerLevel::Medium));
        assert!(parsed.entities.spells.contains(&"protection".to_string()));

        let parsed = interpreter.classify("incante un puissant bouclier magique", &ctx());
        assert_eq!(parsed.params.power_level, Some(PowerLevel::High));
    }

    #[test]
    fn test_confidence_bounds() {
        let interpreter = ActionInterpreter::new();

        // Default classification earns no type bonus.
        let parsed = interpreter.classify("hmm", &ctx());
        assert!((parsed.confidence - 0.5).abs() < 1e-6);

        // Known type + entities + params stacks bonuses, capped.
        let parsed = interpreter.classify(
            "j'attaque le garde avec mon épée et mon bouclier et ma clé",
            &ctx(),
        );
        assert!(parsed.confidence > 0.5);
        assert!(parsed.confidence <= 1.0);
    }

    #[test]
    fn test_validate_magic_insufficient_mana() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("lance un sort", &ctx());
        assert_eq!(parsed.kind, ActionKind::Magic);
        assert_eq!(parsed.complexity, Complexity::Simple);

        // Simple spell costs 8; 5 mana is not enough.
        let outcome = interpreter.validate(&parsed, &ctx_with_stats(100, 5));
        assert!(!outcome.feasible);
        assert!(!outcome.requirements_met);
        assert!(!outcome.warnings.is_empty());

        let outcome = interpreter.validate(&parsed, &ctx_with_stats(100, 8));
        assert!(outcome.feasible);
        assert!(outcome
            .consequences
            .contains(&ConsequenceTag::ManaCost(MANA_COST_SIMPLE)));
    }

    #[test]
    fn test_validate_combat_low_health_warns() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("attaque le garde", &ctx());

        let outcome = interpreter.validate(&parsed, &ctx_with_stats(15, 100));
        assert!(outcome.feasible);
        assert!(!outcome.warnings.is_empty());
        assert!((outcome.confidence - 0.8 * 0.7).abs() < 1e-6);
        assert!(outcome.consequences.contains(&ConsequenceTag::Damage));
        assert!(outcome.consequences.contains(&ConsequenceTag::Experience));
    }

    #[test]
    fn test_validate_dialogue_without_npc_warns() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("parle au vent", &ctx());
        let outcome = interpreter.validate(&parsed, &ctx());
        assert!(outcome.feasible);
        assert!(!outcome.warnings.is_empty());
    }

    #[test]
    fn test_validate_use_without_object_warns() {
        let interpreter = ActionInterpreter::new();
        let parsed = interpreter.classify("utilise quelque chose", &ctx());
        assert_eq!(parsed.kind, ActionKind::Inventory);
        let outcome = interpreter.validate(&parsed, &ctx());
        assert!(!outcome.warnings.is_empty());

        let parsed = interpreter.classify("utilise la potion", &ctx());
        let outcome = interpreter.validate(&parsed, &ctx());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_exploration_and_social_always_feasible() {
        let interpreter = ActionInterpreter::new();

        let parsed = interpreter.classify("explore la forêt", &ctx());
        let outcome = interpreter.validate(&parsed, &ctx_with_stats(1, 0));
        assert!(outcome.feasible);
        assert!(outcome.consequences.contains(&ConsequenceTag::Discovery));

        let parsed = interpreter.classify("persuade le noble", &ctx());
        assert_eq!(parsed.kind, ActionKind::Social);
        let outcome = interpreter.validate(&parsed, &ctx_with_stats(1, 0));
        assert!(outcome.feasible);
        assert!(outcome.consequences.contains(&ConsequenceTag::ReputationShift));
    }
}
