//! Game world data model.
//!
//! Contains all types for representing canonical game state: the player,
//! NPCs, locations, quests, world conditions and the narrative history.
//! Every entity crossing an engine boundary is one of these typed
//! structs; nothing loosely-shaped survives past this module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for game sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for NPCs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NpcId(pub Uuid);

impl NpcId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NpcId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub Uuid);

impl LocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for quests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestId(pub Uuid);

impl QuestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestId {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Player
// ============================================================================

/// Player statistics. All values are clamped to zero or above; health
/// and mana are additionally capped at their maximums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub charisma: i32,
    pub level: i32,
    pub experience: i32,
}

impl PlayerStats {
    /// Apply a delta to one stat by key, clamping the result.
    ///
    /// Unknown keys are ignored. Returns true when the key matched.
    pub fn apply_delta(&mut self, key: &str, delta: i32) -> bool {
        match key {
            "health" => self.health = (self.health + delta).clamp(0, self.max_health),
            "mana" => self.mana = (self.mana + delta).clamp(0, self.max_mana),
            "max_health" => self.max_health = (self.max_health + delta).max(0),
            "max_mana" => self.max_mana = (self.max_mana + delta).max(0),
            "strength" => self.strength = (self.strength + delta).max(0),
            "dexterity" => self.dexterity = (self.dexterity + delta).max(0),
            "intelligence" => self.intelligence = (self.intelligence + delta).max(0),
            "charisma" => self.charisma = (self.charisma + delta).max(0),
            "level" => self.level = (self.level + delta).max(0),
            "experience" => self.experience = (self.experience + delta).max(0),
            _ => return false,
        }
        true
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            health: 100,
            max_health: 100,
            mana: 100,
            max_mana: 100,
            strength: 10,
            dexterity: 10,
            intelligence: 10,
            charisma: 10,
            level: 1,
            experience: 0,
        }
    }
}

/// The player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub character_class: String,
    pub stats: PlayerStats,
    pub inventory: Vec<InventoryItem>,
    /// slot -> item id
    pub equipped: HashMap<String, String>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            character_class: "Adventurer".to_string(),
            stats: PlayerStats::default(),
            inventory: Vec::new(),
            equipped: HashMap::new(),
        }
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ItemKind {
    Weapon,
    Armor,
    Consumable,
    #[default]
    Misc,
}

/// An item in an inventory or on the ground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub description: String,
    pub quantity: u32,
    pub properties: HashMap<String, f32>,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            description: String::new(),
            quantity: 1,
            properties: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ============================================================================
// NPCs
// ============================================================================

/// NPC archetype. Determines the fixed daily routine used by the world
/// simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcKind {
    Merchant,
    Guard,
    Noble,
    Commoner,
}

impl NpcKind {
    pub fn name(&self) -> &'static str {
        match self {
            NpcKind::Merchant => "merchant",
            NpcKind::Guard => "guard",
            NpcKind::Noble => "noble",
            NpcKind::Commoner => "commoner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Disposition {
    Friendly,
    #[default]
    Neutral,
    Hostile,
}

/// A personality trait influencing simulated behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonalityTrait {
    Diligent,
    Friendly,
    Cautious,
    Brave,
    Greedy,
}

/// A non-player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    pub kind: NpcKind,
    pub location: LocationId,
    pub disposition: Disposition,
    /// Clamped to [-1, 1].
    pub relationship_with_player: f32,
    pub traits: Vec<PersonalityTrait>,
    pub motivations: Vec<String>,
    pub daily_routine: Vec<RoutineTask>,
}

impl Npc {
    pub fn new(name: impl Into<String>, kind: NpcKind, location: LocationId) -> Self {
        Self {
            id: NpcId::new(),
            name: name.into(),
            kind,
            location,
            disposition: Disposition::Neutral,
            relationship_with_player: 0.0,
            traits: Vec::new(),
            motivations: Vec::new(),
            daily_routine: RoutineTask::routine_for(kind).to_vec(),
        }
    }

    pub fn with_traits(mut self, traits: Vec<PersonalityTrait>) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }
}

/// A task in an NPC's daily routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutineTask {
    OpenShop,
    ServeCustomers,
    ManageInventory,
    CloseShop,
    Patrol,
    GuardPost,
    Investigate,
    Report,
    CourtDuties,
    SocialEvents,
    PrivateMeetings,
    Leisure,
    Work,
    FamilyTime,
    SocialInteraction,
    Rest,
}

impl RoutineTask {
    pub fn name(&self) -> &'static str {
        match self {
            RoutineTask::OpenShop => "open_shop",
            RoutineTask::ServeCustomers => "serve_customers",
            RoutineTask::ManageInventory => "manage_inventory",
            RoutineTask::CloseShop => "close_shop",
            RoutineTask::Patrol => "patrol",
            RoutineTask::GuardPost => "guard_post",
            RoutineTask::Investigate => "investigate",
            RoutineTask::Report => "report",
            RoutineTask::CourtDuties => "court_duties",
            RoutineTask::SocialEvents => "social_events",
            RoutineTask::PrivateMeetings => "private_meetings",
            RoutineTask::Leisure => "leisure",
            RoutineTask::Work => "work",
            RoutineTask::FamilyTime => "family_time",
            RoutineTask::SocialInteraction => "social_interaction",
            RoutineTask::Rest => "rest",
        }
    }

    /// Fixed daily routine for an NPC archetype.
    pub fn routine_for(kind: NpcKind) -> &'static [RoutineTask] {
        match kind {
            NpcKind::Merchant => &[
                RoutineTask::OpenShop,
                RoutineTask::ServeCustomers,
                RoutineTask::ManageInventory,
                RoutineTask::CloseShop,
            ],
            NpcKind::Guard => &[
                RoutineTask::Patrol,
                RoutineTask::GuardPost,
                RoutineTask::Investigate,
                RoutineTask::Report,
            ],
            NpcKind::Noble => &[
                RoutineTask::CourtDuties,
                RoutineTask::SocialEvents,
                RoutineTask::PrivateMeetings,
                RoutineTask::Leisure,
            ],
            NpcKind::Commoner => &[
                RoutineTask::Work,
                RoutineTask::FamilyTime,
                RoutineTask::SocialInteraction,
                RoutineTask::Rest,
            ],
        }
    }

    /// Preferred hour window (start, end); end < start wraps past
    /// midnight. None means any hour.
    pub fn time_window(&self) -> Option<(u8, u8)> {
        match self {
            RoutineTask::Work | RoutineTask::OpenShop | RoutineTask::ServeCustomers => {
                Some((8, 18))
            }
            RoutineTask::SocialInteraction | RoutineTask::SocialEvents => Some((18, 22)),
            RoutineTask::Rest => Some((22, 6)),
            RoutineTask::Patrol => None,
            _ => None,
        }
    }
}

// ============================================================================
// Locations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationKind {
    Town,
    City,
    Wilderness,
    Dungeon,
    Road,
    Building,
}

impl LocationKind {
    pub fn name(&self) -> &'static str {
        match self {
            LocationKind::Town => "town",
            LocationKind::City => "city",
            LocationKind::Wilderness => "wilderness",
            LocationKind::Dungeon => "dungeon",
            LocationKind::Road => "road",
            LocationKind::Building => "building",
        }
    }

    /// Multiplier applied to the random-encounter frequency.
    pub fn encounter_factor(&self) -> f32 {
        match self {
            LocationKind::Wilderness => 1.5,
            LocationKind::City => 0.3,
            LocationKind::Dungeon => 2.0,
            _ => 1.0,
        }
    }
}

/// A place in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub kind: LocationKind,
    pub connections: Vec<LocationId>,
    pub npcs_present: Vec<NpcId>,
    pub items: Vec<InventoryItem>,
}

impl Location {
    pub fn new(name: impl Into<String>, kind: LocationKind) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            description: String::new(),
            kind,
            connections: Vec::new(),
            npcs_present: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ============================================================================
// Time & weather
// ============================================================================

/// In-game clock. Hours accumulate into days; sub-hour remainders are
/// kept so repeated quarter-hour actions eventually roll the hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldClock {
    pub day: u32,
    pub hour: u8,
    /// Fractional hour carry in [0, 1).
    pub fraction: f32,
}

impl WorldClock {
    pub fn new(day: u32, hour: u8) -> Self {
        Self {
            day,
            hour,
            fraction: 0.0,
        }
    }

    pub fn advance_hours(&mut self, hours: f32) {
        let total = self.fraction + hours.max(0.0);
        let whole = total.floor() as u32;
        self.fraction = total - whole as f32;
        let total_hours = self.hour as u32 + whole;
        self.hour = (total_hours % 24) as u8;
        self.day += total_hours / 24;
    }

    pub fn is_daytime(&self) -> bool {
        self.hour >= 6 && self.hour < 18
    }

    pub fn time_of_day(&self) -> &'static str {
        match self.hour {
            5..=7 => "dawn",
            8..=11 => "morning",
            12..=13 => "midday",
            14..=17 => "afternoon",
            18..=20 => "evening",
            _ => "night",
        }
    }

    /// Whether the clock's hour falls in a (start, end) window; end <
    /// start wraps past midnight.
    pub fn in_window(&self, start: u8, end: u8) -> bool {
        if start <= end {
            self.hour >= start && self.hour <= end
        } else {
            self.hour >= start || self.hour <= end
        }
    }
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Storm,
    Fog,
}

impl Weather {
    pub fn name(&self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Rain => "rain",
            Weather::Storm => "storm",
            Weather::Fog => "fog",
        }
    }

    pub fn all() -> &'static [Weather] {
        &[Weather::Clear, Weather::Rain, Weather::Storm, Weather::Fog]
    }
}

// ============================================================================
// World events
// ============================================================================

/// Categories of autonomous world events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldEventKind {
    RandomEncounter,
    Political,
    Economic,
    Natural,
}

impl WorldEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            WorldEventKind::RandomEncounter => "random_encounter",
            WorldEventKind::Political => "political",
            WorldEventKind::Economic => "economic",
            WorldEventKind::Natural => "natural",
        }
    }
}

/// A world event produced by the simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldEvent {
    pub kind: WorldEventKind,
    pub subtype: String,
    pub description: String,
    pub impact: HashMap<String, f32>,
    pub day: u32,
    pub hour: u8,
}

// ============================================================================
// World state
// ============================================================================

/// The autonomous world: locations, NPCs, time, weather and global
/// pressure scalars read by the simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub current_location: LocationId,
    pub locations: HashMap<LocationId, Location>,
    pub npcs: HashMap<NpcId, Npc>,
    pub clock: WorldClock,
    pub weather: Weather,
    /// [0, 1]; high values favour guard behaviour.
    pub threat_level: f32,
    /// [0, 1]; low values favour work and trade adjustments.
    pub economy: f32,
    pub global_events: Vec<WorldEvent>,
}

impl WorldState {
    pub fn current_location_kind(&self) -> LocationKind {
        self.locations
            .get(&self.current_location)
            .map(|l| l.kind)
            .unwrap_or(LocationKind::Town)
    }
}

// ============================================================================
// Quests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestObjective {
    pub description: String,
    pub completed: bool,
}

/// A quest, optionally on a timer measured in in-game hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub status: QuestStatus,
    pub objectives: Vec<QuestObjective>,
    pub rewards: Vec<InventoryItem>,
    pub time_limit: Option<f32>,
    pub giver: Option<NpcId>,
}

impl Quest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: QuestId::new(),
            title: title.into(),
            description: description.into(),
            status: QuestStatus::Active,
            objectives: Vec::new(),
            rewards: Vec::new(),
            time_limit: None,
            giver: None,
        }
    }

    pub fn with_time_limit(mut self, hours: f32) -> Self {
        self.time_limit = Some(hours);
        self
    }
}

// ============================================================================
// Narrative history
// ============================================================================

/// What produced a narrative entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    UserAction,
    NarrativeResponse,
    SystemEvent,
}

/// The six action categories recognized by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Combat,
    Exploration,
    Dialogue,
    Inventory,
    Magic,
    Social,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Combat => "combat",
            ActionKind::Exploration => "exploration",
            ActionKind::Dialogue => "dialogue",
            ActionKind::Inventory => "inventory",
            ActionKind::Magic => "magic",
            ActionKind::Social => "social",
        }
    }

    /// Fixed classification/enumeration order. Earlier entries win
    /// score ties.
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::Combat,
            ActionKind::Exploration,
            ActionKind::Dialogue,
            ActionKind::Inventory,
            ActionKind::Magic,
            ActionKind::Social,
        ]
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One entry in the append-only narrative log.
///
/// Compression folds a prefix of the log into a single `SystemEvent`
/// entry; `summarized_actions` and `summarized_entries` preserve what
/// arc inference needs from the folded prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    pub content: String,
    #[serde(default)]
    pub action: Option<ActionKind>,
    #[serde(default)]
    pub summarized_actions: Vec<ActionKind>,
    #[serde(default)]
    pub summarized_entries: usize,
    pub timestamp: u64,
}

impl NarrativeEntry {
    pub fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            action: None,
            summarized_actions: Vec::new(),
            summarized_entries: 0,
            timestamp: unix_now(),
        }
    }

    pub fn user_action(content: impl Into<String>, action: ActionKind) -> Self {
        let mut entry = Self::new(EntryKind::UserAction, content);
        entry.action = Some(action);
        entry
    }

    pub fn response(content: impl Into<String>) -> Self {
        Self::new(EntryKind::NarrativeResponse, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(EntryKind::SystemEvent, content)
    }

    /// How many original entries this entry stands for.
    pub fn weight(&self) -> usize {
        if self.summarized_entries > 0 {
            self.summarized_entries
        } else {
            1
        }
    }
}

// ============================================================================
// Settings & game state
// ============================================================================

/// Base narrative styles selectable per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NarrativeStyle {
    #[default]
    Epic,
    Gritty,
    Whimsical,
    Mysterious,
}

impl NarrativeStyle {
    pub fn name(&self) -> &'static str {
        match self {
            NarrativeStyle::Epic => "epic",
            NarrativeStyle::Gritty => "gritty",
            NarrativeStyle::Whimsical => "whimsical",
            NarrativeStyle::Mysterious => "mysterious",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "epic" => Some(NarrativeStyle::Epic),
            "gritty" => Some(NarrativeStyle::Gritty),
            "whimsical" => Some(NarrativeStyle::Whimsical),
            "mysterious" => Some(NarrativeStyle::Mysterious),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    pub universe: String,
    pub narrative_style: NarrativeStyle,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            universe: "fantasy".to_string(),
            narrative_style: NarrativeStyle::Epic,
        }
    }
}

/// The complete canonical state of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub session_id: SessionId,
    pub player: Player,
    pub world: WorldState,
    pub quests: Vec<Quest>,
    pub narrative_history: Vec<NarrativeEntry>,
    /// faction -> standing, clamped to [-1, 1].
    pub reputation: HashMap<String, f32>,
    /// Arc state machine cursor, advanced by the narrative director.
    pub narrative_phase: Option<String>,
    pub settings: GameSettings,
    pub created_at: u64,
    pub updated_at: u64,
}

impl GameState {
    /// Build the starting state for a new session: a quiet village, a
    /// few residents, the player.
    pub fn new(player_name: impl Into<String>, settings: GameSettings) -> Self {
        let mut village = Location::new("Starting Village", LocationKind::Town)
            .with_description("A small, peaceful village where the adventure begins.");

        let merchant = Npc::new("Mirela", NpcKind::Merchant, village.id)
            .with_traits(vec![PersonalityTrait::Friendly, PersonalityTrait::Greedy])
            .with_disposition(Disposition::Friendly);
        let guard = Npc::new("Bastian", NpcKind::Guard, village.id)
            .with_traits(vec![PersonalityTrait::Diligent, PersonalityTrait::Brave]);
        let commoner = Npc::new("Old Tomas", NpcKind::Commoner, village.id)
            .with_traits(vec![PersonalityTrait::Cautious]);

        village.npcs_present = vec![merchant.id, guard.id, commoner.id];

        let mut npcs = HashMap::new();
        let mut locations = HashMap::new();
        let current_location = village.id;
        for npc in [merchant, guard, commoner] {
            npcs.insert(npc.id, npc);
        }
        locations.insert(village.id, village);

        let now = unix_now();
        Self {
            session_id: SessionId::new(),
            player: Player::new(player_name),
            world: WorldState {
                current_location,
                locations,
                npcs,
                clock: WorldClock::default(),
                weather: Weather::Clear,
                threat_level: 0.3,
                economy: 0.5,
                global_events: Vec::new(),
            },
            quests: Vec::new(),
            narrative_history: Vec::new(),
            reputation: HashMap::new(),
            narrative_phase: None,
            settings,
            created_at: now,
            updated_at: now,
        }
    }

    /// Effective narrative history length, counting entries folded into
    /// compression summaries.
    pub fn history_len(&self) -> usize {
        self.narrative_history.iter().map(|e| e.weight()).sum()
    }

    /// Action kinds of all user actions in insertion order, seeing
    /// through compression summaries.
    pub fn action_stream(&self) -> Vec<ActionKind> {
        let mut stream = Vec::new();
        for entry in &self.narrative_history {
            stream.extend(entry.summarized_actions.iter().copied());
            if let Some(kind) = entry.action {
                stream.push(kind);
            }
        }
        stream
    }
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_clamp_to_zero() {
        let mut stats = PlayerStats::default();
        stats.apply_delta("health", -250);
        assert_eq!(stats.health, 0);

        stats.apply_delta("health", 40);
        assert_eq!(stats.health, 40);
    }

    #[test]
    fn test_stats_clamp_to_max() {
        let mut stats = PlayerStats::default();
        stats.apply_delta("mana", 50);
        assert_eq!(stats.mana, 100);
    }

    #[test]
    fn test_stats_unknown_key_ignored() {
        let mut stats = PlayerStats::default();
        assert!(!stats.apply_delta("luck", 5));
        assert_eq!(stats.health, 100);
    }

    #[test]
    fn test_clock_advances_and_wraps() {
        let mut clock = WorldClock::new(1, 22);
        clock.advance_hours(5.0);
        assert_eq!(clock.day, 2);
        assert_eq!(clock.hour, 3);
    }

    #[test]
    fn test_clock_accumulates_fractions() {
        let mut clock = WorldClock::new(1, 10);
        for _ in 0..4 {
            clock.advance_hours(0.25);
        }
        assert_eq!(clock.hour, 11);
        assert!(clock.fraction.abs() < 1e-5);
    }

    #[test]
    fn test_window_wraps_midnight() {
        let clock = WorldClock::new(1, 23);
        assert!(clock.in_window(22, 6));
        let clock = WorldClock::new(1, 3);
        assert!(clock.in_window(22, 6));
        let clock = WorldClock::new(1, 12);
        assert!(!clock.in_window(22, 6));
    }

    #[test]
    fn test_new_state_seeds_village() {
        let state = GameState::new("Arden", GameSettings::default());
        assert_eq!(state.world.npcs.len(), 3);
        assert_eq!(state.world.locations.len(), 1);
        assert_eq!(state.world.current_location_kind(), LocationKind::Town);
        assert!(state.narrative_history.is_empty());
    }

    #[test]
    fn test_routine_seeded_from_kind() {
        let state = GameState::new("Arden", GameSettings::default());
        let guard = state
            .world
            .npcs
            .values()
            .find(|n| n.kind == NpcKind::Guard)
            .unwrap();
        assert!(guard.daily_routine.contains(&RoutineTask::Patrol));
    }

    #[test]
    fn test_action_stream_sees_through_summaries() {
        let mut state = GameState::new("Arden", GameSettings::default());
        let mut summary = NarrativeEntry::system("Earlier events, condensed.");
        summary.summarized_actions = vec![ActionKind::Combat, ActionKind::Dialogue];
        summary.summarized_entries = 4;
        state.narrative_history.push(summary);
        state
            .narrative_history
            .push(NarrativeEntry::user_action("attaque", ActionKind::Combat));

        assert_eq!(
            state.action_stream(),
            vec![ActionKind::Combat, ActionKind::Dialogue, ActionKind::Combat]
        );
        assert_eq!(state.history_len(), 5);
    }
}
