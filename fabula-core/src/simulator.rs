//! World simulator - advances the autonomous world between player turns.
//!
//! Each step runs five independent generators over a read projection of
//! the session: NPC action selection (scored candidates, then an
//! occurrence gate), stochastic world events, environmental shifts,
//! quest timers and reputation drift. Results are applied back through
//! the session store only; the simulator holds no state of its own
//! beyond its rule tables.
//!
//! All randomness flows through a caller-supplied `Rng` so steps are
//! reproducible under a seeded generator.

use crate::store::{SessionStore, SimulationView, StoreError, Subsystem};
use crate::world::{
    Npc, NpcId, NpcKind, PersonalityTrait, QuestId, RoutineTask, SessionId, Weather, WorldEvent,
    WorldEventKind,
};
use lazy_static::lazy_static;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Occurrence gate slope per elapsed hour.
const ACTION_CHANCE_PER_HOUR: f32 = 0.3;
/// Occurrence gate ceiling.
const ACTION_CHANCE_CAP: f32 = 0.8;
/// Chance per hour that an NPC considers a social interaction at all.
const SOCIAL_CANDIDATE_CHANCE: f32 = 0.3;
/// Chance per hour of a weather shift.
const WEATHER_SHIFT_PER_HOUR: f32 = 0.2;
/// Chance per hour of reputation drifting toward neutral.
const REPUTATION_DRIFT_PER_HOUR: f32 = 0.05;
/// Magnitude of one reputation drift step.
const REPUTATION_DRIFT_STEP: f32 = 0.01;

/// Stochastic event generator configuration.
struct EventGenerator {
    frequency: f32,
    subtypes: Vec<&'static str>,
}

lazy_static! {
    static ref EVENT_GENERATORS: HashMap<WorldEventKind, EventGenerator> = {
        let mut map = HashMap::new();
        map.insert(
            WorldEventKind::RandomEncounter,
            EventGenerator {
                frequency: 0.10,
                subtypes: vec!["bandits", "merchants", "travelers", "wildlife", "weather"],
            },
        );
        map.insert(
            WorldEventKind::Political,
            EventGenerator {
                frequency: 0.05,
                subtypes: vec!["decree", "conflict", "alliance", "succession", "rebellion"],
            },
        );
        map.insert(
            WorldEventKind::Economic,
            EventGenerator {
                frequency: 0.08,
                subtypes: vec![
                    "market_crash",
                    "trade_boom",
                    "shortage",
                    "discovery",
                    "embargo",
                ],
            },
        );
        map.insert(
            WorldEventKind::Natural,
            EventGenerator {
                frequency: 0.03,
                subtypes: vec!["storm", "earthquake", "plague", "harvest", "drought"],
            },
        );
        map
    };
}

/// Fixed trial order so a seeded rng replays identically.
const EVENT_ORDER: [WorldEventKind; 4] = [
    WorldEventKind::RandomEncounter,
    WorldEventKind::Political,
    WorldEventKind::Economic,
    WorldEventKind::Natural,
];

// ============================================================================
// Step results
// ============================================================================

/// What a simulated NPC chose to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NpcActionChoice {
    Routine(RoutineTask),
    Social,
    Economic,
}

/// One NPC's action for this step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcActionReport {
    pub npc_id: NpcId,
    pub npc_name: String,
    pub choice: NpcActionChoice,
    pub description: String,
    pub score: f32,
}

/// An environmental shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentalChange {
    pub weather: Weather,
    pub visibility_delta: f32,
    pub description: String,
}

/// A quest that expired during this step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestUpdate {
    pub quest_id: QuestId,
    pub title: String,
    pub description: String,
}

/// A reputation drift applied this step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationChange {
    pub faction: String,
    pub delta: f32,
    pub reason: String,
}

/// Everything one simulation step produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSummary {
    pub npc_actions: Vec<NpcActionReport>,
    pub world_events: Vec<WorldEvent>,
    pub environmental_changes: Vec<EnvironmentalChange>,
    pub quest_updates: Vec<QuestUpdate>,
    pub reputation_changes: Vec<ReputationChange>,
    pub hours_elapsed: f32,
}

// ============================================================================
// Simulator
// ============================================================================

/// The world simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldSimulator;

impl WorldSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Advance the world by `hours` in-game hours, applying all results
    /// through the store.
    pub fn simulate_step<R: Rng>(
        &self,
        store: &SessionStore,
        id: SessionId,
        hours: f32,
        rng: &mut R,
    ) -> Result<StepSummary, StoreError> {
        let view = store
            .context(id, &[Subsystem::Simulation])?
            .simulation
            .expect("simulation slice requested");

        let mut summary = StepSummary {
            hours_elapsed: hours,
            ..StepSummary::default()
        };

        summary.npc_actions = self.simulate_npcs(&view, hours, rng);
        summary.world_events = self.generate_events(&view, hours, rng);
        summary.environmental_changes = self.shift_environment(&view, hours, rng);
        summary.reputation_changes = self.drift_reputation(&view, hours, rng);

        // Apply everything through the store. Quest expiry is resolved
        // by the store mutation itself so the timer decrement happens
        // exactly once.
        store.advance_time(id, hours)?;

        for event in &summary.world_events {
            tracing::debug!(session = %id, kind = event.kind.name(), subtype = %event.subtype, "world event");
            store.record_world_event(id, event.clone())?;
        }

        if let Some(change) = summary.environmental_changes.last() {
            store.set_weather(id, change.weather)?;
        }

        let expired = store.advance_quest_clock(id, hours)?;
        summary.quest_updates = expired
            .iter()
            .map(|quest_id| {
                let title = view
                    .active_quests
                    .iter()
                    .find(|q| q.id == *quest_id)
                    .map(|q| q.title.clone())
                    .unwrap_or_else(|| "Unknown quest".to_string());
                QuestUpdate {
                    quest_id: *quest_id,
                    description: format!("The quest \"{title}\" has expired"),
                    title,
                }
            })
            .collect();

        for change in &summary.reputation_changes {
            store.update_reputation(id, &change.faction, change.delta)?;
        }

        Ok(summary)
    }

    // ========================================================================
    // NPC actions
    // ========================================================================

    fn simulate_npcs<R: Rng>(
        &self,
        view: &SimulationView,
        hours: f32,
        rng: &mut R,
    ) -> Vec<NpcActionReport> {
        let mut actions = Vec::new();

        for npc in &view.npcs {
            // Selection first, occurrence second; the two stages are
            // independent draws.
            let candidate = self.select_candidate(npc, view, rng);

            let occurrence = (hours * ACTION_CHANCE_PER_HOUR).min(ACTION_CHANCE_CAP);
            if rng.gen::<f32>() >= occurrence {
                continue;
            }

            let description = match &candidate.choice {
                NpcActionChoice::Routine(task) => {
                    format!("{} goes about the day's routine: {}", npc.name, task.name())
                }
                NpcActionChoice::Social => format!("{} mingles with those nearby", npc.name),
                NpcActionChoice::Economic => {
                    format!("{} adjusts prices and restocks wares", npc.name)
                }
            };

            actions.push(NpcActionReport {
                npc_id: npc.id,
                npc_name: npc.name.clone(),
                choice: candidate.choice,
                description,
                score: candidate.score,
            });
        }

        actions
    }

    fn select_candidate<R: Rng>(
        &self,
        npc: &Npc,
        view: &SimulationView,
        rng: &mut R,
    ) -> Candidate {
        let mut candidates: Vec<Candidate> = RoutineTask::routine_for(npc.kind)
            .iter()
            .map(|task| Candidate {
                choice: NpcActionChoice::Routine(*task),
                score: self.score_routine(npc, *task, view),
            })
            .collect();

        if rng.gen::<f32>() < SOCIAL_CANDIDATE_CHANCE {
            candidates.push(Candidate {
                choice: NpcActionChoice::Social,
                score: self.score_social(npc, view),
            });
        }

        if npc.kind == NpcKind::Merchant {
            candidates.push(Candidate {
                choice: NpcActionChoice::Economic,
                score: self.score_economic(view),
            });
        }

        // Routine tables are never empty, so a maximum always exists.
        candidates
            .into_iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            .expect("at least one candidate")
    }

    fn score_routine(&self, npc: &Npc, task: RoutineTask, view: &SimulationView) -> f32 {
        let mut score: f32 = 0.5;

        if npc.traits.contains(&PersonalityTrait::Diligent)
            && matches!(task, RoutineTask::Work | RoutineTask::GuardPost)
        {
            score += 0.2;
        }
        if npc.traits.contains(&PersonalityTrait::Friendly)
            && matches!(task, RoutineTask::SocialInteraction | RoutineTask::ServeCustomers)
        {
            score += 0.2;
        }

        if let Some((start, end)) = task.time_window() {
            if view.clock.in_window(start, end) {
                score += 0.3;
            }
        } else if task == RoutineTask::Patrol {
            // Patrols run around the clock.
            score += 0.3;
        }

        if view.threat_level > 0.5
            && matches!(task, RoutineTask::GuardPost | RoutineTask::Patrol)
        {
            score += 0.3;
        }
        if view.threat_level < 0.3
            && matches!(task, RoutineTask::SocialInteraction | RoutineTask::Leisure)
        {
            score += 0.2;
        }
        if view.economy < 0.4
            && matches!(task, RoutineTask::Work | RoutineTask::ManageInventory)
        {
            score += 0.2;
        }

        score.min(1.0)
    }

    fn score_social(&self, npc: &Npc, view: &SimulationView) -> f32 {
        let mut score: f32 = 0.4;

        if npc.location == view.player_location {
            score += 0.3;
        }

        if npc.relationship_with_player > 0.5 {
            score += 0.2;
        } else if npc.relationship_with_player < -0.5 {
            score -= 0.2;
        }

        score.max(0.1)
    }

    fn score_economic(&self, view: &SimulationView) -> f32 {
        let mut score = 0.3;

        if view.economy < 0.4 {
            // A depressed market demands attention.
            score += 0.4;
        } else if view.economy > 0.7 {
            score += 0.2;
        }

        score
    }

    // ========================================================================
    // Events & environment
    // ========================================================================

    fn generate_events<R: Rng>(
        &self,
        view: &SimulationView,
        hours: f32,
        rng: &mut R,
    ) -> Vec<WorldEvent> {
        let mut events = Vec::new();

        for kind in EVENT_ORDER {
            let generator = &EVENT_GENERATORS[&kind];
            let mut probability = generator.frequency * hours;
            if kind == WorldEventKind::RandomEncounter {
                probability *= view.location_kind.encounter_factor();
            }

            if rng.gen::<f32>() >= probability {
                continue;
            }

            let subtype = generator.subtypes[rng.gen_range(0..generator.subtypes.len())];
            events.push(self.build_event(kind, subtype, view));
        }

        events
    }

    fn build_event(&self, kind: WorldEventKind, subtype: &str, view: &SimulationView) -> WorldEvent {
        let mut impact = HashMap::new();
        let description = match kind {
            WorldEventKind::RandomEncounter => {
                impact.insert("tension".to_string(), 0.2);
                format!("An unexpected encounter on the road: {subtype}")
            }
            WorldEventKind::Political => {
                impact.insert("stability".to_string(), -0.1);
                format!("Word spreads of a political {subtype}")
            }
            WorldEventKind::Economic => {
                let delta = match subtype {
                    "trade_boom" | "discovery" => 0.1,
                    _ => -0.1,
                };
                impact.insert("economy".to_string(), delta);
                format!("The markets react to a {subtype}")
            }
            WorldEventKind::Natural => {
                impact.insert("disruption".to_string(), 0.2);
                format!("Nature stirs: {subtype}")
            }
        };

        WorldEvent {
            kind,
            subtype: subtype.to_string(),
            description,
            impact,
            day: view.clock.day,
            hour: view.clock.hour,
        }
    }

    fn shift_environment<R: Rng>(
        &self,
        view: &SimulationView,
        hours: f32,
        rng: &mut R,
    ) -> Vec<EnvironmentalChange> {
        let mut changes = Vec::new();

        if rng.gen::<f32>() < WEATHER_SHIFT_PER_HOUR * hours {
            let options = Weather::all();
            let weather = options[rng.gen_range(0..options.len())];
            let visibility_delta = rng.gen_range(-0.2..0.2);
            changes.push(EnvironmentalChange {
                weather,
                visibility_delta,
                description: format!(
                    "The weather turns {} over {}",
                    weather.name(),
                    view.clock.time_of_day()
                ),
            });
        }

        changes
    }

    fn drift_reputation<R: Rng>(
        &self,
        view: &SimulationView,
        hours: f32,
        rng: &mut R,
    ) -> Vec<ReputationChange> {
        let mut changes = Vec::new();

        if rng.gen::<f32>() < REPUTATION_DRIFT_PER_HOUR * hours {
            let current = view.general_reputation;
            let delta = if current > 0.0 {
                -REPUTATION_DRIFT_STEP
            } else if current < 0.0 {
                REPUTATION_DRIFT_STEP
            } else {
                0.0
            };

            if delta != 0.0 {
                changes.push(ReputationChange {
                    faction: "general".to_string(),
                    delta,
                    reason: "Standing fades toward neutral".to_string(),
                });
            }
        }

        changes
    }
}

struct Candidate {
    choice: NpcActionChoice,
    score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SessionStore, StoreConfig};
    use crate::world::{LocationKind, NarrativeStyle, Quest};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (SessionStore, SessionId) {
        let store = SessionStore::new(StoreConfig::default());
        let id = store.create_session("Arden", "fantasy", NarrativeStyle::Epic);
        (store, id)
    }

    fn view(store: &SessionStore, id: SessionId) -> SimulationView {
        store
            .context(id, &[Subsystem::Simulation])
            .unwrap()
            .simulation
            .unwrap()
    }

    #[test]
    fn test_step_advances_clock() {
        let (store, id) = setup();
        let mut rng = StdRng::seed_from_u64(7);
        let simulator = WorldSimulator::new();

        let before = view(&store, id).clock.hour;
        simulator.simulate_step(&store, id, 2.0, &mut rng).unwrap();
        let after = view(&store, id).clock;
        assert_eq!(after.hour, before + 2);
    }

    #[test]
    fn test_step_is_deterministic_under_seed() {
        let simulator = WorldSimulator::new();

        let run = |seed: u64| {
            let (store, id) = setup();
            let mut rng = StdRng::seed_from_u64(seed);
            simulator.simulate_step(&store, id, 3.0, &mut rng).unwrap()
        };

        let a = run(42);
        let b = run(42);
        assert_eq!(a.npc_actions.len(), b.npc_actions.len());
        assert_eq!(a.world_events.len(), b.world_events.len());
        for (x, y) in a.npc_actions.iter().zip(&b.npc_actions) {
            assert_eq!(x.choice, y.choice);
        }
    }

    #[test]
    fn test_occurrence_gate_zero_hours() {
        let (store, id) = setup();
        let mut rng = StdRng::seed_from_u64(11);
        let simulator = WorldSimulator::new();

        // With no elapsed time the gate probability is zero: nothing
        // happens, for any seed.
        let summary = simulator.simulate_step(&store, id, 0.0, &mut rng).unwrap();
        assert!(summary.npc_actions.is_empty());
        assert!(summary.world_events.is_empty());
        assert!(summary.reputation_changes.is_empty());
    }

    #[test]
    fn test_guard_duty_scores_rise_with_threat() {
        let (store, id) = setup();
        let simulator = WorldSimulator::new();
        let mut v = view(&store, id);

        let guard = v
            .npcs
            .iter()
            .find(|n| n.kind == NpcKind::Guard)
            .cloned()
            .unwrap();

        v.threat_level = 0.2;
        let calm = simulator.score_routine(&guard, RoutineTask::GuardPost, &v);
        v.threat_level = 0.8;
        let tense = simulator.score_routine(&guard, RoutineTask::GuardPost, &v);
        assert!(tense > calm);
    }

    #[test]
    fn test_routine_score_capped_at_one() {
        let (store, id) = setup();
        let simulator = WorldSimulator::new();
        let mut v = view(&store, id);
        v.threat_level = 0.9;

        let guard = v
            .npcs
            .iter()
            .find(|n| n.kind == NpcKind::Guard)
            .cloned()
            .unwrap();

        // Patrol: all-day window, diligence, high threat; still <= 1.
        let score = simulator.score_routine(&guard, RoutineTask::Patrol, &v);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_social_score_follows_relationship_sign() {
        let (store, id) = setup();
        let simulator = WorldSimulator::new();
        let v = view(&store, id);

        let mut npc = v.npcs[0].clone();
        npc.location = v.player_location;

        npc.relationship_with_player = 0.8;
        let liked = simulator.score_social(&npc, &v);
        npc.relationship_with_player = -0.8;
        let disliked = simulator.score_social(&npc, &v);
        assert!(liked > disliked);
        assert!(disliked >= 0.1);
    }

    #[test]
    fn test_economic_candidate_only_for_merchants() {
        let (store, id) = setup();
        let simulator = WorldSimulator::new();
        let v = view(&store, id);
        let mut rng = StdRng::seed_from_u64(3);

        let commoner = v
            .npcs
            .iter()
            .find(|n| n.kind == NpcKind::Commoner)
            .unwrap();
        for _ in 0..20 {
            let candidate = simulator.select_candidate(commoner, &v, &mut rng);
            assert_ne!(candidate.choice, NpcActionChoice::Economic);
        }
    }

    #[test]
    fn test_depressed_economy_favours_merchant_adjustment() {
        let (store, id) = setup();
        let simulator = WorldSimulator::new();
        let mut v = view(&store, id);

        v.economy = 0.2;
        let depressed = simulator.score_economic(&v);
        v.economy = 0.5;
        let steady = simulator.score_economic(&v);
        assert!(depressed > steady);
        assert!((depressed - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_encounter_factor_scales_probability() {
        assert!((LocationKind::Wilderness.encounter_factor() - 1.5).abs() < f32::EPSILON);
        assert!((LocationKind::City.encounter_factor() - 0.3).abs() < f32::EPSILON);
        assert!((LocationKind::Dungeon.encounter_factor() - 2.0).abs() < f32::EPSILON);
        assert!((LocationKind::Town.encounter_factor() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_quest_expiry_reported() {
        let (store, id) = setup();
        store
            .add_quest(
                id,
                Quest::new("Courier run", "Deliver the parcel").with_time_limit(0.5),
            )
            .unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let simulator = WorldSimulator::new();
        let summary = simulator.simulate_step(&store, id, 1.0, &mut rng).unwrap();

        assert_eq!(summary.quest_updates.len(), 1);
        assert_eq!(summary.quest_updates[0].title, "Courier run");
    }

    #[test]
    fn test_reputation_drifts_toward_neutral() {
        let (store, id) = setup();
        store.update_reputation(id, "general", 0.5).unwrap();

        let simulator = WorldSimulator::new();
        // Long enough that the drift trial fires under most seeds; the
        // assertion only checks direction when it does.
        let mut rng = StdRng::seed_from_u64(1);
        let mut drifted = None;
        for _ in 0..50 {
            let summary = simulator.simulate_step(&store, id, 4.0, &mut rng).unwrap();
            if let Some(change) = summary.reputation_changes.first() {
                drifted = Some(change.delta);
                break;
            }
        }

        let delta = drifted.expect("drift should fire within 50 steps");
        assert!(delta < 0.0);
    }
}
