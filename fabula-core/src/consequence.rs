//! Consequence application - turns validated tags into state mutations.
//!
//! Consumes the consequence tags emitted by validation and applies the
//! matching mutations through the session store. Infeasible actions
//! must not reach this module; the engine gates on `feasible` first.

use crate::interpreter::{Complexity, ConsequenceTag, ParsedAction, ValidationOutcome};
use crate::store::{SessionStore, StoreError};
use crate::world::{ActionKind, InventoryItem, ItemKind, SessionId};

/// Health/mana toll of a complex combat action.
const COMPLEX_COMBAT_TOLL: (i32, i32) = (10, 5);
/// Health/mana toll of any other combat action.
const SIMPLE_COMBAT_TOLL: (i32, i32) = (5, 2);
/// Experience granted per combat action, by complexity.
const COMBAT_EXPERIENCE: (i32, i32) = (10, 5);
/// Relationship gained by addressing an NPC.
const DIALOGUE_RELATIONSHIP_GAIN: f32 = 0.1;
/// General reputation gained by social manoeuvring.
const SOCIAL_REPUTATION_GAIN: f32 = 0.05;

/// Apply the consequences of a feasible action. Returns human-readable
/// descriptions of every state change made.
pub fn apply_consequences(
    store: &SessionStore,
    id: SessionId,
    action: &ParsedAction,
    validation: &ValidationOutcome,
) -> Result<Vec<String>, StoreError> {
    let mut changes = Vec::new();

    match action.kind {
        ActionKind::Combat => {
            let complex = action.complexity == Complexity::Complex;
            let (health_loss, mana_loss) = if complex {
                COMPLEX_COMBAT_TOLL
            } else {
                SIMPLE_COMBAT_TOLL
            };
            let experience = if complex {
                COMBAT_EXPERIENCE.0
            } else {
                COMBAT_EXPERIENCE.1
            };

            store.update_stats(
                id,
                &[
                    ("health", -health_loss),
                    ("mana", -mana_loss),
                    ("experience", experience),
                ],
            )?;
            changes.push(format!("Health reduced by {health_loss}"));
            changes.push(format!("Mana reduced by {mana_loss}"));
            changes.push(format!("Experience gained: {experience}"));
        }
        ActionKind::Magic => {
            for tag in &validation.consequences {
                if let ConsequenceTag::ManaCost(cost) = tag {
                    store.update_stats(id, &[("mana", -cost)])?;
                    changes.push(format!("Mana spent: {cost}"));
                }
            }
        }
        ActionKind::Dialogue => {
            for npc in &action.entities.npcs {
                if store.update_npc_relationship(id, npc, DIALOGUE_RELATIONSHIP_GAIN)? {
                    changes.push(format!("Relationship improved with {npc}"));
                }
            }
        }
        ActionKind::Social => {
            if validation
                .consequences
                .contains(&ConsequenceTag::ReputationShift)
            {
                store.update_reputation(id, "general", SOCIAL_REPUTATION_GAIN)?;
                changes.push("General reputation slightly improved".to_string());
            }
        }
        ActionKind::Exploration => {
            if validation.consequences.contains(&ConsequenceTag::Discovery) {
                let item = InventoryItem::new("Objet mystérieux", ItemKind::Misc)
                    .with_description("Un objet trouvé lors de votre exploration");
                let name = item.name.clone();
                store.add_inventory_item(id, item)?;
                changes.push(format!("Item discovered: {name}"));
            }
        }
        ActionKind::Inventory => {
            // Using or rearranging items is narrated; the inventory
            // itself only changes through explicit item operations.
            for object in &action.entities.objects {
                changes.push(format!("Item handled: {object}"));
            }
        }
    }

    Ok(changes)
}
