//! Event extraction from wire messages.
//!
//! Host and peers publish the same events for the same message, so UI code
//! subscribes the same way on either side of the table.

use super::bus::Event;
use super::types::{CombatEvent, TurnEvent};
use crate::protocol::WireMessage;

/// Extract the domain events a state-changing message stands for.
///
/// Chat, whisper and dice messages yield nothing here; they reach the `Chat`
/// topic through the session's chat sink.
///
/// # Event Ordering
///
/// A resolution comes first, then the decision it left pending.
pub fn extract_events(message: &WireMessage) -> Vec<Event> {
    let mut events = Vec::new();
    match message {
        WireMessage::ActionResolved {
            outcome,
            decision,
            state_root,
        } => {
            events.push(Event::Combat(CombatEvent::ActionResolved {
                outcome: outcome.clone(),
                state_root: state_root.clone(),
            }));
            if let (Some(id), Some(pending)) = (decision, &outcome.pending) {
                events.push(Event::Combat(CombatEvent::DecisionPending {
                    id: *id,
                    decision: pending.clone(),
                }));
            }
        }
        WireMessage::DecisionResolved {
            id, outcome, follow_up, ..
        } => {
            events.push(Event::Combat(CombatEvent::DecisionResolved {
                id: *id,
                outcome: outcome.clone(),
            }));
            if let (Some(next), Some(pending)) = (follow_up, &outcome.pending) {
                events.push(Event::Combat(CombatEvent::DecisionPending {
                    id: *next,
                    decision: pending.clone(),
                }));
            }
        }
        WireMessage::InitiativeRolled { entity, score, .. } => {
            events.push(Event::Turn(TurnEvent::InitiativeRolled {
                entity: *entity,
                score: *score,
            }));
        }
        WireMessage::TurnAdvanced { entity, round, .. } => {
            events.push(Event::Turn(TurnEvent::TurnStarted {
                entity: *entity,
                round: *round,
            }));
        }
        WireMessage::CombatEnded { .. } => events.push(Event::Turn(TurnEvent::CombatEnded)),
        WireMessage::Chat { .. } | WireMessage::Whisper { .. } | WireMessage::DiceRoll { .. } => {}
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletop_core::EntityId;

    #[test]
    fn turn_messages_map_to_turn_events() {
        let events = extract_events(&WireMessage::TurnAdvanced {
            entity: EntityId(2),
            round: 3,
            state_root: String::new(),
        });
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Event::Turn(TurnEvent::TurnStarted { entity: EntityId(2), round: 3 })
        ));
    }

    #[test]
    fn chat_yields_no_domain_events() {
        let events = extract_events(&WireMessage::Chat {
            speaker: "Brannoc".into(),
            text: "For the crossroads!".into(),
        });
        assert!(events.is_empty());
    }
}
