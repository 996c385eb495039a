//! Wire messages exchanged between the session host and its peers.
//!
//! Every message is a tagged JSON object. State-changing messages carry the
//! host's state root after the change so a peer can tell it converged.
//! Free text never carries commands: dice rolls and whispers have their own
//! variants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tabletop_core::combat::DiceRoll;
use tabletop_core::{ActionOutcome, DecisionOutcome, EntityId};

use crate::session::DecisionId;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode wire message")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode wire message")]
    Decode(#[source] serde_json::Error),

    #[error("state root `{0}` is not 32 hex-encoded bytes")]
    InvalidRoot(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    ActionResolved {
        outcome: Box<ActionOutcome>,
        /// Id the host gave the decision this action left pending.
        decision: Option<DecisionId>,
        state_root: String,
    },
    DecisionResolved {
        id: DecisionId,
        outcome: Box<DecisionOutcome>,
        follow_up: Option<DecisionId>,
        state_root: String,
    },
    InitiativeRolled {
        entity: EntityId,
        score: i32,
        state_root: String,
    },
    TurnAdvanced {
        entity: EntityId,
        round: u32,
        state_root: String,
    },
    CombatEnded {
        state_root: String,
    },
    Chat {
        speaker: String,
        text: String,
    },
    Whisper {
        from: String,
        to: EntityId,
        text: String,
    },
    DiceRoll {
        roller: String,
        expression: String,
        roll: DiceRoll,
    },
}

impl WireMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }

    /// Tag used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ActionResolved { .. } => "action_resolved",
            Self::DecisionResolved { .. } => "decision_resolved",
            Self::InitiativeRolled { .. } => "initiative_rolled",
            Self::TurnAdvanced { .. } => "turn_advanced",
            Self::CombatEnded { .. } => "combat_ended",
            Self::Chat { .. } => "chat",
            Self::Whisper { .. } => "whisper",
            Self::DiceRoll { .. } => "dice_roll",
        }
    }

    /// Host state root after the change, for messages that change state.
    pub fn state_root(&self) -> Option<&str> {
        match self {
            Self::ActionResolved { state_root, .. }
            | Self::DecisionResolved { state_root, .. }
            | Self::InitiativeRolled { state_root, .. }
            | Self::TurnAdvanced { state_root, .. }
            | Self::CombatEnded { state_root } => Some(state_root),
            Self::Chat { .. } | Self::Whisper { .. } | Self::DiceRoll { .. } => None,
        }
    }
}

pub fn encode_root(root: &[u8; 32]) -> String {
    hex::encode(root)
}

pub fn decode_root(text: &str) -> Result<[u8; 32], ProtocolError> {
    let mut root = [0u8; 32];
    hex::decode_to_slice(text, &mut root).map_err(|_| ProtocolError::InvalidRoot(text.to_owned()))?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_tagged() {
        let message = WireMessage::Chat {
            speaker: "Ysolde".into(),
            text: "Behind the chapel!".into(),
        };
        let json = message.encode().unwrap();
        assert!(json.contains(r#""type":"chat""#));
        assert_eq!(WireMessage::decode(&json).unwrap(), message);
        assert_eq!(message.state_root(), None);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let err = WireMessage::decode(r#"{"type":"teleport","to":3}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn roots_must_be_32_bytes() {
        let root = [7u8; 32];
        assert_eq!(decode_root(&encode_root(&root)).unwrap(), root);
        assert!(matches!(decode_root("abcd"), Err(ProtocolError::InvalidRoot(_))));
        assert!(decode_root(&"zz".repeat(32)).is_err());
    }
}
