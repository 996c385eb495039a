//! Choices an action leaves open for a player.
//!
//! A pending decision waits until someone picks. Cancelling discards it and
//! nothing is applied.

use super::attack::WeaponChoice;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{ConditionDuration, ConditionInstance, ConditionKind, EntityId, Mutation};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PendingDecision {
    /// `target` left `attacker`'s reach; `attacker` may spend its reaction.
    OpportunityAttack { attacker: EntityId, target: EntityId },
    /// A melee attack dropped `target` to 0; `attacker` picks its fate. Both
    /// lists are fully resolved so peers apply them verbatim.
    Knockout {
        attacker: EntityId,
        target: EntityId,
        knockout: Vec<Mutation>,
        lethal: Vec<Mutation>,
    },
}

impl PendingDecision {
    pub(crate) fn knockout(attacker: EntityId, target: EntityId, lethal_slays: bool) -> Self {
        let unconscious = |source_name: &str| {
            Mutation::AddCondition(
                ConditionInstance::new(target, ConditionKind::Unconscious, ConditionDuration::Permanent, source_name)
                    .with_source(attacker),
            )
        };
        let mut lethal = vec![
            Mutation::SetHitPoints {
                entity: target,
                current: 0,
                temporary: 0,
            },
            unconscious("0 hit points"),
        ];
        if lethal_slays {
            lethal.push(Mutation::MarkSlain { entity: target });
        }
        Self::Knockout {
            attacker,
            target,
            knockout: vec![
                Mutation::SetHitPoints {
                    entity: target,
                    current: 1,
                    temporary: 0,
                },
                unconscious("knocked out"),
            ],
            lethal,
        }
    }

    /// Token whose controller makes the choice.
    pub fn chooser(&self) -> EntityId {
        match self {
            Self::OpportunityAttack { attacker, .. } | Self::Knockout { attacker, .. } => *attacker,
        }
    }

    pub fn target(&self) -> EntityId {
        match self {
            Self::OpportunityAttack { target, .. } | Self::Knockout { target, .. } => *target,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecisionChoice {
    Cancel,
    /// Take the opportunity attack with this weapon.
    Strike(WeaponChoice),
    KnockOut,
    Lethal,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("choice `{choice}` does not answer a pending {decision}")]
    Mismatch {
        decision: &'static str,
        choice: &'static str,
    },
}

impl GameError for DecisionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Mismatch { .. } => "DECISION_MISMATCH",
        }
    }
}

impl DecisionChoice {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Strike(_) => "strike",
            Self::KnockOut => "knock out",
            Self::Lethal => "lethal",
        }
    }
}

impl PendingDecision {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::OpportunityAttack { .. } => "opportunity attack",
            Self::Knockout { .. } => "knockout",
        }
    }

    pub(crate) fn mismatch(&self, choice: &DecisionChoice) -> DecisionError {
        DecisionError::Mismatch {
            decision: self.name(),
            choice: choice.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knockout_lists_differ_in_hit_points() {
        let decision = PendingDecision::knockout(EntityId(1), EntityId(2), false);
        let PendingDecision::Knockout { knockout, lethal, .. } = decision else {
            panic!("expected knockout");
        };
        assert!(knockout.contains(&Mutation::SetHitPoints {
            entity: EntityId(2),
            current: 1,
            temporary: 0
        }));
        assert!(lethal.contains(&Mutation::SetHitPoints {
            entity: EntityId(2),
            current: 0,
            temporary: 0
        }));
        assert!(!lethal.contains(&Mutation::MarkSlain { entity: EntityId(2) }));
    }

    #[test]
    fn lethal_slays_monsters() {
        let PendingDecision::Knockout { lethal, .. } = PendingDecision::knockout(EntityId(1), EntityId(3), true)
        else {
            panic!("expected knockout");
        };
        assert_eq!(lethal.last(), Some(&Mutation::MarkSlain { entity: EntityId(3) }));
    }

    #[test]
    fn mismatch_names_both_sides() {
        let decision = PendingDecision::OpportunityAttack {
            attacker: EntityId(1),
            target: EntityId(2),
        };
        assert_eq!(
            decision.mismatch(&DecisionChoice::KnockOut).to_string(),
            "choice `knock out` does not answer a pending opportunity attack"
        );
    }
}
