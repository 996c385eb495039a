use tracing::debug;

use tabletop_core::{AttackAction, CombatAction, EntityId, ShoveChoice, UnarmedMode, WeaponChoice};

use super::{InteractionError, validate_target};
use crate::api::Result;
use crate::session::{ActionResolution, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum ContestStep {
    TargetSelect,
    SaveRoll { target: EntityId },
    /// `None` when the contest named something that no longer exists.
    Done { resolution: Option<Box<ActionResolution>> },
    Cancelled,
}

impl ContestStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TargetSelect => "target-select",
            Self::SaveRoll { .. } => "save-roll",
            Self::Done { .. } => "done",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestInput {
    Target(EntityId),
    RollSave,
    Cancel,
}

impl ContestInput {
    fn name(self) -> &'static str {
        match self {
            Self::Target(_) => "target",
            Self::RollSave => "roll-save",
            Self::Cancel => "cancel",
        }
    }
}

/// A grapple or shove. The target saves against the attacker's DC.
#[derive(Debug, Clone)]
pub struct ContestFlow {
    attacker: EntityId,
    mode: UnarmedMode,
    shove: ShoveChoice,
    step: ContestStep,
}

impl ContestFlow {
    pub fn grapple(attacker: EntityId) -> Self {
        Self {
            attacker,
            mode: UnarmedMode::Grapple,
            shove: ShoveChoice::default(),
            step: ContestStep::TargetSelect,
        }
    }

    /// The push-or-prone choice is made up front, before the save.
    pub fn shove(attacker: EntityId, choice: ShoveChoice) -> Self {
        Self {
            attacker,
            mode: UnarmedMode::Shove,
            shove: choice,
            step: ContestStep::TargetSelect,
        }
    }

    pub fn mode(&self) -> UnarmedMode {
        self.mode
    }

    pub fn step(&self) -> &ContestStep {
        &self.step
    }

    pub fn handle(&mut self, input: ContestInput, session: &mut Session) -> Result<&ContestStep> {
        if self.step.is_finished() {
            return Err(InteractionError::Finished.into());
        }
        let next = match (&self.step, input) {
            (_, ContestInput::Cancel) => ContestStep::Cancelled,
            (ContestStep::TargetSelect, ContestInput::Target(target)) => {
                validate_target(session, self.attacker, target)?;
                ContestStep::SaveRoll { target }
            }
            (ContestStep::SaveRoll { target }, ContestInput::RollSave) => self.roll_save(session, *target)?,
            (step, input) => {
                return Err(InteractionError::UnexpectedInput {
                    step: step.name(),
                    input: input.name(),
                }
                .into());
            }
        };
        debug!(
            target: "runtime::interaction",
            attacker = %self.attacker,
            mode = ?self.mode,
            from = self.step.name(),
            to = next.name(),
            "contest flow advanced"
        );
        self.step = next;
        Ok(&self.step)
    }

    fn roll_save(&self, session: &mut Session, target: EntityId) -> Result<ContestStep> {
        let weapon = WeaponChoice::Unarmed {
            mode: self.mode,
            shove: self.shove,
        };
        let action = CombatAction::Attack(AttackAction::new(self.attacker, target, weapon));
        let resolution = session.submit(&action)?;
        Ok(ContestStep::Done {
            resolution: resolution.map(Box::new),
        })
    }
}
