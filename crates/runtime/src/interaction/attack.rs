use tracing::debug;

use tabletop_core::{
    ActionCost, ActionOutcome, ActionReport, AttackAction, AttackOptions, CombatAction, EntityId, WeaponChoice,
};

use super::{InteractionError, validate_target};
use crate::api::Result;
use crate::session::{ActionResolution, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum AttackStep {
    WeaponSelect,
    TargetSelect {
        weapon: WeaponChoice,
    },
    Roll {
        weapon: WeaponChoice,
        target: EntityId,
    },
    /// The attack hit. The outcome is rolled but not yet applied.
    Damage {
        outcome: Box<ActionOutcome>,
        rolled_at: [u8; 32],
    },
    Result {
        resolution: Box<ActionResolution>,
    },
    Cancelled,
}

impl AttackStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WeaponSelect => "weapon-select",
            Self::TargetSelect { .. } => "target-select",
            Self::Roll { .. } => "roll",
            Self::Damage { .. } => "damage",
            Self::Result { .. } => "result",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttackInput {
    Weapon(WeaponChoice),
    Target(EntityId),
    Roll,
    ApplyDamage,
    Cancel,
}

impl AttackInput {
    fn name(&self) -> &'static str {
        match self {
            Self::Weapon(_) => "weapon",
            Self::Target(_) => "target",
            Self::Roll => "roll",
            Self::ApplyDamage => "apply-damage",
            Self::Cancel => "cancel",
        }
    }
}

/// One attack, driven from weapon choice to applied result.
#[derive(Debug, Clone)]
pub struct AttackFlow {
    attacker: EntityId,
    options: AttackOptions,
    cost: ActionCost,
    step: AttackStep,
}

impl AttackFlow {
    pub fn new(attacker: EntityId) -> Self {
        Self {
            attacker,
            options: AttackOptions::default(),
            cost: ActionCost::default(),
            step: AttackStep::WeaponSelect,
        }
    }

    pub fn with_options(mut self, options: AttackOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cost(mut self, cost: ActionCost) -> Self {
        self.cost = cost;
        self
    }

    pub fn attacker(&self) -> EntityId {
        self.attacker
    }

    pub fn step(&self) -> &AttackStep {
        &self.step
    }

    pub fn handle(&mut self, input: AttackInput, session: &mut Session) -> Result<&AttackStep> {
        if self.step.is_finished() {
            return Err(InteractionError::Finished.into());
        }
        let next = match (&self.step, input) {
            (_, AttackInput::Cancel) => AttackStep::Cancelled,
            (AttackStep::WeaponSelect, AttackInput::Weapon(weapon)) => self.select_weapon(session, weapon)?,
            (AttackStep::TargetSelect { weapon }, AttackInput::Target(target)) => {
                self.select_target(session, weapon.clone(), target)?
            }
            (AttackStep::Roll { weapon, target }, AttackInput::Roll) => self.roll(session, weapon.clone(), *target)?,
            (AttackStep::Damage { outcome, rolled_at }, AttackInput::ApplyDamage) => {
                Self::apply_damage(session, outcome.as_ref().clone(), *rolled_at)?
            }
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
            from = self.step.name(),
            to = next.name(),
            "attack flow advanced"
        );
        self.step = next;
        Ok(&self.step)
    }

    fn select_weapon(&self, session: &Session, weapon: WeaponChoice) -> Result<AttackStep> {
        let attacker = session
            .state()
            .entity(self.attacker)
            .ok_or(InteractionError::UnknownEntity(self.attacker))?;
        if let WeaponChoice::Named(name) = &weapon
            && attacker.weapon(name).is_none()
        {
            return Err(InteractionError::UnknownWeapon {
                attacker: self.attacker,
                weapon: name.clone(),
            }
            .into());
        }
        Ok(AttackStep::TargetSelect { weapon })
    }

    fn select_target(&self, session: &Session, weapon: WeaponChoice, target: EntityId) -> Result<AttackStep> {
        validate_target(session, self.attacker, target)?;
        Ok(AttackStep::Roll { weapon, target })
    }

    /// Rolls the attack. A miss or a refused attack is applied at once; a
    /// hit waits for the damage step.
    fn roll(&self, session: &mut Session, weapon: WeaponChoice, target: EntityId) -> Result<AttackStep> {
        let action = AttackAction::new(self.attacker, target, weapon)
            .with_options(self.options.clone())
            .with_cost(self.cost);
        let rolled_at = session.state_root();
        let outcome = session
            .preview(&CombatAction::Attack(action))?
            .ok_or(InteractionError::Unresolvable)?;

        let hit = matches!(&outcome.report, ActionReport::Attack(report) if report.hit());
        if hit {
            return Ok(AttackStep::Damage {
                outcome: Box::new(outcome),
                rolled_at,
            });
        }
        let resolution = session.commit(outcome)?;
        Ok(AttackStep::Result {
            resolution: Box::new(resolution),
        })
    }

    fn apply_damage(session: &mut Session, outcome: ActionOutcome, rolled_at: [u8; 32]) -> Result<AttackStep> {
        if session.state_root() != rolled_at {
            return Err(InteractionError::StaleRoll.into());
        }
        let resolution = session.commit(outcome)?;
        Ok(AttackStep::Result {
            resolution: Box::new(resolution),
        })
    }
}
