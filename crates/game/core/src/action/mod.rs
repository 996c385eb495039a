//! Combat actions.
//!
//! Every action reads [`CombatState`] and the [`CombatEnv`], draws from the
//! injected [`RandomSource`], and returns an [`ActionOutcome`]: a structured
//! report, the [`Mutation`]s that realise it, human-readable log lines, and
//! optionally a decision a player still has to make. Actions never write the
//! store; the engine applies the mutations.
//!
//! A request naming a token (or weapon, or map) that does not exist resolves
//! to `None`: nothing happens and nothing is logged.
//!
//! # Module Structure
//!
//! - `attack`: weapon, unarmed and improvised attacks with mastery riders
//! - `movement`: walking and teleporting, fear, terrain and opportunity attacks
//! - `area`: area-of-effect damage with saving throws
//! - `damage`: direct damage and the shared damage settlement path
//! - `condition`: granting and curing conditions by name
//! - `economy`: Dash, Disengage, Dodge and Hide
//! - `concentration`, `mount`: spell focus and riding
//! - `decision`: pending opportunity-attack and knockout choices

pub mod area;
pub mod attack;
pub mod concentration;
pub mod condition;
pub mod damage;
pub mod decision;
pub mod economy;
pub mod mount;
pub mod movement;

pub use area::{AreaEffectAction, AreaReport, AreaSave, AreaTargetResult};
pub use attack::{ActionCost, AttackAction, AttackReport, WeaponChoice};
pub use concentration::{ConcentrationAction, ConcentrationReport};
pub use condition::{ConditionAction, ConditionReport};
pub use damage::{DamageAction, DamageReport};
pub use decision::{DecisionChoice, DecisionError, PendingDecision};
pub use economy::{EconomyAction, EconomyKind, EconomyReport};
pub use mount::{MountAction, MountRejection, MountReport};
pub use movement::{MoveMode, MoveRejection, MoveReport, MoveRequest, effective_speed};

use crate::env::{CombatEnv, RandomSource};
use crate::state::{CombatState, ConditionKind, EntityId, Mutation};

/// Resolves one action variant against the current store.
pub trait CombatTransition {
    /// Token performing the action.
    fn actor(&self) -> EntityId;

    fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome>;
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatAction {
    Attack(AttackAction),
    Move(MoveRequest),
    AreaEffect(AreaEffectAction),
    Damage(DamageAction),
    Condition(ConditionAction),
    Economy(EconomyAction),
    Concentrate(ConcentrationAction),
    Mount(MountAction),
}

impl CombatAction {
    pub fn actor(&self) -> EntityId {
        match self {
            Self::Attack(action) => action.actor(),
            Self::Move(action) => action.actor(),
            Self::AreaEffect(action) => action.actor(),
            Self::Damage(action) => action.actor(),
            Self::Condition(action) => action.actor(),
            Self::Economy(action) => action.actor(),
            Self::Concentrate(action) => action.actor(),
            Self::Mount(action) => action.actor(),
        }
    }

    pub fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        match self {
            Self::Attack(action) => action.resolve(state, env, rng),
            Self::Move(action) => action.resolve(state, env, rng),
            Self::AreaEffect(action) => action.resolve(state, env, rng),
            Self::Damage(action) => action.resolve(state, env, rng),
            Self::Condition(action) => action.resolve(state, env, rng),
            Self::Economy(action) => action.resolve(state, env, rng),
            Self::Concentrate(action) => action.resolve(state, env, rng),
            Self::Mount(action) => action.resolve(state, env, rng),
        }
    }
}

/// What an action did, by kind.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionReport {
    Attack(Box<AttackReport>),
    Move(MoveReport),
    Area(AreaReport),
    Damage(DamageReport),
    Condition(ConditionReport),
    Economy(EconomyReport),
    Concentration(ConcentrationReport),
    Mount(MountReport),
}

/// Fully resolved result of one action. Peers apply `mutations` as-is.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionOutcome {
    pub actor: EntityId,
    pub report: ActionReport,
    pub mutations: Vec<Mutation>,
    pub log: Vec<String>,
    pub pending: Option<PendingDecision>,
}

impl ActionOutcome {
    pub(crate) fn new(actor: EntityId, report: ActionReport, effects: Effects) -> Self {
        Self {
            actor,
            report,
            mutations: effects.mutations,
            log: effects.log,
            pending: effects.pending,
        }
    }
}

/// Mutations, log lines and a pending decision accumulated while resolving.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pub mutations: Vec<Mutation>,
    pub log: Vec<String>,
    pub pending: Option<PendingDecision>,
}

impl Effects {
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }
}

/// d20 penalty from the entity's Exhaustion level.
pub(crate) fn exhaustion_penalty(state: &CombatState, env: &CombatEnv<'_>, entity: EntityId) -> i32 {
    i32::from(state.conditions_of(entity).level(ConditionKind::Exhaustion))
        * env.rules().exhaustion_penalty_per_level
}

/// Mount and rider linked to `entity`, which travel with it.
pub(crate) fn passengers(state: &CombatState, entity: EntityId) -> Vec<EntityId> {
    let Some(token) = state.entity(entity) else {
        return Vec::new();
    };
    token
        .rider
        .into_iter()
        .chain(token.mounted_on)
        .filter(|id| state.entities.contains(*id))
        .collect()
}
