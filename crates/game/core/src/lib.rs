//! Deterministic combat rules for a grid-based tabletop game.
//!
//! `tabletop-core` defines the canonical rules (state, combat math, geometry,
//! actions, engine) and exposes pure APIs shared by the session host and its
//! peers. Actions read [`state::CombatState`] and return mutations; all
//! writes flow through [`engine::CombatEngine`].
pub mod action;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod geometry;
pub mod state;

pub use action::{
    ActionCost, ActionOutcome, ActionReport, AreaEffectAction, AttackAction, CombatAction, CombatTransition,
    ConcentrationAction, ConditionAction, DamageAction, DecisionChoice, EconomyAction, EconomyKind, MountAction,
    MoveRequest, PendingDecision, WeaponChoice,
};
pub use combat::{AttackOptions, DamageType, RollMode, ShoveChoice, UnarmedMode};
pub use config::RulesConfig;
pub use engine::{CombatEngine, DecisionOutcome, ExecuteError, TurnAdvance};
pub use env::{CombatEnv, MapDimensions, MapOracle, MapSnapshot, PcgRng, RandomSource, SequenceRng, Terrain};
pub use error::{ErrorSeverity, GameError};
pub use geometry::{AreaShape, AreaShapeKind, CoverCategory, Direction, WallSegment};
pub use state::{
    CombatEntity, CombatState, ConditionDuration, ConditionInstance, ConditionKind, CreatureSize, EntityId,
    Faction, HitPoints, Mutation, Position, StateError, TurnError, Weapon,
};
