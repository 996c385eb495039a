pub mod abilities;
pub mod common;
pub mod condition;
pub mod entities;
pub mod entity;
pub mod weapon;

pub use abilities::{Ability, AbilityScores, AbilitySet};
pub use common::{EntityId, Footprint, Position};
pub use condition::{ConditionDuration, ConditionInstance, ConditionKind};
pub use entities::EntitiesState;
pub use entity::{
    CombatEntity, CombatFeatures, CreatureSize, DamageProfile, Faction, HitPoints, Speeds,
    TypeModifiers,
};
pub use weapon::{MasteryKind, Weapon, WeaponForm, WeaponKind, WeaponProperties, WeaponRange};
