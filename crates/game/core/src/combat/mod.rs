//! Combat resolution math.
//!
//! Pure functions: they read entities and conditions and draw from a
//! [`RandomSource`](crate::env::RandomSource), but never write state. The
//! action layer wraps them and produces mutations.
//!
//! - `advantage`: condition and situation effects on attack rolls
//! - `attack`: attack and damage modifiers, the attack roll, the damage roll
//! - `damage`: damage types and application to hit points
//! - `dice`: dice expression parsing and rolling
//! - `save`, `concentration`: saving throws
//! - `unarmed`, `mastery`: special attack modes and weapon mastery riders

pub mod advantage;
pub mod attack;
pub mod concentration;
pub mod damage;
pub mod dice;
pub mod mastery;
pub mod save;
pub mod unarmed;

pub use advantage::{
    RangeClass, RollInputs, RollMode, RollModifiers, RollOverrides, RollSource, resolve_roll_modifiers,
};
pub use attack::{
    AttackContext, AttackOptions, AttackRoll, AttackStatus, BonusDice, DamageRoll, RangeBand, Situation,
    attack_ability, compute_attack_modifier, compute_damage_modifier, crit_threshold, effective_ac,
    range_band, range_class, roll_attack, roll_damage,
};
pub use concentration::{concentration_check, concentration_dc};
pub use damage::{DamageApplicationResult, DamageType, apply_damage, type_modifiers};
pub use dice::{DiceExpr, DiceParseError, DiceRoll, DiceTerm};
pub use mastery::{MasteryEffect, active_mastery, mastery_effect};
pub use save::{NaturalRule, SavingThrow, best_physical_save, roll_saving_throw};
pub use unarmed::{
    ContestOutcome, ShoveChoice, UnarmedMode, can_contest, contest_dc, push_path, resolve_contest,
};
