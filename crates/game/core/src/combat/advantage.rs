//! Advantage and disadvantage from conditions and situation.
//!
//! [`resolve_roll_modifiers`] turns the attacker's and target's conditions
//! plus a few situational flags into named advantage and disadvantage
//! sources. Each source is a [`RollSource`] so a caller can switch off any
//! one of them (a feat, a DM ruling) before the roll mode is decided.

use std::collections::BTreeSet;

use crate::config::RulesConfig;
use crate::state::{ConditionKind, ConditionView, EntityId};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollSource {
    #[strum(to_string = "target prone")]
    TargetProne,
    #[strum(to_string = "unseen attacker")]
    UnseenAttacker,
    #[strum(to_string = "unseen target")]
    UnseenTarget,
    #[strum(to_string = "attacker blinded")]
    AttackerBlinded,
    #[strum(to_string = "target blinded")]
    TargetBlinded,
    #[strum(to_string = "attacker frightened")]
    AttackerFrightened,
    #[strum(to_string = "attacker poisoned")]
    AttackerPoisoned,
    #[strum(to_string = "attacker restrained")]
    AttackerRestrained,
    #[strum(to_string = "target restrained")]
    TargetRestrained,
    #[strum(to_string = "target incapacitated")]
    TargetIncapacitated,
    #[strum(to_string = "target dodging")]
    TargetDodging,
    #[strum(to_string = "hostile within reach")]
    HostileInReach,
    #[strum(to_string = "long range")]
    LongRange,
    #[strum(to_string = "grappled by another")]
    GrappledByOther,
    #[strum(to_string = "sapped")]
    Sapped,
    #[strum(to_string = "vexed")]
    Vexed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeClass {
    #[default]
    Melee,
    Ranged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

/// Situation of one attack as seen by the resolver.
#[derive(Clone, Copy, Debug)]
pub struct RollInputs<'a> {
    pub attacker: EntityId,
    pub target: EntityId,
    pub attacker_conditions: ConditionView<'a>,
    pub target_conditions: ConditionView<'a>,
    pub range: RangeClass,
    /// Attacker and target are within the attacker's melee reach.
    pub within_reach: bool,
    /// Some hostile, able to act, is within reach of the attacker.
    pub hostile_in_reach: bool,
    pub target_dodging: bool,
    pub attacker_hidden: bool,
    pub target_hidden: bool,
    pub beyond_normal_range: bool,
    /// The attacker has line of sight to a source of its fear. Fear with no
    /// tracked source always counts.
    pub fear_source_in_sight: bool,
}

/// Caller-side switches that disable individual sources before the roll.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollOverrides {
    pub suppressed: BTreeSet<RollSource>,
}

impl RollOverrides {
    pub fn suppress(mut self, source: RollSource) -> Self {
        self.suppressed.insert(source);
        self
    }

    pub fn allows(&self, source: RollSource) -> bool {
        !self.suppressed.contains(&source)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollModifiers {
    pub attacker_cannot_act: bool,
    pub advantage: Vec<RollSource>,
    pub disadvantage: Vec<RollSource>,
    pub auto_crit: bool,
    pub exhaustion_penalty: i32,
}

impl RollModifiers {
    /// Drops suppressed sources.
    pub fn filtered(&self, overrides: &RollOverrides) -> Self {
        Self {
            advantage: self.advantage.iter().copied().filter(|s| overrides.allows(*s)).collect(),
            disadvantage: self
                .disadvantage
                .iter()
                .copied()
                .filter(|s| overrides.allows(*s))
                .collect(),
            ..self.clone()
        }
    }

    /// Any advantage and any disadvantage cancel to a normal roll.
    pub fn mode(&self) -> RollMode {
        match (self.advantage.is_empty(), self.disadvantage.is_empty()) {
            (false, true) => RollMode::Advantage,
            (true, false) => RollMode::Disadvantage,
            _ => RollMode::Normal,
        }
    }
}

pub fn resolve_roll_modifiers(inputs: &RollInputs<'_>, rules: &RulesConfig) -> RollModifiers {
    let attacker = &inputs.attacker_conditions;
    let target = &inputs.target_conditions;
    let melee = inputs.range == RangeClass::Melee;
    let mut advantage = Vec::new();
    let mut disadvantage = Vec::new();

    let attacker_unseen = attacker.has(ConditionKind::Invisible) || inputs.attacker_hidden;
    let target_unseen = target.has(ConditionKind::Invisible) || inputs.target_hidden;

    if target.has(ConditionKind::Prone) {
        if melee && inputs.within_reach {
            advantage.push(RollSource::TargetProne);
        } else if !melee {
            disadvantage.push(RollSource::TargetProne);
        }
    }
    if attacker_unseen {
        advantage.push(RollSource::UnseenAttacker);
    }
    if target_unseen {
        disadvantage.push(RollSource::UnseenTarget);
    }
    if attacker.has(ConditionKind::Blinded) {
        disadvantage.push(RollSource::AttackerBlinded);
    }
    if target.has(ConditionKind::Blinded) {
        advantage.push(RollSource::TargetBlinded);
    }
    if attacker.has(ConditionKind::Frightened) && inputs.fear_source_in_sight {
        disadvantage.push(RollSource::AttackerFrightened);
    }
    if attacker.has(ConditionKind::Poisoned) {
        disadvantage.push(RollSource::AttackerPoisoned);
    }
    if attacker.has(ConditionKind::Restrained) {
        disadvantage.push(RollSource::AttackerRestrained);
    }
    if target.has(ConditionKind::Restrained) {
        advantage.push(RollSource::TargetRestrained);
    }
    let target_helpless = [
        ConditionKind::Paralyzed,
        ConditionKind::Stunned,
        ConditionKind::Unconscious,
        ConditionKind::Petrified,
    ]
    .into_iter()
    .any(|kind| target.has(kind));
    if target_helpless {
        advantage.push(RollSource::TargetIncapacitated);
    }
    let target_perceives =
        !target.has(ConditionKind::Blinded) && !target.is_incapacitated() && !attacker_unseen;
    if inputs.target_dodging && target_perceives {
        disadvantage.push(RollSource::TargetDodging);
    }
    if !melee && inputs.hostile_in_reach {
        disadvantage.push(RollSource::HostileInReach);
    }
    if !melee && inputs.beyond_normal_range {
        disadvantage.push(RollSource::LongRange);
    }
    if attacker
        .sources(ConditionKind::Grappled)
        .any(|grappler| grappler != inputs.target)
    {
        disadvantage.push(RollSource::GrappledByOther);
    }
    if attacker.has(ConditionKind::Sapped) {
        disadvantage.push(RollSource::Sapped);
    }
    if target.has_from(ConditionKind::Vexed, inputs.attacker) {
        advantage.push(RollSource::Vexed);
    }

    let auto_crit = melee
        && inputs.within_reach
        && (target.has(ConditionKind::Paralyzed) || target.has(ConditionKind::Unconscious));

    RollModifiers {
        attacker_cannot_act: attacker.is_incapacitated(),
        advantage,
        disadvantage,
        auto_crit,
        exhaustion_penalty: i32::from(attacker.level(ConditionKind::Exhaustion))
            * rules.exhaustion_penalty_per_level,
    }
}
