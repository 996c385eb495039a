//! Condition instances attached to tokens.

use super::common::EntityId;

/// Closed set of conditions the rules understand.
///
/// Vexed, Sapped and Slowed are the short-lived riders left by weapon
/// masteries; the rest are the standard conditions plus Stable.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionKind {
    Blinded,
    Charmed,
    Deafened,
    Exhaustion,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
    Stable,
    Vexed,
    Sapped,
    Slowed,
}

impl ConditionKind {
    /// Carries a numeric level in [`ConditionInstance::value`].
    pub const fn is_leveled(self) -> bool {
        matches!(self, Self::Exhaustion)
    }

    /// Tracked once per (entity, source) pair instead of once per entity.
    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Frightened | Self::Charmed | Self::Grappled | Self::Vexed
        )
    }

    /// The bearer cannot take actions or reactions.
    pub const fn is_incapacitating(self) -> bool {
        matches!(
            self,
            Self::Incapacitated
                | Self::Paralyzed
                | Self::Petrified
                | Self::Stunned
                | Self::Unconscious
        )
    }

    /// The bearer's speed is zero.
    pub const fn immobilizes(self) -> bool {
        matches!(
            self,
            Self::Grappled
                | Self::Restrained
                | Self::Paralyzed
                | Self::Petrified
                | Self::Stunned
                | Self::Unconscious
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionDuration {
    /// Counts down at each round boundary; expires on reaching zero.
    Rounds(u32),
    Permanent,
}

impl ConditionDuration {
    pub const fn is_timed(&self) -> bool {
        matches!(self, Self::Rounds(_))
    }

    /// Longer of two durations. Permanent outlasts everything.
    pub fn longest(self, other: Self) -> Self {
        match (self, other) {
            (Self::Permanent, _) | (_, Self::Permanent) => Self::Permanent,
            (Self::Rounds(a), Self::Rounds(b)) => Self::Rounds(a.max(b)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionInstance {
    pub entity: EntityId,
    pub kind: ConditionKind,
    pub duration: ConditionDuration,
    /// Spell, feature or weapon that caused it, for display.
    pub source_name: String,
    pub source: Option<EntityId>,
    /// Level for leveled conditions.
    pub value: Option<u8>,
}

impl ConditionInstance {
    pub fn new(
        entity: EntityId,
        kind: ConditionKind,
        duration: ConditionDuration,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            kind,
            duration,
            source_name: source_name.into(),
            source: None,
            value: None,
        }
    }

    pub fn permanent(entity: EntityId, kind: ConditionKind, source_name: impl Into<String>) -> Self {
        Self::new(entity, kind, ConditionDuration::Permanent, source_name)
    }

    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_value(mut self, value: u8) -> Self {
        self.value = Some(value);
        self
    }

    /// Level of a leveled condition; 1 when unset.
    pub fn level(&self) -> u8 {
        self.value.unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn names_round_trip_through_strum() {
        for kind in ConditionKind::iter() {
            let name = kind.to_string();
            assert_eq!(name.to_lowercase().parse::<ConditionKind>(), Ok(kind));
        }
        assert!("Bewildered".parse::<ConditionKind>().is_err());
    }

    #[test]
    fn only_exhaustion_is_leveled() {
        let leveled: Vec<_> = ConditionKind::iter().filter(|k| k.is_leveled()).collect();
        assert_eq!(leveled, vec![ConditionKind::Exhaustion]);
    }

    #[test]
    fn permanent_outlasts_rounds() {
        let timed = ConditionDuration::Rounds(3);
        assert_eq!(timed.longest(ConditionDuration::Rounds(5)), ConditionDuration::Rounds(5));
        assert_eq!(timed.longest(ConditionDuration::Permanent), ConditionDuration::Permanent);
    }
}
