//! Active condition instances per token.
//!
//! The registry is pure data plus queries. Duplicate handling depends on the
//! kind:
//!
//! - leveled (Exhaustion): one instance per token; an explicit level
//!   replaces, an unlevelled application raises by one
//! - relational (Frightened, Charmed, Grappled, Vexed): one instance per
//!   (token, source)
//! - everything else: one instance per token, keeping the longer duration

use std::collections::BTreeMap;

use crate::config::RulesConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::state::types::{ConditionDuration, ConditionInstance, ConditionKind, EntityId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionError {
    #[error("unknown condition `{0}`")]
    UnknownKind(String),

    #[error("{kind} level {value} is outside 1..={max}")]
    InvalidLevel {
        kind: ConditionKind,
        value: u8,
        max: u8,
    },
}

impl GameError for ConditionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownKind(_) => "CONDITION_UNKNOWN_KIND",
            Self::InvalidLevel { .. } => "CONDITION_INVALID_LEVEL",
        }
    }
}

/// What an application did to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionChange {
    Added,
    /// Already present; the longer duration was kept.
    Refreshed,
    Leveled { from: u8, to: u8 },
}

/// Read-only view over one token's conditions.
#[derive(Clone, Copy, Debug)]
pub struct ConditionView<'a> {
    instances: &'a [ConditionInstance],
}

impl<'a> ConditionView<'a> {
    pub const EMPTY: ConditionView<'static> = ConditionView { instances: &[] };

    pub fn new(instances: &'a [ConditionInstance]) -> Self {
        Self { instances }
    }

    pub fn has(&self, kind: ConditionKind) -> bool {
        self.instances.iter().any(|c| c.kind == kind)
    }

    pub fn has_from(&self, kind: ConditionKind, source: EntityId) -> bool {
        self.instances
            .iter()
            .any(|c| c.kind == kind && c.source == Some(source))
    }

    pub fn get(&self, kind: ConditionKind) -> Option<&'a ConditionInstance> {
        self.instances.iter().find(|c| c.kind == kind)
    }

    pub fn sources(&self, kind: ConditionKind) -> impl Iterator<Item = EntityId> + 'a {
        self.instances
            .iter()
            .filter(move |c| c.kind == kind)
            .filter_map(|c| c.source)
    }

    pub fn level(&self, kind: ConditionKind) -> u8 {
        self.get(kind).map(ConditionInstance::level).unwrap_or(0)
    }

    pub fn is_incapacitated(&self) -> bool {
        self.instances.iter().any(|c| c.kind.is_incapacitating())
    }

    /// First condition that pins the token in place, if any.
    pub fn immobilizing(&self) -> Option<ConditionKind> {
        self.instances
            .iter()
            .map(|c| c.kind)
            .find(|kind| kind.immobilizes())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ConditionInstance> {
        self.instances.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionRegistry {
    by_entity: BTreeMap<EntityId, Vec<ConditionInstance>>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a condition name at the registry boundary.
    pub fn parse_kind(name: &str) -> Result<ConditionKind, ConditionError> {
        name.trim()
            .parse()
            .map_err(|_| ConditionError::UnknownKind(name.to_owned()))
    }

    /// Rejects a leveled instance whose level is out of range.
    pub fn validate(instance: &ConditionInstance) -> Result<(), ConditionError> {
        if instance.kind.is_leveled()
            && let Some(value) = instance.value
            && !(1..=RulesConfig::MAX_EXHAUSTION_LEVEL).contains(&value)
        {
            return Err(ConditionError::InvalidLevel {
                kind: instance.kind,
                value,
                max: RulesConfig::MAX_EXHAUSTION_LEVEL,
            });
        }
        Ok(())
    }

    pub fn apply(&mut self, instance: ConditionInstance) -> Result<ConditionChange, ConditionError> {
        Self::validate(&instance)?;

        let slot = self.by_entity.entry(instance.entity).or_default();
        let existing = slot.iter_mut().find(|c| {
            c.kind == instance.kind && (!instance.kind.is_relational() || c.source == instance.source)
        });

        let Some(existing) = existing else {
            let mut instance = instance;
            if instance.kind.is_leveled() {
                instance.value = Some(instance.level());
            }
            slot.push(instance);
            return Ok(ConditionChange::Added);
        };

        existing.duration = existing.duration.longest(instance.duration);
        if instance.kind.is_leveled() {
            let from = existing.level();
            let to = instance
                .value
                .unwrap_or_else(|| from.saturating_add(1))
                .min(RulesConfig::MAX_EXHAUSTION_LEVEL);
            existing.value = Some(to);
            existing.source_name = instance.source_name;
            return Ok(ConditionChange::Leveled { from, to });
        }
        Ok(ConditionChange::Refreshed)
    }

    /// Parses `name` and applies it. Unknown names leave the registry untouched.
    pub fn apply_named(
        &mut self,
        entity: EntityId,
        name: &str,
        duration: ConditionDuration,
        source_name: &str,
        source: Option<EntityId>,
    ) -> Result<ConditionChange, ConditionError> {
        let kind = Self::parse_kind(name)?;
        let mut instance = ConditionInstance::new(entity, kind, duration, source_name);
        instance.source = source;
        self.apply(instance)
    }

    /// Removes instances of `kind`. With a source, only that source's instance
    /// goes. Returns whether anything was removed.
    pub fn remove(&mut self, entity: EntityId, kind: ConditionKind, source: Option<EntityId>) -> bool {
        let Some(slot) = self.by_entity.get_mut(&entity) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|c| !(c.kind == kind && (source.is_none() || c.source == source)));
        let removed = slot.len() != before;
        if slot.is_empty() {
            self.by_entity.remove(&entity);
        }
        removed
    }

    pub fn clear_entity(&mut self, entity: EntityId) -> Vec<ConditionInstance> {
        self.by_entity.remove(&entity).unwrap_or_default()
    }

    pub fn view(&self, entity: EntityId) -> ConditionView<'_> {
        self.by_entity
            .get(&entity)
            .map(|slot| ConditionView::new(slot))
            .unwrap_or(ConditionView::EMPTY)
    }

    pub fn has(&self, entity: EntityId, kind: ConditionKind) -> bool {
        self.view(entity).has(kind)
    }

    pub fn has_from(&self, entity: EntityId, kind: ConditionKind, source: EntityId) -> bool {
        self.view(entity).has_from(kind, source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConditionInstance> {
        self.by_entity.values().flatten()
    }

    /// Counts every timed instance down by one round and returns the ones
    /// that reached zero, which are removed.
    pub fn tick_round(&mut self) -> Vec<ConditionInstance> {
        let mut expired = Vec::new();
        for slot in self.by_entity.values_mut() {
            let mut kept = Vec::with_capacity(slot.len());
            for mut instance in slot.drain(..) {
                match instance.duration {
                    ConditionDuration::Rounds(n) if n <= 1 => expired.push(instance),
                    ConditionDuration::Rounds(n) => {
                        instance.duration = ConditionDuration::Rounds(n - 1);
                        kept.push(instance);
                    }
                    ConditionDuration::Permanent => kept.push(instance),
                }
            }
            *slot = kept;
        }
        self.by_entity.retain(|_, slot| !slot.is_empty());
        expired
    }

    /// Drops every timed instance (combat over). Permanent ones survive.
    pub fn clear_timed(&mut self) -> Vec<ConditionInstance> {
        let mut cleared = Vec::new();
        for slot in self.by_entity.values_mut() {
            let (timed, permanent): (Vec<_>, Vec<_>) =
                slot.drain(..).partition(|c| c.duration.is_timed());
            cleared.extend(timed);
            *slot = permanent;
        }
        self.by_entity.retain(|_, slot| !slot.is_empty());
        cleared
    }
}
