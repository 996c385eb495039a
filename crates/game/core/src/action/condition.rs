//! Granting and curing conditions by name.

use super::{ActionOutcome, ActionReport, CombatTransition, Effects};
use crate::env::{CombatEnv, RandomSource};
use crate::state::{
    CombatState, ConditionDuration, ConditionError, ConditionInstance, ConditionKind, ConditionRegistry, EntityId,
    Mutation,
};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionAction {
    Apply {
        entity: EntityId,
        /// Condition name, matched case-insensitively.
        condition: String,
        duration: ConditionDuration,
        source: Option<EntityId>,
        source_name: String,
        /// Level for Exhaustion; omitted to raise the current level by one.
        value: Option<u8>,
    },
    Cure {
        entity: EntityId,
        condition: String,
        /// Cure only the instance from this source.
        source: Option<EntityId>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionReport {
    pub entity: EntityId,
    pub kind: Option<ConditionKind>,
    /// Applied, or removed for a cure.
    pub changed: bool,
    pub rejected: Option<ConditionError>,
}

impl ConditionAction {
    fn entity(&self) -> EntityId {
        match self {
            Self::Apply { entity, .. } | Self::Cure { entity, .. } => *entity,
        }
    }

    fn condition(&self) -> &str {
        match self {
            Self::Apply { condition, .. } | Self::Cure { condition, .. } => condition,
        }
    }
}

impl CombatTransition for ConditionAction {
    fn actor(&self) -> EntityId {
        self.entity()
    }

    fn resolve(
        &self,
        state: &CombatState,
        _env: &CombatEnv<'_>,
        _rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let target = state.entity(self.entity())?;
        let mut effects = Effects::default();
        let mut report = ConditionReport {
            entity: target.id,
            kind: None,
            changed: false,
            rejected: None,
        };

        let kind = match ConditionRegistry::parse_kind(self.condition()) {
            Ok(kind) => kind,
            Err(err) => {
                effects.note(format!("{err}"));
                report.rejected = Some(err);
                return Some(ActionOutcome::new(target.id, ActionReport::Condition(report), effects));
            }
        };
        report.kind = Some(kind);

        match self {
            Self::Apply {
                duration,
                source,
                source_name,
                value,
                ..
            } => {
                let mut instance = ConditionInstance::new(target.id, kind, *duration, source_name.clone());
                instance.source = *source;
                instance.value = *value;
                if let Err(err) = ConditionRegistry::validate(&instance) {
                    effects.note(format!("{err}"));
                    report.rejected = Some(err);
                    return Some(ActionOutcome::new(target.id, ActionReport::Condition(report), effects));
                }
                effects.push(Mutation::AddCondition(instance));
                effects.note(format!("{} is {kind} ({source_name})", target.name));
                report.changed = true;

                if kind.is_incapacitating()
                    && let Some(spell) = state
                        .resources_of(target.id)
                        .and_then(|r| r.concentrating_on.as_deref())
                {
                    effects.push(Mutation::SetConcentration {
                        entity: target.id,
                        spell: None,
                    });
                    effects.note(format!("{} loses concentration on {spell}", target.name));
                }
            }
            Self::Cure { source, .. } => {
                let present = match source {
                    Some(source) => state.conditions.has_from(target.id, kind, *source),
                    None => state.conditions.has(target.id, kind),
                };
                if present {
                    effects.push(Mutation::RemoveCondition {
                        entity: target.id,
                        kind,
                        source: *source,
                    });
                    effects.note(format!("{} is no longer {kind}", target.name));
                    report.changed = true;
                }
            }
        }

        Some(ActionOutcome::new(target.id, ActionReport::Condition(report), effects))
    }
}
