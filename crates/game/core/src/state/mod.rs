//! Authoritative combat store.
//!
//! [`CombatState`] aggregates the token roster, the condition registry and
//! the turn tracker. It is passed by reference into every operation; the only
//! way actions change it is through [`Mutation`]s applied by
//! [`CombatState::apply`].
pub mod conditions;
pub mod error;
pub mod mutation;
pub mod turn;
pub mod types;

pub use conditions::{ConditionChange, ConditionError, ConditionRegistry, ConditionView};
pub use error::StateError;
pub use mutation::Mutation;
pub use turn::{InitiativeEntry, TurnError, TurnFlag, TurnResourceState, TurnResourceTracker};
pub use types::{
    Ability, AbilityScores, AbilitySet, CombatEntity, CombatFeatures, ConditionDuration,
    ConditionInstance, ConditionKind, CreatureSize, DamageProfile, EntitiesState, EntityId,
    Faction, Footprint, HitPoints, MasteryKind, Position, Speeds, TypeModifiers, Weapon,
    WeaponForm, WeaponKind, WeaponProperties, WeaponRange,
};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    pub entities: EntitiesState,
    pub conditions: ConditionRegistry,
    pub turns: TurnResourceTracker,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(entities: impl IntoIterator<Item = CombatEntity>) -> Self {
        let mut state = Self::new();
        for entity in entities {
            state.entities.insert(entity);
        }
        state
    }

    pub fn entity(&self, id: EntityId) -> Option<&CombatEntity> {
        self.entities.get(id)
    }

    pub fn conditions_of(&self, id: EntityId) -> ConditionView<'_> {
        self.conditions.view(id)
    }

    pub fn resources_of(&self, id: EntityId) -> Option<&TurnResourceState> {
        self.turns.get(id)
    }

    /// Applies one mutation.
    ///
    /// Turn-scoped mutations on a token outside initiative are no-ops, so
    /// out-of-combat play can reuse the same actions.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), StateError> {
        match mutation {
            Mutation::SetPosition { entity, position } => {
                self.entity_mut(*entity)?.position = *position;
            }
            Mutation::SetHitPoints {
                entity,
                current,
                temporary,
            } => {
                let hit_points = &mut self.entity_mut(*entity)?.hit_points;
                hit_points.current = (*current).min(hit_points.max);
                hit_points.temporary = *temporary;
            }
            Mutation::AddCondition(instance) => {
                if !self.entities.contains(instance.entity) {
                    return Err(StateError::EntityNotFound(instance.entity));
                }
                self.conditions.apply(instance.clone())?;
            }
            Mutation::RemoveCondition {
                entity,
                kind,
                source,
            } => {
                self.conditions.remove(*entity, *kind, *source);
            }
            Mutation::SetMovement {
                entity,
                remaining,
                max,
            } => {
                if let Some(resources) = self.turns.get_mut(*entity) {
                    resources.set_movement(*remaining, *max);
                }
            }
            Mutation::SpendAction { entity } => {
                if let Some(resources) = self.turns.get_mut(*entity) {
                    resources.action_used = true;
                }
            }
            Mutation::SpendBonusAction { entity } => {
                if let Some(resources) = self.turns.get_mut(*entity) {
                    resources.bonus_action_used = true;
                }
            }
            Mutation::SpendReaction { entity } => {
                if let Some(resources) = self.turns.get_mut(*entity) {
                    resources.reaction_used = true;
                }
            }
            Mutation::SetTurnFlag {
                entity,
                flag,
                value,
            } => {
                if let Some(resources) = self.turns.get_mut(*entity) {
                    resources.set_flag(*flag, *value);
                }
            }
            Mutation::SetConcentration { entity, spell } => {
                if let Some(resources) = self.turns.get_mut(*entity) {
                    resources.concentrating_on = spell.clone();
                }
            }
            Mutation::SetMount { rider, mount } => self.set_mount(*rider, *mount)?,
            Mutation::MarkSlain { entity } => {
                self.entity_mut(*entity)?.slain = true;
                self.turns.remove(*entity);
            }
        }
        Ok(())
    }

    /// Applies mutations in order, stopping at the first failure.
    pub fn apply_all<'m>(
        &mut self,
        mutations: impl IntoIterator<Item = &'m Mutation>,
    ) -> Result<(), StateError> {
        for mutation in mutations {
            self.apply(mutation)?;
        }
        Ok(())
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut CombatEntity, StateError> {
        self.entities.get_mut(id).ok_or(StateError::EntityNotFound(id))
    }

    fn set_mount(&mut self, rider: EntityId, mount: Option<EntityId>) -> Result<(), StateError> {
        let previous = self.entity_mut(rider)?.mounted_on;
        if let Some(mount) = mount {
            self.entity_mut(mount)?.rider = Some(rider);
        }
        if let Some(previous) = previous
            && Some(previous) != mount
            && let Some(old_mount) = self.entities.get_mut(previous)
        {
            old_mount.rider = None;
        }
        self.entity_mut(rider)?.mounted_on = mount;
        if let Some(resources) = self.turns.get_mut(rider) {
            resources.mounted_on = mount;
        }
        Ok(())
    }

    /// SHA-256 over the bincode encoding of the whole store.
    ///
    /// Host and peers compare roots after applying the same outcome to
    /// confirm they converged.
    #[cfg(feature = "serde")]
    pub fn state_root(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let bytes = bincode::serialize(self);
        debug_assert!(bytes.is_ok(), "combat state failed to encode");
        let mut hasher = Sha256::new();
        hasher.update(bytes.unwrap_or_default());
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duel() -> CombatState {
        let mut state = CombatState::with_entities([
            CombatEntity::new(EntityId(1), "Knight", Faction::Player, Position::new(0, 0)),
            CombatEntity::new(EntityId(2), "Horse", Faction::Player, Position::new(0, 0))
                .with_size(CreatureSize::Large),
            CombatEntity::new(EntityId(3), "Bandit", Faction::Enemy, Position::new(4, 0)),
        ]);
        state.turns.add(EntityId(1), 15, 30).unwrap();
        state
    }

    #[test]
    fn hit_points_are_clamped_to_max() {
        let mut state = duel();
        state
            .apply(&Mutation::SetHitPoints {
                entity: EntityId(3),
                current: 99,
                temporary: 4,
            })
            .unwrap();
        let bandit = state.entity(EntityId(3)).unwrap();
        assert_eq!(bandit.hit_points.current, bandit.hit_points.max);
        assert_eq!(bandit.hit_points.temporary, 4);
    }

    #[test]
    fn applying_the_same_outcome_twice_is_idempotent() {
        let mut state = duel();
        let outcome = [
            Mutation::SetPosition {
                entity: EntityId(1),
                position: Position::new(2, 1),
            },
            Mutation::SetMovement {
                entity: EntityId(1),
                remaining: 20,
                max: 30,
            },
            Mutation::SpendReaction { entity: EntityId(1) },
        ];
        state.apply_all(&outcome).unwrap();
        let once = state.clone();
        state.apply_all(&outcome).unwrap();
        assert_eq!(state, once);
    }

    #[test]
    fn turn_mutations_skip_tokens_outside_initiative() {
        let mut state = duel();
        state
            .apply(&Mutation::SpendAction { entity: EntityId(3) })
            .unwrap();
        assert!(state.resources_of(EntityId(3)).is_none());
    }

    #[test]
    fn unknown_entity_is_reported() {
        let mut state = duel();
        let err = state
            .apply(&Mutation::MarkSlain { entity: EntityId(42) })
            .unwrap_err();
        assert_eq!(err, StateError::EntityNotFound(EntityId(42)));
    }

    #[test]
    fn mounting_links_both_tokens() {
        let mut state = duel();
        state
            .apply(&Mutation::SetMount {
                rider: EntityId(1),
                mount: Some(EntityId(2)),
            })
            .unwrap();
        assert_eq!(state.entity(EntityId(1)).unwrap().mounted_on, Some(EntityId(2)));
        assert_eq!(state.entity(EntityId(2)).unwrap().rider, Some(EntityId(1)));
        assert_eq!(
            state.resources_of(EntityId(1)).unwrap().mounted_on,
            Some(EntityId(2))
        );

        state
            .apply(&Mutation::SetMount {
                rider: EntityId(1),
                mount: None,
            })
            .unwrap();
        assert_eq!(state.entity(EntityId(2)).unwrap().rider, None);
    }

    #[test]
    fn slain_tokens_leave_initiative() {
        let mut state = duel();
        state
            .apply(&Mutation::MarkSlain { entity: EntityId(1) })
            .unwrap();
        assert!(state.entity(EntityId(1)).unwrap().slain);
        assert!(!state.turns.contains(EntityId(1)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn state_root_tracks_changes() {
        let mut state = duel();
        let before = state.state_root();
        assert_eq!(before, duel().state_root());

        state
            .apply(&Mutation::SetPosition {
                entity: EntityId(3),
                position: Position::new(3, 0),
            })
            .unwrap();
        assert_ne!(hex::encode(before), hex::encode(state.state_root()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn state_root_hashes_the_full_encoding() {
        use sha2::{Digest, Sha256};

        let state = duel();
        let encoded = bincode::serialize(&state).unwrap();
        assert!(!encoded.is_empty());
        let expected: [u8; 32] = Sha256::digest(&encoded).into();
        let empty: [u8; 32] = Sha256::digest(b"").into();
        assert_eq!(state.state_root(), expected);
        assert_ne!(state.state_root(), empty);
    }
}
