use std::collections::BTreeMap;

use super::common::{EntityId, Footprint, Position};
use super::entity::CombatEntity;

/// Every token on the battle map, keyed and iterated in id order.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntitiesState {
    tokens: BTreeMap<EntityId, CombatEntity>,
}

impl EntitiesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a token, replacing any token with the same id.
    pub fn insert(&mut self, entity: CombatEntity) -> Option<CombatEntity> {
        self.tokens.insert(entity.id, entity)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<CombatEntity> {
        self.tokens.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&CombatEntity> {
        self.tokens.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut CombatEntity> {
        self.tokens.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.tokens.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &CombatEntity> {
        self.tokens.values()
    }

    /// Living tokens whose footprint covers `cell`.
    pub fn at(&self, cell: Position) -> impl Iterator<Item = &CombatEntity> {
        self.tokens
            .values()
            .filter(move |entity| !entity.slain && entity.footprint().contains(cell))
    }

    /// Footprints of living tokens other than `excluded`, for cover checks.
    pub fn blocking_footprints(&self, excluded: &[EntityId]) -> Vec<Footprint> {
        self.tokens
            .values()
            .filter(|entity| !entity.slain && !excluded.contains(&entity.id))
            .map(CombatEntity::footprint)
            .collect()
    }
}
