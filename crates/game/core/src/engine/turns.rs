use crate::action::effective_speed;
use crate::env::{CombatEnv, RandomSource};
use crate::state::{Ability, ConditionInstance, EntityId, StateError, TurnError};

use super::{CombatEngine, ExecuteError};

/// Whose turn it is after an advance, and what expired on the way.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnAdvance {
    pub entity: EntityId,
    pub round: u32,
    pub new_round: bool,
    /// Timed conditions that ran out at the round boundary.
    pub expired: Vec<ConditionInstance>,
}

/// Initiative and turn order methods for CombatEngine.
impl<'a> CombatEngine<'a> {
    /// Puts an entity into initiative with a known initiative score.
    pub fn add_to_initiative(
        &mut self,
        entity: EntityId,
        initiative: i32,
        env: &CombatEnv<'_>,
    ) -> Result<(), ExecuteError> {
        let token = self
            .state
            .entity(entity)
            .ok_or(StateError::EntityNotFound(entity))?;
        let speed = effective_speed(token, &self.state.conditions_of(entity), env.rules());
        self.state.turns.add(entity, initiative, speed)?;
        Ok(())
    }

    /// Rolls d20 + DEX and adds the entity. Returns the initiative score.
    pub fn roll_initiative(
        &mut self,
        entity: EntityId,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<i32, ExecuteError> {
        let dexterity = self
            .state
            .entity(entity)
            .ok_or(StateError::EntityNotFound(entity))?
            .ability_modifier(Ability::Dexterity);
        if self.state.turns.contains(entity) {
            return Err(TurnError::AlreadyInInitiative(entity).into());
        }
        let initiative = rng.roll_d20() as i32 + dexterity;
        self.add_to_initiative(entity, initiative, env)?;
        Ok(initiative)
    }

    /// Returns true if the entity was in initiative.
    pub fn remove_from_initiative(&mut self, entity: EntityId) -> bool {
        self.state.turns.remove(entity).is_some()
    }

    /// Refreshes the entity's action, bonus action, reaction and movement.
    pub fn begin_turn(&mut self, entity: EntityId, env: &CombatEnv<'_>) -> Result<(), ExecuteError> {
        let speed = match self.state.entity(entity) {
            Some(token) => effective_speed(token, &self.state.conditions_of(entity), env.rules()),
            None => 0,
        };
        let resources = self
            .state
            .turns
            .get_mut(entity)
            .ok_or(TurnError::NotInInitiative(entity))?;
        resources.reset_for_turn(speed);
        Ok(())
    }

    /// Moves to the next entity in initiative and starts its turn.
    ///
    /// Wrapping past the end of the order starts a new round, which counts
    /// every timed condition down by one.
    pub fn advance_turn(&mut self, env: &CombatEnv<'_>) -> Result<TurnAdvance, ExecuteError> {
        let (entity, wrapped) = self.state.turns.next_in_order().ok_or(TurnError::NoCombatants)?;

        let mut expired = Vec::new();
        if wrapped {
            let round = self.state.turns.round();
            if round > 0 {
                expired = self.state.conditions.tick_round();
            }
            self.state.turns.set_round(round + 1);
        }
        self.state.turns.set_active(Some(entity));
        self.begin_turn(entity, env)?;

        Ok(TurnAdvance {
            entity,
            round: self.state.turns.round(),
            new_round: wrapped,
            expired,
        })
    }

    /// Entity whose turn it is.
    pub fn current_actor(&self) -> Option<EntityId> {
        self.state.turns.active()
    }

    /// Clears initiative and every timed condition. Returns what was cleared.
    pub fn end_combat(&mut self) -> Vec<ConditionInstance> {
        self.state.turns.clear();
        self.state.conditions.clear_timed()
    }
}
