//! Action execution and the turn loop.
//!
//! The [`CombatEngine`] is the only writer of [`CombatState`] on the host.
//! It resolves an action, applies the resulting mutations atomically, and
//! hands the outcome back for broadcast. Peers call [`CombatEngine::commit`]
//! with the same outcome and end up in the same state without re-rolling.

mod errors;
mod turns;

pub use errors::ExecuteError;
pub use turns::TurnAdvance;

use crate::action::{
    ActionOutcome, ActionReport, AttackAction, AttackReport, CombatAction, DecisionChoice,
    PendingDecision,
};
use crate::env::{CombatEnv, RandomSource};
use crate::state::{CombatState, EntityId, Mutation, TurnError};

/// What answering a pending decision did.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionOutcome {
    pub chooser: EntityId,
    pub mutations: Vec<Mutation>,
    pub log: Vec<String>,
    /// Report of the opportunity attack, when one was taken.
    pub attack: Option<Box<AttackReport>>,
    /// The opportunity attack may itself drop its target.
    pub pending: Option<PendingDecision>,
}

impl DecisionOutcome {
    fn empty(chooser: EntityId) -> Self {
        Self {
            chooser,
            mutations: Vec::new(),
            log: Vec::new(),
            attack: None,
            pending: None,
        }
    }
}

pub struct CombatEngine<'a> {
    state: &'a mut CombatState,
}

impl<'a> CombatEngine<'a> {
    pub fn new(state: &'a mut CombatState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &CombatState {
        self.state
    }

    /// Resolves `action` and applies its mutations.
    ///
    /// `Ok(None)` means the request named something that does not exist;
    /// nothing changed.
    pub fn execute(
        &mut self,
        action: &CombatAction,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<Option<ActionOutcome>, ExecuteError> {
        let Some(outcome) = action.resolve(self.state, env, rng) else {
            return Ok(None);
        };
        self.apply(&outcome.mutations)?;
        Ok(Some(outcome))
    }

    /// Applies an outcome resolved elsewhere.
    pub fn commit(&mut self, outcome: &ActionOutcome) -> Result<(), ExecuteError> {
        self.apply(&outcome.mutations)
    }

    /// Applies every mutation or none of them.
    pub fn apply(&mut self, mutations: &[Mutation]) -> Result<(), ExecuteError> {
        let mut next = self.state.clone();
        next.apply_all(mutations)?;
        *self.state = next;
        Ok(())
    }

    /// Answers a pending decision and applies the result.
    ///
    /// Cancelling applies nothing. Striking spends the chooser's reaction on
    /// an opportunity attack.
    pub fn resolve_decision(
        &mut self,
        decision: &PendingDecision,
        choice: &DecisionChoice,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<DecisionOutcome, ExecuteError> {
        let chooser = decision.chooser();
        let mut outcome = DecisionOutcome::empty(chooser);

        match (decision, choice) {
            (_, DecisionChoice::Cancel) => {}
            (PendingDecision::Knockout { knockout, target, .. }, DecisionChoice::KnockOut) => {
                outcome.mutations = knockout.clone();
                outcome.log.push(self.describe(*target, "is knocked out"));
            }
            (PendingDecision::Knockout { lethal, target, .. }, DecisionChoice::Lethal) => {
                outcome.mutations = lethal.clone();
                outcome.log.push(self.describe(*target, "is dealt a lethal blow"));
            }
            (PendingDecision::OpportunityAttack { attacker, target }, DecisionChoice::Strike(weapon)) => {
                if self.state.resources_of(*attacker).is_some_and(|r| r.reaction_used) {
                    return Err(TurnError::ReactionUsed(*attacker).into());
                }
                let strike = AttackAction::opportunity(*attacker, *target, weapon.clone());
                let Some(resolved) = CombatAction::Attack(strike).resolve(self.state, env, rng) else {
                    return Ok(outcome);
                };
                outcome.mutations = resolved.mutations;
                outcome.log = resolved.log;
                outcome.pending = resolved.pending;
                if let ActionReport::Attack(report) = resolved.report {
                    outcome.attack = Some(report);
                }
            }
            _ => return Err(decision.mismatch(choice).into()),
        }

        self.apply(&outcome.mutations)?;
        Ok(outcome)
    }

    fn describe(&self, entity: EntityId, what: &str) -> String {
        match self.state.entity(entity) {
            Some(token) => format!("{} {what}", token.name),
            None => format!("{entity} {what}"),
        }
    }
}
