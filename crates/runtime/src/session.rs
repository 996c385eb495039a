//! Authoritative combat session.
//!
//! A [`Session`] owns one [`CombatState`] plus the map, rules and dice for an
//! encounter. On the host it resolves actions, keeps pending decisions by id
//! and queues a [`WireMessage`] for every change. On a peer it applies those
//! messages verbatim and refuses any that would leave it at a different
//! state root than the host reported.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use tabletop_content::Encounter;
use tabletop_core::combat::{DiceExpr, DiceRoll};
use tabletop_core::{
    ActionOutcome, CombatAction, CombatEngine, CombatEnv, CombatState, DecisionChoice, DecisionOutcome, EntityId,
    MapSnapshot, PcgRng, PendingDecision, RandomSource, RulesConfig, TurnAdvance,
};

use crate::api::{Result, RuntimeError};
use crate::chat::{ChatEntry, ChatKind, ChatSink};
use crate::config::{SessionConfig, SessionRole};
use crate::protocol::{WireMessage, decode_root, encode_root};

/// Host-assigned id of a pending decision. Peers reuse the host's ids.
pub type DecisionId = u64;

/// An action the host resolved and applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResolution {
    pub outcome: ActionOutcome,
    pub decision: Option<DecisionId>,
    pub state_root: [u8; 32],
}

impl ActionResolution {
    pub fn to_wire(&self) -> WireMessage {
        WireMessage::ActionResolved {
            outcome: Box::new(self.outcome.clone()),
            decision: self.decision,
            state_root: encode_root(&self.state_root),
        }
    }
}

/// A pending decision the host answered and applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionResolution {
    pub id: DecisionId,
    pub outcome: DecisionOutcome,
    /// Id of the decision the answer itself left pending.
    pub follow_up: Option<DecisionId>,
    pub state_root: [u8; 32],
}

impl DecisionResolution {
    pub fn to_wire(&self) -> WireMessage {
        WireMessage::DecisionResolved {
            id: self.id,
            outcome: Box::new(self.outcome.clone()),
            follow_up: self.follow_up,
            state_root: encode_root(&self.state_root),
        }
    }
}

pub struct Session {
    role: SessionRole,
    state: CombatState,
    map: MapSnapshot,
    rules: RulesConfig,
    rng: Box<dyn RandomSource + Send>,
    pending: BTreeMap<DecisionId, PendingDecision>,
    next_decision: DecisionId,
    outbox: Vec<WireMessage>,
    chat: Box<dyn ChatSink>,
}

impl Session {
    pub fn new(
        config: &SessionConfig,
        state: CombatState,
        map: MapSnapshot,
        rules: RulesConfig,
        chat: Box<dyn ChatSink>,
    ) -> Self {
        info!(
            target: "runtime::session",
            role = ?config.role,
            entities = state.entities.len(),
            width = map.dimensions.width,
            height = map.dimensions.height,
            "session created"
        );
        Self {
            role: config.role,
            state,
            map,
            rules,
            rng: Box::new(PcgRng::new(config.seed)),
            pending: BTreeMap::new(),
            next_decision: 1,
            outbox: Vec::new(),
            chat,
        }
    }

    /// Replaces the seeded dice, e.g. with a fixed sequence for replays.
    pub fn with_rng(mut self, rng: impl RandomSource + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub(crate) fn set_rng(&mut self, rng: Box<dyn RandomSource + Send>) {
        self.rng = rng;
    }

    pub fn from_encounter(config: &SessionConfig, encounter: Encounter, chat: Box<dyn ChatSink>) -> Self {
        Self::new(config, encounter.state, encounter.map, encounter.rules, chat)
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn map(&self) -> &MapSnapshot {
        &self.map
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn state_root(&self) -> [u8; 32] {
        self.state.state_root()
    }

    pub fn pending_decision(&self, id: DecisionId) -> Option<&PendingDecision> {
        self.pending.get(&id)
    }

    pub fn pending_decisions(&self) -> impl Iterator<Item = (DecisionId, &PendingDecision)> {
        self.pending.iter().map(|(id, decision)| (*id, decision))
    }

    /// Messages queued for the other side since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<WireMessage> {
        std::mem::take(&mut self.outbox)
    }

    // ------------------------------------------------------------------
    // Host operations
    // ------------------------------------------------------------------

    /// Resolves and applies `action`.
    ///
    /// `Ok(None)` means the action named something that does not exist;
    /// nothing changed and nothing is broadcast.
    pub fn submit(&mut self, action: &CombatAction) -> Result<Option<ActionResolution>> {
        match self.preview(action)? {
            Some(outcome) => self.commit(outcome).map(Some),
            None => {
                debug!(target: "runtime::session", actor = %action.actor(), "action had nothing to act on");
                Ok(None)
            }
        }
    }

    /// Resolves `action` against the current state without applying it.
    /// Dice are rolled and consumed.
    pub fn preview(&mut self, action: &CombatAction) -> Result<Option<ActionOutcome>> {
        self.require_host("resolve actions")?;
        let env = CombatEnv::with_map(&self.map, &self.rules);
        Ok(action.resolve(&self.state, &env, &mut *self.rng))
    }

    /// Applies an outcome produced by [`Session::preview`] and queues it for
    /// broadcast.
    pub fn commit(&mut self, outcome: ActionOutcome) -> Result<ActionResolution> {
        self.require_host("commit outcomes")?;
        CombatEngine::new(&mut self.state).commit(&outcome)?;

        let decision = outcome.pending.clone().map(|pending| self.register(pending));
        self.post_log(&outcome.log);
        let state_root = self.state.state_root();
        debug!(
            target: "runtime::session",
            actor = %outcome.actor,
            mutations = outcome.mutations.len(),
            decision = ?decision,
            "action resolved"
        );

        let resolution = ActionResolution {
            outcome,
            decision,
            state_root,
        };
        self.outbox.push(resolution.to_wire());
        Ok(resolution)
    }

    /// Answers a pending decision. Cancelling discards it without change.
    pub fn resolve_decision(&mut self, id: DecisionId, choice: &DecisionChoice) -> Result<DecisionResolution> {
        self.require_host("resolve decisions")?;
        let decision = self.pending.get(&id).cloned().ok_or(RuntimeError::UnknownDecision(id))?;

        let env = CombatEnv::with_map(&self.map, &self.rules);
        let outcome = CombatEngine::new(&mut self.state).resolve_decision(&decision, choice, &env, &mut *self.rng)?;
        self.pending.remove(&id);

        let follow_up = outcome.pending.clone().map(|pending| self.register(pending));
        self.post_log(&outcome.log);
        let state_root = self.state.state_root();
        info!(
            target: "runtime::session",
            id,
            chooser = %outcome.chooser,
            choice = ?choice,
            "decision resolved"
        );

        let resolution = DecisionResolution {
            id,
            outcome,
            follow_up,
            state_root,
        };
        self.outbox.push(resolution.to_wire());
        Ok(resolution)
    }

    /// Rolls d20 + DEX for `entity` and adds it to initiative.
    pub fn roll_initiative(&mut self, entity: EntityId) -> Result<i32> {
        self.require_host("roll initiative")?;
        let env = CombatEnv::with_map(&self.map, &self.rules);
        let score = CombatEngine::new(&mut self.state).roll_initiative(entity, &env, &mut *self.rng)?;
        self.announce_initiative(entity, score);
        Ok(score)
    }

    /// Adds `entity` with a score rolled at the table.
    pub fn add_to_initiative(&mut self, entity: EntityId, score: i32) -> Result<()> {
        self.require_host("set initiative")?;
        let env = CombatEnv::with_map(&self.map, &self.rules);
        CombatEngine::new(&mut self.state).add_to_initiative(entity, score, &env)?;
        self.announce_initiative(entity, score);
        Ok(())
    }

    pub fn advance_turn(&mut self) -> Result<TurnAdvance> {
        self.require_host("advance turns")?;
        let env = CombatEnv::with_map(&self.map, &self.rules);
        let advance = CombatEngine::new(&mut self.state).advance_turn(&env)?;
        self.announce_turn(&advance);
        self.outbox.push(WireMessage::TurnAdvanced {
            entity: advance.entity,
            round: advance.round,
            state_root: encode_root(&self.state.state_root()),
        });
        Ok(advance)
    }

    /// Clears initiative, timed conditions and every pending decision.
    pub fn end_combat(&mut self) -> Result<()> {
        self.require_host("end combat")?;
        self.finish_combat();
        self.outbox.push(WireMessage::CombatEnded {
            state_root: encode_root(&self.state.state_root()),
        });
        Ok(())
    }

    /// Rolls a public dice expression such as `2d6+3`.
    pub fn roll_dice(&mut self, roller: &str, expression: &str) -> Result<DiceRoll> {
        self.require_host("roll dice")?;
        let expr: DiceExpr = expression.parse()?;
        let roll = expr.roll(&mut *self.rng);
        self.chat.post(ChatEntry::said_by(roller, describe_roll(expression, &roll), ChatKind::Dice));
        self.outbox.push(WireMessage::DiceRoll {
            roller: roller.to_owned(),
            expression: expression.to_owned(),
            roll: roll.clone(),
        });
        Ok(roll)
    }

    // ------------------------------------------------------------------
    // Table talk (either role)
    // ------------------------------------------------------------------

    pub fn say(&mut self, speaker: &str, text: &str) {
        self.chat.post(ChatEntry::said_by(speaker, text, ChatKind::Say));
        self.outbox.push(WireMessage::Chat {
            speaker: speaker.to_owned(),
            text: text.to_owned(),
        });
    }

    pub fn whisper(&mut self, from: &str, to: EntityId, text: &str) -> Result<()> {
        if self.state.entity(to).is_none() {
            return Err(RuntimeError::UnknownEntity(to));
        }
        self.chat.post(ChatEntry::said_by(from, text, ChatKind::Whisper { to }));
        self.outbox.push(WireMessage::Whisper {
            from: from.to_owned(),
            to,
            text: text.to_owned(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Peer operations
    // ------------------------------------------------------------------

    /// Applies a message from the other side.
    ///
    /// Table talk is accepted by either role. State changes are accepted by
    /// peers only, and only when the result matches the host's state root.
    /// A rejected message leaves the session untouched.
    pub fn apply_remote(&mut self, message: &WireMessage) -> Result<()> {
        let result = self.apply_remote_inner(message);
        if let Err(error) = &result {
            warn!(target: "runtime::session", kind = message.kind(), %error, "remote message rejected");
        }
        result
    }

    fn apply_remote_inner(&mut self, message: &WireMessage) -> Result<()> {
        match message {
            WireMessage::Chat { speaker, text } => {
                self.chat.post(ChatEntry::said_by(speaker.as_str(), text.as_str(), ChatKind::Say));
                return Ok(());
            }
            WireMessage::Whisper { from, to, text } => {
                self.chat.post(ChatEntry::said_by(from.as_str(), text.as_str(), ChatKind::Whisper { to: *to }));
                return Ok(());
            }
            WireMessage::DiceRoll { roller, expression, roll } => {
                self.chat.post(ChatEntry::said_by(roller.as_str(), describe_roll(expression, roll), ChatKind::Dice));
                return Ok(());
            }
            _ => {}
        }

        if self.role != SessionRole::Peer {
            return Err(RuntimeError::NotPeer);
        }
        let env = CombatEnv::with_map(&self.map, &self.rules);
        let mut next = self.state.clone();

        match message {
            WireMessage::ActionResolved {
                outcome,
                decision,
                state_root,
            } => {
                CombatEngine::new(&mut next).commit(outcome)?;
                self.converge(next, state_root)?;
                if let (Some(id), Some(pending)) = (decision, &outcome.pending) {
                    self.adopt(*id, pending.clone());
                }
                self.post_log(&outcome.log);
            }
            WireMessage::DecisionResolved {
                id,
                outcome,
                follow_up,
                state_root,
            } => {
                CombatEngine::new(&mut next).apply(&outcome.mutations)?;
                self.converge(next, state_root)?;
                self.pending.remove(id);
                if let (Some(next_id), Some(pending)) = (follow_up, &outcome.pending) {
                    self.adopt(*next_id, pending.clone());
                }
                self.post_log(&outcome.log);
            }
            WireMessage::InitiativeRolled {
                entity,
                score,
                state_root,
            } => {
                CombatEngine::new(&mut next).add_to_initiative(*entity, *score, &env)?;
                self.converge(next, state_root)?;
                self.announce_initiative_locally(*entity, *score);
            }
            WireMessage::TurnAdvanced {
                entity, state_root, ..
            } => {
                let advance = CombatEngine::new(&mut next).advance_turn(&env)?;
                if advance.entity != *entity {
                    return Err(RuntimeError::TurnMismatch {
                        expected: *entity,
                        actual: advance.entity,
                    });
                }
                self.converge(next, state_root)?;
                self.announce_turn(&advance);
            }
            WireMessage::CombatEnded { state_root } => {
                CombatEngine::new(&mut next).end_combat();
                self.converge(next, state_root)?;
                self.pending.clear();
                self.chat.post(ChatEntry::log("Combat ends"));
            }
            WireMessage::Chat { .. } | WireMessage::Whisper { .. } | WireMessage::DiceRoll { .. } => {}
        }
        debug!(target: "runtime::session", kind = message.kind(), "remote message applied");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_host(&self, what: &'static str) -> Result<()> {
        match self.role {
            SessionRole::Host => Ok(()),
            SessionRole::Peer => Err(RuntimeError::NotHost(what)),
        }
    }

    fn register(&mut self, decision: PendingDecision) -> DecisionId {
        let id = self.next_decision;
        self.next_decision += 1;
        info!(
            target: "runtime::session",
            id,
            chooser = %decision.chooser(),
            target_entity = %decision.target(),
            "decision pending"
        );
        self.pending.insert(id, decision);
        id
    }

    fn adopt(&mut self, id: DecisionId, decision: PendingDecision) {
        self.next_decision = self.next_decision.max(id + 1);
        self.pending.insert(id, decision);
    }

    /// Swaps in `next` if its root matches the host's.
    fn converge(&mut self, next: CombatState, expected: &str) -> Result<()> {
        let expected_root = decode_root(expected)?;
        let actual = next.state_root();
        if actual != expected_root {
            return Err(RuntimeError::StateDiverged {
                expected: expected.to_owned(),
                actual: encode_root(&actual),
            });
        }
        self.state = next;
        Ok(())
    }

    fn finish_combat(&mut self) {
        let cleared = CombatEngine::new(&mut self.state).end_combat();
        self.pending.clear();
        info!(target: "runtime::session", cleared = cleared.len(), "combat ended");
        self.chat.post(ChatEntry::log("Combat ends"));
    }

    fn announce_initiative(&mut self, entity: EntityId, score: i32) {
        self.announce_initiative_locally(entity, score);
        self.outbox.push(WireMessage::InitiativeRolled {
            entity,
            score,
            state_root: encode_root(&self.state.state_root()),
        });
    }

    fn announce_initiative_locally(&mut self, entity: EntityId, score: i32) {
        let name = self.name_of(entity);
        info!(target: "runtime::session", %entity, score, "initiative set");
        self.chat.post(ChatEntry::log(format!("{name} rolls {score} for initiative")));
    }

    fn announce_turn(&mut self, advance: &TurnAdvance) {
        if advance.new_round {
            info!(target: "runtime::session", round = advance.round, "round started");
            self.chat.post(ChatEntry::log(format!("Round {}", advance.round)));
        }
        for condition in &advance.expired {
            let name = self.name_of(condition.entity);
            self.chat.post(ChatEntry::log(format!("{} wears off {name}", condition.kind)));
        }
        let name = self.name_of(advance.entity);
        info!(target: "runtime::session", entity = %advance.entity, "turn started");
        self.chat.post(ChatEntry::log(format!("{name}'s turn")));
    }

    fn post_log(&mut self, lines: &[String]) {
        for line in lines {
            self.chat.post(ChatEntry::log(line.as_str()));
        }
    }

    fn name_of(&self, entity: EntityId) -> String {
        self.state
            .entity(entity)
            .map(|token| token.name.clone())
            .unwrap_or_else(|| entity.to_string())
    }
}

fn describe_roll(expression: &str, roll: &DiceRoll) -> String {
    let dice = roll.rolls.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
    match roll.modifier {
        0 => format!("rolls {expression}: [{dice}] = {}", roll.total),
        m if m > 0 => format!("rolls {expression}: [{dice}] + {m} = {}", roll.total),
        m => format!("rolls {expression}: [{dice}] - {} = {}", -m, roll.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatLog;
    use tabletop_core::{
        AttackAction, CombatEntity, Faction, HitPoints, MapDimensions, Position, Weapon, WeaponChoice,
    };
    use tabletop_core::DamageType;
    use tabletop_core::state::WeaponKind;

    fn duel(config: &SessionConfig, chat: ChatLog) -> Session {
        let axe = Weapon::new("Handaxe", "1d6", DamageType::Slashing, WeaponKind::Melee);
        let state = CombatState::with_entities([
            CombatEntity::new(EntityId(1), "Brannoc", Faction::Player, Position::new(1, 1)).with_weapon(axe.clone()),
            CombatEntity::new(EntityId(2), "Goblin", Faction::Enemy, Position::new(2, 1))
                .with_hit_points(HitPoints::new(7))
                .with_weapon(axe),
        ]);
        Session::new(
            config,
            state,
            MapSnapshot::new(MapDimensions::new(6, 6)),
            RulesConfig::default(),
            Box::new(chat),
        )
    }

    #[test]
    fn peers_cannot_resolve_actions() {
        let mut peer = duel(&SessionConfig::peer(), ChatLog::new());
        let action = CombatAction::Attack(AttackAction::new(EntityId(1), EntityId(2), WeaponChoice::named("Handaxe")));
        assert!(matches!(peer.submit(&action), Err(RuntimeError::NotHost(_))));
        assert!(matches!(peer.roll_dice("Brannoc", "1d20"), Err(RuntimeError::NotHost(_))));
    }

    #[test]
    fn missing_target_is_not_broadcast() {
        let mut host = duel(&SessionConfig::host(7), ChatLog::new());
        let action = CombatAction::Attack(AttackAction::new(EntityId(1), EntityId(9), WeaponChoice::named("Handaxe")));
        assert!(host.submit(&action).unwrap().is_none());
        assert!(host.drain_outbox().is_empty());
    }

    #[test]
    fn resolved_actions_are_logged_and_queued() {
        let chat = ChatLog::new();
        let mut host = duel(&SessionConfig::host(7), chat.clone());
        let action = CombatAction::Attack(AttackAction::new(EntityId(1), EntityId(2), WeaponChoice::named("Handaxe")));
        let resolution = host.submit(&action).unwrap().unwrap();

        assert_eq!(resolution.state_root, host.state_root());
        assert!(!chat.entries().is_empty());
        let outbox = host.drain_outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].state_root(), Some(encode_root(&host.state_root()).as_str()));
    }

    #[test]
    fn unknown_decision_id_is_an_error() {
        let mut host = duel(&SessionConfig::host(7), ChatLog::new());
        assert!(matches!(
            host.resolve_decision(42, &DecisionChoice::Cancel),
            Err(RuntimeError::UnknownDecision(42))
        ));
    }

    #[test]
    fn malformed_dice_are_rejected() {
        let mut host = duel(&SessionConfig::host(7), ChatLog::new());
        assert!(matches!(host.roll_dice("GM", "2d"), Err(RuntimeError::Dice(_))));
        let roll = host.roll_dice("GM", "2d6+3").unwrap();
        assert_eq!(roll.rolls.len(), 2);
        assert_eq!(roll.total, roll.rolls.iter().sum::<u32>() as i32 + 3);
    }

    #[test]
    fn whisper_needs_a_known_recipient() {
        let mut host = duel(&SessionConfig::host(7), ChatLog::new());
        assert!(matches!(
            host.whisper("GM", EntityId(9), "psst"),
            Err(RuntimeError::UnknownEntity(EntityId(9)))
        ));
        host.whisper("GM", EntityId(1), "The goblin is bluffing").unwrap();
        assert!(matches!(host.drain_outbox()[0], WireMessage::Whisper { to: EntityId(1), .. }));
    }

    #[test]
    fn host_refuses_remote_state() {
        let mut host = duel(&SessionConfig::host(7), ChatLog::new());
        let message = WireMessage::CombatEnded {
            state_root: encode_root(&host.state_root()),
        };
        assert!(matches!(host.apply_remote(&message), Err(RuntimeError::NotPeer)));
    }

    #[test]
    fn roll_descriptions() {
        let roll = DiceRoll {
            rolls: vec![3, 5],
            modifier: -1,
            total: 7,
        };
        assert_eq!(describe_roll("2d6-1", &roll), "rolls 2d6-1: [3, 5] - 1 = 7");
    }
}
