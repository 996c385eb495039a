mod common;

use common::{BRANNOC, GOBLIN, session};
use tabletop_core::{
    AttackAction, CombatAction, ConditionKind, DecisionChoice, EntityId, SequenceRng, WeaponChoice,
};
use tabletop_runtime::protocol::encode_root;
use tabletop_runtime::{ChatLog, RuntimeError, Session, SessionConfig, WireMessage};

fn relay(host: &mut Session, peer: &mut Session) {
    for message in host.drain_outbox() {
        // Through JSON, the way a transport would carry it.
        let received = WireMessage::decode(&message.encode().unwrap()).unwrap();
        peer.apply_remote(&received).unwrap();
    }
}

fn handaxe_attack() -> CombatAction {
    CombatAction::Attack(AttackAction::new(BRANNOC, GOBLIN, WeaponChoice::named("Handaxe")))
}

#[test]
fn peer_converges_on_the_host_state() {
    let mut host = session(SessionConfig::host(0), ChatLog::new()).with_rng(SequenceRng::new([15, 4]));
    let peer_log = ChatLog::new();
    let mut peer = session(SessionConfig::peer(), peer_log.clone());

    host.add_to_initiative(BRANNOC, 18).unwrap();
    host.add_to_initiative(GOBLIN, 12).unwrap();
    let turn = host.advance_turn().unwrap();
    assert_eq!((turn.entity, turn.round), (BRANNOC, 1));
    relay(&mut host, &mut peer);
    assert_eq!(peer.state_root(), host.state_root());
    assert_eq!(peer.state().turns.active(), Some(BRANNOC));

    // 15 + 5 hits AC 12; 4 + 3 drops the goblin to 0.
    let resolution = host.submit(&handaxe_attack()).unwrap().unwrap();
    let id = resolution.decision.expect("melee drop asks for knockout or kill");
    relay(&mut host, &mut peer);
    assert!(peer.pending_decision(id).is_some());
    assert_eq!(peer.state().entity(GOBLIN).unwrap().hit_points.current, 0);

    host.resolve_decision(id, &DecisionChoice::KnockOut).unwrap();
    relay(&mut host, &mut peer);

    assert_eq!(peer.state_root(), host.state_root());
    assert_eq!(peer.pending_decisions().count(), 0);
    assert_eq!(peer.state().entity(GOBLIN).unwrap().hit_points.current, 1);
    assert!(peer.state().conditions.has(GOBLIN, ConditionKind::Unconscious));
    assert!(peer_log.texts().iter().any(|line| line.contains("knocked out")));
}

#[test]
fn cancelled_decision_changes_nothing_on_either_side() {
    let mut host = session(SessionConfig::host(0), ChatLog::new()).with_rng(SequenceRng::new([15, 4]));
    let mut peer = session(SessionConfig::peer(), ChatLog::new());

    let id = host.submit(&handaxe_attack()).unwrap().unwrap().decision.unwrap();
    relay(&mut host, &mut peer);
    let before = host.state_root();

    let resolution = host.resolve_decision(id, &DecisionChoice::Cancel).unwrap();
    assert!(resolution.outcome.mutations.is_empty());
    relay(&mut host, &mut peer);

    assert_eq!(host.state_root(), before);
    assert_eq!(peer.state_root(), before);
    assert!(peer.pending_decision(id).is_none());
}

#[test]
fn tampered_root_is_rejected_and_state_kept() {
    let mut host = session(SessionConfig::host(0), ChatLog::new());
    let mut peer = session(SessionConfig::peer(), ChatLog::new());
    host.add_to_initiative(BRANNOC, 18).unwrap();

    let before = peer.state_root();
    let mut messages = host.drain_outbox();
    let WireMessage::InitiativeRolled { state_root, .. } = &mut messages[0] else {
        panic!("expected an initiative message");
    };
    *state_root = encode_root(&[0; 32]);

    let err = peer.apply_remote(&messages[0]).unwrap_err();
    assert!(matches!(err, RuntimeError::StateDiverged { .. }));
    assert_eq!(peer.state_root(), before);
    assert!(peer.state().turns.is_empty());
}

#[test]
fn malformed_root_is_a_protocol_error() {
    let mut peer = session(SessionConfig::peer(), ChatLog::new());
    let message = WireMessage::CombatEnded {
        state_root: "not-a-root".into(),
    };
    assert!(matches!(peer.apply_remote(&message), Err(RuntimeError::Protocol(_))));
}

#[test]
fn turn_order_mismatch_is_detected() {
    let mut host = session(SessionConfig::host(0), ChatLog::new());
    let mut peer = session(SessionConfig::peer(), ChatLog::new());
    host.add_to_initiative(BRANNOC, 18).unwrap();
    host.add_to_initiative(GOBLIN, 12).unwrap();
    relay(&mut host, &mut peer);

    let forged = WireMessage::TurnAdvanced {
        entity: GOBLIN,
        round: 1,
        state_root: encode_root(&host.state_root()),
    };
    let err = peer.apply_remote(&forged).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::TurnMismatch {
            expected: GOBLIN,
            actual: BRANNOC
        }
    ));
}

#[test]
fn table_talk_reaches_the_peer_log() {
    let mut host = session(SessionConfig::host(3), ChatLog::new());
    let peer_log = ChatLog::new();
    let mut peer = session(SessionConfig::peer(), peer_log.clone());

    host.say("GM", "The bandits spring their trap");
    host.whisper("GM", EntityId(1), "You spot a tripwire").unwrap();
    host.roll_dice("GM", "1d20+2").unwrap();
    relay(&mut host, &mut peer);

    let texts = peer_log.texts();
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], "The bandits spring their trap");
    assert!(texts[2].starts_with("rolls 1d20+2: ["));
}

#[test]
fn end_of_combat_clears_initiative_on_both_sides() {
    let mut host = session(SessionConfig::host(0), ChatLog::new());
    let mut peer = session(SessionConfig::peer(), ChatLog::new());
    host.add_to_initiative(BRANNOC, 18).unwrap();
    host.advance_turn().unwrap();
    host.end_combat().unwrap();
    relay(&mut host, &mut peer);

    assert!(peer.state().turns.is_empty());
    assert_eq!(peer.state_root(), host.state_root());
}
