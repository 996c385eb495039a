mod common;

use common::{BANDIT, BRANNOC, GOBLIN, session};
use tabletop_core::{
    CombatAction, ConditionKind, EntityId, MoveRequest, Position, SequenceRng, ShoveChoice, WeaponChoice,
};
use tabletop_runtime::{
    AttackFlow, AttackInput, AttackStep, ChatLog, ContestFlow, ContestInput, ContestStep, InteractionError,
    RuntimeError, Session, SessionConfig,
};

fn host(rolls: impl IntoIterator<Item = u32>) -> Session {
    session(SessionConfig::host(0), ChatLog::new()).with_rng(SequenceRng::new(rolls))
}

fn interaction_error(err: RuntimeError) -> InteractionError {
    match err {
        RuntimeError::Interaction(inner) => inner,
        other => panic!("expected an interaction error, got {other:?}"),
    }
}

#[test]
fn hit_walks_through_the_damage_step() {
    let mut session = host([15, 4]);
    let mut flow = AttackFlow::new(BRANNOC);

    flow.handle(AttackInput::Weapon(WeaponChoice::named("Handaxe")), &mut session).unwrap();
    flow.handle(AttackInput::Target(GOBLIN), &mut session).unwrap();
    let step = flow.handle(AttackInput::Roll, &mut session).unwrap();
    assert!(matches!(step, AttackStep::Damage { .. }));
    // Nothing is applied until damage is confirmed.
    assert_eq!(session.state().entity(GOBLIN).unwrap().hit_points.current, 7);
    assert!(session.drain_outbox().is_empty());

    let AttackStep::Result { resolution } = flow.handle(AttackInput::ApplyDamage, &mut session).unwrap() else {
        panic!("expected the result step");
    };
    assert!(resolution.decision.is_some());
    assert_eq!(session.state().entity(GOBLIN).unwrap().hit_points.current, 0);
    assert_eq!(session.drain_outbox().len(), 1);
    assert!(flow.step().is_finished());
}

#[test]
fn miss_skips_the_damage_step() {
    let mut session = host([2]);
    let mut flow = AttackFlow::new(BRANNOC);
    flow.handle(AttackInput::Weapon(WeaponChoice::named("Handaxe")), &mut session).unwrap();
    flow.handle(AttackInput::Target(GOBLIN), &mut session).unwrap();

    let step = flow.handle(AttackInput::Roll, &mut session).unwrap();
    assert!(matches!(step, AttackStep::Result { .. }));
    assert_eq!(session.state().entity(GOBLIN).unwrap().hit_points.current, 7);
}

#[test]
fn out_of_order_input_leaves_the_flow_in_place() {
    let mut session = host([15, 4]);
    let mut flow = AttackFlow::new(BRANNOC);

    let err = flow.handle(AttackInput::Roll, &mut session).unwrap_err();
    assert_eq!(
        interaction_error(err),
        InteractionError::UnexpectedInput {
            step: "weapon-select",
            input: "roll"
        }
    );
    assert_eq!(flow.step(), &AttackStep::WeaponSelect);
}

#[test]
fn weapon_and_target_are_validated() {
    let mut session = host([15, 4]);
    let mut flow = AttackFlow::new(BRANNOC);

    let err = flow
        .handle(AttackInput::Weapon(WeaponChoice::named("Lance")), &mut session)
        .unwrap_err();
    assert!(matches!(interaction_error(err), InteractionError::UnknownWeapon { .. }));

    flow.handle(AttackInput::Weapon(WeaponChoice::named("handaxe")), &mut session).unwrap();
    let err = flow.handle(AttackInput::Target(BRANNOC), &mut session).unwrap_err();
    assert_eq!(interaction_error(err), InteractionError::InvalidTarget(BRANNOC));
    let err = flow.handle(AttackInput::Target(EntityId(9)), &mut session).unwrap_err();
    assert_eq!(interaction_error(err), InteractionError::UnknownEntity(EntityId(9)));
    assert_eq!(flow.step().name(), "target-select");
}

#[test]
fn cancelled_flow_accepts_nothing_more() {
    let mut session = host([15, 4]);
    let mut flow = AttackFlow::new(BRANNOC);
    flow.handle(AttackInput::Weapon(WeaponChoice::named("Handaxe")), &mut session).unwrap();
    assert_eq!(flow.handle(AttackInput::Cancel, &mut session).unwrap(), &AttackStep::Cancelled);

    let err = flow.handle(AttackInput::Target(GOBLIN), &mut session).unwrap_err();
    assert_eq!(interaction_error(err), InteractionError::Finished);
    assert!(session.drain_outbox().is_empty());
}

#[test]
fn state_change_between_roll_and_damage_is_stale() {
    let mut session = host([15, 4]);
    let mut flow = AttackFlow::new(BRANNOC);
    flow.handle(AttackInput::Weapon(WeaponChoice::named("Handaxe")), &mut session).unwrap();
    flow.handle(AttackInput::Target(GOBLIN), &mut session).unwrap();
    flow.handle(AttackInput::Roll, &mut session).unwrap();

    let walk = CombatAction::Move(MoveRequest::walk(BANDIT, Position::new(5, 4)));
    session.submit(&walk).unwrap();

    let err = flow.handle(AttackInput::ApplyDamage, &mut session).unwrap_err();
    assert_eq!(interaction_error(err), InteractionError::StaleRoll);
    assert_eq!(flow.step().name(), "damage");
    assert_eq!(session.state().entity(GOBLIN).unwrap().hit_points.current, 7);
}

#[test]
fn failed_save_leaves_the_target_grappled() {
    let mut session = host([3]);
    let mut flow = ContestFlow::grapple(BRANNOC);

    flow.handle(ContestInput::Target(GOBLIN), &mut session).unwrap();
    assert_eq!(flow.step(), &ContestStep::SaveRoll { target: GOBLIN });
    let step = flow.handle(ContestInput::RollSave, &mut session).unwrap();
    assert!(matches!(step, ContestStep::Done { resolution: Some(_) }));
    assert!(session.state().conditions.has(GOBLIN, ConditionKind::Grappled));
}

#[test]
fn shove_can_knock_prone() {
    let mut session = host([3]);
    let mut flow = ContestFlow::shove(BRANNOC, ShoveChoice::Prone);
    flow.handle(ContestInput::Target(GOBLIN), &mut session).unwrap();
    flow.handle(ContestInput::RollSave, &mut session).unwrap();

    assert!(session.state().conditions.has(GOBLIN, ConditionKind::Prone));
    assert_eq!(session.state().entity(GOBLIN).unwrap().position, Position::new(2, 1));
    let err = flow.handle(ContestInput::Cancel, &mut session).unwrap_err();
    assert_eq!(interaction_error(err), InteractionError::Finished);
}
