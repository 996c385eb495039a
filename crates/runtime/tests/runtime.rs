mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::{BRANNOC, GOBLIN, init_tracing, skirmish};
use tabletop_content::ContentFactory;
use tabletop_core::{AttackAction, CombatAction, CombatState, DecisionChoice, SequenceRng, WeaponChoice};
use tabletop_runtime::{
    ChatKind, CombatEvent, Event, Runtime, RuntimeError, SessionConfig, Topic, TurnEvent, WireMessage,
};
use tokio::sync::broadcast::Receiver;
use tokio::time::timeout;

async fn next_event(rx: &mut Receiver<Event>) -> Event {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event within a second")
        .expect("bus open")
}

fn host_runtime() -> Runtime {
    init_tracing();
    let (state, map, rules) = skirmish();
    Runtime::builder()
        .config(SessionConfig::host(0))
        .state(state, map, rules)
        .rng(SequenceRng::new([15, 4]))
        .build()
        .unwrap()
}

fn peer_runtime() -> Runtime {
    let (state, map, rules) = skirmish();
    Runtime::builder()
        .config(SessionConfig::peer())
        .state(state, map, rules)
        .build()
        .unwrap()
}

#[tokio::test]
async fn host_publishes_turns_and_outbound_messages() {
    let runtime = host_runtime();
    let handle = runtime.handle();
    let mut turns = handle.subscribe(Topic::Turn);
    let mut outbound = handle.subscribe(Topic::Outbound);

    assert_eq!(handle.roll_initiative(BRANNOC).await.unwrap(), 15);
    assert_eq!(handle.roll_initiative(GOBLIN).await.unwrap(), 4);
    let advance = handle.advance_turn().await.unwrap();
    assert_eq!(advance.entity, BRANNOC);

    assert!(matches!(
        next_event(&mut turns).await,
        Event::Turn(TurnEvent::InitiativeRolled { score: 15, .. })
    ));
    next_event(&mut turns).await;
    assert!(matches!(
        next_event(&mut turns).await,
        Event::Turn(TurnEvent::TurnStarted {
            entity: BRANNOC,
            round: 1
        })
    ));

    let attack = CombatAction::Attack(AttackAction::new(BRANNOC, GOBLIN, WeaponChoice::named("Handaxe")));
    let resolution = handle.submit(attack).await.unwrap().unwrap();
    assert!(resolution.decision.is_some());

    let mut kinds = Vec::new();
    for _ in 0..4 {
        if let Event::Outbound(message) = next_event(&mut outbound).await {
            kinds.push(message.kind());
        }
    }
    assert_eq!(
        kinds,
        ["initiative_rolled", "initiative_rolled", "turn_advanced", "action_resolved"]
    );

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.entity(GOBLIN).unwrap().hit_points.current, 0);
    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn rejected_commands_are_published() {
    let runtime = host_runtime();
    let handle = runtime.handle();
    let mut combat = handle.subscribe(Topic::Combat);

    let err = handle.resolve_decision(99, DecisionChoice::Cancel).await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownDecision(99)));
    let Event::Combat(CombatEvent::Rejected { command, .. }) = next_event(&mut combat).await else {
        panic!("expected a rejection");
    };
    assert_eq!(command, "resolve_decision");
    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn peer_runtime_follows_the_host() {
    let host = host_runtime();
    let peer = peer_runtime();
    let (host_handle, peer_handle) = (host.handle(), peer.handle());
    let mut outbound = host_handle.subscribe(Topic::Outbound);
    let mut peer_turns = peer_handle.subscribe(Topic::Turn);

    host_handle.roll_initiative(BRANNOC).await.unwrap();
    host_handle.roll_initiative(GOBLIN).await.unwrap();
    host_handle.advance_turn().await.unwrap();
    let attack = CombatAction::Attack(AttackAction::new(BRANNOC, GOBLIN, WeaponChoice::named("Handaxe")));
    let id = host_handle.submit(attack).await.unwrap().unwrap().decision.unwrap();
    host_handle.resolve_decision(id, DecisionChoice::KnockOut).await.unwrap();

    for _ in 0..5 {
        let Event::Outbound(message) = next_event(&mut outbound).await else {
            panic!("outbound topic carries wire messages only");
        };
        let wire = WireMessage::decode(&message.encode().unwrap()).unwrap();
        peer_handle.apply_remote(wire).await.unwrap();
    }

    let host_state = host_handle.query_state().await.unwrap();
    let peer_state = peer_handle.query_state().await.unwrap();
    assert_eq!(peer_state.state_root(), host_state.state_root());
    assert!(matches!(
        next_event(&mut peer_turns).await,
        Event::Turn(TurnEvent::InitiativeRolled { entity: BRANNOC, .. })
    ));

    assert!(matches!(
        peer_handle.roll_dice("Ysolde", "1d20").await,
        Err(RuntimeError::NotHost(_))
    ));
    drop((host_handle, peer_handle));
    host.shutdown().await.unwrap();
    peer.shutdown().await.unwrap();
}

#[tokio::test]
async fn table_talk_goes_out_on_the_chat_topic() {
    let runtime = host_runtime();
    let handle = runtime.handle();
    let mut chat = handle.subscribe(Topic::Chat);

    handle.say("Brannoc", "Hold the line!").await.unwrap();
    let Event::Chat(entry) = next_event(&mut chat).await else {
        panic!("expected a chat entry");
    };
    assert_eq!(entry.speaker.as_deref(), Some("Brannoc"));
    assert_eq!(entry.kind, ChatKind::Say);

    handle.roll_dice("GM", "2d6").await.unwrap();
    let Event::Chat(entry) = next_event(&mut chat).await else {
        panic!("expected a dice line");
    };
    assert_eq!(entry.kind, ChatKind::Dice);
    assert_eq!(entry.text, "rolls 2d6: [6, 4] = 10");
    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn bundled_encounter_boots_a_runtime() {
    let data = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../game/content/data");
    let encounter = ContentFactory::new(data)
        .load_encounter("crossroads", "ambush")
        .unwrap();

    let runtime = Runtime::builder().encounter(encounter).build().unwrap();
    let state = runtime.handle().query_state().await.unwrap();
    assert_eq!(state.entities.len(), 6);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn saved_state_resumes_in_a_fresh_runtime() {
    let runtime = host_runtime();
    let handle = runtime.handle();
    handle.roll_initiative(BRANNOC).await.unwrap();
    handle.roll_initiative(GOBLIN).await.unwrap();
    handle.advance_turn().await.unwrap();
    let saved = handle.query_state().await.unwrap();
    drop(handle);
    runtime.shutdown().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skirmish.json");
    std::fs::write(&path, serde_json::to_vec(&saved).unwrap()).unwrap();
    let restored: CombatState = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(restored.state_root(), saved.state_root());
    assert_eq!(restored.turns.active(), Some(BRANNOC));

    let (_, map, rules) = skirmish();
    let resumed = Runtime::builder()
        .config(SessionConfig::host(0))
        .state(restored, map, rules)
        .build()
        .unwrap();
    let advance = resumed.handle().advance_turn().await.unwrap();
    assert_eq!(advance.entity, GOBLIN);
    assert_eq!(advance.round, 1);
    resumed.shutdown().await.unwrap();
}

#[tokio::test]
async fn building_without_an_encounter_fails() {
    assert!(matches!(Runtime::builder().build(), Err(RuntimeError::MissingEncounter)));
}
