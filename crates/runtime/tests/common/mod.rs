#![allow(dead_code)]

use tabletop_core::state::{AbilityScores, WeaponKind};
use tabletop_core::{
    CombatEntity, CombatState, DamageType, EntityId, Faction, HitPoints, MapDimensions, MapSnapshot, Position,
    RulesConfig, Weapon,
};
use tabletop_runtime::{ChatLog, Session, SessionConfig};

pub const BRANNOC: EntityId = EntityId(1);
pub const GOBLIN: EntityId = EntityId(2);
pub const BANDIT: EntityId = EntityId(3);

/// Brannoc (+5 to hit, 1d6+3 handaxe) stands next to a 7 HP goblin. A bandit
/// waits across the yard.
pub fn skirmish() -> (CombatState, MapSnapshot, RulesConfig) {
    let handaxe = Weapon::new("Handaxe", "1d6", DamageType::Slashing, WeaponKind::Melee);
    let state = CombatState::with_entities([
        CombatEntity::new(BRANNOC, "Brannoc", Faction::Player, Position::new(1, 1))
            .with_abilities(AbilityScores::new(16, 10, 14, 10, 10, 10))
            .with_armor_class(16)
            .with_hit_points(HitPoints::new(24))
            .with_weapon(handaxe.clone()),
        CombatEntity::new(GOBLIN, "Goblin", Faction::Enemy, Position::new(2, 1))
            .with_armor_class(12)
            .with_hit_points(HitPoints::new(7))
            .with_weapon(handaxe.clone()),
        CombatEntity::new(BANDIT, "Bandit", Faction::Enemy, Position::new(4, 4))
            .with_armor_class(12)
            .with_hit_points(HitPoints::new(11))
            .with_weapon(handaxe),
    ]);
    (state, MapSnapshot::new(MapDimensions::new(8, 8)), RulesConfig::default())
}

/// Routes session logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn session(config: SessionConfig, chat: ChatLog) -> Session {
    init_tracing();
    let (state, map, rules) = skirmish();
    Session::new(&config, state, map, rules, Box::new(chat))
}
