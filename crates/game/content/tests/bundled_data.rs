use std::path::PathBuf;

use tabletop_content::ContentFactory;
use tabletop_core::{
    AttackAction, CombatAction, CombatEngine, CombatEnv, EntityId, Faction, SequenceRng, WeaponChoice,
};

fn factory() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"))
}

#[test]
fn bundled_catalog_parses() {
    let catalog = factory().load_weapons().unwrap();
    assert_eq!(catalog.len(), 20);
    assert!(catalog.get("heavy crossbow").is_some());
}

#[test]
fn ambush_encounter_loads() {
    let encounter = factory().load_encounter("crossroads", "ambush").unwrap();
    assert_eq!(encounter.map.walls.len(), 3);

    let enemies = encounter
        .state
        .entities
        .iter()
        .filter(|entity| entity.faction == Faction::Enemy)
        .count();
    assert_eq!(enemies, 3);
}

#[test]
fn loaded_tokens_can_fight() {
    let mut encounter = factory().load_encounter("crossroads", "ambush").unwrap();
    let env = CombatEnv::with_map(&encounter.map, &encounter.rules);
    let mut engine = CombatEngine::new(&mut encounter.state);

    // Ysolde shoots the wolf from across the field.
    let shot = CombatAction::Attack(AttackAction::new(EntityId(2), EntityId(12), WeaponChoice::named("Longbow")));
    let outcome = engine
        .execute(&shot, &env, &mut SequenceRng::new([18, 6]))
        .unwrap()
        .unwrap();
    assert!(!outcome.log.is_empty());
    assert!(engine.state().entity(EntityId(12)).unwrap().hit_points.current < 11);
}
