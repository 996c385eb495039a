//! Movement validation and costing.
//!
//! A walk is checked in this order: bounds, immobilizing conditions, fear,
//! occupied destination, standing up from Prone, movement budget. A walk
//! that passes may still provoke one opportunity attack. Teleports only
//! check bounds and occupancy.

use super::{ActionOutcome, ActionReport, CombatTransition, Effects, PendingDecision, passengers};
use crate::config::RulesConfig;
use crate::env::{CombatEnv, MapOracle, RandomSource};
use crate::geometry::{CoverCategory, GridPoint, calculate_cover};
use crate::state::{
    CombatEntity, CombatState, ConditionKind, ConditionView, EntityId, Footprint, Mutation, Position,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveMode {
    #[default]
    Walk,
    Teleport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveRequest {
    pub entity: EntityId,
    pub destination: Position,
    pub mode: MoveMode,
}

impl MoveRequest {
    pub fn walk(entity: EntityId, destination: Position) -> Self {
        Self {
            entity,
            destination,
            mode: MoveMode::Walk,
        }
    }

    pub fn teleport(entity: EntityId, destination: Position) -> Self {
        Self {
            entity,
            destination,
            mode: MoveMode::Teleport,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveRejection {
    OutOfBounds,
    Immobilized(ConditionKind),
    /// Walking would bring the mover closer to the source of its fear.
    Frightened { source: EntityId },
    Occupied(EntityId),
    InsufficientMovement { cost: u32, remaining: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveReport {
    pub entity: EntityId,
    pub from: Position,
    pub to: Position,
    pub mode: MoveMode,
    /// Movement spent, in feet, including standing up.
    pub cost_feet: u32,
    pub stood_up: bool,
    pub crawled: bool,
    pub rejected: Option<MoveRejection>,
    pub opportunity_attacker: Option<EntityId>,
}

/// Walking speed this turn after Slowed and Exhaustion. Zero while
/// immobilized or incapacitated.
pub fn effective_speed(entity: &CombatEntity, conditions: &ConditionView<'_>, rules: &RulesConfig) -> u32 {
    if conditions.immobilizing().is_some() || conditions.is_incapacitated() {
        return 0;
    }
    let mut speed = entity.speeds.walk;
    if conditions.has(ConditionKind::Slowed) {
        speed = speed.saturating_sub(rules.slow_speed_penalty);
    }
    let exhaustion = u32::from(conditions.level(ConditionKind::Exhaustion));
    speed.saturating_sub(exhaustion * rules.exhaustion_speed_per_level)
}

pub(crate) fn footprint_in_bounds(map: &dyn MapOracle, footprint: &Footprint) -> bool {
    footprint.cells().all(|cell| map.contains(cell))
}

/// First living token, other than `ignored`, overlapping `footprint`.
pub(crate) fn occupant(state: &CombatState, footprint: &Footprint, ignored: &[EntityId]) -> Option<EntityId> {
    state
        .entities
        .iter()
        .filter(|other| !other.slain && !ignored.contains(&other.id))
        .find(|other| other.footprint().gap(footprint) == 0)
        .map(|other| other.id)
}

/// How far a forced move along `path` really gets before a map edge, a wall
/// or another token stops it.
pub(crate) fn forced_destination(
    state: &CombatState,
    env: &CombatEnv<'_>,
    mover: &CombatEntity,
    path: &[Position],
) -> Position {
    let mut ignored = passengers(state, mover.id);
    ignored.push(mover.id);
    let side = mover.size.footprint();
    let mut current = mover.position;
    for &step in path {
        let next = Footprint::new(step, side);
        let from = GridPoint::from(Footprint::new(current, side).center());
        let to = GridPoint::from(next.center());
        let blocked_by_map = env
            .map()
            .map(|map| !footprint_in_bounds(map, &next))
            .unwrap_or(false);
        let blocked_by_wall = env.walls().iter().any(|wall| wall.crosses(from, to));
        if blocked_by_map || blocked_by_wall || occupant(state, &next, &ignored).is_some() {
            break;
        }
        current = step;
    }
    current
}

/// Mutations moving `mover` and whatever rides with it to `destination`.
pub(crate) fn relocate(state: &CombatState, mover: EntityId, destination: Position, effects: &mut Effects) {
    for entity in std::iter::once(mover).chain(passengers(state, mover)) {
        effects.push(Mutation::SetPosition {
            entity,
            position: destination,
        });
    }
}

impl MoveRequest {
    fn report(&self, from: Position) -> MoveReport {
        MoveReport {
            entity: self.entity,
            from,
            to: self.destination,
            mode: self.mode,
            cost_feet: 0,
            stood_up: false,
            crawled: false,
            rejected: None,
            opportunity_attacker: None,
        }
    }

    fn rejected(&self, mover: &CombatEntity, rejection: MoveRejection) -> ActionOutcome {
        let mut report = self.report(mover.position);
        report.to = mover.position;
        report.rejected = Some(rejection);
        let mut effects = Effects::default();
        effects.note(format!(
            "{} cannot move to {}: {rejection:?}",
            mover.name, self.destination
        ));
        ActionOutcome::new(self.entity, ActionReport::Move(report), effects)
    }

    fn fear_source(&self, state: &CombatState, env: &CombatEnv<'_>, mover: &CombatEntity) -> Option<EntityId> {
        let here = mover.footprint();
        let there = Footprint::new(self.destination, mover.size.footprint());
        state
            .conditions_of(mover.id)
            .sources(ConditionKind::Frightened)
            .filter_map(|source| state.entity(source))
            .filter(|source| !source.slain)
            .find(|source| {
                let seen = calculate_cover(&here, &source.footprint(), env.walls(), &[]) != CoverCategory::Total;
                let feared = source.footprint();
                seen && there.gap(&feared) < here.gap(&feared)
            })
            .map(|source| source.id)
    }

    /// First hostile whose reach the mover leaves, if it can still react.
    fn opportunity_attacker(
        &self,
        state: &CombatState,
        rules: &RulesConfig,
        mover: &CombatEntity,
        riders: &[EntityId],
    ) -> Option<EntityId> {
        let here = mover.footprint();
        let there = Footprint::new(self.destination, mover.size.footprint());
        state
            .entities
            .iter()
            .filter(|other| other.id != mover.id && !riders.contains(&other.id) && !other.slain)
            .filter(|other| other.is_hostile_to(mover))
            .filter(|other| !state.conditions_of(other.id).is_incapacitated())
            .filter(|other| state.resources_of(other.id).is_none_or(|r| !r.reaction_used))
            .find(|other| {
                let reach = other.melee_reach_feet();
                let theirs = other.footprint();
                rules.feet_for(here.gap(&theirs)) <= reach && rules.feet_for(there.gap(&theirs)) > reach
            })
            .map(|other| other.id)
    }
}

impl CombatTransition for MoveRequest {
    fn actor(&self) -> EntityId {
        self.entity
    }

    fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        _rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let mover = state.entity(self.entity)?;
        let map = env.map().ok()?;
        if mover.slain {
            return None;
        }
        let rules = env.rules();
        let side = mover.size.footprint();
        let destination = Footprint::new(self.destination, side);
        let riders = passengers(state, mover.id);

        if !footprint_in_bounds(map, &destination) {
            return Some(self.rejected(mover, MoveRejection::OutOfBounds));
        }
        let mut ignored = riders.clone();
        ignored.push(mover.id);
        if let Some(blocker) = occupant(state, &destination, &ignored) {
            return Some(self.rejected(mover, MoveRejection::Occupied(blocker)));
        }

        let mut effects = Effects::default();
        let mut report = self.report(mover.position);

        if self.mode == MoveMode::Teleport {
            relocate(state, mover.id, self.destination, &mut effects);
            effects.note(format!("{} teleports to {}", mover.name, self.destination));
            return Some(ActionOutcome::new(self.entity, ActionReport::Move(report), effects));
        }

        let conditions = state.conditions_of(mover.id);
        let pinned = conditions.immobilizing().or_else(|| {
            conditions
                .iter()
                .map(|c| c.kind)
                .find(|kind| kind.is_incapacitating())
        });
        if let Some(kind) = pinned {
            return Some(self.rejected(mover, MoveRejection::Immobilized(kind)));
        }
        if let Some(source) = self.fear_source(state, env, mover) {
            return Some(self.rejected(mover, MoveRejection::Frightened { source }));
        }

        let distance = mover.position.chebyshev(self.destination);
        let mut cost = rules.feet_for(distance) * map.movement_multiplier(self.destination);
        let prone = conditions.has(ConditionKind::Prone);

        match state.resources_of(mover.id) {
            Some(resources) => {
                let mut remaining = resources.movement_remaining;
                let mut stand_cost = 0;
                if prone && resources.movement_remaining == resources.movement_max {
                    stand_cost = resources.movement_max / 2;
                    remaining -= stand_cost;
                    report.stood_up = true;
                } else if prone {
                    cost *= 2;
                    report.crawled = true;
                }
                if cost > remaining {
                    return Some(self.rejected(
                        mover,
                        MoveRejection::InsufficientMovement {
                            cost: cost + stand_cost,
                            remaining: resources.movement_remaining,
                        },
                    ));
                }
                effects.push(Mutation::SetMovement {
                    entity: mover.id,
                    remaining: remaining - cost,
                    max: resources.movement_max,
                });
                report.cost_feet = cost + stand_cost;
            }
            None => {
                report.stood_up = prone;
                report.cost_feet = cost;
            }
        }

        if report.stood_up {
            effects.push(Mutation::RemoveCondition {
                entity: mover.id,
                kind: ConditionKind::Prone,
                source: None,
            });
            effects.note(format!("{} stands up", mover.name));
        }
        relocate(state, mover.id, self.destination, &mut effects);
        effects.note(format!(
            "{} moves {} -> {} ({} ft)",
            mover.name, mover.position, self.destination, report.cost_feet
        ));

        let disengaging = state
            .resources_of(mover.id)
            .is_some_and(|resources| resources.is_disengaging);
        if !disengaging && let Some(attacker) = self.opportunity_attacker(state, rules, mover, &riders) {
            report.opportunity_attacker = Some(attacker);
            effects.pending = Some(PendingDecision::OpportunityAttack {
                attacker,
                target: mover.id,
            });
            if let Some(name) = state.entity(attacker).map(|a| a.name.as_str()) {
                effects.note(format!("{} leaves {name}'s reach", mover.name));
            }
        }

        Some(ActionOutcome::new(self.entity, ActionReport::Move(report), effects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{MapDimensions, MapSnapshot, SequenceRng, Terrain};
    use crate::geometry::WallSegment;
    use crate::state::{
        ConditionDuration, ConditionInstance, CreatureSize, Faction, Speeds, TurnFlag, Weapon, WeaponKind,
        WeaponProperties,
    };
    use crate::combat::DamageType;

    const HERO: EntityId = EntityId(1);
    const OGRE: EntityId = EntityId(2);
    const GOBLIN: EntityId = EntityId(3);

    fn battlefield() -> CombatState {
        let mut state = CombatState::with_entities([
            CombatEntity::new(HERO, "Hero", Faction::Player, Position::new(2, 2)),
            CombatEntity::new(OGRE, "Ogre", Faction::Enemy, Position::new(3, 2)).with_size(CreatureSize::Large),
            CombatEntity::new(GOBLIN, "Goblin", Faction::Enemy, Position::new(9, 9)),
        ]);
        state.turns.add(HERO, 15, 30).unwrap();
        state.turns.add(OGRE, 10, 40).unwrap();
        state
    }

    fn map() -> MapSnapshot {
        MapSnapshot::new(MapDimensions::new(12, 12))
    }

    fn resolve(state: &CombatState, map: &MapSnapshot, request: MoveRequest) -> Option<ActionOutcome> {
        let rules = RulesConfig::default();
        let env = CombatEnv::with_map(map, &rules);
        request.resolve(state, &env, &mut SequenceRng::new([10]))
    }

    fn report(outcome: &ActionOutcome) -> &MoveReport {
        match &outcome.report {
            ActionReport::Move(report) => report,
            other => panic!("expected move report, got {other:?}"),
        }
    }

    #[test]
    fn missing_map_or_mover_is_a_no_op() {
        let state = battlefield();
        let env = CombatEnv::empty();
        let request = MoveRequest::walk(HERO, Position::new(2, 3));
        assert!(request.resolve(&state, &env, &mut SequenceRng::new([1])).is_none());
        assert!(resolve(&state, &map(), MoveRequest::walk(EntityId(42), Position::ORIGIN)).is_none());
    }

    #[test]
    fn walking_costs_distance_times_terrain() {
        let state = battlefield();
        let swamp = map().with_terrain(Position::new(2, 0), Terrain::difficult());
        let outcome = resolve(&state, &swamp, MoveRequest::walk(HERO, Position::new(2, 0))).unwrap();
        assert_eq!(report(&outcome).cost_feet, 20);
        assert!(outcome.mutations.contains(&Mutation::SetMovement {
            entity: HERO,
            remaining: 10,
            max: 30
        }));
    }

    #[test]
    fn over_budget_walks_are_rejected() {
        let state = battlefield();
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(2, 9))).unwrap();
        assert_eq!(
            report(&outcome).rejected,
            Some(MoveRejection::InsufficientMovement {
                cost: 35,
                remaining: 30
            })
        );
        assert!(outcome.mutations.is_empty());
    }

    #[test]
    fn leaving_reach_provokes_once() {
        let mut state = battlefield();
        state.turns.get_mut(HERO).unwrap().movement_remaining = 30;
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(0, 2))).unwrap();
        assert_eq!(report(&outcome).opportunity_attacker, Some(OGRE));
        assert_eq!(
            outcome.pending,
            Some(PendingDecision::OpportunityAttack {
                attacker: OGRE,
                target: HERO
            })
        );
    }

    #[test]
    fn two_threatened_exits_prompt_only_the_lowest_id() {
        let mut state = battlefield();
        state.entities.get_mut(GOBLIN).unwrap().position = Position::new(2, 3);
        let walk = MoveRequest::walk(HERO, Position::new(0, 2));

        let outcome = resolve(&state, &map(), walk).unwrap();
        assert_eq!(report(&outcome).opportunity_attacker, Some(OGRE));
        assert_eq!(
            outcome.pending,
            Some(PendingDecision::OpportunityAttack {
                attacker: OGRE,
                target: HERO
            })
        );

        state.turns.get_mut(OGRE).unwrap().reaction_used = true;
        let outcome = resolve(&state, &map(), walk).unwrap();
        assert_eq!(report(&outcome).opportunity_attacker, Some(GOBLIN));
    }

    #[test]
    fn disengage_reaction_and_incapacitation_prevent_the_attack() {
        let mut state = battlefield();
        state.turns.get_mut(HERO).unwrap().set_flag(TurnFlag::Disengaging, true);
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(0, 2))).unwrap();
        assert!(outcome.pending.is_none());

        let mut state = battlefield();
        state.turns.get_mut(OGRE).unwrap().reaction_used = true;
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(0, 2))).unwrap();
        assert!(outcome.pending.is_none());

        let mut state = battlefield();
        state
            .conditions
            .apply(ConditionInstance::permanent(OGRE, ConditionKind::Stunned, "spell"))
            .unwrap();
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(0, 2))).unwrap();
        assert!(outcome.pending.is_none());
    }

    #[test]
    fn reach_weapons_extend_the_threat() {
        let mut state = battlefield();
        let pike = Weapon::new("Pike", "1d10", DamageType::Piercing, WeaponKind::Melee)
            .with_properties(WeaponProperties::REACH | WeaponProperties::HEAVY);
        state.entities.get_mut(OGRE).unwrap().weapons.push(pike);
        // one cell away is still inside 10 ft reach
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(1, 2))).unwrap();
        assert!(outcome.pending.is_none());
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(0, 2))).unwrap();
        assert!(outcome.pending.is_some());
    }

    #[test]
    fn teleport_ignores_cost_fear_and_reach() {
        let mut state = battlefield();
        state
            .conditions
            .apply(ConditionInstance::permanent(HERO, ConditionKind::Frightened, "roar").with_source(OGRE))
            .unwrap();
        let outcome = resolve(&state, &map(), MoveRequest::teleport(HERO, Position::new(11, 0))).unwrap();
        assert!(outcome.pending.is_none());
        assert_eq!(
            outcome.mutations,
            vec![Mutation::SetPosition {
                entity: HERO,
                position: Position::new(11, 0)
            }]
        );
    }

    #[test]
    fn fear_blocks_approach_in_sight_only() {
        let mut state = CombatState::with_entities([
            CombatEntity::new(HERO, "Hero", Faction::Player, Position::new(0, 0)),
            CombatEntity::new(OGRE, "Ogre", Faction::Enemy, Position::new(6, 0)),
        ]);
        state
            .conditions
            .apply(ConditionInstance::permanent(HERO, ConditionKind::Frightened, "roar").with_source(OGRE))
            .unwrap();
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(1, 0))).unwrap();
        assert_eq!(
            report(&outcome).rejected,
            Some(MoveRejection::Frightened { source: OGRE })
        );

        // moving away is fine
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(0, 1))).unwrap();
        assert!(report(&outcome).rejected.is_none());

        // a solid wall hides the source
        let walled = map().with_wall(WallSegment::new(GridPoint::new(3.0, -1.0), GridPoint::new(3.0, 13.0)));
        let outcome = resolve(&state, &walled, MoveRequest::walk(HERO, Position::new(1, 0))).unwrap();
        assert!(report(&outcome).rejected.is_none());
    }

    #[test]
    fn grappled_creatures_cannot_walk() {
        let mut state = battlefield();
        state
            .conditions
            .apply(ConditionInstance::permanent(HERO, ConditionKind::Grappled, "grab").with_source(OGRE))
            .unwrap();
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(2, 3))).unwrap();
        assert_eq!(
            report(&outcome).rejected,
            Some(MoveRejection::Immobilized(ConditionKind::Grappled))
        );
    }

    #[test]
    fn standing_up_costs_half_then_crawling_doubles() {
        let mut state = battlefield();
        state
            .conditions
            .apply(ConditionInstance::new(HERO, ConditionKind::Prone, ConditionDuration::Permanent, "shove"))
            .unwrap();
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(2, 4))).unwrap();
        let moved = report(&outcome);
        assert!(moved.stood_up);
        assert_eq!(moved.cost_feet, 25);
        assert!(outcome.mutations.contains(&Mutation::RemoveCondition {
            entity: HERO,
            kind: ConditionKind::Prone,
            source: None
        }));

        state.turns.get_mut(HERO).unwrap().movement_remaining = 20;
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(2, 3))).unwrap();
        let crawled = report(&outcome);
        assert!(crawled.crawled);
        assert_eq!(crawled.cost_feet, 10);
    }

    #[test]
    fn mount_and_rider_move_together() {
        let mut state = CombatState::with_entities([
            CombatEntity::new(HERO, "Hero", Faction::Player, Position::new(0, 0)),
            CombatEntity::new(EntityId(5), "Horse", Faction::Player, Position::new(0, 0))
                .with_size(CreatureSize::Large)
                .with_speeds(Speeds::walking(60)),
        ]);
        state
            .apply(&Mutation::SetMount {
                rider: HERO,
                mount: Some(EntityId(5)),
            })
            .unwrap();
        let outcome = resolve(&state, &map(), MoveRequest::walk(EntityId(5), Position::new(4, 0))).unwrap();
        assert!(outcome.mutations.contains(&Mutation::SetPosition {
            entity: HERO,
            position: Position::new(4, 0)
        }));
        assert!(outcome.mutations.contains(&Mutation::SetPosition {
            entity: EntityId(5),
            position: Position::new(4, 0)
        }));
    }

    #[test]
    fn bounds_and_occupancy() {
        let state = battlefield();
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(-1, 2))).unwrap();
        assert_eq!(report(&outcome).rejected, Some(MoveRejection::OutOfBounds));
        let outcome = resolve(&state, &map(), MoveRequest::walk(HERO, Position::new(3, 3))).unwrap();
        assert_eq!(report(&outcome).rejected, Some(MoveRejection::Occupied(OGRE)));
    }

    #[test]
    fn speed_accounts_for_slow_and_exhaustion() {
        let hero = CombatEntity::new(HERO, "Hero", Faction::Player, Position::ORIGIN);
        let conditions = [
            ConditionInstance::new(HERO, ConditionKind::Slowed, ConditionDuration::Rounds(1), "Slow"),
            ConditionInstance::permanent(HERO, ConditionKind::Exhaustion, "march").with_value(2),
        ];
        let rules = RulesConfig::default();
        assert_eq!(effective_speed(&hero, &ConditionView::new(&conditions), &rules), 10);
        let pinned = [ConditionInstance::permanent(HERO, ConditionKind::Restrained, "net")];
        assert_eq!(effective_speed(&hero, &ConditionView::new(&pinned), &rules), 0);
    }

    #[test]
    fn forced_moves_stop_at_walls_and_tokens() {
        let state = battlefield();
        let rules = RulesConfig::default();
        let walled = map().with_wall(WallSegment::new(GridPoint::new(2.0, 0.0), GridPoint::new(2.0, 12.0)));
        let env = CombatEnv::with_map(&walled, &rules);
        let hero = state.entity(HERO).unwrap();
        let path = [Position::new(1, 2), Position::new(0, 2)];
        assert_eq!(forced_destination(&state, &env, hero, &path), Position::new(2, 2));

        let open = map();
        let env = CombatEnv::with_map(&open, &rules);
        assert_eq!(forced_destination(&state, &env, hero, &path), Position::new(0, 2));
        let into_ogre = [Position::new(3, 2)];
        assert_eq!(forced_destination(&state, &env, hero, &into_ogre), Position::new(2, 2));
    }
}
