//! Mounting and dismounting.
//!
//! Either costs half the rider's speed in initiative. A mounted rider shares
//! its mount's position and travels with it.

use super::movement::{effective_speed, footprint_in_bounds, occupant};
use super::{ActionOutcome, ActionReport, CombatTransition, Effects};
use crate::env::{CombatEnv, RandomSource};
use crate::state::{CombatEntity, CombatState, EntityId, Footprint, Mutation, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MountAction {
    Mount { rider: EntityId, mount: EntityId },
    /// Step off into `to`, which must touch the mount.
    Dismount { rider: EntityId, to: Position },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MountRejection {
    NotAdjacent,
    /// The mount must be at least one size larger than the rider.
    MountTooSmall,
    AlreadyRidden(EntityId),
    AlreadyMounted(EntityId),
    NotMounted,
    CannotAct,
    OutOfBounds,
    Occupied(EntityId),
    InsufficientMovement { cost: u32, remaining: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MountReport {
    pub rider: EntityId,
    pub mount: Option<EntityId>,
    pub cost_feet: u32,
    pub rejected: Option<MountRejection>,
}

impl MountAction {
    fn rider(&self) -> EntityId {
        match self {
            Self::Mount { rider, .. } | Self::Dismount { rider, .. } => *rider,
        }
    }
}

impl CombatTransition for MountAction {
    fn actor(&self) -> EntityId {
        self.rider()
    }

    fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        _rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let rider = state.entity(self.rider())?;
        if rider.slain {
            return None;
        }
        let mut effects = Effects::default();
        let mut report = MountReport {
            rider: rider.id,
            mount: None,
            cost_feet: 0,
            rejected: None,
        };

        let checked = match *self {
            Self::Mount { mount, .. } => {
                let mount = state.entity(mount).filter(|m| !m.slain)?;
                report.mount = Some(mount.id);
                check_mount(rider, mount)
            }
            Self::Dismount { to, .. } => {
                let mount = rider.mounted_on.and_then(|id| state.entity(id));
                report.mount = mount.map(|m| m.id);
                match mount {
                    Some(mount) => check_dismount(state, env, rider, mount, to),
                    None => Err(MountRejection::NotMounted),
                }
            }
        };
        let conditions = state.conditions_of(rider.id);
        let checked = checked.and_then(|()| {
            if conditions.is_incapacitated() || conditions.immobilizing().is_some() {
                Err(MountRejection::CannotAct)
            } else {
                Ok(())
            }
        });

        let budget = state.resources_of(rider.id).map(|resources| {
            let cost = effective_speed(rider, &conditions, env.rules()) / 2;
            (cost, resources.movement_remaining, resources.movement_max)
        });
        let checked = checked.and_then(|()| match budget {
            Some((cost, remaining, _)) if cost > remaining => {
                Err(MountRejection::InsufficientMovement { cost, remaining })
            }
            _ => Ok(()),
        });

        if let Err(rejection) = checked {
            report.rejected = Some(rejection);
            effects.note(format!("{} cannot do that: {rejection:?}", rider.name));
            return Some(ActionOutcome::new(rider.id, ActionReport::Mount(report), effects));
        }

        if let Some((cost, remaining, max)) = budget {
            report.cost_feet = cost;
            effects.push(Mutation::SetMovement {
                entity: rider.id,
                remaining: remaining - cost,
                max,
            });
        }
        match *self {
            Self::Mount { .. } => {
                let mount = report.mount.and_then(|id| state.entity(id))?;
                effects.push(Mutation::SetMount {
                    rider: rider.id,
                    mount: Some(mount.id),
                });
                effects.push(Mutation::SetPosition {
                    entity: rider.id,
                    position: mount.position,
                });
                effects.note(format!("{} mounts {}", rider.name, mount.name));
            }
            Self::Dismount { to, .. } => {
                effects.push(Mutation::SetMount {
                    rider: rider.id,
                    mount: None,
                });
                effects.push(Mutation::SetPosition {
                    entity: rider.id,
                    position: to,
                });
                effects.note(format!("{} dismounts to {to}", rider.name));
            }
        }

        Some(ActionOutcome::new(rider.id, ActionReport::Mount(report), effects))
    }
}

fn check_mount(rider: &CombatEntity, mount: &CombatEntity) -> Result<(), MountRejection> {
    if let Some(current) = rider.mounted_on {
        return Err(MountRejection::AlreadyMounted(current));
    }
    if let Some(other) = mount.rider {
        return Err(MountRejection::AlreadyRidden(other));
    }
    if mount.size.category() <= rider.size.category() {
        return Err(MountRejection::MountTooSmall);
    }
    if rider.footprint().gap(&mount.footprint()) > 1 {
        return Err(MountRejection::NotAdjacent);
    }
    Ok(())
}

fn check_dismount(
    state: &CombatState,
    env: &CombatEnv<'_>,
    rider: &CombatEntity,
    mount: &CombatEntity,
    to: Position,
) -> Result<(), MountRejection> {
    let landing = Footprint::new(to, rider.size.footprint());
    if landing.gap(&mount.footprint()) != 1 {
        return Err(MountRejection::NotAdjacent);
    }
    if let Ok(map) = env.map()
        && !footprint_in_bounds(map, &landing)
    {
        return Err(MountRejection::OutOfBounds);
    }
    match occupant(state, &landing, &[rider.id]) {
        Some(blocker) => Err(MountRejection::Occupied(blocker)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::MoveRequest;
    use crate::config::RulesConfig;
    use crate::env::{MapDimensions, MapSnapshot, SequenceRng};
    use crate::state::{CreatureSize, Faction, Speeds};

    const KNIGHT: EntityId = EntityId(1);
    const HORSE: EntityId = EntityId(2);

    fn stable() -> CombatState {
        let mut state = CombatState::with_entities([
            CombatEntity::new(KNIGHT, "Knight", Faction::Player, Position::new(1, 1))
                .with_speeds(Speeds::walking(30)),
            CombatEntity::new(HORSE, "Warhorse", Faction::Player, Position::new(2, 1))
                .with_size(CreatureSize::Large)
                .with_speeds(Speeds::walking(60)),
        ]);
        state.turns.add(KNIGHT, 12, 30).unwrap();
        state
    }

    fn run(state: &mut CombatState, action: MountAction) -> MountReport {
        let map = MapSnapshot::new(MapDimensions::new(10, 10));
        let rules = RulesConfig::default();
        let env = CombatEnv::with_map(&map, &rules);
        let outcome = action.resolve(state, &env, &mut SequenceRng::new([1])).unwrap();
        state.apply_all(&outcome.mutations).unwrap();
        match outcome.report {
            ActionReport::Mount(report) => report,
            other => panic!("expected mount report, got {other:?}"),
        }
    }

    #[test]
    fn mounting_costs_half_speed_and_links_both() {
        let mut state = stable();
        let report = run(
            &mut state,
            MountAction::Mount {
                rider: KNIGHT,
                mount: HORSE,
            },
        );
        assert_eq!(report.rejected, None);
        assert_eq!(report.cost_feet, 15);
        assert_eq!(state.entity(KNIGHT).unwrap().mounted_on, Some(HORSE));
        assert_eq!(state.entity(HORSE).unwrap().rider, Some(KNIGHT));
        assert_eq!(state.entity(KNIGHT).unwrap().position, Position::new(2, 1));
        assert_eq!(state.resources_of(KNIGHT).unwrap().movement_remaining, 15);
    }

    #[test]
    fn rider_moves_with_mount_then_dismounts() {
        let mut state = stable();
        run(
            &mut state,
            MountAction::Mount {
                rider: KNIGHT,
                mount: HORSE,
            },
        );
        let map = MapSnapshot::new(MapDimensions::new(10, 10));
        let rules = RulesConfig::default();
        let env = CombatEnv::with_map(&map, &rules);
        let gallop = MoveRequest::walk(HORSE, Position::new(6, 6))
            .resolve(&state, &env, &mut SequenceRng::new([1]))
            .unwrap();
        state.apply_all(&gallop.mutations).unwrap();
        assert_eq!(state.entity(KNIGHT).unwrap().position, Position::new(6, 6));

        // movement left: 15, dismount costs 15
        let report = run(
            &mut state,
            MountAction::Dismount {
                rider: KNIGHT,
                to: Position::new(5, 6),
            },
        );
        assert_eq!(report.rejected, None);
        assert_eq!(state.entity(KNIGHT).unwrap().mounted_on, None);
        assert_eq!(state.entity(HORSE).unwrap().rider, None);
        assert_eq!(state.entity(KNIGHT).unwrap().position, Position::new(5, 6));
    }

    #[test]
    fn same_size_mount_is_refused() {
        let mut state = stable();
        state.entities.get_mut(HORSE).unwrap().size = CreatureSize::Medium;
        let report = run(
            &mut state,
            MountAction::Mount {
                rider: KNIGHT,
                mount: HORSE,
            },
        );
        assert_eq!(report.rejected, Some(MountRejection::MountTooSmall));
        assert_eq!(state.entity(KNIGHT).unwrap().mounted_on, None);
    }

    #[test]
    fn distant_mount_is_refused() {
        let mut state = stable();
        state.entities.get_mut(HORSE).unwrap().position = Position::new(7, 7);
        let report = run(
            &mut state,
            MountAction::Mount {
                rider: KNIGHT,
                mount: HORSE,
            },
        );
        assert_eq!(report.rejected, Some(MountRejection::NotAdjacent));
    }

    #[test]
    fn dismount_onto_the_mount_is_refused() {
        let mut state = stable();
        let report = run(
            &mut state,
            MountAction::Dismount {
                rider: KNIGHT,
                to: Position::new(0, 0),
            },
        );
        assert_eq!(report.rejected, Some(MountRejection::NotMounted));
    }
}
