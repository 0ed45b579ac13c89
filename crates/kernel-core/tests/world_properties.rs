use std::collections::BTreeMap;

use contracts::{attr, EntityId, Position, WorldConfig};
use kernel_core::kinds;
use kernel_core::{Sightline, World};
use proptest::prelude::*;

const SIDE: u32 = 6;

fn walled_world(blocked: &[bool]) -> World {
    let mut world = World::new(WorldConfig::with_extent(SIDE, SIDE)).expect("world");
    for (index, is_wall) in blocked.iter().enumerate() {
        if *is_wall {
            let position = Position::new(index as i32 % SIDE as i32, index as i32 / SIDE as i32);
            let wall = world
                .spawn("wall", kinds::WALL, BTreeMap::new())
                .expect("spawn wall");
            world.place(wall, position).expect("place wall");
        }
    }
    world
}

fn position() -> impl Strategy<Value = Position> {
    (0..SIDE as i32, 0..SIDE as i32).prop_map(|(x, y)| Position::new(x, y))
}

fn node_blocks(world: &World, position: Position) -> (bool, bool) {
    let node = world.grid().node(position).expect("node");
    (node.blocks_movement(), node.blocks_light())
}

#[derive(Debug, Clone)]
enum Op {
    Place(usize, Position),
    Remove(usize),
    Store(usize, usize),
    SetBlocksMovement(usize, bool),
    SetBlocksLight(usize, bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4_usize, position()).prop_map(|(e, p)| Op::Place(e, p)),
        (0..4_usize).prop_map(Op::Remove),
        (0..4_usize, 0..4_usize).prop_map(|(e, c)| Op::Store(e, c)),
        (0..4_usize, any::<bool>()).prop_map(|(e, v)| Op::SetBlocksMovement(e, v)),
        (0..4_usize, any::<bool>()).prop_map(|(e, v)| Op::SetBlocksLight(e, v)),
    ]
}

proptest! {
    #[test]
    fn node_aggregates_match_their_members(ops in prop::collection::vec(op(), 1..40)) {
        let mut world = World::new(WorldConfig::with_extent(SIDE, SIDE)).expect("world");
        let ids: Vec<EntityId> = [kinds::WALL, kinds::DOOR, kinds::ITEM, kinds::CHARACTER]
            .iter()
            .map(|kind| world.spawn(*kind, kind, BTreeMap::new()).expect("spawn"))
            .collect();

        for op in ops {
            // Cycles and other refused moves leave the world unchanged.
            let _ = match op {
                Op::Place(e, p) => world.place(ids[e], p),
                Op::Remove(e) => world.remove_from_world(ids[e]),
                Op::Store(e, c) => world.store(ids[e], ids[c]),
                Op::SetBlocksMovement(e, v) => {
                    world.set_attribute(ids[e], attr::BLOCKS_MOVEMENT, v.into())
                }
                Op::SetBlocksLight(e, v) => {
                    world.set_attribute(ids[e], attr::BLOCKS_LIGHT, v.into())
                }
            };

            for node in world.grid().nodes() {
                let members: Vec<_> = node
                    .entities()
                    .iter()
                    .map(|id| world.entities().get(*id).expect("member is registered"))
                    .collect();
                prop_assert!(members
                    .iter()
                    .all(|entity| entity.location().node() == Some(node.position())));
                prop_assert_eq!(
                    node.blocks_movement(),
                    members.iter().any(|entity| entity.blocks_movement())
                );
                prop_assert_eq!(
                    node.blocks_light(),
                    members.iter().any(|entity| entity.blocks_light())
                );
            }
            for id in &ids {
                let entity = world.entities().get(*id).expect("registered");
                if let Some(container) = entity.location().container() {
                    let holder = world.entities().get(container).expect("container");
                    prop_assert!(holder.inventory().contains(id));
                    prop_assert!(!world.entities().is_within(container, *id));
                }
            }
        }
    }

    #[test]
    fn found_paths_are_walkable_and_shortest(
        blocked in prop::collection::vec(prop::bool::weighted(0.3), (SIDE * SIDE) as usize),
        start in position(),
        goal in position(),
    ) {
        let world = walled_world(&blocked);
        let path = world.get_path(start, goal).expect("in bounds");
        let frontier = world
            .get_path_distance(start, SIDE * SIDE)
            .expect("in bounds");
        let reached = frontier.iter().find(|entry| entry.position == goal);

        if goal != start && node_blocks(&world, goal).0 {
            prop_assert!(path.is_none());
            return Ok(());
        }
        match (path, reached) {
            (Some(path), Some(entry)) => {
                prop_assert_eq!(path.start(), start);
                prop_assert_eq!(path.goal(), goal);
                prop_assert_eq!(path.steps() as u32, entry.distance);
                prop_assert!(path.steps() as u32 >= start.chebyshev(goal));
                for pair in path.nodes().windows(2) {
                    prop_assert_eq!(pair[0].chebyshev(pair[1]), 1);
                }
                for step in &path.nodes()[1..] {
                    prop_assert!(!node_blocks(&world, *step).0);
                }
            }
            (None, None) => {}
            (path, entry) => {
                prop_assert!(false, "path {:?} disagrees with frontier {:?}", path, entry)
            }
        }
    }

    #[test]
    fn shadow_stays_within_radius_and_holds_its_source(
        blocked in prop::collection::vec(prop::bool::weighted(0.2), (SIDE * SIDE) as usize),
        source in position(),
        radius in 0_u32..5,
    ) {
        let world = walled_world(&blocked);
        let shadow = world.get_shadow(source, radius).expect("in bounds");
        prop_assert!(shadow.contains(source));
        for node in shadow.nodes() {
            prop_assert!(world.grid().contains(*node));
            prop_assert!(source.chebyshev(*node) <= radius);
        }
    }

    #[test]
    fn raycast_names_the_first_light_blocker(
        blocked in prop::collection::vec(prop::bool::weighted(0.2), (SIDE * SIDE) as usize),
        source in position(),
        target in position(),
    ) {
        let world = walled_world(&blocked);
        match world.get_raycast(source, target).expect("in bounds") {
            Sightline::Clear(ray) => {
                let nodes = ray.nodes();
                prop_assert_eq!(nodes.first(), Some(&source));
                prop_assert_eq!(nodes.last(), Some(&target));
                if nodes.len() > 2 {
                    for node in &nodes[1..nodes.len() - 1] {
                        prop_assert!(!node_blocks(&world, *node).1);
                    }
                }
            }
            Sightline::Blocked(ray) => {
                prop_assert!(node_blocks(&world, ray.blocking_node()).1);
                prop_assert!(ray.blocking_node() != source && ray.blocking_node() != target);
                let entity = world.entities().get(ray.blocking_entity()).expect("blocker");
                prop_assert_eq!(entity.location().node(), Some(ray.blocking_node()));
                for node in &ray.nodes()[1..] {
                    prop_assert!(!node_blocks(&world, *node).1);
                }
            }
        }
    }
}
