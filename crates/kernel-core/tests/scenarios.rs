use contracts::{attr, ActionRequest, ActionsPayload, Position, WorldConfig, WorldEventOutcome};
use kernel_core::actions;
use kernel_core::kinds;
use kernel_core::{door_demo, EntitySpawn, ScenarioSpec, ScenarioStep, Sightline, World};

#[test]
fn open_five_by_five_grid_has_a_five_node_diagonal() {
    let world = World::new(WorldConfig::with_extent(5, 5)).expect("world");
    let path = world
        .get_path(Position::new(0, 0), Position::new(4, 4))
        .expect("in bounds")
        .expect("reachable");
    assert_eq!(
        path.nodes(),
        &[
            Position::new(0, 0),
            Position::new(1, 1),
            Position::new(2, 2),
            Position::new(3, 3),
            Position::new(4, 4),
        ]
    );
}

#[test]
fn cardinal_grid_walks_around_the_edge() {
    let mut config = WorldConfig::with_extent(5, 5);
    config.allow_diagonal = false;
    let world = World::new(config).expect("world");
    let path = world
        .get_path(Position::new(0, 0), Position::new(4, 4))
        .expect("in bounds")
        .expect("reachable");
    assert_eq!(path.len(), 9);
    for pair in path.nodes().windows(2) {
        assert_eq!(pair[0].manhattan(pair[1]), 1);
    }
}

#[test]
fn locked_door_scenario_ends_with_the_hero_past_the_door() {
    let loaded = door_demo().load().expect("load");
    let mut world = loaded.world;
    let hero = loaded.names["hero"];
    let door = loaded.names["cellar door"];

    let east = Position::new(4, 2);
    let before = world.get_raycast(Position::new(1, 2), east).expect("ray");
    assert!(matches!(before, Sightline::Blocked(ref ray) if ray.blocking_entity() == door));
    let detour = world
        .get_path(Position::new(1, 2), east)
        .expect("in bounds")
        .expect("reachable around the walls");
    assert!(!detour.nodes().contains(&Position::new(2, 2)));

    let results = world.apply_actions_payload(&loaded.payload);
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|result| result.success), "{results:?}");

    let door_state = world.get_instance(door).expect("door");
    assert_eq!(door_state.attribute(attr::IS_LOCKED), Some(false.into()));
    assert_eq!(door_state.attribute(attr::OPEN), Some(true.into()));
    assert_eq!(
        world.get_instance(hero).and_then(|s| s.position),
        Some(Position::new(3, 2))
    );
    assert!(world
        .get_raycast(Position::new(1, 2), east)
        .expect("ray")
        .is_clear());

    let ids: Vec<&str> = world.events().iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "evt:000001:0000",
            "evt:000001:0001",
            "evt:000001:0002",
            "evt:000001:0003"
        ]
    );
}

#[test]
fn steps_out_of_order_are_rejected_without_stopping_the_batch() {
    let mut spec = door_demo();
    spec.steps = vec![
        ScenarioStep::on_entity("hero", actions::OPEN, "cellar door"),
        ScenarioStep::on_node("hero", actions::MOVE, 2, 2),
        ScenarioStep::on_entity("hero", actions::UNLOCK, "cellar door"),
        ScenarioStep::on_entity("hero", actions::OPEN, "cellar door"),
        ScenarioStep::on_node("hero", actions::MOVE, 2, 2),
    ];
    let run = spec.run().expect("run");
    let outcomes: Vec<bool> = run.results.iter().map(|r| r.success).collect();
    assert_eq!(outcomes, vec![false, false, true, true, true]);

    let rejected: Vec<_> = run
        .world
        .events_for_turn(1)
        .filter(|event| event.outcome == WorldEventOutcome::Rejected)
        .collect();
    assert_eq!(rejected.len(), 2);
    assert!(rejected[0].summary.contains("expected is_locked = false"));
    assert_eq!(run.world.status().turn, 1);
    assert_eq!(run.world.status().event_count, 5);
}

#[test]
fn untouched_entities_keep_their_snapshot_across_a_batch() {
    let spec = ScenarioSpec {
        config: WorldConfig::with_extent(4, 4),
        entities: vec![
            EntitySpawn::new("a", kinds::CHARACTER).at(0, 0),
            EntitySpawn::new("b", kinds::CHARACTER).at(3, 3),
            EntitySpawn::new("coin", kinds::ITEM).at(3, 3).with("value", 5_i64),
        ],
        steps: Vec::new(),
    };
    let loaded = spec.load().expect("load");
    let mut world = loaded.world;
    let a = loaded.names["a"];
    let coin = loaded.names["coin"];
    let b_before = world.get_instance(loaded.names["b"]);
    let coin_before = world.get_instance(coin);

    let node = world
        .grid()
        .node(Position::new(1, 0))
        .expect("node")
        .id();
    let results = world.apply_actions_payload(&ActionsPayload::from(vec![
        ActionRequest::new(a, node, actions::MOVE),
        ActionRequest::new(a, coin, actions::PICKUP),
    ]));
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(world.get_instance(loaded.names["b"]), b_before);
    assert_eq!(world.get_instance(coin), coin_before);
}

#[test]
fn custom_kinds_flow_through_scenarios() {
    let raw = r#"{
        "config": {"width": 2, "height": 1},
        "entities": [
            {"name": "boulder", "kind": "wall", "position": {"x": 1, "y": 0},
             "attributes": {"weight": {"type": "int", "value": 900}}}
        ]
    }"#;
    let loaded = ScenarioSpec::from_json(raw)
        .expect("parse")
        .load()
        .expect("load");
    let boulder = loaded
        .world
        .get_instance(loaded.names["boulder"])
        .expect("boulder");
    assert_eq!(boulder.attribute("weight"), Some(900_i64.into()));
    assert!(loaded
        .world
        .grid()
        .node(Position::new(1, 0))
        .expect("node")
        .blocks_movement());

    let known: Vec<&str> = loaded.world.entity_types().collect();
    assert!(known.contains(&"node"));
    assert!(known.contains(&kinds::DOOR));
}
