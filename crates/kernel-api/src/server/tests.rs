use contracts::{ActionRequest, EntitySelector, WorldConfig};

use super::*;

fn demo_state() -> AppState {
    let (engine, _) = EngineApi::demo().expect("demo loads");
    AppState::new(engine)
}

#[test]
fn pagination_enforces_max_bounds() {
    let (start, end, next_cursor) = paginate(100, Some(10), Some(20)).expect("page should work");
    assert_eq!(start, 10);
    assert_eq!(end, 30);
    assert_eq!(next_cursor, Some(30));

    let (_, end, next_cursor) = paginate(100, None, Some(0)).expect("clamped page");
    assert_eq!(end, 1);
    assert_eq!(next_cursor, Some(1));

    let out_of_range = paginate(5, Some(10), Some(1));
    assert!(out_of_range.is_err());
}

#[test]
fn world_errors_map_to_status_codes() {
    let missing = HttpApiError::from_world(WorldError::UnknownEntity(EntityId(77)));
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error.error_code, ErrorCode::EntityNotFound);
    assert_eq!(missing.error.details.as_deref(), Some("id=77"));

    let outside = HttpApiError::from_world(WorldError::OutOfBounds(Position::new(-1, 3)));
    assert_eq!(outside.status, StatusCode::BAD_REQUEST);
    assert_eq!(outside.error.error_code, ErrorCode::OutOfBounds);

    let cycle = HttpApiError::from_world(WorldError::ContainmentCycle {
        entity: EntityId(9),
        container: EntityId(10),
    });
    assert_eq!(cycle.status, StatusCode::INTERNAL_SERVER_ERROR);

    let scenario = HttpApiError::from_scenario(ScenarioError::DuplicateName("hero".to_string()));
    assert_eq!(scenario.error.error_code, ErrorCode::InvalidScenario);
    assert!(scenario
        .error
        .details
        .as_deref()
        .is_some_and(|details| details.contains("hero")));
}

#[tokio::test]
async fn replacing_the_world_resets_the_turn() {
    let state = demo_state();
    let Json(status) = get_status(State(state.clone())).await;
    assert_eq!(status.turn, 1);

    let spec = ScenarioSpec {
        config: WorldConfig::with_extent(3, 2),
        ..ScenarioSpec::default()
    };
    let Json(report) = replace_world(State(state.clone()), Json(spec))
        .await
        .expect("scenario loads");
    assert!(report.results.is_empty());

    let Json(status) = get_status(State(state)).await;
    assert_eq!((status.turn, status.width, status.height), (1, 3, 2));
    assert_eq!(status.event_count, 0);
}

#[tokio::test]
async fn invalid_scenarios_keep_the_current_world() {
    let state = demo_state();
    let spec = ScenarioSpec {
        config: WorldConfig::with_extent(0, 2),
        ..ScenarioSpec::default()
    };
    let err = replace_world(State(state.clone()), Json(spec))
        .await
        .expect_err("zero width");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.error.error_code, ErrorCode::InvalidScenario);

    let Json(status) = get_status(State(state)).await;
    assert_eq!(status.width, 5);
}

#[tokio::test]
async fn action_batches_report_per_request_results() {
    let state = demo_state();
    let hero = {
        let inner = state.inner.lock().await;
        inner.engine.entities(Some("character")).expect("kind")[0].id
    };
    let payload = ActionsPayload::from(vec![
        ActionRequest::new(hero, EntityId(14), "move"),
        ActionRequest::new(hero, EntityId(4), "move"),
    ]);
    let Json(response) = submit_actions(State(state.clone()), Json(payload)).await;
    assert_eq!(response.turn, 2);
    assert!(response.results[0].success);
    assert!(!response.results[1].success);

    let Json(page) = get_events(
        State(state),
        Query(PaginationQuery {
            cursor: Some(4),
            page_size: Some(1),
        }),
    )
    .await
    .expect("page");
    assert_eq!(page.events.len(), 1);
    assert_eq!(page.events[0].turn, 2);
    assert_eq!(page.next_cursor, Some(5));
}

#[tokio::test]
async fn summarized_requests_surface_conversion_errors() {
    let state = demo_state();
    let Json(response) = submit_summarized(
        State(state),
        Json(vec![SummarizedActionPayload {
            source: EntitySelector::new("character", Position::new(0, 0)),
            target: EntitySelector::new("node", Position::new(1, 0)),
            action_name: "move".to_string(),
        }]),
    )
    .await;
    assert!(matches!(
        response.outcomes[0],
        SummarizedActionOutcome::Rejected { .. }
    ));
}

#[tokio::test]
async fn queries_wrap_shapes_and_reject_bad_input() {
    let state = demo_state();

    let Json(response) = spatial_raycast(
        State(state.clone()),
        Query(LineQuery {
            x: 0,
            y: 2,
            to_x: 4,
            to_y: 2,
        }),
    )
    .await
    .expect("in bounds");
    assert_eq!(response.query_type, "spatial.raycast");
    assert_eq!(response.data["outcome"], "clear");

    let err = spatial_path(
        State(state.clone()),
        Query(LineQuery {
            x: 0,
            y: 0,
            to_x: 9,
            to_y: 9,
        }),
    )
    .await
    .expect_err("outside the grid");
    assert_eq!(err.error.error_code, ErrorCode::OutOfBounds);

    let err = spatial_rectangle(
        State(state.clone()),
        Query(RectangleQuery {
            left: 3,
            top: 3,
            right: 1,
            bottom: 1,
        }),
    )
    .await
    .expect_err("inverted");
    assert_eq!(err.error.error_code, ErrorCode::InvalidRequest);

    let Json(node) = get_entity(Path(EntityId(3)), State(state.clone()))
        .await
        .expect("nodes resolve too");
    assert!(node.is_node());
    let err = get_entity(Path(EntityId(999)), State(state.clone()))
        .await
        .expect_err("unknown id");
    assert_eq!(err.status, StatusCode::NOT_FOUND);

    let Json(view) = get_node(Path((2, 2)), State(state))
        .await
        .expect("in bounds");
    assert_eq!(view.entities.len(), 1);
}
