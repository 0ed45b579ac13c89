#[derive(Debug, Deserialize, Default)]
struct PaginationQuery {
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct EntitiesQuery {
    kind: Option<String>,
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EntityPage {
    schema_version: String,
    turn: u64,
    cursor: usize,
    next_cursor: Option<usize>,
    entities: Vec<EntitySnapshot>,
}

#[derive(Debug, Serialize)]
struct EventPage {
    schema_version: String,
    turn: u64,
    cursor: usize,
    next_cursor: Option<usize>,
    events: Vec<WorldEvent>,
}

async fn get_entity(
    Path(id): Path<EntityId>,
    State(state): State<AppState>,
) -> Result<Json<EntitySnapshot>, HttpApiError> {
    let inner = state.inner.lock().await;
    let snapshot = inner.engine.entity(id).map_err(HttpApiError::from_world)?;
    Ok(Json(snapshot))
}

async fn list_entities(
    State(state): State<AppState>,
    Query(query): Query<EntitiesQuery>,
) -> Result<Json<EntityPage>, HttpApiError> {
    let inner = state.inner.lock().await;
    let mut entities = inner
        .engine
        .entities(query.kind.as_deref())
        .map_err(HttpApiError::from_world)?;
    let (start, end, next_cursor) = paginate(entities.len(), query.cursor, query.page_size)?;
    entities.truncate(end);

    Ok(Json(EntityPage {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        turn: inner.engine.status().turn,
        cursor: start,
        next_cursor,
        entities: entities.split_off(start),
    }))
}

async fn get_node(
    Path((x, y)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<NodeView>, HttpApiError> {
    let inner = state.inner.lock().await;
    let view = inner
        .engine
        .node(Position::new(x, y))
        .map_err(HttpApiError::from_world)?;
    Ok(Json(view))
}

async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<EventPage>, HttpApiError> {
    let inner = state.inner.lock().await;
    let events = inner.engine.events();
    let (start, end, next_cursor) = paginate(events.len(), query.cursor, query.page_size)?;

    Ok(Json(EventPage {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        turn: inner.engine.status().turn,
        cursor: start,
        next_cursor,
        events: events[start..end].to_vec(),
    }))
}
