#[derive(Debug, Deserialize)]
struct LineQuery {
    x: i32,
    y: i32,
    to_x: i32,
    to_y: i32,
}

impl LineQuery {
    fn endpoints(&self) -> (Position, Position) {
        (Position::new(self.x, self.y), Position::new(self.to_x, self.to_y))
    }
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    x: i32,
    y: i32,
    max: u32,
}

#[derive(Debug, Deserialize)]
struct RectangleQuery {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

async fn spatial_path(
    State(state): State<AppState>,
    Query(query): Query<LineQuery>,
) -> Result<Json<QueryResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let (start, goal) = query.endpoints();
    let path = inner
        .engine
        .path(start, goal)
        .map_err(HttpApiError::from_world)?;
    query_response("spatial.path", inner.engine.status().turn, path)
}

async fn spatial_path_distance(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<QueryResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let reachable = inner
        .engine
        .path_distance(Position::new(query.x, query.y), query.max)
        .map_err(HttpApiError::from_world)?;
    query_response("spatial.path_distance", inner.engine.status().turn, reachable)
}

async fn spatial_radius(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<QueryResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let radius = inner
        .engine
        .radius(Position::new(query.x, query.y), query.max)
        .map_err(HttpApiError::from_world)?;
    query_response("spatial.radius", inner.engine.status().turn, radius)
}

async fn spatial_shadow(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<QueryResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let shadow = inner
        .engine
        .shadow(Position::new(query.x, query.y), query.max)
        .map_err(HttpApiError::from_world)?;
    query_response("spatial.shadow", inner.engine.status().turn, shadow)
}

async fn spatial_raycast(
    State(state): State<AppState>,
    Query(query): Query<LineQuery>,
) -> Result<Json<QueryResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let (source, target) = query.endpoints();
    let sightline = inner
        .engine
        .raycast(source, target)
        .map_err(HttpApiError::from_world)?;
    query_response("spatial.raycast", inner.engine.status().turn, sightline)
}

async fn spatial_rectangle(
    State(state): State<AppState>,
    Query(query): Query<RectangleQuery>,
) -> Result<Json<QueryResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let rectangle = inner
        .engine
        .rectangle(
            Position::new(query.left, query.top),
            Position::new(query.right, query.bottom),
        )
        .map_err(HttpApiError::from_world)?;
    query_response("spatial.rectangle", inner.engine.status().turn, rectangle)
}
