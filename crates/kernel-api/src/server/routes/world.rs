async fn replace_world(
    State(state): State<AppState>,
    Json(spec): Json<ScenarioSpec>,
) -> Result<Json<ScenarioReport>, HttpApiError> {
    let (engine, report) = EngineApi::from_scenario(&spec).map_err(|err| {
        warn!(%err, "scenario rejected");
        HttpApiError::from_scenario(err)
    })?;

    let mut inner = state.inner.lock().await;
    inner.engine = engine;
    info!(
        width = report.status.width,
        height = report.status.height,
        "world replaced"
    );
    Ok(Json(report))
}

async fn get_status(State(state): State<AppState>) -> Json<WorldStatus> {
    let inner = state.inner.lock().await;
    Json(inner.engine.status())
}
