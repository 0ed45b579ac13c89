#[derive(Debug, Serialize)]
struct ActionBatchResponse {
    schema_version: String,
    turn: u64,
    results: Vec<ActionResult>,
}

#[derive(Debug, Serialize)]
struct SummarizedBatchResponse {
    schema_version: String,
    turn: u64,
    outcomes: Vec<SummarizedActionOutcome>,
}

async fn submit_actions(
    State(state): State<AppState>,
    Json(payload): Json<ActionsPayload>,
) -> Json<ActionBatchResponse> {
    let mut inner = state.inner.lock().await;
    let results = inner.engine.apply_actions(&payload);
    Json(ActionBatchResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        turn: inner.engine.status().turn,
        results,
    })
}

async fn submit_summarized(
    State(state): State<AppState>,
    Json(payloads): Json<Vec<SummarizedActionPayload>>,
) -> Json<SummarizedBatchResponse> {
    let mut inner = state.inner.lock().await;
    let outcomes = inner.engine.apply_summarized(&payloads);
    Json(SummarizedBatchResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        turn: inner.engine.status().turn,
        outcomes,
    })
}
