/// Shared server state. The mutex serializes every request against the one
/// world.
#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<ServerInner>>,
}

impl AppState {
    fn new(engine: EngineApi) -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(ServerInner { engine })),
        }
    }
}

#[derive(Debug)]
struct ServerInner {
    engine: EngineApi,
}
