#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError::new(code, message, None),
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.error.details = Some(details.into());
        self
    }

    fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            message,
        )
    }

    fn from_world(err: WorldError) -> Self {
        let message = err.to_string();
        match err {
            WorldError::UnknownEntity(id) | WorldError::NotAnEntity(id) => Self::new(
                StatusCode::NOT_FOUND,
                ErrorCode::EntityNotFound,
                message,
            )
            .with_details(format!("id={}", id.0)),
            WorldError::OutOfBounds(position)
            | WorldError::Shape(ShapeError::OutOfBounds { position, .. }) => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::OutOfBounds,
                message,
            )
            .with_details(format!("x={} y={}", position.x, position.y)),
            WorldError::UnknownEntityType(_)
            | WorldError::Shape(ShapeError::InvertedBounds { .. }) => {
                Self::invalid_request(message)
            }
            WorldError::InvalidConfig(_) => {
                Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidScenario, message)
            }
            other => Self::internal("world query failed").with_details(other.to_string()),
        }
    }

    fn from_scenario(err: ScenarioError) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidScenario,
            "scenario could not be loaded",
        )
        .with_details(err.to_string())
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
