use tokio::task::JoinError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("{service}: {kind}")]
    Service { service: String, kind: ServiceErrorKind },

    #[error("{service}: could not parse response: {message}")]
    Parse { service: String, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Tokio join error: {0}")]
    Join(#[from] JoinError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceErrorKind {
    #[error("unauthorized request, check your API key")]
    Unauthorized,

    #[error("request failed with HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("no response within {0} seconds")]
    TimedOut(u64),
}

impl AppError {
    pub fn service(service: impl Into<String>, kind: ServiceErrorKind) -> Self {
        AppError::Service { service: service.into(), kind }
    }

    pub fn parse(service: impl Into<String>, message: impl ToString) -> Self {
        AppError::Parse { service: service.into(), message: message.to_string() }
    }

    pub fn transport(service: impl Into<String>, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ServiceErrorKind::Transport(format!("timed out: {}", err))
        } else {
            ServiceErrorKind::Transport(err.to_string())
        };
        AppError::service(service, kind)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Service { kind: ServiceErrorKind::Unauthorized, .. })
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({
                "error": self.to_string(),
            }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Resource(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Service { .. } => StatusCode::BAD_GATEWAY,
            AppError::Parse { .. } => StatusCode::BAD_GATEWAY,
            AppError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
