use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    models::Route,
    platform::PlatformError,
    response::{ApiResponse, Meta},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Access denied")]
    AccessDenied,

    #[error("Authentication failed")]
    AuthFailed(#[source] PlatformError),

    #[error("Failed to load data")]
    LoadError(#[source] PlatformError),

    #[error("Failed to save changes")]
    MutationError(#[source] PlatformError),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Where the caller should navigate after this error, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            AppError::AuthRequired => Some(Route::SignIn),
            AppError::AccessDenied => Some(Route::Home),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthRequired | AppError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::LoadError(_) | AppError::MutationError(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human readable detail, including the platform cause where one exists.
    pub fn detail(&self) -> String {
        match self {
            AppError::AuthFailed(source)
            | AppError::LoadError(source)
            | AppError::MutationError(source) => format!("{self}: {source}"),
            AppError::Validation(fields) => fields
                .iter()
                .map(|f| format!("{}: {}", f.field, f.message))
                .collect::<Vec<_>>()
                .join(", "),
            _ => self.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.detail(), "request failed");
        }

        let fields = match &self {
            AppError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.detail(),
                fields,
                redirect: self.redirect().map(|route| route.path().to_string()),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
