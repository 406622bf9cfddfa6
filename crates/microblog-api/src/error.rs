use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use microblog_db::DbError;
use thiserror::Error;
use tracing::error;

use crate::render::{ErrorTemplate, HtmlTemplate, Layout};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Db(DbError::Duplicate { .. }) => StatusCode::CONFLICT,
            ApiError::Db(DbError::NotFound { .. }) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Db(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            "Something went wrong while handling this request.".to_string()
        } else {
            self.to_string()
        };

        let title = status.canonical_reason().unwrap_or("Error");
        let page = ErrorTemplate {
            layout: Layout::new(title, None),
            message,
        };
        (status, HtmlTemplate(page)).into_response()
    }
}
