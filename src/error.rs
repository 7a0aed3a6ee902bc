use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::messages::{self, Locale};

/// Reasons a request is rejected as malformed or not allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadRequestKind {
    DuplicateEmail(String),
    InvalidActivationLink,
    UnregisteredEmail,
    InvalidCredentials,
    InvalidEmail,
    InvalidPassword,
}

impl BadRequestKind {
    /// Machine-readable code sent to clients. Login failures share one code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateEmail(_) => "duplicate_email",
            Self::InvalidActivationLink => "invalid_activation_link",
            Self::UnregisteredEmail | Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidPassword => "invalid_password",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("bad request: {0:?}")]
    BadRequest(BadRequestKind),
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn localize(self, locale: Locale) -> ApiError {
        ApiError {
            error: self,
            locale,
        }
    }
}

/// An [`AuthError`] paired with the locale its message is rendered in.
#[derive(Debug)]
pub struct ApiError {
    pub error: AuthError,
    pub locale: Locale,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.error {
            AuthError::BadRequest(kind) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: kind.code(),
                    message: messages::bad_request(kind, self.locale),
                },
            ),
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "unauthorized",
                    message: messages::unauthorized(self.locale).into(),
                },
            ),
            AuthError::Internal(e) => {
                error!(error = ?e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "internal",
                        message: messages::internal(self.locale).into(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
