//! Error taxonomy for the settings controller.
//!
//! Registries report `RegistryError`. The controller inspects only the
//! recoverable kinds (illegal name, wrong password, repositories still owned)
//! and wraps everything else in `SettingsError::Server`, which is fatal.

use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("name is not allowed: {0}")]
    NameIllegal(String),
    /// Lost a race on the unique name index after `name_exists` said it was free.
    #[error("name is already taken")]
    NameTaken,
    #[error("account does not exist or password is wrong")]
    AccountNotFound,
    #[error("organization still owns {0} repositories")]
    StillOwnsRepos(i64),
    #[error("record not found")]
    NotFound,
    #[error("invalid avatar: {0}")]
    Avatar(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Backend(String),
}

/// Fatal failure of a controller operation; `op` names the failing registry call.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{op}: {source}")]
    Server {
        op: &'static str,
        #[source]
        source: RegistryError,
    },
}

impl SettingsError {
    pub(crate) fn server(op: &'static str) -> impl FnOnce(RegistryError) -> Self {
        move |source| Self::Server { op, source }
    }
}

impl IntoResponse for SettingsError {
    /// Logged server-side; the client only sees a bare `500`.
    fn into_response(self) -> axum::response::Response {
        error!("{self}");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Recoverable validation or policy failure, rendered inline on the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NameTaken,
    IllegalName,
    InvalidPassword,
    InvalidForm(ValidationErrors),
}

#[derive(Debug, Serialize)]
pub struct RejectionBody {
    pub field: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl Rejection {
    /// Form field the rejection highlights, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NameTaken | Self::IllegalName => Some("name"),
            Self::InvalidPassword => Some("password"),
            Self::InvalidForm(_) => None,
        }
    }

    /// Message key for the localization layer.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NameTaken => "form.username_been_taken",
            Self::IllegalName => "form.illegal_username",
            Self::InvalidPassword => "form.enterred_invalid_password",
            Self::InvalidForm(_) => "form.invalid",
        }
    }

    #[must_use]
    pub fn to_body(&self) -> RejectionBody {
        RejectionBody {
            field: self.field().map(str::to_string),
            message: self.message().to_string(),
            fields: match self {
                Self::InvalidForm(errors) => Some(errors.clone()),
                _ => None,
            },
        }
    }
}
