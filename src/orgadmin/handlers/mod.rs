//! Organization settings endpoints.
//!
//! Every settings route is scoped by organization name and requires a signed
//! in actor who owns the organization or is a site administrator. Anyone
//! else gets `404` so organization existence does not leak.
//!
//! Flow Overview:
//! 1) Authenticate via session cookie (`context`).
//! 2) Resolve the organization and check ownership (`context`).
//! 3) Decode the form and call the settings controller.
//! 4) Turn the controller outcome into a view, a redirect, or a JSON
//!    redirect, carrying flash messages in a cookie (`render`, `flash`).

pub mod avatar;
mod context;
pub mod delete;
mod flash;
pub mod health;
pub mod hooks;
pub mod labels;
mod render;
pub mod runners;
pub mod settings;

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub use render::{RedirectResponse, ViewResponse};

/// `?id=` selector of the webhook or runner delete endpoints. A missing or
/// malformed id fails the delete through the flash instead of the extractor.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    #[serde(default)]
    #[param(value_type = Option<Uuid>)]
    pub id: Option<String>,
}

impl IdQuery {
    #[must_use]
    pub fn parsed(&self) -> Option<Uuid> {
        self.id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
    }
}

pub(crate) const INVALID_ID: &str = "invalid id";
