use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;

use super::{ViewResponse, context::authorize, render::respond};
use crate::orgadmin::AppState;

#[utoipa::path(
    get,
    path = "/org/{org}/settings/labels",
    params(("org" = String, Path, description = "Organization name")),
    responses(
        (status = 200, description = "Label template names.", body = ViewResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
    ),
    tag = "settings"
)]
pub async fn list_labels(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    if let Err(response) = authorize(&headers, &state, &org).await {
        return response;
    }

    respond(&headers, state.settings().labels())
}
