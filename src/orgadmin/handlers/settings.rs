//! Organization options page and its update form.

use axum::{
    Form,
    extract::{Extension, Path},
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;

use super::{
    ViewResponse,
    context::authorize,
    render::{respond, respond_result},
};
use crate::orgadmin::AppState;
use crate::settings::types::UpdateOrgSettingsForm;

#[utoipa::path(
    get,
    path = "/org/{org}/settings",
    params(("org" = String, Path, description = "Organization name")),
    responses(
        (status = 200, description = "Options view.", body = ViewResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
    ),
    tag = "settings"
)]
pub async fn show_settings(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    respond(&headers, state.settings().settings_view(&target))
}

#[utoipa::path(
    post,
    path = "/org/{org}/settings",
    params(("org" = String, Path, description = "Organization name")),
    request_body(content = UpdateOrgSettingsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Form re-rendered with an error.", body = ViewResponse),
        (status = 303, description = "Saved; redirects to the settings page."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
        (status = 500, description = "A registry failed."),
    ),
    tag = "settings"
)]
/// Renames the organization, overwrites its descriptive fields, and cascades
/// a visibility change to its repositories.
pub async fn update_settings(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<UpdateOrgSettingsForm>,
) -> Response {
    let (actor, mut target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let result = state
        .settings()
        .update_settings(&actor, &mut target, form)
        .await;
    respond_result(&headers, result)
}
