//! Organization deletion: confirmation page and password-checked delete.

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
use crate::settings::types::DeleteOrgForm;

#[utoipa::path(
    get,
    path = "/org/{org}/settings/delete",
    params(("org" = String, Path, description = "Organization name")),
    responses(
        (status = 200, description = "Delete confirmation view.", body = ViewResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
    ),
    tag = "settings"
)]
pub async fn confirm_delete(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    if let Err(response) = authorize(&headers, &state, &org).await {
        return response;
    }

    respond(&headers, state.settings().delete_confirm())
}

/// Deletes the organization after re-checking the actor's own password.
/// Organizations that still own repositories are not deleted.
#[utoipa::path(
    post,
    path = "/org/{org}/settings/delete",
    params(("org" = String, Path, description = "Organization name")),
    request_body(content = DeleteOrgForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Wrong password; confirmation re-rendered.", body = ViewResponse),
        (status = 303, description = "Deleted, or bounced back while repositories remain."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
        (status = 500, description = "A registry failed."),
    ),
    tag = "settings"
)]
pub async fn delete_organization(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<DeleteOrgForm>,
) -> Response {
    let (actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let result = state
        .settings()
        .delete(&actor, &target, &form.password)
        .await;
    respond_result(&headers, result)
}
