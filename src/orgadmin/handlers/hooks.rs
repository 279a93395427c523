use axum::{
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use super::{
    INVALID_ID, IdQuery, RedirectResponse, ViewResponse,
    context::authorize,
    render::{respond, respond_result},
};
use crate::orgadmin::AppState;
use crate::settings::{Flash, Outcome};

#[utoipa::path(
    get,
    path = "/org/{org}/settings/hooks",
    params(("org" = String, Path, description = "Organization name")),
    responses(
        (status = 200, description = "Webhook list view.", body = ViewResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
        (status = 500, description = "Webhooks could not be listed."),
    ),
    tag = "settings"
)]
pub async fn list_webhooks(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    respond_result(&headers, state.settings().webhooks(&target).await)
}

#[utoipa::path(
    post,
    path = "/org/{org}/settings/hooks/delete",
    params(
        ("org" = String, Path, description = "Organization name"),
        IdQuery,
    ),
    responses(
        (status = 200, description = "Redirect target; the outcome travels as a flash message.", body = RedirectResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
    ),
    tag = "settings"
)]
pub async fn delete_webhook(
    Path(org): Path<String>,
    query: Result<Query<IdQuery>, QueryRejection>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let Some(webhook_id) = query.map(|Query(query)| query).unwrap_or_default().parsed() else {
        warn!(org = %target.organization.name, "webhook delete without a valid id");
        let flash = Flash::error(format!("failed to delete webhook: {INVALID_ID}"));
        return respond(
            &headers,
            Outcome::json_redirect(target.settings_link("/hooks"), flash),
        );
    };

    respond(
        &headers,
        state.settings().delete_webhook(&target, webhook_id).await,
    )
}
