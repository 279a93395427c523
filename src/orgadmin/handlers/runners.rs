//! Build runner pages and the runner-facing credential check.

use axum::{
    Form, Json,
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    INVALID_ID, IdQuery, RedirectResponse, ViewResponse,
    context::authorize,
    render::{respond, respond_result},
};
use crate::orgadmin::AppState;
use crate::settings::{Flash, Outcome, types::NewRunnerForm};

#[derive(Debug, Serialize, ToSchema)]
pub struct RunnerIdentity {
    pub runner_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/org/{org}/settings/runners",
    params(("org" = String, Path, description = "Organization name")),
    responses(
        (status = 200, description = "Runner list view.", body = ViewResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
        (status = 500, description = "Runners could not be listed."),
    ),
    tag = "runners"
)]
pub async fn list_runners(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    respond_result(&headers, state.settings().runners(&target).await)
}

#[utoipa::path(
    post,
    path = "/org/{org}/settings/runners/new",
    params(("org" = String, Path, description = "Organization name")),
    request_body(content = NewRunnerForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Form re-rendered with an error.", body = ViewResponse),
        (status = 303, description = "Created; redirects to the runner list."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
        (status = 500, description = "The runner could not be created."),
    ),
    tag = "runners"
)]
pub async fn create_runner(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<NewRunnerForm>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    respond_result(
        &headers,
        state.settings().create_runner(&target, form).await,
    )
}

/// Deletes a runner. A hosted runner's secret stops authenticating before
/// this returns.
#[utoipa::path(
    post,
    path = "/org/{org}/settings/runners/delete",
    params(
        ("org" = String, Path, description = "Organization name"),
        IdQuery,
    ),
    responses(
        (status = 200, description = "Redirect target; the outcome travels as a flash message.", body = RedirectResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
    ),
    tag = "runners"
)]
pub async fn delete_runner(
    Path(org): Path<String>,
    query: Result<Query<IdQuery>, QueryRejection>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let Some(runner_id) = query.map(|Query(query)| query).unwrap_or_default().parsed() else {
        warn!(org = %target.organization.name, "runner delete without a valid id");
        let flash = Flash::error(format!("failed to delete runner: {INVALID_ID}"));
        return respond(
            &headers,
            Outcome::json_redirect(target.settings_link("/runners"), flash),
        );
    };

    respond(
        &headers,
        state.settings().delete_runner(&target, runner_id).await,
    )
}

#[utoipa::path(
    get,
    path = "/api/runner/whoami",
    responses(
        (status = 200, description = "The secret belongs to a live hosted runner.", body = RunnerIdentity),
        (status = 401, description = "Missing, unknown, or revoked runner secret."),
    ),
    tag = "runners"
)]
pub async fn whoami(headers: HeaderMap, Extension(state): Extension<Arc<AppState>>) -> Response {
    let Some(secret) = bearer_token(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match state
        .credentials()
        .authenticate(&secret, state.settings().runner_registry())
        .await
    {
        Ok(Some(runner_id)) => (StatusCode::OK, Json(RunnerIdentity { runner_id })).into_response(),
        Ok(None) => StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => {
            error!("Failed to authenticate runner: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<SecretString> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| SecretString::from(token))
}
