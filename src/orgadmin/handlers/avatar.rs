use axum::{
    extract::{
        Extension, Multipart, Path,
        multipart::{MultipartError, MultipartRejection},
    },
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use super::{context::authorize, render::respond};
use crate::orgadmin::AppState;
use crate::settings::{
    Flash, Outcome,
    types::{AvatarForm, AvatarSource},
};

const AVATAR_FIELD: &str = "avatar";

#[utoipa::path(
    post,
    path = "/org/{org}/settings/avatar",
    params(("org" = String, Path, description = "Organization name")),
    request_body(content_type = "multipart/form-data", description = "Image in the `avatar` field."),
    responses(
        (status = 303, description = "Redirects to the settings page with a flash message."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
    ),
    tag = "settings"
)]
pub async fn set_avatar(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let content = match multipart {
        Ok(multipart) => read_avatar(multipart).await.map_err(|err| err.body_text()),
        Err(rejection) => Err(rejection.body_text()),
    };

    // Unreadable uploads, including ones over the body limit, bounce like a
    // rejected image.
    let content = match content {
        Ok(content) => content,
        Err(message) => {
            warn!(org = %target.organization.name, "avatar upload unreadable: {message}");
            let flash = Flash::error(format!("avatar upload failed: {message}"));
            return respond(
                &headers,
                Outcome::redirect(target.settings_link(""), Some(flash)),
            );
        }
    };

    let form = AvatarForm {
        source: AvatarSource::Local,
        content,
    };
    respond(&headers, state.settings().set_avatar(&target, form).await)
}

/// Bytes of the last `avatar` field; other fields are skipped.
async fn read_avatar(mut multipart: Multipart) -> Result<Vec<u8>, MultipartError> {
    let mut content = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(AVATAR_FIELD) {
            content = field.bytes().await?.to_vec();
        }
    }
    Ok(content)
}

#[utoipa::path(
    post,
    path = "/org/{org}/settings/avatar/delete",
    params(("org" = String, Path, description = "Organization name")),
    responses(
        (status = 303, description = "Redirects to the settings page."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Organization not found."),
    ),
    tag = "settings"
)]
pub async fn delete_avatar(
    Path(org): Path<String>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    let (_actor, target) = match authorize(&headers, &state, &org).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    respond(&headers, state.settings().delete_avatar(&target).await)
}
