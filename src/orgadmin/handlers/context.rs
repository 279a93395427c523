//! Actor and target resolution shared by every settings handler.

use axum::{
    http::{HeaderMap, StatusCode, header::COOKIE},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::orgadmin::AppState;
use crate::settings::{ActorContext, OrganizationTarget};

pub(crate) const SESSION_COOKIE: &str = "orgadmin_session";

/// Returns the value of cookie `name`, looking through every `Cookie` header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| val.trim().to_string())
        })
}

/// Resolve the session cookie into an actor, or `401` when it is missing or unknown.
pub(crate) async fn require_actor(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<ActorContext, Response> {
    let Some(token) = cookie_value(headers, SESSION_COOKIE).filter(|token| !token.is_empty())
    else {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    };
    match state.sessions().actor(&token).await {
        Ok(Some(actor)) => Ok(actor),
        Ok(None) => Err(StatusCode::UNAUTHORIZED.into_response()),
        Err(err) => {
            error!("Failed to lookup session: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// Authenticate the actor and resolve the organization they want to manage.
///
/// Unknown organizations and organizations the actor may not manage both
/// answer `404`.
pub(crate) async fn authorize(
    headers: &HeaderMap,
    state: &AppState,
    org_name: &str,
) -> Result<(ActorContext, OrganizationTarget), Response> {
    let actor = require_actor(headers, state).await?;
    let directory = state.settings().directory();

    let organization = match directory.find_organization(org_name).await {
        Ok(Some(organization)) => organization,
        Ok(None) => return Err(StatusCode::NOT_FOUND.into_response()),
        Err(err) => {
            error!("Failed to resolve organization: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };

    if !actor.is_admin {
        match directory.is_owner(organization.id, actor.account_id).await {
            Ok(true) => {}
            Ok(false) => return Err(StatusCode::NOT_FOUND.into_response()),
            Err(err) => {
                error!("Failed to check organization ownership: {err}");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        }
    }

    Ok((actor, OrganizationTarget::new(organization, state.app_sub_url())))
}
