//! Controller outcomes to HTTP responses.

use axum::{
    Json,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use super::flash;
use crate::settings::{Flash, Outcome, Rejection, SettingsError, View};

/// A rendered view: template name, its data, the inline form error and the
/// flash consumed by this request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewResponse {
    pub template: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    #[schema(value_type = Option<Object>)]
    pub error: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub flash: Option<serde_json::Value>,
}

/// Body of the asynchronous delete endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct RedirectResponse {
    pub redirect: String,
}

pub(crate) fn respond_result(
    headers: &HeaderMap,
    result: Result<Outcome, SettingsError>,
) -> Response {
    match result {
        Ok(outcome) => respond(headers, outcome),
        Err(err) => err.into_response(),
    }
}

pub(crate) fn respond(headers: &HeaderMap, outcome: Outcome) -> Response {
    match outcome {
        Outcome::Render { view, rejection } => render(headers, &view, rejection.as_ref()),
        Outcome::Redirect { location, flash } => {
            let Ok(location) = HeaderValue::from_str(&location) else {
                error!("invalid redirect location: {location}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            };
            let mut response = StatusCode::SEE_OTHER.into_response();
            response.headers_mut().insert(LOCATION, location);
            with_flash(response, flash.as_ref())
        }
        Outcome::JsonRedirect { redirect, flash } => {
            let response = (StatusCode::OK, Json(RedirectResponse { redirect })).into_response();
            with_flash(response, flash.as_ref())
        }
    }
}

fn render(headers: &HeaderMap, view: &View, rejection: Option<&Rejection>) -> Response {
    let pending = flash::pending(headers);

    let body = serde_json::to_value(view).and_then(|data| {
        Ok(ViewResponse {
            template: view.template().to_string(),
            data,
            error: rejection
                .map(|rejection| serde_json::to_value(rejection.to_body()))
                .transpose()?,
            flash: pending.as_ref().map(serde_json::to_value).transpose()?,
        })
    });

    let body = match body {
        Ok(body) => body,
        Err(err) => {
            error!("Failed to serialize view {}: {err}", view.template());
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    if pending.is_some() {
        response
            .headers_mut()
            .append(SET_COOKIE, flash::clear_cookie());
    }
    response
}

fn with_flash(mut response: Response, flash: Option<&Flash>) -> Response {
    if let Some(cookie) = flash.and_then(flash::set_cookie) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
