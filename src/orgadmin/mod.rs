use crate::{
    settings::{OrgSettings, Registries, SecretCache, registry::Sessions},
    storage::{DiskAvatars, PgRegistry},
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Room for multipart framing on top of the avatar itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppState {
    settings: Arc<OrgSettings>,
    sessions: Arc<dyn Sessions>,
    credentials: Arc<SecretCache>,
    app_sub_url: String,
}

impl AppState {
    #[must_use]
    pub fn new(
        settings: Arc<OrgSettings>,
        sessions: Arc<dyn Sessions>,
        credentials: Arc<SecretCache>,
        app_sub_url: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            sessions,
            credentials,
            app_sub_url: app_sub_url.into(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &OrgSettings {
        &self.settings
    }

    #[must_use]
    pub fn credentials(&self) -> &SecretCache {
        &self.credentials
    }

    #[must_use]
    pub fn app_sub_url(&self) -> &str {
        &self.app_sub_url
    }

    pub(crate) fn sessions(&self) -> &dyn Sessions {
        self.sessions.as_ref()
    }
}

#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub dsn: SecretString,
    pub app_sub_url: String,
    pub avatar_dir: PathBuf,
    pub avatar_max_bytes: usize,
    pub label_templates: Vec<String>,
}

/// Assemble the routed application: documented routes, Swagger UI, and the
/// request-id/tracing layers.
#[must_use]
pub fn app(state: Arc<AppState>, body_limit: usize) -> Router {
    let (router, openapi) = router().split_for_parts();
    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(Extension(state)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(config: ServerConfig) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(config.dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    let registry = Arc::new(PgRegistry::new(pool.clone()));
    // The controller invalidates through the same cache the runner endpoint reads.
    let credentials = Arc::new(SecretCache::new());
    let avatars = Arc::new(DiskAvatars::new(
        pool,
        config.avatar_dir,
        config.avatar_max_bytes,
    ));

    let settings = OrgSettings::new(
        Registries {
            directory: registry.clone(),
            repositories: registry.clone(),
            webhooks: registry.clone(),
            runners: registry.clone(),
            credentials: credentials.clone(),
            avatars,
        },
        config.label_templates,
    );
    let state = Arc::new(AppState::new(
        Arc::new(settings),
        registry,
        credentials,
        config.app_sub_url,
    ));

    let app = app(state, config.avatar_max_bytes + MULTIPART_OVERHEAD);

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!("Listening on [::]:{}", config.port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
