use super::handlers::{avatar, delete, health, hooks, labels, runners, settings};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` document. Handlers sharing a path go
/// in the same `routes!` call.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(settings::show_settings, settings::update_settings))
        .routes(routes!(avatar::set_avatar))
        .routes(routes!(avatar::delete_avatar))
        .routes(routes!(delete::confirm_delete, delete::delete_organization))
        .routes(routes!(hooks::list_webhooks))
        .routes(routes!(hooks::delete_webhook))
        .routes(routes!(labels::list_labels))
        .routes(routes!(runners::list_runners))
        .routes(routes!(runners::create_runner))
        .routes(routes!(runners::delete_runner))
        .routes(routes!(runners::whoami));

    let mut settings_tag = Tag::new("settings");
    settings_tag.description = Some("Organization settings".to_string());

    let mut runners_tag = Tag::new("runners");
    runners_tag.description = Some("Build runners and their credentials".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service health".to_string());

    router.get_openapi_mut().tags = Some(vec![settings_tag, runners_tag, health_tag]);

    router
}

/// Document info taken from the package manifest.
fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(non_empty(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    // Cargo joins multiple authors with ':'; the first one is the contact.
    info.contact = env!("CARGO_PKG_AUTHORS")
        .split(':')
        .next()
        .and_then(|author| match parse_author(author) {
            (None, None) => None,
            (name, email) => {
                let mut contact = Contact::new();
                contact.name = name.map(str::to_string);
                contact.email = email.map(str::to_string);
                Some(contact)
            }
        });

    info.license = non_empty(env!("CARGO_PKG_LICENSE")).map(|spdx| {
        let mut license = License::new(spdx);
        license.identifier = Some(spdx.to_string());
        license
    });

    OpenApiBuilder::new().info(info).build()
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

/// Splits `Name <email>` into its parts.
fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, rest)) => (non_empty(name), non_empty(rest.trim_end_matches('>'))),
        None => (non_empty(author), None),
    }
}
