//! Domain records and form payloads for organization settings.
//!
//! Records mirror the rows owned by the registries; forms are the decoded
//! request payloads the controller validates before touching any registry.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Access level of an organization and, by inheritance, of its repositories.
#[derive(Debug, Deserialize, Serialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Limited,
    Private,
}

impl Visibility {
    /// Returns the canonical string used in payloads and SQL writes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Limited => "limited",
            Self::Private => "private",
        }
    }

    fn openness(self) -> u8 {
        match self {
            Self::Public => 2,
            Self::Limited => 1,
            Self::Private => 0,
        }
    }

    /// `Public` is more open than `Limited`, which is more open than `Private`.
    #[must_use]
    pub fn is_more_open_than(self, other: Self) -> bool {
        self.openness() > other.openness()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Self::Public),
            "limited" => Ok(Self::Limited),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub lower_name: String,
    pub full_name: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub visibility: Visibility,
    pub repo_admin_change_team_access: bool,
    /// `-1` means the site-wide default applies.
    pub max_repo_creation: i32,
    pub num_repos: i64,
    pub avatar: Option<String>,
    pub use_custom_avatar: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub is_private: bool,
    pub owner_visibility: Visibility,
}

impl Repository {
    /// A private repository stays private whatever its owner does.
    #[must_use]
    pub fn effective_visibility(&self) -> Visibility {
        if self.is_private {
            Visibility::Private
        } else {
            self.owner_visibility
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Webhook {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub url: String,
    pub content_type: String,
    pub events: serde_json::Value,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    /// Platform-hosted runner whose secret lives in the credential cache.
    Hosted,
    /// Externally registered runner managing its own credentials.
    External,
}

impl RunnerKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::External => "external",
        }
    }
}

impl FromStr for RunnerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hosted" => Ok(Self::Hosted),
            "external" => Ok(Self::External),
            other => Err(format!("unknown runner kind: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildRunner {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: RunnerKind,
    pub secret: SecretString,
    pub created_at: String,
}

/// What the runners page shows for one runner.
#[derive(Debug, Serialize, ToSchema)]
pub struct RunnerSummary {
    pub id: Uuid,
    pub kind: RunnerKind,
    /// Only hosted runners expose their token; external runners hold their own.
    pub token: Option<String>,
    pub created_at: String,
}

impl From<&BuildRunner> for RunnerSummary {
    fn from(runner: &BuildRunner) -> Self {
        Self {
            id: runner.id,
            kind: runner.kind,
            token: (runner.kind == RunnerKind::Hosted)
                .then(|| runner.secret.expose_secret().to_string()),
            created_at: runner.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    /// `0` means unpaginated.
    pub page: i64,
    pub page_size: i64,
}

impl ListOptions {
    #[must_use]
    pub fn single_page(page_size: i64) -> Self {
        Self { page: 1, page_size }
    }

    /// Returns `(limit, offset)` for SQL, or `None` when unpaginated.
    #[must_use]
    pub fn limit_offset(self) -> Option<(i64, i64)> {
        if self.page < 1 || self.page_size < 1 {
            return None;
        }
        Some((self.page_size, (self.page - 1) * self.page_size))
    }
}

/// The authenticated account performing the request.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub account_id: Uuid,
    pub name: String,
    pub is_admin: bool,
}

/// The organization a request operates on, plus its canonical link.
#[derive(Debug, Clone)]
pub struct OrganizationTarget {
    pub organization: Organization,
    link: String,
    app_sub_url: String,
}

impl OrganizationTarget {
    #[must_use]
    pub fn new(organization: Organization, app_sub_url: &str) -> Self {
        let app_sub_url = app_sub_url.trim_end_matches('/').to_string();
        let link = org_link(&app_sub_url, &organization.name);
        Self {
            organization,
            link,
            app_sub_url,
        }
    }

    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    #[must_use]
    pub fn app_sub_url(&self) -> &str {
        &self.app_sub_url
    }

    /// Recomputes the link after a rename; the previous link is stale from then on.
    pub fn relink(&mut self, name: &str) {
        self.link = org_link(&self.app_sub_url, name);
    }

    #[must_use]
    pub fn settings_link(&self, suffix: &str) -> String {
        format!("{}/settings{suffix}", self.link)
    }
}

fn org_link(app_sub_url: &str, name: &str) -> String {
    format!("{app_sub_url}/org/{name}")
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateOrgSettingsForm {
    #[validate(length(min = 1, max = 40), custom(function = "validate_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255), custom(function = "validate_website"))]
    pub website: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub location: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_max_repo_creation")]
    pub max_repo_creation: i32,
    #[serde(default)]
    pub repo_admin_change_team_access: bool,
}

fn default_max_repo_creation() -> i32 {
    -1
}

/// Names are limited to `[A-Za-z0-9_.-]`; reserved words are the directory's call.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("alpha_dash_dot"))
    }
}

fn validate_website(website: &str) -> Result<(), ValidationError> {
    if website.is_empty() || url::Url::parse(website).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvatarSource {
    #[default]
    Local,
    Lookup,
}

#[derive(Debug, Clone, Default)]
pub struct AvatarForm {
    pub source: AvatarSource,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct NewRunnerForm {
    #[serde(default = "default_runner_kind")]
    #[validate(custom(function = "validate_hosted_kind"))]
    pub kind: String,
}

fn default_runner_kind() -> String {
    RunnerKind::Hosted.as_str().to_string()
}

fn validate_hosted_kind(kind: &str) -> Result<(), ValidationError> {
    if kind == RunnerKind::Hosted.as_str() {
        Ok(())
    } else {
        Err(ValidationError::new("hosted_only"))
    }
}

#[derive(Deserialize, ToSchema)]
pub struct DeleteOrgForm {
    /// Missing counts as a wrong password.
    #[serde(default = "empty_password")]
    #[schema(value_type = String)]
    pub password: SecretString,
}

fn empty_password() -> SecretString {
    SecretString::from(String::new())
}
