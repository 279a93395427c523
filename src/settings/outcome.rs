//! What a controller operation asks the HTTP layer to do.

use serde::{Deserialize, Serialize};

use super::{
    error::Rejection,
    types::{Organization, RunnerSummary, UpdateOrgSettingsForm, Visibility, Webhook},
};

pub const UPDATE_SETTING_SUCCESS: &str = "org.settings.update_setting_success";
pub const UPDATE_AVATAR_SUCCESS: &str = "org.settings.update_avatar_success";
pub const STILL_OWN_REPO: &str = "form.org_still_own_repo";
pub const WEBHOOK_DELETION_SUCCESS: &str = "repo.settings.webhook_deletion_success";
pub const ADD_RUNNER_SUCCESS: &str = "org.settings.add_runner_success";
pub const RUNNER_DELETION_SUCCESS: &str = "org.settings.runner_deletion_success";

/// One-shot notification that survives a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Flash {
    Success(String),
    Error(String),
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

#[derive(Debug, Serialize)]
pub struct OrgView {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub visibility: Visibility,
    pub max_repo_creation: i32,
    pub repo_admin_change_team_access: bool,
    pub num_repos: i64,
    pub avatar: Option<String>,
}

impl From<&Organization> for OrgView {
    fn from(org: &Organization) -> Self {
        Self {
            name: org.name.clone(),
            full_name: org.full_name.clone(),
            description: org.description.clone(),
            website: org.website.clone(),
            location: org.location.clone(),
            visibility: org.visibility,
            max_repo_creation: org.max_repo_creation,
            repo_admin_change_team_access: org.repo_admin_change_team_access,
            num_repos: org.num_repos,
            avatar: org.use_custom_avatar.then(|| org.avatar.clone()).flatten(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum View {
    Options {
        org: OrgView,
        current_visibility: Visibility,
        repo_admin_change_team_access: bool,
        /// Submitted values echoed back when the form is re-rendered.
        #[serde(skip_serializing_if = "Option::is_none")]
        form: Option<UpdateOrgSettingsForm>,
    },
    Delete {},
    Hooks {
        base_link: String,
        webhooks: Vec<Webhook>,
    },
    Labels {
        templates: Vec<String>,
    },
    Runners {
        base_link: String,
        runners: Vec<RunnerSummary>,
    },
}

impl View {
    #[must_use]
    pub fn template(&self) -> &'static str {
        match self {
            Self::Options { .. } => "org/settings/options",
            Self::Delete {} => "org/settings/delete",
            Self::Hooks { .. } => "org/settings/hooks",
            Self::Labels { .. } => "org/settings/labels",
            Self::Runners { .. } => "org/settings/runners",
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Render {
        view: View,
        rejection: Option<Rejection>,
    },
    Redirect {
        location: String,
        flash: Option<Flash>,
    },
    /// Asynchronous UI pattern: HTTP 200 with `{"redirect": url}`, status never
    /// reflects whether the operation itself succeeded.
    JsonRedirect {
        redirect: String,
        flash: Option<Flash>,
    },
}

impl Outcome {
    #[must_use]
    pub fn render(view: View) -> Self {
        Self::Render {
            view,
            rejection: None,
        }
    }

    #[must_use]
    pub fn rejected(view: View, rejection: Rejection) -> Self {
        Self::Render {
            view,
            rejection: Some(rejection),
        }
    }

    #[must_use]
    pub fn redirect(location: String, flash: Option<Flash>) -> Self {
        Self::Redirect { location, flash }
    }

    #[must_use]
    pub fn json_redirect(redirect: String, flash: Flash) -> Self {
        Self::JsonRedirect {
            redirect,
            flash: Some(flash),
        }
    }

    /// The rejection of a re-rendered form, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Render { rejection, .. } => rejection.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn flash(&self) -> Option<&Flash> {
        match self {
            Self::Redirect { flash, .. } | Self::JsonRedirect { flash, .. } => flash.as_ref(),
            Self::Render { .. } => None,
        }
    }

    /// Redirect target of either redirect flavour.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location, .. } => Some(location),
            Self::JsonRedirect { redirect, .. } => Some(redirect),
            Self::Render { .. } => None,
        }
    }
}
