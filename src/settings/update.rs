//! Settings view, rename and field update, visibility cascade.

use tracing::{instrument, trace};
use validator::Validate;

use super::{
    OrgSettings,
    error::{RegistryError, Rejection, SettingsError},
    outcome::{Flash, Outcome, UPDATE_SETTING_SUCCESS, View},
    types::{ActorContext, ListOptions, Organization, OrganizationTarget, UpdateOrgSettingsForm},
};

impl OrgSettings {
    #[must_use]
    pub fn settings_view(&self, target: &OrganizationTarget) -> Outcome {
        Outcome::render(options_view(&target.organization, None))
    }

    /// Applies a submitted settings form to the organization.
    ///
    /// A changed (case-insensitive) name goes through the uniqueness check and
    /// the directory rename; a case-only change skips both. A changed
    /// visibility is cascaded to every owned repository after the record is
    /// persisted.
    ///
    /// # Errors
    /// Returns `SettingsError::Server` for any registry failure other than an
    /// illegal name.
    #[instrument(skip_all, fields(org = %target.organization.name, actor = %actor.name))]
    pub async fn update_settings(
        &self,
        actor: &ActorContext,
        target: &mut OrganizationTarget,
        form: UpdateOrgSettingsForm,
    ) -> Result<Outcome, SettingsError> {
        if let Err(errors) = form.validate() {
            return Ok(rejected(target, form, Rejection::InvalidForm(errors)));
        }

        let lower_name = form.name.to_lowercase();
        if target.organization.lower_name != lower_name {
            let taken = self
                .directory
                .name_exists(target.organization.id, &form.name)
                .await
                .map_err(SettingsError::server("name_exists"))?;
            if taken {
                return Ok(rejected(target, form, Rejection::NameTaken));
            }

            match self.directory.rename(&target.organization, &form.name).await {
                Ok(()) => {}
                Err(RegistryError::NameIllegal(_)) => {
                    return Ok(rejected(target, form, Rejection::IllegalName));
                }
                Err(RegistryError::NameTaken) => {
                    return Ok(rejected(target, form, Rejection::NameTaken));
                }
                Err(err) => return Err(SettingsError::server("rename")(err)),
            }

            target.relink(&form.name);
            trace!(from = %target.organization.name, to = %form.name, "organization name changed");
        }

        let org = &mut target.organization;
        // Also covers a pure case change, which never reaches the rename above.
        org.name.clone_from(&form.name);
        org.lower_name = lower_name;

        if actor.is_admin {
            org.max_repo_creation = form.max_repo_creation;
        }

        org.full_name = form.full_name;
        org.description = form.description;
        org.website = form.website;
        org.location = form.location;
        org.repo_admin_change_team_access = form.repo_admin_change_team_access;

        let visibility_changed = form.visibility != org.visibility;
        org.visibility = form.visibility;

        self.directory
            .persist(org)
            .await
            .map_err(SettingsError::server("persist"))?;

        if visibility_changed {
            self.cascade_visibility(&target.organization).await?;
        }

        trace!(org = %target.organization.name, "organization settings updated");
        Ok(Outcome::redirect(
            target.settings_link(""),
            Some(Flash::success(UPDATE_SETTING_SUCCESS)),
        ))
    }

    /// Pushes the organization's visibility onto every owned repository.
    ///
    /// Lists all repositories in one page sized by `num_repos`, then updates
    /// them one at a time. The first failure stops the cascade; nothing is
    /// rolled back.
    async fn cascade_visibility(&self, org: &Organization) -> Result<(), SettingsError> {
        let repositories = self
            .repositories
            .list_owned(org.id, ListOptions::single_page(org.num_repos))
            .await
            .map_err(SettingsError::server("list_owned_repositories"))?;

        for mut repository in repositories {
            repository.owner_visibility = org.visibility;
            self.repositories
                .update(&repository, true)
                .await
                .map_err(SettingsError::server("update_repository"))?;
            trace!(repo = %repository.name, visibility = %org.visibility, "repository visibility cascaded");
        }

        Ok(())
    }
}

fn options_view(org: &Organization, form: Option<UpdateOrgSettingsForm>) -> View {
    View::Options {
        org: org.into(),
        current_visibility: org.visibility,
        repo_admin_change_team_access: org.repo_admin_change_team_access,
        form,
    }
}

fn rejected(
    target: &OrganizationTarget,
    form: UpdateOrgSettingsForm,
    rejection: Rejection,
) -> Outcome {
    Outcome::rejected(options_view(&target.organization, Some(form)), rejection)
}
