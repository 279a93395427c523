//! Build runner listing, creation, and revocation.

use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{
    OrgSettings,
    error::{Rejection, SettingsError},
    outcome::{ADD_RUNNER_SUCCESS, Flash, Outcome, RUNNER_DELETION_SUCCESS, View},
    types::{ListOptions, NewRunnerForm, OrganizationTarget, RunnerKind, RunnerSummary},
};

impl OrgSettings {
    /// # Errors
    /// Returns `SettingsError::Server` if the runners cannot be listed.
    pub async fn runners(&self, target: &OrganizationTarget) -> Result<Outcome, SettingsError> {
        Ok(Outcome::render(self.runners_view(target).await?))
    }

    /// Registers a new hosted runner for the organization. An invalid form
    /// re-renders the runner list with the errors instead of redirecting.
    ///
    /// # Errors
    /// Returns `SettingsError::Server` if listing or creation fails.
    #[instrument(skip_all, fields(org = %target.organization.name))]
    pub async fn create_runner(
        &self,
        target: &OrganizationTarget,
        form: NewRunnerForm,
    ) -> Result<Outcome, SettingsError> {
        if let Err(errors) = form.validate() {
            let view = self.runners_view(target).await?;
            return Ok(Outcome::rejected(view, Rejection::InvalidForm(errors)));
        }

        let runner = self
            .runners
            .create(target.organization.id, RunnerKind::Hosted)
            .await
            .map_err(SettingsError::server("create_runner"))?;
        info!(runner_id = %runner.id, "hosted runner created");

        Ok(Outcome::redirect(
            target.settings_link("/runners"),
            Some(Flash::success(ADD_RUNNER_SUCCESS)),
        ))
    }

    /// Deletes a runner and, for hosted runners, revokes its secret from the
    /// live credential cache before answering.
    #[instrument(skip_all, fields(org = %target.organization.name, %runner_id))]
    pub async fn delete_runner(&self, target: &OrganizationTarget, runner_id: Uuid) -> Outcome {
        let flash = match self.runners.delete(target.organization.id, runner_id).await {
            Ok(runner) => {
                if runner.kind == RunnerKind::Hosted {
                    self.credentials.invalidate(&runner.secret);
                }
                info!(kind = runner.kind.as_str(), "runner deleted");
                Flash::success(RUNNER_DELETION_SUCCESS)
            }
            Err(err) => {
                warn!("failed to delete runner: {err}");
                Flash::error(format!("failed to delete runner: {err}"))
            }
        };

        Outcome::json_redirect(target.settings_link("/runners"), flash)
    }

    async fn runners_view(&self, target: &OrganizationTarget) -> Result<View, SettingsError> {
        let runners = self
            .runners
            .list(target.organization.id, ListOptions::default())
            .await
            .map_err(SettingsError::server("list_runners"))?;

        Ok(View::Runners {
            base_link: target.settings_link(""),
            runners: runners.iter().map(RunnerSummary::from).collect(),
        })
    }
}
