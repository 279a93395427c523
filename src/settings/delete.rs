//! Organization deletion: confirm, re-authenticate, delete.

use secrecy::SecretString;
use tracing::{info, instrument};

use super::{
    OrgSettings,
    error::{RegistryError, Rejection, SettingsError},
    outcome::{Flash, Outcome, STILL_OWN_REPO, View},
    types::{ActorContext, OrganizationTarget},
};

impl OrgSettings {
    #[must_use]
    pub fn delete_confirm(&self) -> Outcome {
        Outcome::render(View::Delete {})
    }

    /// Deletes the organization after re-verifying the actor's own password.
    ///
    /// A wrong password re-renders the confirmation form; an organization that
    /// still owns repositories is bounced back to the confirmation page with a
    /// flash message. On success the actor lands on the application root.
    ///
    /// # Errors
    /// Returns `SettingsError::Server` for any other directory failure.
    #[instrument(skip_all, fields(org = %target.organization.name, actor = %actor.name))]
    pub async fn delete(
        &self,
        actor: &ActorContext,
        target: &OrganizationTarget,
        password: &SecretString,
    ) -> Result<Outcome, SettingsError> {
        match self.directory.verify_password(actor.account_id, password).await {
            Ok(()) => {}
            Err(RegistryError::AccountNotFound) => {
                return Ok(Outcome::rejected(View::Delete {}, Rejection::InvalidPassword));
            }
            Err(err) => return Err(SettingsError::server("verify_password")(err)),
        }

        match self.directory.delete_organization(&target.organization).await {
            Ok(()) => {
                info!(org = %target.organization.name, "organization deleted");
                Ok(Outcome::redirect(format!("{}/", target.app_sub_url()), None))
            }
            Err(RegistryError::StillOwnsRepos(_)) => Ok(Outcome::redirect(
                target.settings_link("/delete"),
                Some(Flash::error(STILL_OWN_REPO)),
            )),
            Err(err) => Err(SettingsError::server("delete_organization")(err)),
        }
    }
}
