//! Webhook listing/deletion and the label template passthrough.

use tracing::warn;
use uuid::Uuid;

use super::{
    OrgSettings,
    error::SettingsError,
    outcome::{Flash, Outcome, View, WEBHOOK_DELETION_SUCCESS},
    types::{ListOptions, OrganizationTarget},
};

impl OrgSettings {
    /// # Errors
    /// Returns `SettingsError::Server` if the webhooks cannot be listed.
    pub async fn webhooks(&self, target: &OrganizationTarget) -> Result<Outcome, SettingsError> {
        let webhooks = self
            .webhooks
            .list(target.organization.id, ListOptions::default())
            .await
            .map_err(SettingsError::server("list_webhooks"))?;

        Ok(Outcome::render(View::Hooks {
            base_link: target.settings_link("/hooks"),
            webhooks,
        }))
    }

    /// Deletes one webhook. Failures (including an already-gone webhook) are
    /// reported through the flash channel only.
    pub async fn delete_webhook(&self, target: &OrganizationTarget, webhook_id: Uuid) -> Outcome {
        let flash = match self.webhooks.delete(target.organization.id, webhook_id).await {
            Ok(()) => Flash::success(WEBHOOK_DELETION_SUCCESS),
            Err(err) => {
                warn!(%webhook_id, "failed to delete webhook: {err}");
                Flash::error(format!("failed to delete webhook: {err}"))
            }
        };

        Outcome::json_redirect(target.settings_link("/hooks"), flash)
    }

    #[must_use]
    pub fn labels(&self) -> Outcome {
        Outcome::render(View::Labels {
            templates: self.label_templates.clone(),
        })
    }
}
