//! Best-effort avatar operations; failures become flash messages.

use tracing::warn;

use super::{
    OrgSettings,
    outcome::{Flash, Outcome, UPDATE_AVATAR_SUCCESS},
    types::{AvatarForm, AvatarSource, OrganizationTarget},
};

impl OrgSettings {
    /// Uploads a new avatar. Organizations only support locally uploaded
    /// images, so the submitted source is overridden.
    pub async fn set_avatar(&self, target: &OrganizationTarget, mut form: AvatarForm) -> Outcome {
        form.source = AvatarSource::Local;

        let flash = match self.avatars.update_avatar(&target.organization, &form).await {
            Ok(()) => Flash::success(UPDATE_AVATAR_SUCCESS),
            Err(err) => {
                warn!(org = %target.organization.name, "avatar update failed: {err}");
                Flash::error(err.to_string())
            }
        };

        Outcome::redirect(target.settings_link(""), Some(flash))
    }

    pub async fn delete_avatar(&self, target: &OrganizationTarget) -> Outcome {
        let flash = match self.avatars.delete_avatar(&target.organization).await {
            Ok(()) => None,
            Err(err) => {
                warn!(org = %target.organization.name, "avatar removal failed: {err}");
                Some(Flash::error(err.to_string()))
            }
        };

        Outcome::redirect(target.settings_link(""), flash)
    }
}
