//! Maps validated CLI matches to the action the binary executes.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{
    ARG_APP_SUB_URL, ARG_AVATAR_DIR, ARG_AVATAR_MAX_BYTES, ARG_DSN, ARG_LABEL_TEMPLATES, ARG_PORT,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    let app_sub_url = matches
        .get_one::<String>(ARG_APP_SUB_URL)
        .cloned()
        .unwrap_or_default();
    let avatar_dir = matches
        .get_one::<PathBuf>(ARG_AVATAR_DIR)
        .cloned()
        .context("missing argument: --avatar-dir")?;
    let avatar_max_bytes = matches
        .get_one::<usize>(ARG_AVATAR_MAX_BYTES)
        .copied()
        .context("missing argument: --avatar-max-bytes")?;
    let label_templates = matches
        .get_many::<String>(ARG_LABEL_TEMPLATES)
        .map(|values| {
            values
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(Action::Server(Args {
        port,
        dsn: SecretString::from(dsn),
        app_sub_url,
        avatar_dir,
        avatar_max_bytes,
        label_templates,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn builds_server_args() {
        temp_env::with_vars(
            [
                ("ORGADMIN_LABEL_TEMPLATES", None::<&str>),
                ("ORGADMIN_APP_SUB_URL", None),
                ("ORGADMIN_PORT", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec![
                    "orgadmin",
                    "--dsn",
                    "postgres://orgadmin@localhost:5432/orgadmin",
                    "--app-sub-url",
                    "/git",
                    "--label-templates",
                    "Default, ,Kanban",
                ]);
                let Ok(Action::Server(args)) = handler(&matches) else {
                    panic!("expected a server action");
                };
                assert_eq!(args.port, 8080);
                assert_eq!(
                    args.dsn.expose_secret(),
                    "postgres://orgadmin@localhost:5432/orgadmin"
                );
                assert_eq!(args.app_sub_url, "/git");
                assert_eq!(args.label_templates, vec!["Default", "Kanban"]);
            },
        );
    }
}
