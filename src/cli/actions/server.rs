use crate::{cli::telemetry, orgadmin};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub app_sub_url: String,
    pub avatar_dir: PathBuf,
    pub avatar_max_bytes: usize,
    pub label_templates: Vec<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = orgadmin::ServerConfig {
        port: args.port,
        dsn: args.dsn,
        app_sub_url: args.app_sub_url,
        avatar_dir: args.avatar_dir,
        avatar_max_bytes: args.avatar_max_bytes,
        label_templates: args.label_templates,
    };
    debug!("Server config: {:?}", config);

    let result = orgadmin::new(config).await;
    telemetry::shutdown_tracer();
    result
}
