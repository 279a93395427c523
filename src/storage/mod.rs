//! Postgres and disk adapters for the settings registries.
//!
//! `PgRegistry` implements every record-store trait the controller consumes
//! over one shared pool; `DiskAvatars` keeps avatar files on local disk and
//! records the reference on the account row. SQL lives next to the trait it
//! implements, one file per registry.

mod avatars;
mod directory;
mod repositories;
mod runners;
mod sessions;
mod webhooks;

use sqlx::{PgPool, postgres::PgRow};
use std::str::FromStr;

use crate::settings::RegistryError;

pub use avatars::DiskAvatars;
pub use directory::is_legal_name;
pub use sessions::hash_session_token;

/// Formats `created_at` the same way for every table.
const CREATED_AT_UTC: &str =
    r#"to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at"#;

#[derive(Clone, Debug)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Returns `true` when `err` is a Postgres unique violation (`23505`).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Parses a text column into one of the domain enums.
fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, RegistryError>
where
    T: FromStr<Err = String>,
{
    use sqlx::Row;

    let value: String = row.try_get(column)?;
    value.parse().map_err(RegistryError::Backend)
}
