//! Connection-related data models.
//!
//! This module defines the supported backends and the resolved connection target
//! the pool is built from.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use url::Url;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::SQLite => "SQLite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Where the pool connects to, with driver options already parsed.
#[derive(Debug, Clone)]
pub struct ConnectionTarget {
    kind: TargetKind,
    /// Display-safe description (credentials masked)
    description: String,
}

#[derive(Debug, Clone)]
enum TargetKind {
    Postgres(PgConnectOptions),
    Sqlite(SqliteConnectOptions),
}

/// Errors that can occur when resolving a connection target.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionTargetError {
    #[error("Unknown database type in connection string (expected postgres:// or sqlite:)")]
    UnknownDatabaseType,

    #[error("Invalid {db_type} connection string: {message}")]
    InvalidConnectionString {
        db_type: DatabaseType,
        message: String,
    },
}

impl ConnectionTarget {
    /// Resolve a target from a `postgres://` or `sqlite:` URL.
    ///
    /// SQLite files are created when missing.
    pub fn from_url(connection_string: &str) -> Result<Self, ConnectionTargetError> {
        let db_type = DatabaseType::from_connection_string(connection_string)
            .ok_or(ConnectionTargetError::UnknownDatabaseType)?;
        let invalid = |e: sqlx::Error| ConnectionTargetError::InvalidConnectionString {
            db_type,
            message: e.to_string(),
        };

        let kind = match db_type {
            DatabaseType::PostgreSQL => {
                TargetKind::Postgres(PgConnectOptions::from_str(connection_string).map_err(invalid)?)
            }
            DatabaseType::SQLite => TargetKind::Sqlite(
                SqliteConnectOptions::from_str(connection_string)
                    .map_err(invalid)?
                    .create_if_missing(true),
            ),
        };

        Ok(Self {
            kind,
            description: mask_password(connection_string),
        })
    }

    /// Build a PostgreSQL target from individual settings.
    pub fn postgres(
        host: &str,
        port: Option<u16>,
        user: &str,
        password: Option<&str>,
        database: &str,
    ) -> Self {
        let mut options = PgConnectOptions::new()
            .host(host)
            .username(user)
            .database(database);
        if let Some(port) = port {
            options = options.port(port);
        }
        if let Some(password) = password {
            options = options.password(password);
        }

        let port_part = port.map(|p| format!(":{}", p)).unwrap_or_default();
        let password_part = if password.is_some() { ":****" } else { "" };
        let description = format!(
            "postgres://{}{}@{}{}/{}",
            user, password_part, host, port_part, database
        );

        Self {
            kind: TargetKind::Postgres(options),
            description,
        }
    }

    /// Get the database type for this target.
    pub fn db_type(&self) -> DatabaseType {
        match self.kind {
            TargetKind::Postgres(_) => DatabaseType::PostgreSQL,
            TargetKind::Sqlite(_) => DatabaseType::SQLite,
        }
    }

    /// Display-safe description of the target.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn postgres_options(&self) -> Option<&PgConnectOptions> {
        match &self.kind {
            TargetKind::Postgres(options) => Some(options),
            TargetKind::Sqlite(_) => None,
        }
    }

    pub(crate) fn sqlite_options(&self) -> Option<&SqliteConnectOptions> {
        match &self.kind {
            TargetKind::Sqlite(options) => Some(options),
            TargetKind::Postgres(_) => None,
        }
    }
}

/// Replace the password of a URL with `****`; strings that do not parse are
/// returned unchanged when they carry no userinfo.
fn mask_password(connection_string: &str) -> String {
    match Url::parse(connection_string) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) if connection_string.contains('@') => "<redacted>".to_string(),
        Err(_) => connection_string.to_string(),
    }
}
