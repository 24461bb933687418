//! Error types for the migration engine.

use std::path::PathBuf;

/// Errors that can occur while inspecting or migrating a schema.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The driver speaks a dialect no adapter exists for.
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// The server version is below what the adapter supports.
    #[error("Unsupported {dialect} version {version} (minimum {minimum})")]
    UnsupportedVersion {
        /// Dialect name.
        dialect: &'static str,
        /// Version reported by the server.
        version: String,
        /// Minimum supported version.
        minimum: &'static str,
    },

    /// SQLite was opened without foreign key enforcement.
    #[error("SQLite foreign_keys pragma is off: missing \"_fk=1\" in the connection string")]
    ForeignKeysDisabled,

    /// The primary key of an existing table differs from the desired one.
    #[error("Changing the primary key of table \"{table}\" is not supported")]
    PrimaryKeyChange {
        /// Table name.
        table: String,
    },

    /// A column type change that may lose data.
    #[error("Changing column type for \"{column}\" is invalid ({from} != {to})")]
    InvalidTypeChange {
        /// Column name.
        column: String,
        /// Current type.
        from: String,
        /// Desired type.
        to: String,
    },

    /// A native column type the adapter cannot map.
    #[error("Unsupported type {ty:?} for column \"{column}\"")]
    UnknownColumnType {
        /// Column name.
        column: String,
        /// Native or logical type.
        ty: String,
    },

    /// Removing uniqueness needs an index drop, which is not enabled.
    #[error("Removing uniqueness of \"{table}\".\"{column}\" requires dropping an index")]
    UniqueChange {
        /// Table name.
        table: String,
        /// Column or index name.
        column: String,
    },

    /// A unique column lost its uniqueness but no backing index was found.
    #[error("Missing index to drop for unique column \"{column}\"")]
    MissingIndex {
        /// Column name.
        column: String,
    },

    /// The type metadata table is full.
    #[error("Max number of types exceeded: {0}")]
    MaxTypesExceeded(usize),

    /// A default value that does not fit the column type.
    #[error("Invalid default value {value:?} for column \"{column}\"")]
    UnsupportedDefault {
        /// Column name.
        column: String,
        /// Offending value.
        value: String,
    },

    /// A statement failed while performing a migration step.
    #[error("{context}: {source}")]
    Exec {
        /// What was being done, e.g. `create table "users"`.
        context: String,
        /// Underlying failure.
        #[source]
        source: Box<MigrateError>,
    },

    /// The migration failed and so did the rollback.
    #[error("{source}: {rollback}")]
    Rollback {
        /// The error that triggered the rollback.
        #[source]
        source: Box<MigrateError>,
        /// The rollback failure.
        rollback: Box<MigrateError>,
    },

    /// Database error passed through from the driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (writing migration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Diff was requested without a migration directory.
    #[error("Migration directory is not configured")]
    NoMigrationDir,

    /// Migration directory does not exist.
    #[error("Migrations directory not found: {0}")]
    MigrationsDirNotFound(PathBuf),

    /// Invalid migration state.
    #[error("Invalid migration state: {0}")]
    InvalidState(String),

    /// Multiple errors occurred.
    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<MigrateError>),
}

impl MigrateError {
    /// Wraps `self` with the step that failed.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Exec {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Attaches step context to fallible results.
pub trait ResultExt<T> {
    /// Wraps the error with `context`.
    fn context(self, context: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| e.context(context()))
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let err = MigrateError::InvalidState(String::from("boom")).context("create table \"users\"");
        assert_eq!(
            err.to_string(),
            "create table \"users\": Invalid migration state: boom"
        );
    }

    #[test]
    fn test_rollback_display() {
        let err = MigrateError::Rollback {
            source: Box::new(MigrateError::PrimaryKeyChange {
                table: String::from("users"),
            }),
            rollback: Box::new(MigrateError::InvalidState(String::from("tx closed"))),
        };
        assert_eq!(
            err.to_string(),
            "Changing the primary key of table \"users\" is not supported: Invalid migration state: tx closed"
        );
    }

    #[test]
    fn test_multiple_display() {
        let err = MigrateError::Multiple(vec![
            MigrateError::NoMigrationDir,
            MigrateError::MaxTypesExceeded(65536),
        ]);
        assert_eq!(
            err.to_string(),
            "Multiple errors occurred:\n  - Migration directory is not configured\n  - Max number of types exceeded: 65536"
        );
    }
}
