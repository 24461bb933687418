//! SQL dialect support.
//!
//! Every statement is rendered for exactly one [`Dialect`]. The dialect is
//! passed explicitly to the rendering functions; builders never remember it.

use std::fmt;
use std::str::FromStr;

/// The SQL engines supported by the builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// MySQL and MariaDB.
    #[default]
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite 3.
    Sqlite,
}

/// Returned when parsing an unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported dialect {0:?}")]
pub struct DialectError(pub String);

impl Dialect {
    /// Returns the name of the dialect.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite3",
        }
    }

    /// Returns the identifier quote character.
    #[must_use]
    pub const fn identifier_quote(self) -> char {
        match self {
            Self::Postgres => '"',
            Self::MySql | Self::Sqlite => '`',
        }
    }

    /// Returns the placeholder for the `n`-th (1-based) argument.
    #[must_use]
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::MySql | Self::Sqlite => String::from("?"),
        }
    }

    /// Returns whether the dialect supports the RETURNING clause.
    #[must_use]
    pub const fn supports_returning(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Maximum length of an identifier (table, index or constraint name).
    #[must_use]
    pub const fn max_identifier_len(self) -> usize {
        match self {
            Self::Postgres => 63,
            Self::MySql | Self::Sqlite => 64,
        }
    }

    /// Quotes an identifier.
    #[must_use]
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Self::Postgres if name.contains('`') => name.replace('`', "\""),
            _ => {
                let quote = self.identifier_quote();
                format!("{quote}{name}{quote}")
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(DialectError(other.to_string())),
        }
    }
}
