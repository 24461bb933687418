//! The narrow driver interface the migration engine runs on.
//!
//! The engine never opens connections itself. It is handed a [`Driver`],
//! opens one [`Tx`] per migration and issues every statement through the
//! [`ExecQuerier`] half of that transaction.

mod debug;
mod sqlite;
mod write;

pub use debug::DebugDriver;
pub use sqlite::SqliteDriver;
pub use write::{expand_args, WriteDriver};

use async_trait::async_trait;
use oxide_sqlgraph::builder::Querier;
use oxide_sqlgraph::{Dialect, SqlValue};

use crate::error::Result;

/// Executes statements and runs queries.
#[async_trait]
pub trait ExecQuerier: Send + Sync {
    /// Executes a statement and returns the number of affected rows.
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64>;

    /// Runs a query and collects its rows.
    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows>;

    /// Renders `q` for `dialect` and executes it.
    async fn exec_querier(&self, q: &(dyn Querier + '_), dialect: Dialect) -> Result<u64> {
        let (sql, args) = q.query(dialect);
        self.exec(&sql, &args).await
    }

    /// Renders `q` for `dialect` and runs it as a query.
    async fn query_querier(&self, q: &(dyn Querier + '_), dialect: Dialect) -> Result<Rows> {
        let (sql, args) = q.query(dialect);
        self.query(&sql, &args).await
    }
}

/// A database connection that can open transactions.
#[async_trait]
pub trait Driver: ExecQuerier {
    /// Starts a transaction.
    async fn tx(&self) -> Result<Box<dyn Tx>>;

    /// The dialect spoken by the underlying database.
    fn dialect(&self) -> Dialect;

    /// Closes the underlying connections.
    async fn close(&self) -> Result<()>;
}

/// An open transaction.
#[async_trait]
pub trait Tx: ExecQuerier {
    /// Commits the transaction.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rolls the transaction back.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

// Boxed transactions and shared drivers are handed around as `&dyn ExecQuerier`.

#[async_trait]
impl ExecQuerier for Box<dyn Tx> {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        (**self).exec(query, args).await
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        (**self).query(query, args).await
    }
}

#[async_trait]
impl ExecQuerier for std::sync::Arc<dyn Driver> {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        (**self).exec(query, args).await
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        (**self).query(query, args).await
    }
}

/// Rows returned by [`ExecQuerier::query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    /// Column names, in select order.
    pub columns: Vec<String>,
    /// Row values, one vector per row.
    pub rows: Vec<Vec<SqlValue>>,
}

impl Rows {
    /// Creates a result set.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when no rows were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// The first column of the first row as an integer.
    ///
    /// Used for `COUNT(*)` style queries. An empty result reads as `None`.
    #[must_use]
    pub fn first_int(&self) -> Option<i64> {
        self.iter().next().and_then(|row| row.int(0))
    }
}

/// A borrowed row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> Row<'a> {
    /// The value at `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&'a SqlValue> {
        self.values.get(i)
    }

    /// The value of the column named `name`, compared case-insensitively.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&'a SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    /// The value at `i` as an integer. Numeric text is parsed.
    #[must_use]
    pub fn int(&self, i: usize) -> Option<i64> {
        match self.get(i)? {
            SqlValue::Int(n) => Some(*n),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            SqlValue::Text(s) => s.trim().parse().ok(),
            #[allow(clippy::cast_possible_truncation)]
            SqlValue::Float(f) => Some(*f as i64),
            SqlValue::Null | SqlValue::Blob(_) => None,
        }
    }

    /// The value at `i` as text. `NULL` reads as `None`.
    #[must_use]
    pub fn text(&self, i: usize) -> Option<String> {
        match self.get(i)? {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            other => Some(other.to_string()),
        }
    }

    /// The value at `i` as a boolean flag (`1`, `true`, `YES`).
    #[must_use]
    pub fn flag(&self, i: usize) -> bool {
        match self.get(i) {
            Some(SqlValue::Bool(b)) => *b,
            Some(SqlValue::Int(n)) => *n != 0,
            Some(SqlValue::Text(s)) => {
                matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "t")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Rows {
        Rows::new(
            vec![String::from("name"), String::from("notnull")],
            vec![
                vec![SqlValue::Text(String::from("id")), SqlValue::Int(1)],
                vec![SqlValue::Null, SqlValue::Text(String::from("YES"))],
            ],
        )
    }

    #[test]
    fn test_rows_accessors() {
        let rows = rows();
        assert_eq!(rows.len(), 2);
        let all: Vec<Row<'_>> = rows.iter().collect();
        assert_eq!(all[0].text(0).as_deref(), Some("id"));
        assert!(all[0].flag(1));
        assert_eq!(all[1].text(0), None);
        assert!(all[1].flag(1));
        assert_eq!(all[0].value("NOTNULL"), Some(&SqlValue::Int(1)));
    }

    #[test]
    fn test_first_int() {
        let rows = Rows::new(vec![String::from("count")], vec![vec![SqlValue::Text(String::from("3"))]]);
        assert_eq!(rows.first_int(), Some(3));
        assert_eq!(Rows::default().first_int(), None);
    }
}
