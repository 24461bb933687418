//! Per-dialect migration adapters.
//!
//! An adapter knows the metadata queries of its engine, maps logical column
//! types to native ones and back, and renders the DDL fragments used by the
//! migration engine.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use async_trait::async_trait;

use oxide_sqlgraph::builder::{column, ColumnBuilder, IndexBuilder, Selector, TableAlter, TableBuilder};
use oxide_sqlgraph::Dialect;

use crate::driver::ExecQuerier;
use crate::error::Result;
use crate::plan::Statement;
use crate::schema::{Column, ForeignKey, Index, Table};

/// Migration adapter for one SQL engine.
#[async_trait]
pub trait SqlDialect: Send + Sync {
    /// The dialect rendered by this adapter.
    fn dialect(&self) -> Dialect;

    /// Checks the server (version, settings) before migrating.
    async fn init(&mut self, conn: &dyn ExecQuerier) -> Result<()>;

    /// Reports whether table `name` exists.
    async fn table_exist(&self, conn: &dyn ExecQuerier, name: &str) -> Result<bool>;

    /// Reports whether foreign key `fk` of `table` exists.
    async fn fk_exist(&self, conn: &dyn ExecQuerier, table: &Table, fk: &ForeignKey) -> Result<bool>;

    /// Names of the user tables in the current schema, sorted.
    async fn table_names(&self, conn: &dyn ExecQuerier) -> Result<Vec<String>>;

    /// Reads the live description of table `name`.
    async fn table(&self, conn: &dyn ExecQuerier, name: &str) -> Result<Table>;

    /// Statements that make the next generated id of `table` equal `value`.
    async fn set_range(&self, conn: &dyn ExecQuerier, table: &Table, value: i64) -> Result<Vec<Statement>>;

    /// Statement that drops `idx` from `table`.
    async fn drop_index(&self, conn: &dyn ExecQuerier, idx: &Index, table: &str) -> Result<Statement>;

    /// Native type of `c`.
    fn c_type(&self, c: &Column) -> Result<String>;

    /// `CREATE TABLE` for `t`.
    fn t_builder(&self, t: &Table) -> Result<TableBuilder>;

    /// `CREATE INDEX` for `idx` on `table`.
    fn add_index(&self, idx: &Index, table: &str) -> IndexBuilder;

    /// `ALTER TABLE` statements adding, modifying and dropping columns of `table`.
    fn alter_columns(
        &self,
        table: &Table,
        add: &[Column],
        modify: &[Column],
        drop: &[Column],
    ) -> Result<Vec<TableAlter>>;
}

/// Creates the adapter for `dialect`. `schema` restricts introspection to
/// one schema instead of the connection's current one.
#[must_use]
pub fn adapter(dialect: Dialect, schema: Option<&str>) -> Box<dyn SqlDialect> {
    match dialect {
        Dialect::MySql => Box::new(MySqlDialect::new().schema(schema)),
        Dialect::Postgres => Box::new(PostgresDialect::new().schema(schema)),
        Dialect::Sqlite => Box::new(SqliteDialect::new()),
    }
}

/// Runs a `COUNT` query and reports whether it found anything.
pub(crate) async fn exist(conn: &dyn ExecQuerier, q: &Selector, dialect: Dialect) -> Result<bool> {
    let rows = conn.query_querier(q, dialect).await?;
    Ok(rows.first_int().unwrap_or(0) > 0)
}

/// Appends `UNIQUE` for non-key unique columns.
fn unique(b: ColumnBuilder, c: &Column) -> ColumnBuilder {
    if c.unique && !c.is_primary() {
        b.attr("UNIQUE")
    } else {
        b
    }
}

/// Appends `NULL` or `NOT NULL`.
fn nullable(b: ColumnBuilder, c: &Column) -> ColumnBuilder {
    if c.nullable {
        b.attr("NULL")
    } else {
        b.attr("NOT NULL")
    }
}

/// Appends `<clause> <literal>` when the column has a renderable default.
fn default_value(b: ColumnBuilder, c: &Column, clause: &str) -> ColumnBuilder {
    match c.default_literal() {
        Some(literal) => b.attr(&format!("{clause} {literal}")),
        None => b,
    }
}

/// Starts a column definition with its type and extra attributes.
fn typed(adapter: &dyn SqlDialect, c: &Column) -> Result<ColumnBuilder> {
    Ok(column(&c.name).type_(&adapter.c_type(c)?).attr(&c.attr))
}

/// Splits a native type such as `varchar(255)` or `int(10) unsigned` into
/// lower-cased parts.
fn type_fields(native: &str) -> Vec<String> {
    native
        .split(|c: char| c == '(' || c == ')' || c == ' ' || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// A connection serving canned rows, for testing adapters without a server.
#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use oxide_sqlgraph::SqlValue;

    use crate::driver::{ExecQuerier, Rows};
    use crate::error::Result;

    /// Answers a query with the rows of the first pattern it contains.
    #[derive(Default)]
    pub struct MockConn {
        responses: Vec<(&'static str, Rows)>,
        pub log: Mutex<Vec<(String, Vec<SqlValue>)>>,
    }

    impl MockConn {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(mut self, pattern: &'static str, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
            let columns = columns.iter().map(ToString::to_string).collect();
            self.responses.push((pattern, Rows::new(columns, rows)));
            self
        }

        pub fn queries(&self) -> Vec<String> {
            self.log.lock().unwrap().iter().map(|(q, _)| q.clone()).collect()
        }
    }

    pub fn text(s: &str) -> SqlValue {
        SqlValue::Text(s.to_string())
    }

    #[async_trait]
    impl ExecQuerier for MockConn {
        async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
            self.log.lock().unwrap().push((query.to_string(), args.to_vec()));
            Ok(0)
        }

        async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
            self.log.lock().unwrap().push((query.to_string(), args.to_vec()));
            Ok(self
                .responses
                .iter()
                .find(|(pattern, _)| query.contains(pattern))
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_fields() {
        assert_eq!(type_fields("varchar(255)"), vec!["varchar", "255"]);
        assert_eq!(type_fields("INT(10) UNSIGNED"), vec!["int", "10", "unsigned"]);
        assert_eq!(type_fields("enum('a','b')"), vec!["enum", "'a'", "'b'"]);
    }
}
