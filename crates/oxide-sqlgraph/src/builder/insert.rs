//! INSERT statement builder.

use super::value::{SqlValue, ToSqlValue};
use super::{Builder, Querier};
use crate::dialect::Dialect;

/// An INSERT statement builder supporting single-row `set` and multi-row
/// `values`.
#[derive(Debug, Clone, Default)]
pub struct Insert {
    table: String,
    schema: Option<String>,
    columns: Vec<String>,
    values: Vec<Vec<SqlValue>>,
    default_values: bool,
    returning: Vec<String>,
}

/// Starts an INSERT into `table`.
#[must_use]
pub fn insert(table: &str) -> Insert {
    Insert {
        table: table.to_string(),
        ..Insert::default()
    }
}

impl Insert {
    /// Sets the schema of the table. Ignored on SQLite.
    #[must_use]
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Adds a column and its value to the first row.
    #[must_use]
    pub fn set<T: ToSqlValue>(mut self, column: &str, value: T) -> Self {
        self.columns.push(column.to_string());
        if self.values.is_empty() {
            self.values.push(Vec::new());
        }
        self.values[0].push(value.to_sql_value());
        self
    }

    /// Sets the column list for `values`.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns
            .extend(columns.iter().map(ToString::to_string));
        self
    }

    /// Adds a row of values.
    #[must_use]
    pub fn values(mut self, row: Vec<SqlValue>) -> Self {
        self.values.push(row);
        self
    }

    /// Inserts a row made only of default values when no columns are given.
    #[must_use]
    pub const fn default_values(mut self) -> Self {
        self.default_values = true;
        self
    }

    /// Adds a `RETURNING` clause. Only rendered on dialects supporting it.
    #[must_use]
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning = columns.iter().map(ToString::to_string).collect();
        self
    }
}

impl Querier for Insert {
    fn render(&self, b: &mut Builder) {
        b.write_str("INSERT INTO ");
        write_schema(b, self.schema.as_deref());
        b.ident(&self.table).pad();
        if self.default_values && self.columns.is_empty() {
            match b.dialect() {
                Dialect::MySql => b.write_str("VALUES ()"),
                Dialect::Postgres | Dialect::Sqlite => b.write_str("DEFAULT VALUES"),
            };
        } else {
            b.nested(|b| {
                b.ident_comma(&self.columns);
            });
            b.write_str(" VALUES ");
            for (i, row) in self.values.iter().enumerate() {
                if i > 0 {
                    b.comma();
                }
                b.nested(|b| {
                    b.args(row);
                });
            }
        }
        if !self.returning.is_empty() && b.dialect().supports_returning() {
            b.write_str(" RETURNING ").ident_comma(&self.returning);
        }
    }
}

pub(crate) fn write_schema(b: &mut Builder, schema: Option<&str>) {
    if let Some(schema) = schema {
        if b.dialect() != Dialect::Sqlite {
            b.ident(schema).write_char('.');
        }
    }
}
