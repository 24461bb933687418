//! DELETE statement builder.

use super::insert::write_schema;
use super::predicate::{and, Predicate};
use super::select::Selector;
use super::{Builder, Querier};

/// A DELETE statement builder.
#[derive(Debug, Clone, Default)]
pub struct Delete {
    table: String,
    schema: Option<String>,
    where_clause: Option<Predicate>,
}

/// Starts a DELETE from `table`.
#[must_use]
pub fn delete(table: &str) -> Delete {
    Delete {
        table: table.to_string(),
        ..Delete::default()
    }
}

impl Delete {
    /// Sets the schema of the table. Ignored on SQLite.
    #[must_use]
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Adds a predicate; repeated calls are joined with `AND`.
    #[must_use]
    pub fn where_clause(mut self, p: Predicate) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(prev) => and(vec![prev, p]),
            None => p,
        });
        self
    }

    /// Reuses the source table and `WHERE` predicate of a selector.
    #[must_use]
    pub fn from_select(mut self, s: &Selector) -> Self {
        if let Some(t) = s.table() {
            self.table = t.name().to_string();
        }
        self.where_clause = s.p().cloned();
        self
    }
}

impl Querier for Delete {
    fn render(&self, b: &mut Builder) {
        b.write_str("DELETE FROM ");
        write_schema(b, self.schema.as_deref());
        b.ident(&self.table);
        if let Some(p) = &self.where_clause {
            b.write_str(" WHERE ").join(p);
        }
    }
}
