//! UPDATE statement builder.

use super::insert::write_schema;
use super::predicate::{and, Predicate};
use super::select::table;
use super::value::{SqlValue, ToSqlValue};
use super::{Builder, Querier};

#[derive(Debug, Clone)]
enum Assignment {
    Value(SqlValue),
    Add(SqlValue),
}

/// An UPDATE statement builder.
#[derive(Debug, Clone, Default)]
pub struct Update {
    table: String,
    schema: Option<String>,
    nulls: Vec<String>,
    columns: Vec<(String, Assignment)>,
    where_clause: Option<Predicate>,
}

/// Starts an UPDATE of `table`.
#[must_use]
pub fn update(table: &str) -> Update {
    Update {
        table: table.to_string(),
        ..Update::default()
    }
}

impl Update {
    /// Sets the schema of the table. Ignored on SQLite.
    #[must_use]
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// `column = value`
    #[must_use]
    pub fn set<T: ToSqlValue>(mut self, column: &str, value: T) -> Self {
        self.columns
            .push((column.to_string(), Assignment::Value(value.to_sql_value())));
        self
    }

    /// `column = COALESCE(table.column, 0) + value`
    #[must_use]
    pub fn add<T: ToSqlValue>(mut self, column: &str, value: T) -> Self {
        self.columns
            .push((column.to_string(), Assignment::Add(value.to_sql_value())));
        self
    }

    /// `column = NULL`
    #[must_use]
    pub fn set_null(mut self, column: &str) -> Self {
        self.nulls.push(column.to_string());
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

    /// Returns true if no column is updated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nulls.is_empty() && self.columns.is_empty()
    }
}

impl Querier for Update {
    fn render(&self, b: &mut Builder) {
        b.write_str("UPDATE ");
        write_schema(b, self.schema.as_deref());
        b.ident(&self.table).write_str(" SET ");
        for (i, c) in self.nulls.iter().enumerate() {
            if i > 0 {
                b.comma();
            }
            b.ident(c).write_str(" = NULL");
        }
        if !self.nulls.is_empty() && !self.columns.is_empty() {
            b.comma();
        }
        for (i, (c, assignment)) in self.columns.iter().enumerate() {
            if i > 0 {
                b.comma();
            }
            b.ident(c).write_str(" = ");
            match assignment {
                Assignment::Value(v) => {
                    b.value(v.clone());
                }
                Assignment::Add(v) => {
                    b.write_str("COALESCE")
                        .nested(|b| {
                            b.ident(&table(&self.table).c(c)).comma().write_char('0');
                        })
                        .write_str(" + ")
                        .value(v.clone());
                }
            }
        }
        if let Some(p) = &self.where_clause {
            b.write_str(" WHERE ").join(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{eq, or};
    use crate::dialect::Dialect;

    #[test]
    fn test_update_set() {
        let (sql, args) = update("users")
            .set("name", "foo")
            .where_clause(eq("name", "bar"))
            .query(Dialect::Postgres);
        assert_eq!(sql, r#"UPDATE "users" SET "name" = $1 WHERE "name" = $2"#);
        assert_eq!(
            args,
            vec![SqlValue::Text("foo".into()), SqlValue::Text("bar".into())]
        );
    }

    #[test]
    fn test_update_nulls_first() {
        let (sql, _) = update("users")
            .set("name", "a8m")
            .set_null("spouse_id")
            .query(Dialect::MySql);
        assert_eq!(sql, "UPDATE `users` SET `spouse_id` = NULL, `name` = ?");
    }

    #[test]
    fn test_update_add() {
        let (sql, args) = update("users")
            .add("age", 1)
            .set("name", "a")
            .query(Dialect::MySql);
        assert_eq!(
            sql,
            "UPDATE `users` SET `age` = COALESCE(`users`.`age`, 0) + ?, `name` = ?"
        );
        assert_eq!(args, vec![SqlValue::Int(1), SqlValue::Text("a".into())]);
        let (sql, _) = update("users").add("age", 1).query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"UPDATE "users" SET "age" = COALESCE("users"."age", 0) + $1"#
        );
    }

    #[test]
    fn test_update_repeated_where() {
        let p1 = eq("name", "bar");
        let p2 = or(vec![eq("age", 10), eq("age", 20)]);
        let (sql, args) = update("users")
            .set("name", "foo")
            .where_clause(p1.clone())
            .where_clause(p2.clone())
            .where_clause(p1)
            .where_clause(p2)
            .query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"UPDATE "users" SET "name" = $1 WHERE (("name" = $2 AND ("age" = $3 OR "age" = $4)) AND "name" = $5) AND ("age" = $6 OR "age" = $7)"#
        );
        assert_eq!(args.len(), 7);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(update("users").is_empty());
        assert!(!update("users").set_null("a").is_empty());
    }
}
