//! Dialect-aware SQL builders.
//!
//! Every statement implements [`Querier`]. Rendering takes the dialect as an
//! explicit parameter and writes into a fresh [`Builder`], so a statement can
//! be rendered any number of times, for any dialect, without being consumed.
//!
//! # Example
//!
//! ```rust
//! use oxide_sqlgraph::builder::{eq, select, table, Querier};
//! use oxide_sqlgraph::Dialect;
//!
//! let (sql, args) = select(&[])
//!     .from(table("users"))
//!     .where_clause(eq("name", "a8m"))
//!     .query(Dialect::Postgres);
//!
//! assert_eq!(sql, r#"SELECT * FROM "users" WHERE "name" = $1"#);
//! assert_eq!(args.len(), 1);
//! ```

mod ddl;
mod delete;
mod insert;
mod predicate;
mod select;
mod update;
pub mod value;

pub use ddl::{
    alter_index, alter_table, column, create_index, create_table, describe, drop_index,
    foreign_key, reference, ColumnBuilder, DescribeBuilder, DropIndexBuilder,
    ForeignKeyBuilder, IndexAlter, IndexBuilder, ReferenceBuilder, TableAlter, TableBuilder,
};
pub use delete::{delete, Delete};
pub use insert::{insert, Insert};
pub use predicate::{
    always_false, and, avg, columns_eq, composite_gt, composite_lt, contains, contains_fold,
    count, custom, desc, distinct, eq, equal_fold, gt, gte, has_prefix, has_suffix, in_select,
    in_values, is_null, like, lower, lt, lte, max, min, neq, not, not_in, not_in_select,
    not_null, or, sum, as_, asc, Predicate,
};
pub use select::{select, table, with, SelectTable, Selector, TableView, With};
pub use update::{update, Update};
pub use value::{IntoOperand, Operand, Raw, SqlValue, ToSqlValue};

use crate::dialect::Dialect;

/// A renderable SQL fragment or statement.
pub trait Querier: Send + Sync {
    /// Writes the SQL text and arguments of `self` into `b`.
    fn render(&self, b: &mut Builder);

    /// Renders `self` for the given dialect.
    fn query(&self, dialect: Dialect) -> (String, Vec<SqlValue>) {
        let mut b = Builder::new(dialect);
        self.render(&mut b);
        b.finish()
    }
}

/// Comparison and membership operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `<>`
    Neq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `LIKE`
    Like,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    NotNull,
}

impl Op {
    /// Returns the SQL keyword or symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like => "LIKE",
            Self::IsNull => "IS NULL",
            Self::NotNull => "IS NOT NULL",
        }
    }
}

/// Accumulator of SQL text and bound arguments for a single render.
///
/// Arguments are pushed in the same order their placeholders are written.
#[derive(Debug)]
pub struct Builder {
    dialect: Dialect,
    sql: String,
    args: Vec<SqlValue>,
}

impl Builder {
    /// Creates an empty builder for `dialect`.
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            args: Vec::new(),
        }
    }

    /// The dialect being rendered.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns true when rendering for Postgres.
    #[must_use]
    pub const fn postgres(&self) -> bool {
        matches!(self.dialect, Dialect::Postgres)
    }

    /// Quotes `ident` for the current dialect.
    #[must_use]
    pub fn quote(&self, ident: &str) -> String {
        self.dialect.quote_identifier(ident)
    }

    /// Writes an identifier, quoting it unless it is `*`, already quoted,
    /// a function call or a modifier.
    pub fn ident(&mut self, s: &str) -> &mut Self {
        if s.is_empty() {
            return self;
        }
        let pass = is_func(s) || is_modifier(s);
        if s != "*" && !self.is_quoted(s) && !pass {
            let quoted = self.quote(s);
            self.sql.push_str(&quoted);
        } else if pass && self.postgres() {
            self.sql.push_str(&s.replace('`', "\""));
        } else {
            self.sql.push_str(s);
        }
        self
    }

    /// Writes a comma separated list of identifiers.
    pub fn ident_comma<S: AsRef<str>>(&mut self, idents: &[S]) -> &mut Self {
        for (i, s) in idents.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.ident(s.as_ref());
        }
        self
    }

    /// Appends raw SQL text.
    pub fn write_str(&mut self, s: &str) -> &mut Self {
        self.sql.push_str(s);
        self
    }

    /// Appends a single character.
    pub fn write_char(&mut self, c: char) -> &mut Self {
        self.sql.push(c);
        self
    }

    /// Appends a space.
    pub fn pad(&mut self) -> &mut Self {
        self.write_char(' ')
    }

    /// Appends `", "`.
    pub fn comma(&mut self) -> &mut Self {
        self.write_str(", ")
    }

    /// Writes an operator with its padding.
    pub fn op(&mut self, op: Op) -> &mut Self {
        match op {
            Op::IsNull | Op::NotNull => {
                self.pad().write_str(op.as_str());
            }
            _ => {
                self.pad().write_str(op.as_str()).pad();
            }
        }
        self
    }

    /// Writes a placeholder and records its argument, or writes a raw operand.
    pub fn arg(&mut self, arg: impl IntoOperand) -> &mut Self {
        match arg.into_operand() {
            Operand::Value(v) => self.value(v),
            Operand::Raw(s) => self.write_str(&s),
        }
    }

    /// Writes a placeholder for `v`.
    pub fn value(&mut self, v: SqlValue) -> &mut Self {
        self.args.push(v);
        let placeholder = self.dialect.placeholder(self.args.len());
        self.write_str(&placeholder)
    }

    /// Writes a comma separated list of placeholders.
    pub fn args(&mut self, values: &[SqlValue]) -> &mut Self {
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.value(v.clone());
        }
        self
    }

    /// Renders another querier into this builder.
    pub fn join(&mut self, q: &dyn Querier) -> &mut Self {
        q.render(self);
        self
    }

    /// Renders several queriers separated by commas.
    pub fn join_comma(&mut self, qs: &[&dyn Querier]) -> &mut Self {
        for (i, q) in qs.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            q.render(self);
        }
        self
    }

    /// Wraps whatever `f` writes in parentheses.
    pub fn nested(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.write_char('(');
        f(self);
        self.write_char(')')
    }

    /// Number of arguments recorded so far.
    #[must_use]
    pub fn total(&self) -> usize {
        self.args.len()
    }

    /// The SQL text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// Consumes the builder.
    #[must_use]
    pub fn finish(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.args)
    }

    fn is_quoted(&self, s: &str) -> bool {
        if self.postgres() {
            s.contains('"')
        } else {
            s.contains('`')
        }
    }
}

impl Querier for Raw {
    fn render(&self, b: &mut Builder) {
        b.write_str(&self.0);
    }
}

/// Statements joined with spaces, for example a `WITH` prefix and its body.
#[derive(Default)]
pub struct Queries(pub Vec<Box<dyn Querier>>);

impl Queries {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    #[must_use]
    pub fn push(mut self, q: impl Querier + 'static) -> Self {
        self.0.push(Box::new(q));
        self
    }
}

impl Querier for Queries {
    fn render(&self, b: &mut Builder) {
        for (i, q) in self.0.iter().enumerate() {
            if i > 0 {
                b.pad();
            }
            q.render(b);
        }
    }
}

fn is_func(s: &str) -> bool {
    s.contains('(') && s.contains(')')
}

fn is_modifier(s: &str) -> bool {
    ["DISTINCT", "ALL", "WITH ROLLUP"]
        .iter()
        .any(|m| s.starts_with(m))
}
