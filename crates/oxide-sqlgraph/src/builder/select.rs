//! SELECT statements, table references and common table expressions.

use super::predicate::{and, columns_eq, not, or, Predicate};
use super::{Builder, Querier};
use crate::dialect::Dialect;

/// A named table, optionally schema-qualified and aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectTable {
    name: String,
    schema: Option<String>,
    alias: Option<String>,
    quote: bool,
}

/// Creates a table reference.
#[must_use]
pub fn table(name: &str) -> SelectTable {
    SelectTable {
        name: name.to_string(),
        schema: None,
        alias: None,
        quote: true,
    }
}

impl SelectTable {
    /// Sets the schema (namespace) of the table. Ignored on SQLite.
    #[must_use]
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Sets the table alias.
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Writes the table name verbatim, without quoting.
    #[must_use]
    pub fn unquote(mut self) -> Self {
        self.quote = false;
        self
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns a column qualified with the alias or the table name.
    #[must_use]
    pub fn c(&self, column: &str) -> String {
        let mut b = Builder::new(Dialect::MySql);
        match &self.alias {
            Some(alias) => {
                b.ident(alias);
            }
            None => {
                if let Some(schema) = &self.schema {
                    b.ident(schema).write_char('.');
                }
                b.ident(&self.name);
            }
        }
        b.write_char('.').ident(column);
        b.finish().0
    }

    /// Returns a list of qualified columns.
    #[must_use]
    pub fn columns(&self, columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| self.c(c)).collect()
    }

    fn render_ref(&self, b: &mut Builder) {
        if !self.quote {
            b.write_str(&self.name);
            return;
        }
        if let Some(schema) = &self.schema {
            if b.dialect() != Dialect::Sqlite {
                b.ident(schema).write_char('.');
            }
        }
        b.ident(&self.name);
        if let Some(alias) = &self.alias {
            b.write_str(" AS ").ident(alias);
        }
    }
}

/// Something that can appear after `FROM` or `JOIN`.
#[derive(Debug, Clone)]
pub enum TableView {
    /// A named table.
    Table(SelectTable),
    /// A nested SELECT, rendered as `(SELECT ...) AS alias`.
    Select(Box<Selector>),
}

impl TableView {
    /// Returns a column qualified with the view alias or table name.
    #[must_use]
    pub fn c(&self, column: &str) -> String {
        match self {
            Self::Table(t) => t.c(column),
            Self::Select(s) => s.c(column),
        }
    }

    fn render_ref(&self, b: &mut Builder) {
        match self {
            Self::Table(t) => t.render_ref(b),
            Self::Select(s) => {
                b.nested(|b| s.render(b));
                if let Some(alias) = &s.alias {
                    b.write_str(" AS ").ident(alias);
                }
            }
        }
    }
}

impl From<SelectTable> for TableView {
    fn from(t: SelectTable) -> Self {
        Self::Table(t)
    }
}

impl From<Selector> for TableView {
    fn from(s: Selector) -> Self {
        Self::Select(Box::new(s))
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: &'static str,
    view: TableView,
    on: Option<Predicate>,
}

/// A SELECT statement builder.
///
/// Cloning a selector yields an independent copy that can be refined
/// without affecting the original.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    alias: Option<String>,
    columns: Vec<String>,
    from: Option<TableView>,
    distinct: bool,
    joins: Vec<Join>,
    where_clause: Option<Predicate>,
    or: bool,
    not: bool,
    group_by: Vec<String>,
    having: Option<Predicate>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// Starts a SELECT of the given columns. No columns selects `*`.
#[must_use]
pub fn select(columns: &[&str]) -> Selector {
    Selector {
        columns: columns.iter().map(ToString::to_string).collect(),
        ..Selector::default()
    }
}

impl Selector {
    /// Replaces the selected columns.
    #[must_use]
    pub fn columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Sets the source of the statement.
    #[must_use]
    pub fn from(mut self, view: impl Into<TableView>) -> Self {
        self.from = Some(view.into());
        self
    }

    /// Sets the alias used when this selector is nested as a table.
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Adds `DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a `JOIN`.
    #[must_use]
    pub fn join(self, view: impl Into<TableView>) -> Self {
        self.join_kind("JOIN", view.into())
    }

    /// Adds a `LEFT JOIN`.
    #[must_use]
    pub fn left_join(self, view: impl Into<TableView>) -> Self {
        self.join_kind("LEFT JOIN", view.into())
    }

    /// Adds a `RIGHT JOIN`.
    #[must_use]
    pub fn right_join(self, view: impl Into<TableView>) -> Self {
        self.join_kind("RIGHT JOIN", view.into())
    }

    fn join_kind(mut self, kind: &'static str, view: TableView) -> Self {
        let position = self.joins.len() + 1;
        let view = match view {
            TableView::Table(t) if t.alias.is_none() => TableView::Table(t.alias("t0")),
            TableView::Select(mut s) => {
                if s.alias.is_none() {
                    s.alias = Some(format!("t{position}"));
                }
                TableView::Select(s)
            }
            other @ TableView::Table(_) => other,
        };
        self.joins.push(Join {
            kind,
            view,
            on: None,
        });
        self
    }

    /// Returns a column qualified with the most recently joined view.
    #[must_use]
    pub fn joined_c(&self, column: &str) -> String {
        self.joins
            .last()
            .map_or_else(|| self.c(column), |j| j.view.c(column))
    }

    /// Adds `c1 = c2` to the `ON` clause of the last join.
    #[must_use]
    pub fn on(self, c1: &str, c2: &str) -> Self {
        self.on_p(columns_eq(c1, c2))
    }

    /// Adds a predicate to the `ON` clause of the last join.
    #[must_use]
    pub fn on_p(mut self, p: Predicate) -> Self {
        if let Some(join) = self.joins.last_mut() {
            join.on = Some(match join.on.take() {
                Some(prev) => and(vec![prev, p]),
                None => p,
            });
        }
        self
    }

    /// Adds a predicate to the `WHERE` clause. Consecutive calls are joined
    /// with `AND`, unless `or()` or `not()` was called before.
    #[must_use]
    pub fn where_clause(mut self, p: Predicate) -> Self {
        let p = if self.not {
            self.not = false;
            not(p)
        } else {
            p
        };
        self.where_clause = Some(match self.where_clause.take() {
            None => p,
            Some(prev) if self.or => {
                self.or = false;
                or(vec![prev, p])
            }
            Some(prev) => and(vec![prev, p]),
        });
        self
    }

    /// Joins the next predicate with `OR`.
    #[must_use]
    pub const fn or(mut self) -> Self {
        self.or = true;
        self
    }

    /// Negates the next predicate.
    #[must_use]
    pub const fn not(mut self) -> Self {
        self.not = true;
        self
    }

    /// Returns the `WHERE` predicate.
    #[must_use]
    pub const fn p(&self) -> Option<&Predicate> {
        self.where_clause.as_ref()
    }

    /// Replaces the `WHERE` predicate and clears pending `or`/`not` flags.
    #[must_use]
    pub fn set_p(mut self, p: Option<Predicate>) -> Self {
        self.where_clause = p;
        self.or = false;
        self.not = false;
        self
    }

    /// Copies the `WHERE` predicate of another selector.
    #[must_use]
    pub fn from_select(mut self, other: &Self) -> Self {
        self.where_clause.clone_from(&other.where_clause);
        self
    }

    /// Adds `GROUP BY` columns.
    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by
            .extend(columns.iter().map(ToString::to_string));
        self
    }

    /// Sets the `HAVING` predicate.
    #[must_use]
    pub fn having(mut self, p: Predicate) -> Self {
        self.having = Some(p);
        self
    }

    /// Adds `ORDER BY` terms.
    #[must_use]
    pub fn order_by(mut self, columns: &[&str]) -> Self {
        self.order_by
            .extend(columns.iter().map(ToString::to_string));
        self
    }

    /// Sets `LIMIT`.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets `OFFSET`.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Replaces the columns with `COUNT(*)` or `COUNT(columns)`.
    #[must_use]
    pub fn count(mut self, columns: &[&str]) -> Self {
        let inner = if columns.is_empty() {
            String::from("*")
        } else {
            let mut b = Builder::new(Dialect::MySql);
            b.ident_comma(columns);
            b.finish().0
        };
        self.columns = vec![format!("COUNT({inner})")];
        self
    }

    /// Returns a column qualified with the selector alias, or with the
    /// source table when the selector has no alias.
    #[must_use]
    pub fn c(&self, column: &str) -> String {
        if let Some(alias) = &self.alias {
            return table(alias).c(column);
        }
        match &self.from {
            Some(TableView::Table(t)) => t.c(column),
            _ => {
                let mut b = Builder::new(Dialect::MySql);
                b.ident(column);
                b.finish().0
            }
        }
    }

    /// The source table, when the source is a named table.
    #[must_use]
    pub const fn table(&self) -> Option<&SelectTable> {
        match &self.from {
            Some(TableView::Table(t)) => Some(t),
            _ => None,
        }
    }

    /// The selector alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl Querier for Selector {
    fn render(&self, b: &mut Builder) {
        b.write_str("SELECT ");
        if self.distinct {
            b.write_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            b.write_char('*');
        } else {
            b.ident_comma(&self.columns);
        }
        if let Some(from) = &self.from {
            b.write_str(" FROM ");
            from.render_ref(b);
        }
        for join in &self.joins {
            b.pad().write_str(join.kind).pad();
            join.view.render_ref(b);
            if let Some(on) = &join.on {
                b.write_str(" ON ").join(on);
            }
        }
        if let Some(p) = &self.where_clause {
            b.write_str(" WHERE ").join(p);
        }
        if !self.group_by.is_empty() {
            b.write_str(" GROUP BY ").ident_comma(&self.group_by);
        }
        if let Some(p) = &self.having {
            b.write_str(" HAVING ").join(p);
        }
        if !self.order_by.is_empty() {
            b.write_str(" ORDER BY ").ident_comma(&self.order_by);
        }
        if let Some(n) = self.limit {
            b.write_str(&format!(" LIMIT {n}"));
        }
        if let Some(n) = self.offset {
            b.write_str(&format!(" OFFSET {n}"));
        }
    }
}

/// A `WITH name AS (...)` prefix.
#[derive(Debug, Clone)]
pub struct With {
    name: String,
    select: Option<Selector>,
}

/// Starts a common table expression.
#[must_use]
pub fn with(name: &str) -> With {
    With {
        name: name.to_string(),
        select: None,
    }
}

impl With {
    /// Sets the query bound to the name.
    #[must_use]
    pub fn as_(mut self, s: Selector) -> Self {
        self.select = Some(s);
        self
    }
}

impl Querier for With {
    fn render(&self, b: &mut Builder) {
        b.write_str("WITH ").ident(&self.name).write_str(" AS ");
        b.nested(|b| {
            if let Some(s) = &self.select {
                s.render(b);
            }
        });
    }
}
