//! Predicate algebra.
//!
//! A [`Predicate`] is a list of render steps. Groups created by [`and`] and
//! [`or`] parenthesize themselves when they are nested below the top level,
//! and members made of more than one step are parenthesized by their group.
//! This keeps precedence explicit without relying on the engine's rules.

use std::fmt;
use std::sync::Arc;

use super::select::Selector;
use super::value::{IntoOperand, Operand, SqlValue, ToSqlValue};
use super::{Builder, Op, Querier};
use crate::dialect::Dialect;

type RenderFn = Arc<dyn Fn(&mut Builder) + Send + Sync>;

#[derive(Clone)]
enum Part {
    Fn(RenderFn),
    Group(&'static str, Vec<Predicate>),
    Nested(Box<Predicate>),
}

/// A composable boolean expression.
#[derive(Clone, Default)]
pub struct Predicate {
    parts: Vec<Part>,
}

impl Predicate {
    /// Creates an empty predicate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a custom render step.
    #[must_use]
    pub fn append(mut self, f: impl Fn(&mut Builder) + Send + Sync + 'static) -> Self {
        self.parts.push(Part::Fn(Arc::new(f)));
        self
    }

    /// Returns true if nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn render_at(&self, b: &mut Builder, depth: usize) {
        for part in &self.parts {
            match part {
                Part::Fn(f) => f(b),
                Part::Group(op, preds) => render_group(b, op, preds, depth),
                Part::Nested(p) => {
                    b.nested(|b| p.render_at(b, 0));
                }
            }
        }
    }
}

fn render_group(b: &mut Builder, op: &str, preds: &[Predicate], depth: usize) {
    if let [single] = preds {
        single.render_at(b, depth);
        return;
    }
    let wrap = preds.len() > 1 && depth != 0;
    if wrap {
        b.write_char('(');
    }
    for (i, p) in preds.iter().enumerate() {
        if i > 0 {
            b.pad().write_str(op).pad();
        }
        if p.parts.len() > 1 {
            b.nested(|b| p.render_at(b, depth + 1));
        } else {
            p.render_at(b, depth + 1);
        }
    }
    if wrap {
        b.write_char(')');
    }
}

impl Querier for Predicate {
    fn render(&self, b: &mut Builder) {
        self.render_at(b, 0);
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sql, args) = self.query(Dialect::MySql);
        f.debug_struct("Predicate")
            .field("sql", &sql)
            .field("args", &args)
            .finish()
    }
}

fn step(f: impl Fn(&mut Builder) + Send + Sync + 'static) -> Predicate {
    Predicate::new().append(f)
}

fn compare(col: &str, op: Op, arg: Operand) -> Predicate {
    let col = col.to_string();
    step(move |b| {
        b.ident(&col).op(op).arg(arg.clone());
    })
}

/// `col = arg`
pub fn eq(col: &str, arg: impl IntoOperand) -> Predicate {
    compare(col, Op::Eq, arg.into_operand())
}

/// `col <> arg`
pub fn neq(col: &str, arg: impl IntoOperand) -> Predicate {
    compare(col, Op::Neq, arg.into_operand())
}

/// `col < arg`
pub fn lt(col: &str, arg: impl IntoOperand) -> Predicate {
    compare(col, Op::Lt, arg.into_operand())
}

/// `col <= arg`
pub fn lte(col: &str, arg: impl IntoOperand) -> Predicate {
    compare(col, Op::Lte, arg.into_operand())
}

/// `col > arg`
pub fn gt(col: &str, arg: impl IntoOperand) -> Predicate {
    compare(col, Op::Gt, arg.into_operand())
}

/// `col >= arg`
pub fn gte(col: &str, arg: impl IntoOperand) -> Predicate {
    compare(col, Op::Gte, arg.into_operand())
}

/// `col IS NULL`
#[must_use]
pub fn is_null(col: &str) -> Predicate {
    let col = col.to_string();
    step(move |b| {
        b.ident(&col).op(Op::IsNull);
    })
}

/// `col IS NOT NULL`
#[must_use]
pub fn not_null(col: &str) -> Predicate {
    let col = col.to_string();
    step(move |b| {
        b.ident(&col).op(Op::NotNull);
    })
}

fn membership<T: ToSqlValue>(
    col: &str,
    op: Op,
    values: impl IntoIterator<Item = T>,
) -> Predicate {
    let values: Vec<SqlValue> = values.into_iter().map(ToSqlValue::to_sql_value).collect();
    if values.is_empty() {
        return always_false();
    }
    let col = col.to_string();
    step(move |b| {
        b.ident(&col).op(op).nested(|b| {
            b.args(&values);
        });
    })
}

/// `col IN (v1, v2, ...)`. An empty list renders `FALSE`.
pub fn in_values<T: ToSqlValue>(col: &str, values: impl IntoIterator<Item = T>) -> Predicate {
    membership(col, Op::In, values)
}

/// `col NOT IN (v1, v2, ...)`. An empty list renders `FALSE`.
pub fn not_in<T: ToSqlValue>(col: &str, values: impl IntoIterator<Item = T>) -> Predicate {
    membership(col, Op::NotIn, values)
}

fn sub_select(col: &str, op: Op, query: Selector) -> Predicate {
    let col = col.to_string();
    step(move |b| {
        b.ident(&col).op(op).nested(|b| {
            b.join(&query);
        });
    })
}

/// `col IN (SELECT ...)`
#[must_use]
pub fn in_select(col: &str, query: Selector) -> Predicate {
    sub_select(col, Op::In, query)
}

/// `col NOT IN (SELECT ...)`
#[must_use]
pub fn not_in_select(col: &str, query: Selector) -> Predicate {
    sub_select(col, Op::NotIn, query)
}

/// `col LIKE pattern`
#[must_use]
pub fn like(col: &str, pattern: &str) -> Predicate {
    compare(col, Op::Like, Operand::Value(SqlValue::Text(pattern.to_string())))
}

/// `col LIKE 'prefix%'`
#[must_use]
pub fn has_prefix(col: &str, prefix: &str) -> Predicate {
    like(col, &format!("{prefix}%"))
}

/// `col LIKE '%suffix'`
#[must_use]
pub fn has_suffix(col: &str, suffix: &str) -> Predicate {
    like(col, &format!("%{suffix}"))
}

/// `col LIKE '%sub%'`
#[must_use]
pub fn contains(col: &str, sub: &str) -> Predicate {
    like(col, &format!("%{sub}%"))
}

/// Case-insensitive equality: `LOWER(col) = lower(arg)`.
#[must_use]
pub fn equal_fold(col: &str, arg: &str) -> Predicate {
    let col = col.to_string();
    let arg = arg.to_lowercase();
    step(move |b| {
        b.write_str("LOWER").nested(|b| {
            b.ident(&col);
        });
        b.op(Op::Eq).arg(arg.as_str());
    })
}

/// Case-insensitive containment, rendered per dialect.
#[must_use]
pub fn contains_fold(col: &str, sub: &str) -> Predicate {
    let col = col.to_string();
    let pattern = format!("%{}%", sub.to_lowercase());
    step(move |b| match b.dialect() {
        Dialect::MySql => {
            b.ident(&col)
                .write_str(" COLLATE utf8mb4_general_ci")
                .op(Op::Like)
                .arg(pattern.as_str());
        }
        Dialect::Postgres => {
            b.ident(&col).write_str(" ILIKE ").arg(pattern.as_str());
        }
        Dialect::Sqlite => {
            b.write_str("LOWER").nested(|b| {
                b.ident(&col);
            });
            b.op(Op::Like).arg(pattern.as_str());
        }
    })
}

fn composite(columns: &[&str], op: Op, args: Vec<SqlValue>) -> Predicate {
    let columns: Vec<String> = columns.iter().map(ToString::to_string).collect();
    step(move |b| {
        b.nested(|b| {
            b.ident_comma(&columns);
        });
        b.op(op).nested(|b| {
            b.args(&args);
        });
    })
}

/// `(c1, c2) > (v1, v2)`
#[must_use]
pub fn composite_gt(columns: &[&str], args: Vec<SqlValue>) -> Predicate {
    composite(columns, Op::Gt, args)
}

/// `(c1, c2) < (v1, v2)`
#[must_use]
pub fn composite_lt(columns: &[&str], args: Vec<SqlValue>) -> Predicate {
    composite(columns, Op::Lt, args)
}

/// `c1 = c2`, comparing two columns.
#[must_use]
pub fn columns_eq(c1: &str, c2: &str) -> Predicate {
    let (c1, c2) = (c1.to_string(), c2.to_string());
    step(move |b| {
        b.ident(&c1).op(Op::Eq).ident(&c2);
    })
}

/// `FALSE`
#[must_use]
pub fn always_false() -> Predicate {
    step(|b| {
        b.write_str("FALSE");
    })
}

/// A predicate rendered by a caller-supplied function.
pub fn custom(f: impl Fn(&mut Builder) + Send + Sync + 'static) -> Predicate {
    step(f)
}

/// `NOT (p)`
#[must_use]
pub fn not(p: Predicate) -> Predicate {
    let mut n = step(|b| {
        b.write_str("NOT ");
    });
    n.parts.push(Part::Nested(Box::new(p)));
    n
}

/// Joins predicates with `AND`.
#[must_use]
pub fn and(preds: Vec<Predicate>) -> Predicate {
    Predicate {
        parts: vec![Part::Group("AND", preds)],
    }
}

/// Joins predicates with `OR`.
#[must_use]
pub fn or(preds: Vec<Predicate>) -> Predicate {
    Predicate {
        parts: vec![Part::Group("OR", preds)],
    }
}

fn func(name: &str, ident: &str) -> String {
    let mut b = Builder::new(Dialect::MySql);
    b.write_str(name).nested(|b| {
        b.ident(ident);
    });
    b.finish().0
}

/// `LOWER(ident)`
#[must_use]
pub fn lower(ident: &str) -> String {
    func("LOWER", ident)
}

/// `COUNT(ident)`
#[must_use]
pub fn count(ident: &str) -> String {
    func("COUNT", ident)
}

/// `MAX(ident)`
#[must_use]
pub fn max(ident: &str) -> String {
    func("MAX", ident)
}

/// `MIN(ident)`
#[must_use]
pub fn min(ident: &str) -> String {
    func("MIN", ident)
}

/// `SUM(ident)`
#[must_use]
pub fn sum(ident: &str) -> String {
    func("SUM", ident)
}

/// `AVG(ident)`
#[must_use]
pub fn avg(ident: &str) -> String {
    func("AVG", ident)
}

/// `ident AS alias`
#[must_use]
pub fn as_(ident: &str, alias: &str) -> String {
    let mut b = Builder::new(Dialect::MySql);
    b.ident(ident).write_str(" AS ").ident(alias);
    b.finish().0
}

/// `DISTINCT c1, c2`
#[must_use]
pub fn distinct(idents: &[&str]) -> String {
    let mut b = Builder::new(Dialect::MySql);
    b.write_str("DISTINCT ").ident_comma(idents);
    b.finish().0
}

/// `ident ASC`
#[must_use]
pub fn asc(ident: &str) -> String {
    let mut b = Builder::new(Dialect::MySql);
    b.ident(ident).write_str(" ASC");
    b.finish().0
}

/// `ident DESC`
#[must_use]
pub fn desc(ident: &str) -> String {
    let mut b = Builder::new(Dialect::MySql);
    b.ident(ident).write_str(" DESC");
    b.finish().0
}
