//! Relation step translation.
//!
//! A [`Step`] describes one hop across an edge between two tables. The
//! translator turns it into a neighbor query ([`neighbors`],
//! [`set_neighbors`]) or into an existence filter applied to an existing
//! selector ([`has_neighbors`], [`has_neighbors_with`]).
//!
//! Every step is reduced once, at construction, to a [`Hop`]: where the
//! foreign key lives, or which join-table column belongs to which side. All
//! four translations read the same hop, so the fetch path and the filter path
//! cannot disagree about the direction of an edge.
//!
//! # Example
//!
//! ```rust
//! use oxide_sqlgraph::builder::Querier;
//! use oxide_sqlgraph::graph::{neighbors, EdgeSpec, FromVertex, Rel, Step, ToVertex};
//! use oxide_sqlgraph::Dialect;
//!
//! let step = Step::new(
//!     FromVertex::new("groups", "id").value(2),
//!     ToVertex::new("users", "id"),
//!     EdgeSpec::new(Rel::M2M, "user_groups", &["group_id", "user_id"]),
//! )
//! .unwrap();
//! let (sql, args) = neighbors(&step).unwrap().query(Dialect::MySql);
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM `users` JOIN (SELECT `user_groups`.`user_id` FROM `user_groups` \
//!      WHERE `user_groups`.`group_id` = ?) AS `t1` ON `users`.`id` = `t1`.`user_id`"
//! );
//! assert_eq!(args.len(), 1);
//! ```

use std::fmt;

use thiserror::Error;

use crate::builder::{eq, in_select, not_null, select, table, Selector, SqlValue, ToSqlValue};

/// Errors raised while building or translating a step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The edge carries the wrong number of columns for its relation.
    #[error("{rel} edge {table:?} expects {expected} column(s), got {got}")]
    EdgeColumns {
        /// Relation kind.
        rel: Rel,
        /// Edge table.
        table: String,
        /// Expected number of columns.
        expected: usize,
        /// Number of columns given.
        got: usize,
    },

    /// The source vertex has no value to start from.
    #[error("step from {0:?} has no source value")]
    MissingValue(String),

    /// A single-vertex translation was asked for a set source, or the reverse.
    #[error("step from {table:?} expects a {expected} source")]
    SourceKind {
        /// Source table.
        table: String,
        /// What the translation expected.
        expected: &'static str,
    },
}

/// Relation kind of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rel {
    /// One-to-one.
    O2O,
    /// One-to-many.
    O2M,
    /// Many-to-one.
    M2O,
    /// Many-to-many.
    M2M,
}

impl Rel {
    const fn edge_columns(self) -> usize {
        match self {
            Self::M2M => 2,
            Self::O2O | Self::O2M | Self::M2O => 1,
        }
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::O2O => "O2O",
            Self::O2M => "O2M",
            Self::M2O => "M2O",
            Self::M2M => "M2M",
        };
        f.write_str(s)
    }
}

/// Where a traversal starts: one vertex id, or the rows of a selector.
#[derive(Debug, Clone)]
pub enum Vertex {
    /// A single vertex id.
    Value(SqlValue),
    /// A set of vertices.
    Set(Selector),
}

/// The source side of a step.
#[derive(Debug, Clone)]
pub struct FromVertex {
    /// Source table.
    pub table: String,
    /// Key column of the source table.
    pub column: String,
    /// Starting vertex or vertices. Unused by existence filters.
    pub value: Option<Vertex>,
}

impl FromVertex {
    /// Creates a source without a starting value.
    #[must_use]
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            value: None,
        }
    }

    /// Starts from a single vertex id.
    #[must_use]
    pub fn value(mut self, v: impl ToSqlValue) -> Self {
        self.value = Some(Vertex::Value(v.to_sql_value()));
        self
    }

    /// Starts from the rows selected by `s`.
    #[must_use]
    pub fn set(mut self, s: Selector) -> Self {
        self.value = Some(Vertex::Set(s));
        self
    }
}

/// The destination side of a step.
#[derive(Debug, Clone)]
pub struct ToVertex {
    /// Destination table.
    pub table: String,
    /// Key column of the destination table.
    pub column: String,
}

impl ToVertex {
    /// Creates a destination.
    #[must_use]
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// The edge crossed by a step.
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    /// Relation kind.
    pub rel: Rel,
    /// Whether the edge is traversed from its inverse side.
    pub inverse: bool,
    /// Table holding the foreign key, or the join table for `M2M`.
    pub table: String,
    /// Foreign-key column, or the two join-table columns for `M2M`.
    pub columns: Vec<String>,
}

impl EdgeSpec {
    /// Creates an edge.
    #[must_use]
    pub fn new(rel: Rel, table: &str, columns: &[&str]) -> Self {
        Self {
            rel,
            inverse: false,
            table: table.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
        }
    }

    /// Marks the edge as traversed from its inverse side.
    #[must_use]
    pub const fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }
}

/// The shape of a hop, derived once from the relation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hop {
    /// The destination table holds a foreign key to the source
    /// (`O2M`, non-inverse `O2O`).
    ForeignKeyOnTarget {
        /// Foreign-key column on the destination.
        fk: String,
    },
    /// The source table holds a foreign key to the destination
    /// (`M2O`, inverse `O2O`).
    ForeignKeyOnSource {
        /// Foreign-key column on the source.
        fk: String,
    },
    /// A join table links both sides (`M2M`).
    JoinTable {
        /// Join-table column referencing the source.
        source_key: String,
        /// Join-table column referencing the destination.
        target_key: String,
    },
}

/// One validated hop across a relationship.
#[derive(Debug, Clone)]
pub struct Step {
    from: FromVertex,
    to: ToVertex,
    edge: EdgeSpec,
    hop: Hop,
}

impl Step {
    /// Validates the edge arity and derives the hop shape.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeColumns`] when an `M2M` edge does not carry
    /// exactly two columns, or any other edge does not carry exactly one.
    pub fn new(from: FromVertex, to: ToVertex, edge: EdgeSpec) -> Result<Self, GraphError> {
        let expected = edge.rel.edge_columns();
        if edge.columns.len() != expected {
            return Err(GraphError::EdgeColumns {
                rel: edge.rel,
                table: edge.table.clone(),
                expected,
                got: edge.columns.len(),
            });
        }
        let c = &edge.columns;
        let hop = match (edge.rel, edge.inverse) {
            (Rel::M2M, false) => Hop::JoinTable {
                source_key: c[0].clone(),
                target_key: c[1].clone(),
            },
            (Rel::M2M, true) => Hop::JoinTable {
                source_key: c[1].clone(),
                target_key: c[0].clone(),
            },
            (Rel::M2O, _) | (Rel::O2O, true) => Hop::ForeignKeyOnSource { fk: c[0].clone() },
            (Rel::O2M, _) | (Rel::O2O, false) => Hop::ForeignKeyOnTarget { fk: c[0].clone() },
        };
        Ok(Self {
            from,
            to,
            edge,
            hop,
        })
    }

    /// The hop shape.
    #[must_use]
    pub const fn hop(&self) -> &Hop {
        &self.hop
    }

    /// The source side.
    #[must_use]
    pub const fn from(&self) -> &FromVertex {
        &self.from
    }

    /// The destination side.
    #[must_use]
    pub const fn to(&self) -> &ToVertex {
        &self.to
    }

    /// The edge.
    #[must_use]
    pub const fn edge(&self) -> &EdgeSpec {
        &self.edge
    }

    fn source(&self) -> Result<&Vertex, GraphError> {
        self.from
            .value
            .as_ref()
            .ok_or_else(|| GraphError::MissingValue(self.from.table.clone()))
    }

    fn source_kind(&self, expected: &'static str) -> GraphError {
        GraphError::SourceKind {
            table: self.from.table.clone(),
            expected,
        }
    }
}

/// Returns the neighbors of a single source vertex.
///
/// # Errors
///
/// Fails when the step has no source value or starts from a set.
pub fn neighbors(s: &Step) -> Result<Selector, GraphError> {
    let value = match s.source()? {
        Vertex::Value(v) => v.clone(),
        Vertex::Set(_) => return Err(s.source_kind("single vertex")),
    };
    let to = table(&s.to.table);
    let q = match &s.hop {
        Hop::ForeignKeyOnTarget { fk } => select(&[]).from(to).where_clause(eq(fk, value)),
        Hop::ForeignKeyOnSource { fk } => {
            let owner = select(&[fk.as_str()])
                .from(table(&s.edge.table))
                .where_clause(eq(&s.from.column, value));
            let q = select(&[]).from(to.clone()).join(owner);
            let on = q.joined_c(fk);
            q.on(&to.c(&s.to.column), &on)
        }
        Hop::JoinTable {
            source_key,
            target_key,
        } => {
            let join = table(&s.edge.table);
            let matches = select(&[join.c(target_key).as_str()])
                .from(join.clone())
                .where_clause(eq(&join.c(source_key), value));
            let q = select(&[]).from(to.clone()).join(matches);
            let on = q.joined_c(target_key);
            q.on(&to.c(&s.to.column), &on)
        }
    };
    Ok(q)
}

/// Returns the neighbors of every vertex selected by the source set.
///
/// # Errors
///
/// Fails when the step has no source value or starts from a single vertex.
pub fn set_neighbors(s: &Step) -> Result<Selector, GraphError> {
    let set = match s.source()? {
        Vertex::Set(set) => set.clone(),
        Vertex::Value(_) => return Err(s.source_kind("set of vertices")),
    };
    let to = table(&s.to.table);
    let q = match &s.hop {
        Hop::ForeignKeyOnTarget { fk } => {
            let keys = [set.c(&s.from.column)];
            let q = select(&[]).from(to.clone()).join(set.columns(&keys));
            let on = q.joined_c(&s.from.column);
            q.on(&to.c(fk), &on)
        }
        Hop::ForeignKeyOnSource { fk } => {
            let keys = [set.c(fk)];
            let q = select(&[]).from(to.clone()).join(set.columns(&keys));
            let on = q.joined_c(fk);
            q.on(&to.c(&s.to.column), &on)
        }
        Hop::JoinTable {
            source_key,
            target_key,
        } => {
            let join = table(&s.edge.table);
            let keys = [set.c(&s.from.column)];
            let matches = select(&[join.c(target_key).as_str()])
                .from(join.clone())
                .join(set.columns(&keys));
            let on = matches.joined_c(&s.from.column);
            let matches = matches.on(&join.c(source_key), &on);
            let q = select(&[]).from(to.clone()).join(matches);
            let on = q.joined_c(target_key);
            q.on(&to.c(&s.to.column), &on)
        }
    };
    Ok(q)
}

/// Restricts `q` to source rows that have at least one neighbor.
///
/// Source columns are qualified through `q`, so an aliased source table is
/// referenced by its alias.
#[must_use]
pub fn has_neighbors(q: Selector, s: &Step) -> Selector {
    match &s.hop {
        Hop::ForeignKeyOnTarget { fk } => {
            let to = table(&s.edge.table);
            let key = q.c(&s.from.column);
            q.where_clause(in_select(
                &key,
                select(&[to.c(fk).as_str()])
                    .from(to.clone())
                    .where_clause(not_null(&to.c(fk))),
            ))
        }
        Hop::ForeignKeyOnSource { fk } => {
            let key = q.c(fk);
            q.where_clause(not_null(&key))
        }
        Hop::JoinTable { source_key, .. } => {
            let join = table(&s.edge.table);
            let key = q.c(&s.from.column);
            q.where_clause(in_select(
                &key,
                select(&[join.c(source_key).as_str()]).from(join),
            ))
        }
    }
}

/// Restricts `q` to source rows having at least one neighbor accepted by
/// `pred`. `pred` receives the inner selector over the destination rows and
/// typically adds `WHERE` conditions to it.
#[must_use]
pub fn has_neighbors_with(
    q: Selector,
    s: &Step,
    pred: impl FnOnce(Selector) -> Selector,
) -> Selector {
    let to = table(&s.to.table);
    match &s.hop {
        Hop::ForeignKeyOnTarget { fk } => {
            let edge = table(&s.edge.table);
            let matches = pred(select(&[edge.c(fk).as_str()]).from(edge));
            let key = q.c(&s.from.column);
            q.where_clause(in_select(&key, matches))
        }
        Hop::ForeignKeyOnSource { fk } => {
            let matches = pred(select(&[to.c(&s.to.column).as_str()]).from(to));
            let key = q.c(fk);
            q.where_clause(in_select(&key, matches))
        }
        Hop::JoinTable {
            source_key,
            target_key,
        } => {
            let join = table(&s.edge.table);
            let matches = select(&[join.c(source_key).as_str()]).from(join.clone()).join(to);
            let on = matches.joined_c(&s.to.column);
            let matches = pred(matches.on(&join.c(target_key), &on));
            let key = q.c(&s.from.column);
            q.where_clause(in_select(&key, matches))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{eq as p_eq, Querier};
    use crate::dialect::Dialect;
    use proptest::prelude::*;

    fn step(from: FromVertex, to: (&str, &str), rel: Rel, inverse: bool, edge: (&str, &[&str])) -> Step {
        Step::new(
            from,
            ToVertex::new(to.0, to.1),
            EdgeSpec::new(rel, edge.0, edge.1).inverse(inverse),
        )
        .unwrap()
    }

    #[test]
    fn test_step_arity() {
        let err = Step::new(
            FromVertex::new("groups", "id"),
            ToVertex::new("users", "id"),
            EdgeSpec::new(Rel::M2M, "user_groups", &["group_id"]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::EdgeColumns {
                rel: Rel::M2M,
                table: "user_groups".into(),
                expected: 2,
                got: 1
            }
        );
        assert!(Step::new(
            FromVertex::new("users", "id"),
            ToVertex::new("pets", "id"),
            EdgeSpec::new(Rel::O2M, "pets", &["owner_id", "x"]),
        )
        .is_err());
    }

    #[test]
    fn test_hop_shapes() {
        let s = step(FromVertex::new("users", "id"), ("groups", "id"), Rel::M2M, true, ("user_groups", &["group_id", "user_id"]));
        assert_eq!(
            s.hop(),
            &Hop::JoinTable {
                source_key: "user_id".into(),
                target_key: "group_id".into()
            }
        );
        let s = step(FromVertex::new("nodes", "id"), ("nodes", "id"), Rel::O2O, true, ("nodes", &["prev_id"]));
        assert_eq!(s.hop(), &Hop::ForeignKeyOnSource { fk: "prev_id".into() });
        let s = step(FromVertex::new("users", "id"), ("pets", "id"), Rel::O2M, false, ("pets", &["owner_id"]));
        assert_eq!(s.hop(), &Hop::ForeignKeyOnTarget { fk: "owner_id".into() });
    }

    #[test]
    fn test_neighbors_o2o_same_type() {
        let s = step(FromVertex::new("users", "id").value(1), ("users", "id"), Rel::O2O, false, ("users", &["spouse_id"]));
        let (sql, args) = neighbors(&s).unwrap().query(Dialect::MySql);
        assert_eq!(sql, "SELECT * FROM `users` WHERE `spouse_id` = ?");
        assert_eq!(args, vec![SqlValue::Int(1)]);
    }

    #[test]
    fn test_neighbors_o2o_inverse() {
        let s = step(FromVertex::new("nodes", "id").value(1), ("nodes", "id"), Rel::O2O, true, ("nodes", &["prev_id"]));
        let (sql, args) = neighbors(&s).unwrap().query(Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `nodes` JOIN (SELECT `prev_id` FROM `nodes` WHERE `id` = ?) AS `t1` ON `nodes`.`id` = `t1`.`prev_id`"
        );
        assert_eq!(args, vec![SqlValue::Int(1)]);
    }

    #[test]
    fn test_neighbors_o2m() {
        let s = step(FromVertex::new("users", "id").value(1), ("pets", "id"), Rel::O2M, false, ("pets", &["owner_id"]));
        let (sql, _) = neighbors(&s).unwrap().query(Dialect::MySql);
        assert_eq!(sql, "SELECT * FROM `pets` WHERE `owner_id` = ?");
    }

    #[test]
    fn test_neighbors_m2o() {
        let s = step(FromVertex::new("pets", "id").value(2), ("users", "id"), Rel::M2O, true, ("pets", &["owner_id"]));
        let (sql, args) = neighbors(&s).unwrap().query(Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `users` JOIN (SELECT `owner_id` FROM `pets` WHERE `id` = ?) AS `t1` ON `users`.`id` = `t1`.`owner_id`"
        );
        assert_eq!(args, vec![SqlValue::Int(2)]);
    }

    #[test]
    fn test_neighbors_m2m() {
        let s = step(FromVertex::new("groups", "id").value(2), ("users", "id"), Rel::M2M, false, ("user_groups", &["group_id", "user_id"]));
        let (sql, args) = neighbors(&s).unwrap().query(Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `users` JOIN (SELECT `user_groups`.`user_id` FROM `user_groups` WHERE `user_groups`.`group_id` = ?) AS `t1` ON `users`.`id` = `t1`.`user_id`"
        );
        assert_eq!(args, vec![SqlValue::Int(2)]);
    }

    #[test]
    fn test_neighbors_m2m_inverse() {
        let s = step(FromVertex::new("users", "id").value(1), ("groups", "id"), Rel::M2M, true, ("user_groups", &["group_id", "user_id"]));
        let (sql, _) = neighbors(&s).unwrap().query(Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `groups` JOIN (SELECT `user_groups`.`group_id` FROM `user_groups` WHERE `user_groups`.`user_id` = ?) AS `t1` ON `groups`.`id` = `t1`.`group_id`"
        );
    }

    #[test]
    fn test_neighbors_source_kind() {
        let s = step(FromVertex::new("users", "id"), ("pets", "id"), Rel::O2M, false, ("pets", &["owner_id"]));
        assert_eq!(neighbors(&s).unwrap_err(), GraphError::MissingValue("users".into()));
        let s = step(
            FromVertex::new("users", "id").set(select(&[]).from(table("users"))),
            ("pets", "id"),
            Rel::O2M,
            false,
            ("pets", &["owner_id"]),
        );
        assert!(matches!(neighbors(&s), Err(GraphError::SourceKind { .. })));
        let s = step(FromVertex::new("users", "id").value(1), ("pets", "id"), Rel::O2M, false, ("pets", &["owner_id"]));
        assert!(matches!(set_neighbors(&s), Err(GraphError::SourceKind { .. })));
    }

    fn users_named() -> Selector {
        select(&[]).from(table("users")).where_clause(p_eq("name", "a8m"))
    }

    #[test]
    fn test_set_neighbors_o2m() {
        let s = step(FromVertex::new("users", "id").set(users_named()), ("pets", "id"), Rel::O2M, false, ("pets", &["owner_id"]));
        let (sql, args) = set_neighbors(&s).unwrap().query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "pets" JOIN (SELECT "users"."id" FROM "users" WHERE "name" = $1) AS "t1" ON "pets"."owner_id" = "t1"."id""#
        );
        assert_eq!(args, vec![SqlValue::Text("a8m".into())]);
    }

    #[test]
    fn test_set_neighbors_m2o() {
        let pets = select(&[]).from(table("pets")).where_clause(p_eq("name", "pedro"));
        let s = step(FromVertex::new("pets", "id").set(pets), ("users", "id"), Rel::M2O, true, ("pets", &["owner_id"]));
        let (sql, _) = set_neighbors(&s).unwrap().query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" JOIN (SELECT "pets"."owner_id" FROM "pets" WHERE "name" = $1) AS "t1" ON "users"."id" = "t1"."owner_id""#
        );
    }

    #[test]
    fn test_set_neighbors_m2m() {
        let s = step(
            FromVertex::new("users", "id").set(users_named()),
            ("groups", "id"),
            Rel::M2M,
            true,
            ("user_groups", &["group_id", "user_id"]),
        );
        let (sql, args) = set_neighbors(&s).unwrap().query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "groups" JOIN (SELECT "user_groups"."group_id" FROM "user_groups" JOIN (SELECT "users"."id" FROM "users" WHERE "name" = $1) AS "t1" ON "user_groups"."user_id" = "t1"."id") AS "t1" ON "groups"."id" = "t1"."group_id""#
        );
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_has_neighbors() {
        let s = step(FromVertex::new("nodes", "id"), ("nodes", "id"), Rel::O2O, false, ("nodes", &["prev_id"]));
        let (sql, _) = has_neighbors(select(&[]).from(table("nodes")), &s).query(Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `nodes` WHERE `nodes`.`id` IN (SELECT `nodes`.`prev_id` FROM `nodes` WHERE `nodes`.`prev_id` IS NOT NULL)"
        );

        let s = step(FromVertex::new("nodes", "id"), ("nodes", "id"), Rel::O2O, true, ("nodes", &["prev_id"]));
        let (sql, _) = has_neighbors(select(&[]).from(table("nodes")), &s).query(Dialect::MySql);
        assert_eq!(sql, "SELECT * FROM `nodes` WHERE `nodes`.`prev_id` IS NOT NULL");

        let s = step(FromVertex::new("users", "id"), ("groups", "id"), Rel::M2M, false, ("user_groups", &["user_id", "group_id"]));
        let (sql, _) = has_neighbors(select(&[]).from(table("users")), &s).query(Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `users` WHERE `users`.`id` IN (SELECT `user_groups`.`user_id` FROM `user_groups`)"
        );
    }

    #[test]
    fn test_has_neighbors_with_o2m() {
        let s = step(FromVertex::new("users", "id"), ("pets", "id"), Rel::O2M, false, ("pets", &["owner_id"]));
        let q = select(&[]).from(table("users")).where_clause(p_eq("last_name", "mashraki"));
        let (sql, args) = has_neighbors_with(q, &s, |m| m.where_clause(p_eq("name", "pedro")))
            .query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "last_name" = $1 AND "users"."id" IN (SELECT "pets"."owner_id" FROM "pets" WHERE "name" = $2)"#
        );
        assert_eq!(
            args,
            vec![SqlValue::Text("mashraki".into()), SqlValue::Text("pedro".into())]
        );
    }

    #[test]
    fn test_has_neighbors_with_m2o() {
        let s = step(FromVertex::new("pets", "id"), ("users", "id"), Rel::M2O, true, ("pets", &["owner_id"]));
        let (sql, _) = has_neighbors_with(select(&[]).from(table("pets")), &s, |m| {
            m.where_clause(p_eq("name", "a8m"))
        })
        .query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "pets" WHERE "pets"."owner_id" IN (SELECT "users"."id" FROM "users" WHERE "name" = $1)"#
        );
    }

    #[test]
    fn test_has_neighbors_with_m2m() {
        let s = step(FromVertex::new("users", "id"), ("groups", "id"), Rel::M2M, true, ("group_users", &["group_id", "user_id"]));
        let (sql, _) = has_neighbors_with(select(&[]).from(table("users")), &s, |m| {
            m.where_clause(p_eq("name", "GitHub"))
        })
        .query(Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "users"."id" IN (SELECT "group_users"."user_id" FROM "group_users" JOIN "groups" AS "t0" ON "group_users"."group_id" = "t0"."id" WHERE "name" = $1)"#
        );
    }

    #[test]
    fn test_has_neighbors_aliased_source() {
        let users = || select(&[]).from(table("users").alias("u"));
        let s = step(FromVertex::new("users", "id"), ("pets", "id"), Rel::O2M, false, ("pets", &["owner_id"]));
        let (sql, _) = has_neighbors(users(), &s).query(Dialect::Sqlite);
        assert_eq!(
            sql,
            "SELECT * FROM `users` AS `u` WHERE `u`.`id` IN (SELECT `pets`.`owner_id` FROM `pets` WHERE `pets`.`owner_id` IS NOT NULL)"
        );
        let (sql, _) = has_neighbors_with(users(), &s, |m| m).query(Dialect::Sqlite);
        assert_eq!(
            sql,
            "SELECT * FROM `users` AS `u` WHERE `u`.`id` IN (SELECT `pets`.`owner_id` FROM `pets`)"
        );

        let s = step(FromVertex::new("users", "id"), ("users", "id"), Rel::O2O, true, ("users", &["spouse_id"]));
        let (sql, _) = has_neighbors(users(), &s).query(Dialect::Sqlite);
        assert_eq!(sql, "SELECT * FROM `users` AS `u` WHERE `u`.`spouse_id` IS NOT NULL");
        let (sql, _) = has_neighbors_with(users(), &s, |m| m).query(Dialect::Sqlite);
        assert_eq!(
            sql,
            "SELECT * FROM `users` AS `u` WHERE `u`.`spouse_id` IN (SELECT `users`.`id` FROM `users`)"
        );

        let s = step(FromVertex::new("users", "id"), ("groups", "id"), Rel::M2M, false, ("user_groups", &["user_id", "group_id"]));
        let (sql, _) = has_neighbors(users(), &s).query(Dialect::Sqlite);
        assert_eq!(
            sql,
            "SELECT * FROM `users` AS `u` WHERE `u`.`id` IN (SELECT `user_groups`.`user_id` FROM `user_groups`)"
        );
    }

    fn any_rel() -> impl Strategy<Value = (Rel, bool)> {
        prop_oneof![
            Just((Rel::O2O, false)),
            Just((Rel::O2O, true)),
            Just((Rel::O2M, false)),
            Just((Rel::M2O, true)),
            Just((Rel::M2M, false)),
            Just((Rel::M2M, true)),
        ]
    }

    proptest! {
        #[test]
        fn prop_fetch_and_filter_use_same_edge_columns((rel, inverse) in any_rel(), id in 1_i64..1000) {
            let columns: &[&str] = if rel == Rel::M2M { &["a_id", "b_id"] } else { &["fk_id"] };
            let s = step(FromVertex::new("a", "id").value(id), ("b", "id"), rel, inverse, ("edge", columns));
            let (fetch, args) = neighbors(&s).unwrap().query(Dialect::MySql);
            let (filter, _) = has_neighbors(select(&[]).from(table("a")), &s).query(Dialect::MySql);
            prop_assert_eq!(args, vec![SqlValue::Int(id)]);
            match s.hop() {
                Hop::JoinTable { source_key, target_key } => {
                    let filter_key = format!("`edge`.`{source_key}` = ?");
                    let source_filter = format!("SELECT `edge`.`{source_key}` FROM");
                    let target_select = format!("SELECT `edge`.`{target_key}` FROM");
                    prop_assert!(fetch.contains(&filter_key));
                    prop_assert!(fetch.contains(&target_select));
                    prop_assert!(filter.contains(&source_filter));
                }
                Hop::ForeignKeyOnSource { fk } => {
                    let not_null = format!("`a`.`{fk}` IS NOT NULL");
                    prop_assert!(filter.contains(&not_null));
                    let fk_select = format!("SELECT `{fk}` FROM `edge`");
                    prop_assert!(fetch.contains(&fk_select));
                }
                Hop::ForeignKeyOnTarget { fk } => {
                    let fk_where = format!("WHERE `{fk}` = ?");
                    let edge_select = format!("SELECT `edge`.`{fk}` FROM `edge`");
                    prop_assert!(fetch.ends_with(&fk_where));
                    prop_assert!(filter.contains(&edge_select));
                }
            }
        }
    }
}
