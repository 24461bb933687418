//! Planned migrations and the diff/apply hook chains.
//!
//! The plan path splits a migration in two steps. A [`Differ`] turns the
//! current and desired tables into a list of [`Change`]s, and an
//! [`Applier`] executes the statements rendered from those changes. Hooks
//! wrap either step: each hook receives the next stage and returns a new
//! one, so hooks can filter, rewrite or observe what flows through.
//!
//! ```rust
//! use std::sync::Arc;
//! use oxide_sqlgraph_migrate::change::{Change, ChangeKind};
//! use oxide_sqlgraph_migrate::plan::{DiffFn, DiffHook, Differ};
//! use oxide_sqlgraph_migrate::schema::Table;
//!
//! // Drop every column removal before it reaches the applier.
//! let hook: DiffHook = Box::new(|next: Arc<dyn Differ>| -> Arc<dyn Differ> {
//!     Arc::new(DiffFn::new(move |current: &[Table], desired: &[Table]| {
//!         let changes = next.diff(current, desired)?;
//!         Ok(changes
//!             .into_iter()
//!             .filter(|c: &Change| !c.kind().is(ChangeKind::DROP_COLUMN))
//!             .collect())
//!     }))
//! });
//! # let _ = hook;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use oxide_sqlgraph::builder::Querier;
use oxide_sqlgraph::{Dialect, SqlValue};

use crate::change::{Change, ChangeKind};
use crate::driver::ExecQuerier;
use crate::error::Result;
use crate::schema::Table;

/// A rendered statement with a human readable description.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// What the statement does, e.g. `create "users" table`.
    pub comment: String,
    /// SQL text.
    pub sql: String,
    /// Bound arguments.
    pub args: Vec<SqlValue>,
}

impl Statement {
    /// Renders `q` for `dialect`.
    #[must_use]
    pub fn new(comment: impl Into<String>, q: &dyn Querier, dialect: Dialect) -> Self {
        let (sql, args) = q.query(dialect);
        Self {
            comment: comment.into(),
            sql,
            args,
        }
    }

    /// A statement without arguments.
    #[must_use]
    pub fn raw(comment: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Executes the statement, tagging failures with its comment.
    pub async fn exec(&self, conn: &dyn ExecQuerier) -> Result<u64> {
        debug!(sql = %self.sql, "Executing SQL");
        conn.exec(&self.sql, &self.args)
            .await
            .map_err(|e| e.context(self.comment.clone()))
    }
}

/// An ordered list of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Plan name, used for migration file names.
    pub name: String,
    /// Statements in execution order.
    pub statements: Vec<Statement>,
}

impl Plan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements: Vec::new(),
        }
    }

    /// Returns true when there is nothing to execute.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Computes the changes that turn `current` into `desired`.
pub trait Differ: Send + Sync {
    /// `current` holds the live description of the desired tables that
    /// already exist.
    fn diff(&self, current: &[Table], desired: &[Table]) -> Result<Vec<Change>>;
}

/// Adapts a closure into a [`Differ`].
pub struct DiffFn<F>(pub F);

impl<F> DiffFn<F>
where
    F: Fn(&[Table], &[Table]) -> Result<Vec<Change>> + Send + Sync,
{
    /// Wraps `f`.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Differ for DiffFn<F>
where
    F: Fn(&[Table], &[Table]) -> Result<Vec<Change>> + Send + Sync,
{
    fn diff(&self, current: &[Table], desired: &[Table]) -> Result<Vec<Change>> {
        (self.0)(current, desired)
    }
}

/// Wraps a differ.
pub type DiffHook = Box<dyn Fn(Arc<dyn Differ>) -> Arc<dyn Differ> + Send + Sync>;

/// Executes a plan.
#[async_trait]
pub trait Applier: Send + Sync {
    /// Applies `plan` on `conn`.
    async fn apply(&self, conn: &dyn ExecQuerier, plan: &Plan) -> Result<()>;
}

/// Adapts a closure returning a boxed future into an [`Applier`].
pub struct ApplyFn<F>(pub F);

impl<F> ApplyFn<F>
where
    F: for<'a> Fn(&'a dyn ExecQuerier, &'a Plan) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    /// Wraps `f`. Passing the closure here lets its signature be inferred.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Applier for ApplyFn<F>
where
    F: for<'a> Fn(&'a dyn ExecQuerier, &'a Plan) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    async fn apply(&self, conn: &dyn ExecQuerier, plan: &Plan) -> Result<()> {
        (self.0)(conn, plan).await
    }
}

/// Wraps an applier.
pub type ApplyHook = Box<dyn Fn(Arc<dyn Applier>) -> Arc<dyn Applier> + Send + Sync>;

/// Executes every statement in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecApplier;

#[async_trait]
impl Applier for ExecApplier {
    async fn apply(&self, conn: &dyn ExecQuerier, plan: &Plan) -> Result<()> {
        for stmt in &plan.statements {
            stmt.exec(conn).await?;
        }
        Ok(())
    }
}

/// Builds the differ chain. The first hook ends up outermost.
pub fn chain_differ(base: Arc<dyn Differ>, hooks: &[DiffHook]) -> Arc<dyn Differ> {
    hooks.iter().rev().fold(base, |next, hook| hook(next))
}

/// Builds the applier chain. The first hook ends up outermost.
pub fn chain_applier(base: Arc<dyn Applier>, hooks: &[ApplyHook]) -> Arc<dyn Applier> {
    hooks.iter().rev().fold(base, |next, hook| hook(next))
}

/// A hook that removes the changes whose kind is in `skip`.
///
/// Changes nested in a table modification are filtered too, unless table
/// modifications are skipped as a whole.
#[must_use]
pub fn filter_changes(skip: ChangeKind) -> DiffHook {
    Box::new(move |next: Arc<dyn Differ>| -> Arc<dyn Differ> {
        Arc::new(DiffFn::new(move |current: &[Table], desired: &[Table]| {
            let changes = next.diff(current, desired)?;
            Ok(filter(changes, skip))
        }))
    })
}

fn filter(changes: Vec<Change>, skip: ChangeKind) -> Vec<Change> {
    changes
        .into_iter()
        .filter_map(|change| match change {
            Change::ModifyTable { table, changes } if !skip.is(ChangeKind::MODIFY_TABLE) => {
                let changes = filter(changes, skip);
                (!changes.is_empty()).then_some(Change::ModifyTable { table, changes })
            }
            c if skip.is(c.kind()) => None,
            c => Some(c),
        })
        .collect()
}
