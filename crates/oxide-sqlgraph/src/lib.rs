//! # oxide-sqlgraph
//!
//! Dialect-aware SQL construction for graph-shaped schemas.
//!
//! This crate provides:
//! - Statement builders (`SELECT`, `INSERT`, `UPDATE`, `DELETE` and DDL)
//!   rendering SQL text plus bound arguments for MySQL, Postgres and SQLite
//! - A composable predicate algebra
//! - Translation of relationship steps into neighbor queries and existence
//!   filters
//!
//! Nothing here performs I/O. Rendering is pure and every statement can be
//! rendered many times, for any [`Dialect`]:
//!
//! ```rust
//! use oxide_sqlgraph::builder::{eq, or, update, Querier};
//! use oxide_sqlgraph::Dialect;
//!
//! let stmt = update("users")
//!     .set("name", "foo")
//!     .where_clause(or(vec![eq("age", 10), eq("age", 20)]));
//!
//! let (sql, _) = stmt.query(Dialect::MySql);
//! assert_eq!(sql, "UPDATE `users` SET `name` = ? WHERE `age` = ? OR `age` = ?");
//!
//! let (sql, args) = stmt.query(Dialect::Postgres);
//! assert_eq!(sql, r#"UPDATE "users" SET "name" = $1 WHERE "age" = $2 OR "age" = $3"#);
//! assert_eq!(args.len(), 3);
//! ```

pub mod builder;
pub mod dialect;
pub mod graph;

pub use builder::{Querier, Selector, SqlValue};
pub use dialect::Dialect;
pub use graph::{GraphError, Step};
