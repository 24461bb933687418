//! Schema inspection, diffing and migration for `oxide-sqlgraph`.
//!
//! `oxide-sqlgraph-migrate` takes the tables an application expects and
//! makes a live database match them:
//! - Missing tables are created, existing ones get new columns, widened
//!   types, nullability changes and index changes
//! - Changes that may lose data (narrowing a type, changing a primary key)
//!   are refused before anything runs
//! - Everything runs in one transaction and rolls back on failure
//! - Tables can share a 64-bit id space, each owning a `1 << 32` wide range
//!
//! # Architecture
//!
//! - **Driver** - The narrow async interface statements run through
//! - **Schema** - `Table`, `Column`, `Index` and `ForeignKey` descriptors
//! - **Dialect** - Per-engine introspection, type mapping and DDL rendering
//! - **Migrate** - The engine, with a classic path and a hookable plan path
//! - **Writer** - Versioned migration files instead of direct execution
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oxide_sqlgraph_migrate::prelude::*;
//!
//! # async fn run() -> oxide_sqlgraph_migrate::error::Result<()> {
//! let driver = SqliteDriver::connect("sqlite:app.db").await?;
//! let users = Table::new("users")
//!     .add_primary(Column::new("id", FieldType::Int64).increment())
//!     .add_column(Column::new("name", FieldType::String).unique());
//!
//! let migrate = Migrate::new(Arc::new(driver), MigrateOptions::new().global_unique_id(true));
//! migrate.create(&[users]).await?;
//! # Ok(())
//! # }
//! ```

pub mod change;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod global_id;
pub mod inspect;
pub mod migrate;
pub mod plan;
pub mod schema;
pub mod writer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::change::{Change, ChangeKind};
    pub use crate::dialect::{adapter, MySqlDialect, PostgresDialect, SqlDialect, SqliteDialect};
    pub use crate::driver::{DebugDriver, Driver, ExecQuerier, Rows, SqliteDriver, Tx, WriteDriver};
    pub use crate::error::{MigrateError, Result};
    pub use crate::inspect::Inspector;
    pub use crate::migrate::{Migrate, MigrateOptions};
    pub use crate::plan::{
        Applier, ApplyFn, ApplyHook, DiffFn, DiffHook, Differ, ExecApplier, Plan, Statement,
    };
    pub use crate::schema::{
        Column, DefaultValue, FieldType, ForeignKey, Index, Key, ReferenceOption, Table,
    };
    pub use crate::writer::DirWriter;
}
