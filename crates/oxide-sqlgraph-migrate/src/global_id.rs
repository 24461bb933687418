//! Globally unique ids.
//!
//! Every table that opts in gets its own 1<<32 wide slice of the 64-bit id
//! space. Slices are handed out in the order types are recorded in the
//! `ent_types` table, so the n-th recorded type starts at `n << 32`. Rows
//! are only ever appended; a table that is dropped and created again gets
//! its old slice back.

use oxide_sqlgraph::builder::{insert, select, table};

use crate::dialect::SqlDialect;
use crate::driver::ExecQuerier;
use crate::error::{MigrateError, Result};
use crate::plan::Statement;
use crate::schema::{Column, FieldType, Table};

/// Name of the type metadata table.
pub const TYPE_TABLE: &str = "ent_types";

/// Maximum number of recorded types.
pub const MAX_TYPES: usize = u16::MAX as usize;

/// Descriptor of the type metadata table.
#[must_use]
pub fn type_table() -> Table {
    Table::new(TYPE_TABLE)
        .add_primary(Column::new("id", FieldType::Uint64).increment())
        .add_column(Column::new("type", FieldType::String).unique())
}

/// The first id of the `index`-th type.
pub fn offset(index: usize) -> Result<i64> {
    let index = u16::try_from(index).map_err(|_| MigrateError::MaxTypesExceeded(index))?;
    Ok(i64::from(index) << 32)
}

/// Recorded type names, in allocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRanges {
    types: Vec<String>,
}

impl TypeRanges {
    /// Reads the recorded types.
    ///
    /// When the metadata table does not exist yet, the returned statements
    /// create it and the list starts empty.
    pub async fn load(conn: &dyn ExecQuerier, adapter: &dyn SqlDialect) -> Result<(Self, Vec<Statement>)> {
        if !adapter.table_exist(conn, TYPE_TABLE).await? {
            let stmt = Statement::new(
                format!("create \"{TYPE_TABLE}\" table"),
                &adapter.t_builder(&type_table())?,
                adapter.dialect(),
            );
            return Ok((Self::default(), vec![stmt]));
        }
        let rows = conn
            .query_querier(
                &select(&["type"]).from(table(TYPE_TABLE)).order_by(&["id"]),
                adapter.dialect(),
            )
            .await
            .map_err(|e| e.context("querying types"))?;
        let types = rows.iter().filter_map(|row| row.text(0)).collect();
        Ok((Self { types }, Vec::new()))
    }

    /// Recorded type names.
    #[must_use]
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Statements giving `t` its id range.
    ///
    /// A type seen before reuses its slice. A new type is recorded first,
    /// which fails once [`MAX_TYPES`] types exist.
    pub async fn alloc(
        &mut self,
        conn: &dyn ExecQuerier,
        adapter: &dyn SqlDialect,
        t: &Table,
    ) -> Result<Vec<Statement>> {
        let mut stmts = Vec::new();
        let index = if let Some(i) = self.types.iter().position(|name| *name == t.name) {
            i
        } else {
            if self.types.len() >= MAX_TYPES {
                return Err(MigrateError::MaxTypesExceeded(self.types.len()));
            }
            stmts.push(Statement::new(
                format!("record \"{}\" type", t.name),
                &insert(TYPE_TABLE).set("type", t.name.as_str()),
                adapter.dialect(),
            ));
            self.types.push(t.name.clone());
            self.types.len() - 1
        };
        stmts.extend(adapter.set_range(conn, t, offset(index)?).await?);
        Ok(stmts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::mock::{text, MockConn};
    use crate::dialect::MySqlDialect;

    #[test]
    fn test_offset() {
        assert_eq!(offset(0).unwrap(), 0);
        assert_eq!(offset(1).unwrap(), 1 << 32);
        assert_eq!(offset(3).unwrap(), 3 << 32);
        assert!(offset(usize::from(u16::MAX) + 1).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_table() {
        let conn = MockConn::new();
        let adapter = MySqlDialect::new().version("8.0.19");
        let (ranges, stmts) = TypeRanges::load(&conn, &adapter).await.unwrap();
        assert!(ranges.types().is_empty());
        assert_eq!(
            stmts[0].sql,
            "CREATE TABLE IF NOT EXISTS `ent_types`(`id` bigint unsigned AUTO_INCREMENT NOT NULL, `type` varchar(255) UNIQUE NOT NULL, PRIMARY KEY(`id`)) CHARACTER SET utf8mb4"
        );
    }

    #[tokio::test]
    async fn test_alloc_reuses_recorded_range() {
        let conn = MockConn::new()
            .on("`TABLES`", &["COUNT(*)"], vec![vec![oxide_sqlgraph::SqlValue::Int(1)]])
            .on("`ent_types`", &["type"], vec![vec![text("users")], vec![text("pets")]]);
        let adapter = MySqlDialect::new().version("8.0.19");
        let (mut ranges, stmts) = TypeRanges::load(&conn, &adapter).await.unwrap();
        assert!(stmts.is_empty());
        assert_eq!(ranges.types(), ["users", "pets"]);

        let stmts = ranges.alloc(&conn, &adapter, &Table::new("pets")).await.unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].sql, "ALTER TABLE `pets` AUTO_INCREMENT = 4294967296");

        let stmts = ranges.alloc(&conn, &adapter, &Table::new("groups")).await.unwrap();
        assert_eq!(stmts[0].sql, "INSERT INTO `ent_types` (`type`) VALUES (?)");
        assert_eq!(stmts[1].sql, "ALTER TABLE `groups` AUTO_INCREMENT = 8589934592");
        assert_eq!(ranges.types().len(), 3);
    }

    #[tokio::test]
    async fn test_alloc_limit() {
        let conn = MockConn::new();
        let adapter = MySqlDialect::new();
        let mut ranges = TypeRanges {
            types: (0..MAX_TYPES).map(|i| format!("t{i}")).collect(),
        };
        let err = ranges.alloc(&conn, &adapter, &Table::new("one_more")).await.unwrap_err();
        assert!(matches!(err, MigrateError::MaxTypesExceeded(n) if n == MAX_TYPES));
    }
}
