//! SQLite migration adapter.
//!
//! SQLite cannot add constraints to an existing table, so foreign keys are
//! declared inline in `CREATE TABLE` and on `ADD COLUMN`. Columns are never
//! modified or dropped.

use async_trait::async_trait;

use oxide_sqlgraph::builder::{
    alter_table, and, create_index, create_table, drop_index, eq, insert, like, not, reference,
    select, table, update, ColumnBuilder, IndexBuilder, Querier, TableAlter, TableBuilder,
};
use oxide_sqlgraph::Dialect;

use super::{default_value, exist, nullable, type_fields, typed, unique, SqlDialect};
use crate::driver::ExecQuerier;
use crate::error::{MigrateError, Result};
use crate::plan::Statement;
use crate::schema::{Column, FieldType, ForeignKey, Index, Key, Table, DEFAULT_STRING_LEN};

/// SQLite migration adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add_column(&self, c: &Column) -> Result<ColumnBuilder> {
        let mut b = unique(typed(self, c)?, c);
        if c.increment {
            b = b.attr("PRIMARY KEY AUTOINCREMENT");
        }
        Ok(default_value(nullable(b, c), c, "DEFAULT"))
    }

    async fn indexes(&self, conn: &dyn ExecQuerier, t: &mut Table) -> Result<()> {
        let rows = conn
            .query(&format!("pragma index_list({})", literal(&t.name)), &[])
            .await?;
        let mut found = Vec::new();
        // seq, name, unique, origin, partial
        for row in rows.iter() {
            let origin = row.text(3).unwrap_or_default();
            if origin == "pk" {
                continue;
            }
            found.push((row.text(1).unwrap_or_default(), row.int(2) == Some(1), origin == "u"));
        }
        for (name, is_unique, implicit) in found {
            let info = conn
                .query(&format!("pragma index_info({})", literal(&name)), &[])
                .await?;
            // seqno, cid, name
            let columns: Vec<String> = info.iter().filter_map(|row| row.text(2)).collect();
            if is_unique && columns.len() == 1 {
                if let Some(c) = t.column_mut(&columns[0]) {
                    c.unique = true;
                    if c.key == Key::None {
                        c.key = Key::Unique;
                    }
                }
            }
            // Autoindexes behind UNIQUE columns cannot be referenced by name.
            let name = if implicit && columns.len() == 1 {
                columns[0].clone()
            } else {
                name
            };
            t.indexes.push(Index::new(name, is_unique, &columns));
        }
        Ok(())
    }
}

/// Maps a declared SQLite type back to a logical column type.
fn type_field(c: &mut Column, declared: &str) -> Result<()> {
    let parts = type_fields(declared);
    let unknown = || MigrateError::UnknownColumnType {
        column: c.name.clone(),
        ty: declared.to_string(),
    };
    let head = parts.first().map(String::as_str).unwrap_or_default();
    c.ty = match head {
        "bool" | "boolean" => FieldType::Bool,
        "int" | "integer" => FieldType::Int32,
        "smallint" => FieldType::Int16,
        "bigint" => FieldType::Int64,
        "tinyint" => FieldType::Int8,
        "double" | "real" | "float" => FieldType::Float64,
        "timestamp" | "datetime" => FieldType::Time,
        "blob" => {
            c.size = i64::from(u32::MAX);
            FieldType::Bytes
        }
        "text" => {
            c.size = i64::from(i32::MAX);
            FieldType::String
        }
        "varchar" => {
            if let Some(size) = parts.get(1) {
                c.size = size.parse().map_err(|_| unknown())?;
            }
            FieldType::String
        }
        "json" => FieldType::Json,
        "uuid" => FieldType::Uuid,
        "enum" => {
            c.enums = parts[1..].iter().map(|e| e.trim_matches('\'').to_string()).collect();
            FieldType::Enum
        }
        _ => return Err(unknown()),
    };
    Ok(())
}

/// A single-quoted SQL string literal.
fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[async_trait]
impl SqlDialect for SqliteDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn init(&mut self, conn: &dyn ExecQuerier) -> Result<()> {
        let rows = conn.query("PRAGMA foreign_keys", &[]).await?;
        if rows.first_int().unwrap_or(0) > 0 {
            Ok(())
        } else {
            Err(MigrateError::ForeignKeysDisabled)
        }
    }

    async fn table_exist(&self, conn: &dyn ExecQuerier, name: &str) -> Result<bool> {
        let q = select(&[])
            .count(&[])
            .from(table("sqlite_master"))
            .where_clause(and(vec![eq("type", "table"), eq("name", name)]));
        exist(conn, &q, Dialect::Sqlite).await
    }

    async fn table_names(&self, conn: &dyn ExecQuerier) -> Result<Vec<String>> {
        let q = select(&["name"])
            .from(table("sqlite_master"))
            .where_clause(and(vec![eq("type", "table"), not(like("name", "sqlite_%"))]))
            .order_by(&["name"]);
        let rows = conn.query_querier(&q, Dialect::Sqlite).await?;
        Ok(rows.iter().filter_map(|row| row.text(0)).collect())
    }

    async fn fk_exist(&self, conn: &dyn ExecQuerier, t: &Table, fk: &ForeignKey) -> Result<bool> {
        let rows = conn
            .query(&format!("pragma foreign_key_list({})", literal(&t.name)), &[])
            .await?;
        // id, seq, table, from, to, on_update, on_delete, match
        let exists = rows.iter().any(|row| {
            row.text(2).as_deref() == Some(fk.ref_table.as_str())
                && row.text(3).as_deref() == fk.columns.first().map(String::as_str)
                && row.text(4).as_deref() == fk.ref_columns.first().map(String::as_str)
        });
        Ok(exists)
    }

    async fn table(&self, conn: &dyn ExecQuerier, name: &str) -> Result<Table> {
        let rows = conn
            .query(&format!("pragma table_info({})", literal(name)), &[])
            .await
            .map_err(|e| e.context(format!("reading table description of {name:?}")))?;
        let mut t = Table::new(name);
        let mut pk = Vec::new();
        for row in rows.iter() {
            let mut c = Column::new(row.text(1).unwrap_or_default(), FieldType::String);
            let declared = row.text(2).unwrap_or_default();
            type_field(&mut c, &declared)?;
            c.raw_type = declared.to_ascii_lowercase();
            c.nullable = row.int(3) == Some(0);
            if let Some(default) = row.text(4) {
                c.scan_default(&default)?;
            }
            let position = row.int(5).unwrap_or(0);
            if position > 0 {
                c.key = Key::Primary;
                pk.push((position, c.name.clone()));
            }
            t.columns.push(c);
        }
        pk.sort();
        t.primary_key = pk.into_iter().map(|(_, name)| name).collect();
        self.indexes(conn, &mut t).await?;
        Ok(t)
    }

    async fn set_range(&self, conn: &dyn ExecQuerier, t: &Table, value: i64) -> Result<Vec<Statement>> {
        let comment = format!("set \"{}\" id range", t.name);
        let sequence = self.table_exist(conn, "sqlite_sequence").await?
            && exist(
                conn,
                &select(&[])
                    .count(&[])
                    .from(table("sqlite_sequence"))
                    .where_clause(eq("name", t.name.as_str())),
                Dialect::Sqlite,
            )
            .await?;
        let stmt = if sequence {
            Statement::new(
                comment,
                &update("sqlite_sequence")
                    .set("seq", value)
                    .where_clause(eq("name", t.name.as_str())),
                Dialect::Sqlite,
            )
        } else {
            Statement::new(
                comment,
                &insert("sqlite_sequence")
                    .set("name", t.name.as_str())
                    .set("seq", value),
                Dialect::Sqlite,
            )
        };
        Ok(vec![stmt])
    }

    async fn drop_index(&self, _conn: &dyn ExecQuerier, idx: &Index, _table: &str) -> Result<Statement> {
        Ok(Statement::new(
            format!("drop index \"{}\"", idx.name),
            &drop_index(&idx.name),
            Dialect::Sqlite,
        ))
    }

    fn c_type(&self, c: &Column) -> Result<String> {
        if let Some(t) = c.schema_type_for(Dialect::Sqlite) {
            return Ok(t.to_string());
        }
        let t = match c.ty {
            FieldType::Bool => String::from("bool"),
            // AUTOINCREMENT is only allowed on INTEGER PRIMARY KEY.
            t if t.is_integer() => String::from("integer"),
            FieldType::Bytes => String::from("blob"),
            FieldType::String | FieldType::Enum => {
                let size = if c.size == 0 { DEFAULT_STRING_LEN } else { c.size };
                format!("varchar({size})")
            }
            FieldType::Float32 | FieldType::Float64 => String::from("real"),
            FieldType::Time => String::from("datetime"),
            FieldType::Json => String::from("json"),
            FieldType::Uuid => String::from("uuid"),
            _ => {
                return Err(MigrateError::UnknownColumnType {
                    column: c.name.clone(),
                    ty: c.ty.to_string(),
                })
            }
        };
        Ok(t)
    }

    fn t_builder(&self, t: &Table) -> Result<TableBuilder> {
        let mut b = create_table(&t.name);
        for c in &t.columns {
            b = b.column(self.add_column(c)?);
        }
        b = b.foreign_keys(t.foreign_keys.iter().map(ForeignKey::dsl));
        let inline_pk = t.primary_key.len() == 1 && t.primary_key_columns().any(|c| c.increment);
        if !inline_pk && !t.primary_key.is_empty() {
            b = b.primary_key(&t.primary_key);
        }
        Ok(b)
    }

    fn add_index(&self, idx: &Index, table: &str) -> IndexBuilder {
        let b = create_index(&idx.name).table(table).columns(&idx.columns);
        if idx.unique {
            b.unique()
        } else {
            b
        }
    }

    fn alter_columns(
        &self,
        t: &Table,
        add: &[Column],
        _modify: &[Column],
        _drop: &[Column],
    ) -> Result<Vec<TableAlter>> {
        let mut alters = Vec::with_capacity(add.len());
        for c in add {
            let mut b = self.add_column(c)?;
            let fk = t
                .foreign_keys
                .iter()
                .find(|fk| fk.columns.len() == 1 && fk.columns[0] == c.name);
            if let Some(fk) = fk {
                let (clause, _) = reference()
                    .table(&fk.ref_table)
                    .columns(&fk.ref_columns)
                    .query(Dialect::Sqlite);
                b = b.attr(&clause);
                if let Some(action) = fk.on_delete {
                    b = b.attr(&format!("ON DELETE {}", action.as_str()));
                }
                if let Some(action) = fk.on_update {
                    b = b.attr(&format!("ON UPDATE {}", action.as_str()));
                }
            }
            alters.push(alter_table(&t.name).add_column(b));
        }
        Ok(alters)
    }
}
