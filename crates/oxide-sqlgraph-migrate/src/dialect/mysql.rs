//! MySQL and MariaDB migration adapter.

use std::cmp::Ordering;

use async_trait::async_trait;

use oxide_sqlgraph::builder::{
    alter_table, and, column, create_index, create_table, drop_index, eq, select, table,
    ColumnBuilder, IndexBuilder, Predicate, Raw, TableAlter, TableBuilder,
};
use oxide_sqlgraph::Dialect;

use super::{default_value, exist, nullable, type_fields, typed, unique, SqlDialect};
use crate::driver::ExecQuerier;
use crate::error::{MigrateError, Result};
use crate::plan::Statement;
use crate::schema::{
    compare_versions, Column, FieldType, ForeignKey, Index, Key, Table, DEFAULT_STRING_LEN,
};

const MEDIUM_SIZE: i64 = (1 << 24) - 1;

/// MySQL migration adapter.
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect {
    schema: Option<String>,
    version: String,
}

impl MySqlDialect {
    /// Creates an adapter for the connection's current database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts introspection to `schema`.
    #[must_use]
    pub fn schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.map(String::from);
        self
    }

    /// Sets the server version instead of reading it in `init`.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The MariaDB version, when the server is MariaDB.
    fn mariadb(&self) -> Option<&str> {
        self.version
            .find("MariaDB")
            .map(|i| self.version[..i].trim_end_matches('-'))
    }

    fn supports_uuid(&self) -> bool {
        self.mariadb()
            .is_some_and(|v| compare_versions(v, "10.7.0") != Ordering::Less)
    }

    fn match_schema(&self) -> Predicate {
        match &self.schema {
            Some(schema) => eq("TABLE_SCHEMA", schema.as_str()),
            None => eq("TABLE_SCHEMA", Raw::new("(SELECT DATABASE())")),
        }
    }

    /// Default `varchar` size. Old servers limit index keys to 767 bytes, so
    /// indexed columns get 191 characters there.
    fn default_size(&self, c: &Column) -> i64 {
        let (version, checked) = match self.mariadb() {
            Some(v) => (v, "10.2.2"),
            None => (self.version.as_str(), "5.7.0"),
        };
        if compare_versions(version, checked) != Ordering::Less
            || (!c.unique && c.key == Key::None)
        {
            DEFAULT_STRING_LEN
        } else {
            191
        }
    }

    fn add_column(&self, c: &Column) -> Result<ColumnBuilder> {
        let mut b = unique(typed(self, c)?, c);
        if c.increment {
            b = b.attr("AUTO_INCREMENT");
        }
        b = default_value(nullable(b, c), c, "DEFAULT");
        if !c.collation.is_empty() {
            b = b.attr(&format!("COLLATE {}", c.collation));
        }
        Ok(b)
    }

    async fn indexes(&self, conn: &dyn ExecQuerier, t: &mut Table) -> Result<()> {
        let q = select(&["index_name", "column_name", "non_unique", "seq_in_index"])
            .from(table("STATISTICS").schema("INFORMATION_SCHEMA"))
            .where_clause(and(vec![self.match_schema(), eq("TABLE_NAME", t.name.as_str())]))
            .order_by(&["index_name", "seq_in_index"]);
        let rows = conn
            .query_querier(&q, Dialect::MySql)
            .await
            .map_err(|e| e.context("mysql: reading index description"))?;
        for row in rows.iter() {
            let name = row.text(0).unwrap_or_default();
            let col = row.text(1).unwrap_or_default();
            if name == "PRIMARY" {
                let c = t.column_mut(&col).ok_or_else(|| {
                    MigrateError::InvalidState(format!("missing primary-key column: {col:?}"))
                })?;
                c.key = Key::Primary;
                t.primary_key.push(col);
                continue;
            }
            match t.indexes.iter_mut().find(|idx| idx.name == name) {
                Some(idx) => idx.columns.push(col),
                None => t.indexes.push(Index::new(name, !row.flag(2), &[col])),
            }
        }
        Ok(())
    }

    fn scan_column(&self, c: &mut Column, default: Option<String>) -> Result<()> {
        let (parts, size, unsigned) = parse_column(&c.raw_type).ok_or_else(|| MigrateError::UnknownColumnType {
            column: c.name.clone(),
            ty: c.raw_type.clone(),
        })?;
        let pick = |signed: FieldType, unsigned_ty: FieldType| if unsigned { unsigned_ty } else { signed };
        c.ty = match parts[0].as_str() {
            "mediumint" | "int" => pick(FieldType::Int32, FieldType::Uint32),
            "smallint" => pick(FieldType::Int16, FieldType::Uint16),
            "bigint" => pick(FieldType::Int64, FieldType::Uint64),
            "tinyint" if size == 1 => FieldType::Bool,
            "tinyint" => pick(FieldType::Int8, FieldType::Uint8),
            "double" | "float" => FieldType::Float64,
            "numeric" | "decimal" => {
                c.schema_type
                    .insert(Dialect::MySql.name().to_string(), c.raw_type.clone());
                FieldType::Float64
            }
            "time" | "timestamp" | "date" | "datetime" => FieldType::Time,
            "tinyblob" => {
                c.size = i64::from(u8::MAX);
                FieldType::Bytes
            }
            "blob" => {
                c.size = i64::from(u16::MAX);
                FieldType::Bytes
            }
            "mediumblob" => {
                c.size = MEDIUM_SIZE;
                FieldType::Bytes
            }
            "longblob" => {
                c.size = i64::from(u32::MAX);
                FieldType::Bytes
            }
            "binary" | "varbinary" => {
                c.size = size;
                FieldType::Bytes
            }
            "varchar" => {
                c.size = size;
                FieldType::String
            }
            "text" => {
                c.size = i64::from(u16::MAX);
                FieldType::String
            }
            "mediumtext" => {
                c.size = MEDIUM_SIZE;
                FieldType::String
            }
            "longtext" => {
                c.size = i64::from(i32::MAX);
                FieldType::String
            }
            "json" => FieldType::Json,
            "enum" => {
                c.enums = parse_enum(&c.raw_type).ok_or_else(|| MigrateError::UnknownColumnType {
                    column: c.name.clone(),
                    ty: c.raw_type.clone(),
                })?;
                FieldType::Enum
            }
            // 32 hex digits and 4 hyphens.
            "char" if size == 36 => FieldType::Uuid,
            "char" | "point" | "geometry" | "linestring" | "polygon" => FieldType::Other,
            _ => {
                return Err(MigrateError::UnknownColumnType {
                    column: c.name.clone(),
                    ty: c.raw_type.clone(),
                })
            }
        };
        match default {
            Some(value) if c.ty != FieldType::Time => c.scan_default(&value),
            _ => Ok(()),
        }
    }
}

/// Splits a MySQL column type into its parts, size and signedness.
fn parse_column(typ: &str) -> Option<(Vec<String>, i64, bool)> {
    let parts = type_fields(typ);
    let mut size = 0;
    let mut unsigned = false;
    match parts.first()?.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "bigint" => match parts.len() {
            // int unsigned
            2 if parts[1] == "unsigned" => unsigned = true,
            // int(10) unsigned
            3 => {
                unsigned = true;
                size = parts[1].parse().ok()?;
            }
            // int(10)
            2 => size = parts[1].parse().ok()?,
            _ => {}
        },
        "varbinary" | "varchar" | "char" | "binary" => {
            if let Some(s) = parts.get(1) {
                size = s.parse().ok()?;
            }
        }
        _ => {}
    }
    Some((parts, size, unsigned))
}

/// Parses `enum('a','b')` into its values.
fn parse_enum(typ: &str) -> Option<Vec<String>> {
    let values = typ.strip_prefix("enum(")?.strip_suffix(')')?;
    if values.is_empty() {
        return None;
    }
    Some(
        values
            .split("','")
            .map(|v| v.trim_matches('\'').to_string())
            .collect(),
    )
}

#[async_trait]
impl SqlDialect for MySqlDialect {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn init(&mut self, conn: &dyn ExecQuerier) -> Result<()> {
        let rows = conn
            .query("SHOW VARIABLES LIKE 'version'", &[])
            .await
            .map_err(|e| e.context("mysql: querying mysql version"))?;
        let version = rows
            .iter()
            .next()
            .and_then(|row| row.text(1))
            .ok_or_else(|| MigrateError::InvalidState(String::from("mysql: version variable was not found")))?;
        self.version = version;
        Ok(())
    }

    async fn table_exist(&self, conn: &dyn ExecQuerier, name: &str) -> Result<bool> {
        let q = select(&[])
            .count(&[])
            .from(table("TABLES").schema("INFORMATION_SCHEMA"))
            .where_clause(and(vec![self.match_schema(), eq("TABLE_NAME", name)]));
        exist(conn, &q, Dialect::MySql).await
    }

    async fn table_names(&self, conn: &dyn ExecQuerier) -> Result<Vec<String>> {
        let q = select(&["TABLE_NAME"])
            .from(table("TABLES").schema("INFORMATION_SCHEMA"))
            .where_clause(self.match_schema())
            .order_by(&["TABLE_NAME"]);
        let rows = conn.query_querier(&q, Dialect::MySql).await?;
        Ok(rows.iter().filter_map(|row| row.text(0)).collect())
    }

    async fn fk_exist(&self, conn: &dyn ExecQuerier, _t: &Table, fk: &ForeignKey) -> Result<bool> {
        let q = select(&[])
            .count(&[])
            .from(table("TABLE_CONSTRAINTS").schema("INFORMATION_SCHEMA"))
            .where_clause(and(vec![
                self.match_schema(),
                eq("CONSTRAINT_TYPE", "FOREIGN KEY"),
                eq("CONSTRAINT_NAME", fk.symbol.as_str()),
            ]));
        exist(conn, &q, Dialect::MySql).await
    }

    async fn table(&self, conn: &dyn ExecQuerier, name: &str) -> Result<Table> {
        let q = select(&[
            "column_name",
            "column_type",
            "is_nullable",
            "column_key",
            "column_default",
            "extra",
        ])
        .from(table("COLUMNS").schema("INFORMATION_SCHEMA"))
        .where_clause(and(vec![self.match_schema(), eq("TABLE_NAME", name)]));
        let rows = conn
            .query_querier(&q, Dialect::MySql)
            .await
            .map_err(|e| e.context("mysql: reading table description"))?;
        let mut t = Table::new(name);
        for row in rows.iter() {
            let mut c = Column::new(row.text(0).unwrap_or_default(), FieldType::String);
            c.raw_type = row.text(1).unwrap_or_default().to_ascii_lowercase();
            c.nullable = row.text(2).as_deref() == Some("YES");
            c.key = Key::parse(&row.text(3).unwrap_or_default());
            c.unique = c.key == Key::Unique;
            c.attr = row.text(5).unwrap_or_default();
            c.increment = c.attr.contains("auto_increment");
            self.scan_column(&mut c, row.text(4))?;
            t.columns.push(c);
        }
        self.indexes(conn, &mut t).await?;
        Ok(t)
    }

    async fn set_range(&self, _conn: &dyn ExecQuerier, t: &Table, value: i64) -> Result<Vec<Statement>> {
        Ok(vec![Statement::raw(
            format!("set \"{}\" id range", t.name),
            format!("ALTER TABLE `{}` AUTO_INCREMENT = {value}", t.name),
        )])
    }

    async fn drop_index(&self, _conn: &dyn ExecQuerier, idx: &Index, table: &str) -> Result<Statement> {
        Ok(Statement::new(
            format!("drop index \"{}\"", idx.name),
            &drop_index(&idx.name).table(table),
            Dialect::MySql,
        ))
    }

    fn c_type(&self, c: &Column) -> Result<String> {
        if let Some(t) = c.schema_type_for(Dialect::MySql) {
            return Ok(t.to_ascii_lowercase());
        }
        let scanned = |fallback: &str| {
            if c.raw_type.is_empty() {
                fallback.to_string()
            } else {
                c.raw_type.clone()
            }
        };
        let t = match c.ty {
            FieldType::Bool => String::from("boolean"),
            FieldType::Int8 => String::from("tinyint"),
            FieldType::Uint8 => String::from("tinyint unsigned"),
            FieldType::Int16 => String::from("smallint"),
            FieldType::Uint16 => String::from("smallint unsigned"),
            FieldType::Int32 => String::from("int"),
            FieldType::Uint32 => String::from("int unsigned"),
            FieldType::Int | FieldType::Int64 => String::from("bigint"),
            FieldType::Uint | FieldType::Uint64 => String::from("bigint unsigned"),
            FieldType::Bytes => {
                let size = if c.size > 0 { c.size } else { i64::from(u16::MAX) };
                match size {
                    s if s <= i64::from(u8::MAX) => String::from("tinyblob"),
                    s if s <= i64::from(u16::MAX) => String::from("blob"),
                    s if s < 1 << 24 => String::from("mediumblob"),
                    _ => String::from("longblob"),
                }
            }
            FieldType::Json if compare_versions(&self.version, "5.7.8") == Ordering::Less => {
                String::from("longblob")
            }
            FieldType::Json => String::from("json"),
            FieldType::String => {
                let size = if c.size == 0 { self.default_size(c) } else { c.size };
                match size {
                    _ if c.raw_type == "tinytext" || c.raw_type == "text" => c.raw_type.clone(),
                    s if s <= i64::from(u16::MAX) => format!("varchar({s})"),
                    MEDIUM_SIZE => String::from("mediumtext"),
                    _ => String::from("longtext"),
                }
            }
            FieldType::Float32 | FieldType::Float64 => scanned("double"),
            FieldType::Time => scanned("timestamp"),
            FieldType::Enum => {
                let values: Vec<String> = c.enums.iter().map(|e| format!("'{e}'")).collect();
                format!("enum({})", values.join(", "))
            }
            FieldType::Uuid if self.supports_uuid() => String::from("uuid"),
            FieldType::Uuid => String::from("char(36) binary"),
            FieldType::Other if !c.raw_type.is_empty() => c.raw_type.clone(),
            FieldType::Other => {
                return Err(MigrateError::UnknownColumnType {
                    column: c.name.clone(),
                    ty: c.ty.to_string(),
                })
            }
        };
        Ok(t)
    }

    fn t_builder(&self, t: &Table) -> Result<TableBuilder> {
        let mut b = create_table(&t.name).if_not_exists();
        for c in &t.columns {
            b = b.column(self.add_column(c)?);
        }
        if !t.primary_key.is_empty() {
            b = b.primary_key(&t.primary_key);
        }
        Ok(b.charset("utf8mb4"))
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
        modify: &[Column],
        drop: &[Column],
    ) -> Result<Vec<TableAlter>> {
        let mut b = alter_table(&t.name);
        for c in add {
            b = b.add_column(self.add_column(c)?);
        }
        for c in modify {
            b = b.modify_column(self.add_column(c)?);
        }
        for c in drop {
            b = b.drop_column(column(&c.name));
        }
        Ok(if b.is_empty() { Vec::new() } else { vec![b] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::mock::{text, MockConn};
    use crate::schema::DefaultValue;
    use oxide_sqlgraph::builder::Querier;
    use oxide_sqlgraph::SqlValue;

    fn users() -> Table {
        Table::new("users")
            .add_primary(Column::new("id", FieldType::Int64).increment())
            .add_column(Column::new("name", FieldType::String).nullable())
            .add_column(Column::new("age", FieldType::Int64))
    }

    #[test]
    fn test_create_table() {
        let d = MySqlDialect::new().version("8.0.19");
        assert_eq!(
            d.t_builder(&users()).unwrap().query(Dialect::MySql).0,
            "CREATE TABLE IF NOT EXISTS `users`(`id` bigint AUTO_INCREMENT NOT NULL, `name` varchar(255) NULL, `age` bigint NOT NULL, PRIMARY KEY(`id`)) CHARACTER SET utf8mb4"
        );
    }

    #[test]
    fn test_c_type() {
        let d = MySqlDialect::new().version("5.6.35");
        let c = |ty| Column::new("c", ty);
        assert_eq!(d.c_type(&c(FieldType::Json)).unwrap(), "longblob");
        assert_eq!(d.c_type(&c(FieldType::Bool)).unwrap(), "boolean");
        assert_eq!(d.c_type(&c(FieldType::Uint32)).unwrap(), "int unsigned");
        assert_eq!(d.c_type(&c(FieldType::Bytes).size(100)).unwrap(), "tinyblob");
        assert_eq!(d.c_type(&c(FieldType::Bytes).size(1 << 20)).unwrap(), "mediumblob");
        assert_eq!(d.c_type(&c(FieldType::String).size(MEDIUM_SIZE)).unwrap(), "mediumtext");
        assert_eq!(d.c_type(&c(FieldType::String).size(1 << 30)).unwrap(), "longtext");
        assert_eq!(
            d.c_type(&c(FieldType::Enum).enums(&["a", "b"])).unwrap(),
            "enum('a', 'b')"
        );
        assert_eq!(d.c_type(&c(FieldType::Uuid)).unwrap(), "char(36) binary");
        assert_eq!(
            d.c_type(&c(FieldType::Float64).schema_type(Dialect::MySql, "DECIMAL(6,2)")).unwrap(),
            "decimal(6,2)"
        );
        assert!(d.c_type(&c(FieldType::Other)).is_err());

        let maria = MySqlDialect::new().version("10.7.1-MariaDB");
        assert_eq!(maria.c_type(&c(FieldType::Uuid)).unwrap(), "uuid");
        assert_eq!(maria.c_type(&c(FieldType::Json)).unwrap(), "json");
    }

    #[test]
    fn test_default_size() {
        let old = MySqlDialect::new().version("5.6.35");
        let plain = Column::new("name", FieldType::String);
        assert_eq!(old.c_type(&plain).unwrap(), "varchar(255)");
        assert_eq!(old.c_type(&plain.clone().unique()).unwrap(), "varchar(191)");
        let mut indexed = plain.clone();
        indexed.key = Key::Multiple;
        assert_eq!(old.c_type(&indexed).unwrap(), "varchar(191)");

        let maria = MySqlDialect::new().version("10.2.2-MariaDB");
        assert_eq!(maria.c_type(&plain.unique()).unwrap(), "varchar(255)");
    }

    #[test]
    fn test_parse_column() {
        assert_eq!(
            parse_column("int(10) unsigned"),
            Some((vec![String::from("int"), String::from("10"), String::from("unsigned")], 10, true))
        );
        assert_eq!(parse_column("bigint unsigned").map(|p| (p.1, p.2)), Some((0, true)));
        assert_eq!(parse_column("varchar(191)").map(|p| p.1), Some(191));
        assert_eq!(
            parse_enum("enum('a','b b')"),
            Some(vec![String::from("a"), String::from("b b")])
        );
    }

    #[test]
    fn test_alter_columns() {
        let d = MySqlDialect::new().version("8.0.19");
        let t = users();
        let alters = d
            .alter_columns(
                &t,
                &[Column::new("nick", FieldType::String).nullable()],
                &[Column::new("age", FieldType::Int64).nullable()],
                &[Column::new("old", FieldType::Int32)],
            )
            .unwrap();
        assert_eq!(alters.len(), 1);
        assert_eq!(
            alters[0].query(Dialect::MySql).0,
            "ALTER TABLE `users` ADD COLUMN `nick` varchar(255) NULL, MODIFY COLUMN `age` bigint NULL, DROP COLUMN `old`"
        );
        assert!(d.alter_columns(&t, &[], &[], &[]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_and_exist() {
        let conn = MockConn::new()
            .on("SHOW VARIABLES", &["Variable_name", "Value"], vec![vec![text("version"), text("5.7.23")]])
            .on("`TABLES`", &["COUNT(*)"], vec![vec![SqlValue::Int(1)]]);
        let mut d = MySqlDialect::new();
        d.init(&conn).await.unwrap();
        assert_eq!(d.version, "5.7.23");
        assert!(d.table_exist(&conn, "users").await.unwrap());
        let fk = ForeignKey::new("pets_owner", &["owner_id"], "users", &["id"]);
        assert!(!d.fk_exist(&conn, &users(), &fk).await.unwrap());

        let queries = conn.queries();
        assert!(queries[1].starts_with("SELECT COUNT(*) FROM `INFORMATION_SCHEMA`.`TABLES` WHERE"));
        assert!(queries[1].contains("(SELECT DATABASE())"));

        let scoped = MySqlDialect::new().schema(Some("app"));
        scoped.table_exist(&conn, "users").await.unwrap();
        let log = conn.log.lock().unwrap();
        assert_eq!(log.last().map(|(_, args)| args.clone()), Some(vec![text("app"), text("users")]));
    }

    #[tokio::test]
    async fn test_init_missing_version() {
        let conn = MockConn::new();
        assert!(MySqlDialect::new().init(&conn).await.is_err());
    }

    #[tokio::test]
    async fn test_table() {
        let null = SqlValue::Null;
        let conn = MockConn::new()
            .on(
                "`COLUMNS`",
                &["column_name", "column_type", "is_nullable", "column_key", "column_default", "extra"],
                vec![
                    vec![text("id"), text("bigint(20)"), text("NO"), text("PRI"), null.clone(), text("auto_increment")],
                    vec![text("name"), text("varchar(255)"), text("YES"), text(""), null.clone(), text("")],
                    vec![text("email"), text("varchar(191)"), text("NO"), text("UNI"), null.clone(), text("")],
                    vec![text("active"), text("tinyint(1)"), text("NO"), text(""), text("1"), text("")],
                    vec![text("uid"), text("char(36)"), text("NO"), text(""), null.clone(), text("")],
                    vec![text("status"), text("enum('on','off')"), text("NO"), text(""), text("on"), text("")],
                    vec![text("created_at"), text("timestamp"), text("NO"), text(""), text("CURRENT_TIMESTAMP"), text("")],
                ],
            )
            .on(
                "`STATISTICS`",
                &["index_name", "column_name", "non_unique", "seq_in_index"],
                vec![
                    vec![text("PRIMARY"), text("id"), SqlValue::Int(0), SqlValue::Int(1)],
                    vec![text("email"), text("email"), SqlValue::Int(0), SqlValue::Int(1)],
                    vec![text("name_status"), text("name"), SqlValue::Int(1), SqlValue::Int(1)],
                    vec![text("name_status"), text("status"), SqlValue::Int(1), SqlValue::Int(2)],
                ],
            );
        let d = MySqlDialect::new().version("8.0.19");
        let t = d.table(&conn, "users").await.unwrap();

        assert_eq!(t.primary_key, vec![String::from("id")]);
        assert!(t.column("id").unwrap().increment);
        assert_eq!(t.column("name").map(|c| (c.ty, c.size, c.nullable)), Some((FieldType::String, 255, true)));
        assert!(t.column("email").unwrap().unique);
        let active = t.column("active").unwrap();
        assert_eq!((active.ty, active.default.clone()), (FieldType::Bool, Some(DefaultValue::Bool(true))));
        assert_eq!(t.column("uid").map(|c| c.ty), Some(FieldType::Uuid));
        let status = t.column("status").unwrap();
        assert_eq!(status.enums, vec![String::from("on"), String::from("off")]);
        assert_eq!(status.default, Some(DefaultValue::Text(String::from("on"))));
        assert_eq!(t.column("created_at").unwrap().default, None);
        assert_eq!(
            t.index("name_status"),
            Some(Index::new("name_status", false, &["name", "status"]))
        );
        assert_eq!(t.index("email").map(|i| i.unique), Some(true));

        // Inspected columns render to the same native types.
        assert_eq!(d.c_type(t.column("email").unwrap()).unwrap(), "varchar(191)");
        assert_eq!(d.c_type(t.column("created_at").unwrap()).unwrap(), "timestamp");
        assert_eq!(d.c_type(t.column("status").unwrap()).unwrap(), "enum('on', 'off')");
    }

    #[tokio::test]
    async fn test_set_range_and_drop_index() {
        let conn = MockConn::new();
        let d = MySqlDialect::new();
        let stmts = d.set_range(&conn, &users(), 1 << 32).await.unwrap();
        assert_eq!(stmts[0].sql, "ALTER TABLE `users` AUTO_INCREMENT = 4294967296");
        let stmt = d
            .drop_index(&conn, &Index::new("name", false, &["name"]), "users")
            .await
            .unwrap();
        assert_eq!(stmt.sql, "DROP INDEX `name` ON `users`");
    }
}
