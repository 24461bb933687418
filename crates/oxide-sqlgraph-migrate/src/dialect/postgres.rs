//! PostgreSQL migration adapter.

use std::cmp::Ordering;

use async_trait::async_trait;

use oxide_sqlgraph::builder::{
    alter_table, and, column, create_index, create_table, eq, select, table, ColumnBuilder,
    IndexBuilder, Predicate, Raw, TableAlter, TableBuilder,
};
use oxide_sqlgraph::{Dialect, SqlValue};

use super::{default_value, exist, nullable, typed, unique, SqlDialect};
use crate::driver::ExecQuerier;
use crate::error::{MigrateError, Result};
use crate::plan::Statement;
use crate::schema::{compare_versions, Column, FieldType, ForeignKey, Index, Key, Table};

/// Strings above this size are stored as `text`.
const MAX_CHAR_SIZE: i64 = 10 << 20;

const MIN_VERSION: &str = "10.0.0";

/// PostgreSQL migration adapter.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect {
    schema: Option<String>,
    version: String,
}

impl PostgresDialect {
    /// Creates an adapter for the connection's current schema.
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

    fn match_schema(&self) -> Predicate {
        match &self.schema {
            Some(schema) => eq("table_schema", schema.as_str()),
            None => eq("table_schema", Raw::new("CURRENT_SCHEMA()")),
        }
    }

    fn add_column(&self, c: &Column) -> Result<ColumnBuilder> {
        let mut b = unique(typed(self, c)?, c);
        if c.increment {
            b = b.attr("GENERATED BY DEFAULT AS IDENTITY");
        }
        b = default_value(nullable(b, c), c, "DEFAULT");
        if !c.collation.is_empty() {
            b = b.attr(&format!("COLLATE \"{}\"", c.collation));
        }
        Ok(b)
    }

    async fn indexes(&self, conn: &dyn ExecQuerier, t: &mut Table) -> Result<()> {
        let (namespace, mut args) = match &self.schema {
            Some(schema) => ("$2", vec![SqlValue::Text(schema.clone())]),
            None => ("CURRENT_SCHEMA()", Vec::new()),
        };
        args.insert(0, SqlValue::Text(t.name.clone()));
        let query = format!(
            "SELECT i.relname AS index_name, a.attname AS column_name, idx.indisprimary AS primary, \
             idx.indisunique AS unique, array_position(idx.indkey, a.attnum) AS seq_in_index \
             FROM pg_class t, pg_class i, pg_index idx, pg_attribute a, pg_namespace n \
             WHERE t.oid = idx.indrelid AND i.oid = idx.indexrelid AND n.oid = t.relnamespace \
             AND a.attrelid = t.oid AND a.attnum = ANY(idx.indkey) AND t.relkind = 'r' \
             AND t.relname = $1 AND n.nspname = {namespace} \
             ORDER BY index_name, seq_in_index"
        );
        let rows = conn
            .query(&query, &args)
            .await
            .map_err(|e| e.context("postgres: reading index description"))?;

        // (name, primary, unique, columns) in name order.
        let mut groups: Vec<(String, bool, bool, Vec<String>)> = Vec::new();
        for row in rows.iter() {
            let name = row.text(0).unwrap_or_default();
            let col = row.text(1).unwrap_or_default();
            match groups.iter_mut().find(|g| g.0 == name) {
                Some(g) => g.3.push(col),
                None => groups.push((name, row.flag(2), row.flag(3), vec![col])),
            }
        }
        let prefix = format!("{}_", t.name);
        for (name, primary, is_unique, columns) in groups {
            if primary {
                for col in columns {
                    if let Some(c) = t.column_mut(&col) {
                        c.key = Key::Primary;
                    }
                    t.primary_key.push(col);
                }
                continue;
            }
            if is_unique && columns.len() == 1 {
                if let Some(c) = t.column_mut(&columns[0]) {
                    c.unique = true;
                    if c.key == Key::None {
                        c.key = Key::Unique;
                    }
                }
            }
            let name = name.strip_prefix(&prefix).unwrap_or(&name).to_string();
            t.indexes.push(Index::new(name, is_unique, &columns));
        }
        Ok(())
    }
}

/// Reports whether `name` already identifies the index without a table
/// prefix. Names made of the indexed columns only are not.
fn has_unique_name(name: &str, columns: &[String]) -> bool {
    let name = name.strip_suffix("_key").unwrap_or(name);
    let suffix = columns.join("_");
    if !name.ends_with(&suffix) {
        return true;
    }
    name != suffix
}

/// Defaults computed by a function call, e.g. `nextval('users_id_seq'::regclass)`.
fn call_expr(value: &str) -> bool {
    value.contains('(') && value.ends_with(')')
}

fn scan_column(
    c: &mut Column,
    data_type: &str,
    udt: &str,
    precision: Option<i64>,
    scale: Option<i64>,
    max_len: Option<i64>,
) -> Result<()> {
    c.ty = match data_type {
        "boolean" => FieldType::Bool,
        "smallint" => FieldType::Int16,
        "integer" => FieldType::Int32,
        "bigint" => FieldType::Int64,
        "real" => FieldType::Float32,
        "double precision" => FieldType::Float64,
        "numeric" | "decimal" => {
            c.schema_type.insert(
                Dialect::Postgres.name().to_string(),
                format!("numeric({},{})", precision.unwrap_or(0), scale.unwrap_or(0)),
            );
            FieldType::Float64
        }
        "text" => {
            c.size = MAX_CHAR_SIZE + 1;
            FieldType::String
        }
        "character" | "character varying" => {
            c.size = max_len.unwrap_or(0);
            FieldType::String
        }
        "date" | "time" | "timestamp" | "timestamp with time zone" | "timestamp without time zone"
        | "time with time zone" | "time without time zone" => {
            c.raw_type = data_type.to_string();
            FieldType::Time
        }
        "bytea" => FieldType::Bytes,
        "json" | "jsonb" => FieldType::Json,
        "uuid" => FieldType::Uuid,
        "cidr" | "inet" | "macaddr" | "macaddr8" | "point" | "line" | "lseg" | "box" | "path"
        | "polygon" | "circle" => {
            c.raw_type = data_type.to_string();
            FieldType::Other
        }
        "ARRAY" => {
            c.raw_type = udt.to_string();
            c.schema_type
                .insert(Dialect::Postgres.name().to_string(), String::from("ARRAY"));
            FieldType::Other
        }
        "USER-DEFINED" | "tstzrange" | "interval" => {
            c.raw_type = udt.to_string();
            c.schema_type
                .insert(Dialect::Postgres.name().to_string(), udt.to_string());
            FieldType::Other
        }
        _ => {
            return Err(MigrateError::UnknownColumnType {
                column: c.name.clone(),
                ty: data_type.to_string(),
            })
        }
    };
    Ok(())
}

/// Strips the type cast from a default, e.g. `'x'::character varying`.
fn strip_cast(value: &str) -> &str {
    value.split("::").next().unwrap_or(value)
}

#[async_trait]
impl SqlDialect for PostgresDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn init(&mut self, conn: &dyn ExecQuerier) -> Result<()> {
        let rows = conn
            .query("SHOW server_version_num", &[])
            .await
            .map_err(|e| e.context("postgres: querying server version"))?;
        let raw = rows
            .iter()
            .next()
            .and_then(|row| row.text(0))
            .ok_or_else(|| MigrateError::InvalidState(String::from("postgres: server_version_num was not found")))?;
        let unsupported = |version: String| MigrateError::UnsupportedVersion {
            dialect: "postgres",
            version,
            minimum: MIN_VERSION,
        };
        if raw.len() < 6 || !raw.is_ascii() {
            return Err(unsupported(raw));
        }
        let version = format!("{}.{}.{}", &raw[..2], &raw[2..4], &raw[4..]);
        if compare_versions(&version, MIN_VERSION) == Ordering::Less {
            return Err(unsupported(version));
        }
        self.version = version;
        Ok(())
    }

    async fn table_exist(&self, conn: &dyn ExecQuerier, name: &str) -> Result<bool> {
        let q = select(&[])
            .count(&[])
            .from(table("tables").schema("information_schema"))
            .where_clause(and(vec![self.match_schema(), eq("table_name", name)]));
        exist(conn, &q, Dialect::Postgres).await
    }

    async fn table_names(&self, conn: &dyn ExecQuerier) -> Result<Vec<String>> {
        let q = select(&["table_name"])
            .from(table("tables").schema("information_schema"))
            .where_clause(and(vec![self.match_schema(), eq("table_type", "BASE TABLE")]))
            .order_by(&["table_name"]);
        let rows = conn.query_querier(&q, Dialect::Postgres).await?;
        Ok(rows.iter().filter_map(|row| row.text(0)).collect())
    }

    async fn fk_exist(&self, conn: &dyn ExecQuerier, _t: &Table, fk: &ForeignKey) -> Result<bool> {
        let q = select(&[])
            .count(&[])
            .from(table("table_constraints").schema("information_schema"))
            .where_clause(and(vec![
                self.match_schema(),
                eq("constraint_type", "FOREIGN KEY"),
                eq("constraint_name", fk.symbol.as_str()),
            ]));
        exist(conn, &q, Dialect::Postgres).await
    }

    async fn table(&self, conn: &dyn ExecQuerier, name: &str) -> Result<Table> {
        let q = select(&[
            "column_name",
            "data_type",
            "is_nullable",
            "column_default",
            "udt_name",
            "numeric_precision",
            "numeric_scale",
            "character_maximum_length",
        ])
        .from(table("columns").schema("information_schema"))
        .where_clause(and(vec![self.match_schema(), eq("table_name", name)]));
        let rows = conn
            .query_querier(&q, Dialect::Postgres)
            .await
            .map_err(|e| e.context("postgres: reading table description"))?;
        let mut t = Table::new(name);
        for row in rows.iter() {
            let mut c = Column::new(row.text(0).unwrap_or_default(), FieldType::String);
            c.nullable = row.text(2).as_deref() == Some("YES");
            scan_column(
                &mut c,
                &row.text(1).unwrap_or_default(),
                &row.text(4).unwrap_or_default(),
                row.int(5),
                row.int(6),
                row.int(7),
            )?;
            if let Some(value) = row.text(3) {
                if c.ty != FieldType::Time && !call_expr(&value) {
                    c.scan_default(strip_cast(&value))?;
                }
            }
            t.columns.push(c);
        }
        self.indexes(conn, &mut t).await?;
        Ok(t)
    }

    async fn set_range(&self, _conn: &dyn ExecQuerier, t: &Table, value: i64) -> Result<Vec<Statement>> {
        let pk = t.primary_key.first().map_or("id", String::as_str);
        let value = if value == 0 { 1 } else { value };
        Ok(vec![Statement::raw(
            format!("set \"{}\" id range", t.name),
            format!(
                "ALTER TABLE \"{}\" ALTER COLUMN \"{pk}\" RESTART WITH {value}",
                t.name
            ),
        )])
    }

    async fn drop_index(&self, conn: &dyn ExecQuerier, idx: &Index, table_name: &str) -> Result<Statement> {
        let prefix = format!("{table_name}_");
        let name = if idx.name.starts_with(&prefix) || has_unique_name(&idx.name, &idx.columns) {
            idx.name.clone()
        } else {
            format!("{prefix}{}", idx.name)
        };
        let q = select(&[])
            .count(&[])
            .from(table("table_constraints").schema("information_schema"))
            .where_clause(and(vec![
                self.match_schema(),
                eq("constraint_type", "UNIQUE"),
                eq("constraint_name", name.as_str()),
            ]));
        let comment = format!("drop index \"{name}\"");
        if exist(conn, &q, Dialect::Postgres).await? {
            return Ok(Statement::new(
                comment,
                &alter_table(table_name).drop_constraint(&name),
                Dialect::Postgres,
            ));
        }
        Ok(Statement::new(
            comment,
            &oxide_sqlgraph::builder::drop_index(&name),
            Dialect::Postgres,
        ))
    }

    fn c_type(&self, c: &Column) -> Result<String> {
        if let Some(t) = c.schema_type_for(Dialect::Postgres) {
            return Ok(t.to_string());
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
            FieldType::Int8 | FieldType::Int16 | FieldType::Uint8 | FieldType::Uint16 => {
                String::from("smallint")
            }
            FieldType::Int32 | FieldType::Uint32 => String::from("int"),
            FieldType::Int | FieldType::Int64 | FieldType::Uint | FieldType::Uint64 => {
                String::from("bigint")
            }
            FieldType::Float32 => scanned("real"),
            FieldType::Float64 => scanned("double precision"),
            FieldType::Bytes => String::from("bytea"),
            FieldType::Json => String::from("jsonb"),
            FieldType::Uuid => String::from("uuid"),
            FieldType::String if c.size > MAX_CHAR_SIZE => String::from("text"),
            FieldType::String | FieldType::Enum => String::from("varchar"),
            FieldType::Time => scanned("timestamp with time zone"),
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
        Ok(b)
    }

    fn add_index(&self, idx: &Index, table_name: &str) -> IndexBuilder {
        let name = if has_unique_name(&idx.name, &idx.columns) {
            idx.name.clone()
        } else {
            format!("{table_name}_{}", idx.name)
        };
        let b = create_index(&name)
            .if_not_exists()
            .table(table_name)
            .columns(&idx.columns);
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
            let mut clauses = vec![
                column(&c.name).type_(&self.c_type(c)?),
                column(&c.name).attr(if c.nullable { "DROP NOT NULL" } else { "SET NOT NULL" }),
            ];
            if let Some(literal) = c.default_literal() {
                clauses.push(column(&c.name).attr(&format!("SET DEFAULT {literal}")));
            }
            b = b.modify_columns(clauses);
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

    fn users() -> Table {
        Table::new("users")
            .add_primary(Column::new("id", FieldType::Int64).increment())
            .add_column(Column::new("name", FieldType::String).nullable())
            .add_column(Column::new("email", FieldType::String).unique())
            .add_column(
                Column::new("active", FieldType::Bool).default_value(DefaultValue::Bool(true)),
            )
    }

    #[test]
    fn test_create_table() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.t_builder(&users()).unwrap().query(Dialect::Postgres).0,
            r#"CREATE TABLE IF NOT EXISTS "users"("id" bigint GENERATED BY DEFAULT AS IDENTITY NOT NULL, "name" varchar NULL, "email" varchar UNIQUE NOT NULL, "active" boolean NOT NULL DEFAULT true, PRIMARY KEY("id"))"#
        );
    }

    #[test]
    fn test_c_type() {
        let d = PostgresDialect::new();
        let c = |ty| Column::new("c", ty);
        assert_eq!(d.c_type(&c(FieldType::Uint8)).unwrap(), "smallint");
        assert_eq!(d.c_type(&c(FieldType::Uint32)).unwrap(), "int");
        assert_eq!(d.c_type(&c(FieldType::Uint64)).unwrap(), "bigint");
        assert_eq!(d.c_type(&c(FieldType::Float32)).unwrap(), "real");
        assert_eq!(d.c_type(&c(FieldType::Json)).unwrap(), "jsonb");
        assert_eq!(d.c_type(&c(FieldType::Enum)).unwrap(), "varchar");
        assert_eq!(d.c_type(&c(FieldType::String).size(MAX_CHAR_SIZE + 1)).unwrap(), "text");
        assert_eq!(d.c_type(&c(FieldType::Time)).unwrap(), "timestamp with time zone");
        assert_eq!(
            d.c_type(&c(FieldType::Float64).schema_type(Dialect::Postgres, "numeric(10,2)")).unwrap(),
            "numeric(10,2)"
        );
        assert!(d.c_type(&c(FieldType::Other)).is_err());
    }

    #[test]
    fn test_has_unique_name() {
        let cols = |cs: &[&str]| cs.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert!(!has_unique_name("name", &cols(&["name"])));
        assert!(!has_unique_name("name_key", &cols(&["name"])));
        assert!(has_unique_name("user_name", &cols(&["name"])));
        assert!(has_unique_name("by_age", &cols(&["name", "age"])));
        assert!(!has_unique_name("name_age", &cols(&["name", "age"])));
    }

    #[test]
    fn test_add_index() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.add_index(&Index::new("name", false, &["name"]), "users")
                .query(Dialect::Postgres)
                .0,
            r#"CREATE INDEX IF NOT EXISTS "users_name" ON "users"("name")"#
        );
        assert_eq!(
            d.add_index(&Index::new("user_name_age", true, &["name", "age"]), "users")
                .query(Dialect::Postgres)
                .0,
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "user_name_age" ON "users"("name", "age")"#
        );
    }

    #[test]
    fn test_alter_columns() {
        let d = PostgresDialect::new();
        let alters = d
            .alter_columns(
                &users(),
                &[Column::new("nick", FieldType::String).nullable()],
                &[Column::new("age", FieldType::Int64)
                    .nullable()
                    .default_value(DefaultValue::Int(1))],
                &[Column::new("old", FieldType::Int32)],
            )
            .unwrap();
        assert_eq!(
            alters[0].query(Dialect::Postgres).0,
            r#"ALTER TABLE "users" ADD COLUMN "nick" varchar NULL, ALTER COLUMN "age" TYPE bigint, ALTER COLUMN "age" DROP NOT NULL, ALTER COLUMN "age" SET DEFAULT 1, DROP COLUMN "old""#
        );
    }

    #[tokio::test]
    async fn test_init() {
        let ok = MockConn::new().on("server_version_num", &["server_version_num"], vec![vec![text("130004")]]);
        let mut d = PostgresDialect::new();
        d.init(&ok).await.unwrap();
        assert_eq!(d.version, "13.00.04");

        let old = MockConn::new().on("server_version_num", &["server_version_num"], vec![vec![text("090624")]]);
        let err = PostgresDialect::new().init(&old).await.unwrap_err();
        assert!(matches!(err, MigrateError::UnsupportedVersion { .. }));

        let short = MockConn::new().on("server_version_num", &["server_version_num"], vec![vec![text("1")]]);
        assert!(PostgresDialect::new().init(&short).await.is_err());
    }

    #[tokio::test]
    async fn test_table() {
        let null = SqlValue::Null;
        let int = SqlValue::Int;
        let conn = MockConn::new()
            .on(
                r#""columns""#,
                &[
                    "column_name",
                    "data_type",
                    "is_nullable",
                    "column_default",
                    "udt_name",
                    "numeric_precision",
                    "numeric_scale",
                    "character_maximum_length",
                ],
                vec![
                    vec![text("id"), text("bigint"), text("NO"), null.clone(), text("int8"), int(64), int(0), null.clone()],
                    vec![text("name"), text("character varying"), text("YES"), text("'anon'::character varying"), text("varchar"), null.clone(), null.clone(), int(255)],
                    vec![text("email"), text("character varying"), text("NO"), null.clone(), text("varchar"), null.clone(), null.clone(), null.clone()],
                    vec![text("price"), text("numeric"), text("NO"), null.clone(), text("numeric"), int(10), int(2), null.clone()],
                    vec![text("seq"), text("integer"), text("NO"), text("nextval('users_seq_seq'::regclass)"), text("int4"), int(32), int(0), null.clone()],
                    vec![text("created_at"), text("timestamp with time zone"), text("NO"), text("now()"), text("timestamptz"), null.clone(), null.clone(), null.clone()],
                    vec![text("mood"), text("USER-DEFINED"), text("NO"), null.clone(), text("mood"), null.clone(), null.clone(), null.clone()],
                ],
            )
            .on(
                "pg_index",
                &["index_name", "column_name", "primary", "unique", "seq_in_index"],
                vec![
                    vec![text("users_email_key"), text("email"), SqlValue::Bool(false), SqlValue::Bool(true), int(1)],
                    vec![text("users_name_seq"), text("name"), SqlValue::Bool(false), SqlValue::Bool(false), int(1)],
                    vec![text("users_name_seq"), text("seq"), SqlValue::Bool(false), SqlValue::Bool(false), int(2)],
                    vec![text("users_pkey"), text("id"), SqlValue::Bool(true), SqlValue::Bool(true), int(1)],
                ],
            );
        let d = PostgresDialect::new();
        let t = d.table(&conn, "users").await.unwrap();

        assert_eq!(t.primary_key, vec![String::from("id")]);
        assert!(t.column("id").is_some_and(Column::is_primary));
        let name = t.column("name").unwrap();
        assert_eq!((name.size, name.nullable), (255, true));
        assert_eq!(name.default, Some(DefaultValue::Text(String::from("anon"))));
        let email = t.column("email").unwrap();
        assert!(email.unique);
        assert_eq!(email.key, Key::Unique);
        assert_eq!(t.column("seq").unwrap().default, None);
        assert_eq!(t.column("created_at").unwrap().default, None);
        assert_eq!(d.c_type(t.column("price").unwrap()).unwrap(), "numeric(10,2)");
        assert_eq!(d.c_type(t.column("mood").unwrap()).unwrap(), "mood");
        assert_eq!(
            t.indexes,
            vec![
                Index::new("email_key", true, &["email"]),
                Index::new("name_seq", false, &["name", "seq"]),
            ]
        );

        let queries = conn.queries();
        assert!(queries[0].contains(r#""table_schema" = CURRENT_SCHEMA()"#));
        assert!(queries[1].contains("n.nspname = CURRENT_SCHEMA()"));
    }

    #[tokio::test]
    async fn test_drop_index() {
        let d = PostgresDialect::new();
        let unique = MockConn::new().on("table_constraints", &["count"], vec![vec![SqlValue::Int(1)]]);
        let stmt = d
            .drop_index(&unique, &Index::new("email_key", true, &["email"]), "users")
            .await
            .unwrap();
        assert_eq!(stmt.sql, r#"ALTER TABLE "users" DROP CONSTRAINT "users_email_key""#);
        assert_eq!(unique.log.lock().unwrap()[0].1[0], text("UNIQUE"));

        let plain = MockConn::new();
        let stmt = d
            .drop_index(&plain, &Index::new("user_name", false, &["name"]), "users")
            .await
            .unwrap();
        assert_eq!(stmt.sql, r#"DROP INDEX "user_name""#);
    }

    #[tokio::test]
    async fn test_set_range() {
        let d = PostgresDialect::new();
        let conn = MockConn::new();
        let stmts = d.set_range(&conn, &users(), 0).await.unwrap();
        assert_eq!(stmts[0].sql, r#"ALTER TABLE "users" ALTER COLUMN "id" RESTART WITH 1"#);
        let stmts = d.set_range(&conn, &users(), 1 << 32).await.unwrap();
        assert_eq!(stmts[0].sql, r#"ALTER TABLE "users" ALTER COLUMN "id" RESTART WITH 4294967296"#);
    }
}
