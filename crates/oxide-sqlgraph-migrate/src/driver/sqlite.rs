//! SQLite driver backed by an `sqlx` pool.

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, Transaction, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::debug;

use oxide_sqlgraph::{Dialect, SqlValue};

use super::{Driver, ExecQuerier, Rows, Tx};
use crate::error::{MigrateError, Result};

/// A [`Driver`] over an [`SqlitePool`].
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    pool: SqlitePool,
}

impl SqliteDriver {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `url`, e.g. `sqlite:db.sqlite3`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds a single connection so every statement sees the same
    /// database.
    pub async fn memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ExecQuerier for SqliteDriver {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        debug!(sql = %query, args = args.len(), "Executing SQL");
        let done = bind(sqlx::query(query), args).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        debug!(sql = %query, args = args.len(), "Running query");
        let rows = bind(sqlx::query(query), args)
            .fetch_all(&self.pool)
            .await?;
        collect(&rows)
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn tx(&self) -> Result<Box<dyn Tx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTx {
            tx: Mutex::new(Some(tx)),
        }))
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// A transaction opened by [`SqliteDriver::tx`].
pub struct SqliteTx {
    tx: Mutex<Option<Transaction<'static, Sqlite>>>,
}

fn done() -> MigrateError {
    MigrateError::InvalidState(String::from("transaction already finished"))
}

#[async_trait]
impl ExecQuerier for SqliteTx {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        debug!(sql = %query, args = args.len(), "Executing SQL");
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(done)?;
        let result = bind(sqlx::query(query), args).execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        debug!(sql = %query, args = args.len(), "Running query");
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(done)?;
        let rows = bind(sqlx::query(query), args).fetch_all(&mut **tx).await?;
        collect(&rows)
    }
}

#[async_trait]
impl Tx for SqliteTx {
    async fn commit(self: Box<Self>) -> Result<()> {
        let tx = self.tx.into_inner().ok_or_else(done)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let tx = self.tx.into_inner().ok_or_else(done)?;
        tx.rollback().await?;
        Ok(())
    }
}

fn bind<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    args: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Blob(b) => query.bind(b.as_slice()),
        };
    }
    query
}

fn collect(rows: &[SqliteRow]) -> Result<Rows> {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let mut out = Vec::with_capacity(row.len());
        for i in 0..row.len() {
            out.push(decode(row, i)?);
        }
        values.push(out);
    }
    Ok(Rows::new(columns, values))
}

fn decode(row: &SqliteRow, i: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let kind = raw.type_info().name().to_string();
    let value = match kind.as_str() {
        "INTEGER" | "BOOLEAN" | "NUMERIC" => SqlValue::Int(row.try_get_unchecked::<i64, _>(i)?),
        "REAL" => SqlValue::Float(row.try_get_unchecked::<f64, _>(i)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(i)?),
        _ => SqlValue::Text(row.try_get_unchecked::<String, _>(i)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exec_and_query() {
        let driver = SqliteDriver::memory().await.unwrap();
        driver
            .exec("CREATE TABLE `users`(`id` integer PRIMARY KEY, `name` text NULL, `score` real NULL)", &[])
            .await
            .unwrap();
        let affected = driver
            .exec(
                "INSERT INTO `users` (`name`, `score`) VALUES (?, ?), (?, ?)",
                &[
                    SqlValue::Text(String::from("a8m")),
                    SqlValue::Float(1.5),
                    SqlValue::Null,
                    SqlValue::Null,
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 2);

        let rows = driver
            .query("SELECT `id`, `name`, `score` FROM `users` ORDER BY `id`", &[])
            .await
            .unwrap();
        assert_eq!(rows.columns, vec!["id", "name", "score"]);
        assert_eq!(
            rows.rows,
            vec![
                vec![
                    SqlValue::Int(1),
                    SqlValue::Text(String::from("a8m")),
                    SqlValue::Float(1.5)
                ],
                vec![SqlValue::Int(2), SqlValue::Null, SqlValue::Null],
            ]
        );
    }

    #[tokio::test]
    async fn test_tx_rollback() {
        let driver = SqliteDriver::memory().await.unwrap();
        driver
            .exec("CREATE TABLE `t`(`id` integer PRIMARY KEY)", &[])
            .await
            .unwrap();

        let tx = driver.tx().await.unwrap();
        tx.exec("INSERT INTO `t` (`id`) VALUES (?)", &[SqlValue::Int(1)])
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let rows = driver.query("SELECT COUNT(*) FROM `t`", &[]).await.unwrap();
        assert_eq!(rows.first_int(), Some(0));

        let tx = driver.tx().await.unwrap();
        tx.exec("INSERT INTO `t` (`id`) VALUES (?)", &[SqlValue::Int(1)])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let rows = driver.query("SELECT COUNT(*) FROM `t`", &[]).await.unwrap();
        assert_eq!(rows.first_int(), Some(1));
    }
}
