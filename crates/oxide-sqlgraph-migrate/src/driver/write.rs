//! A driver that writes statements instead of executing them.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use oxide_sqlgraph::{Dialect, SqlValue};

use super::{Driver, ExecQuerier, Rows, Tx};
use crate::error::{MigrateError, Result};

/// Writes every executed statement, terminated by `;` and a newline, to a
/// sink. Arguments are expanded inline.
///
/// Queries are forwarded to an optional inner driver so that introspection
/// still sees the live schema; without one they return no rows.
pub struct WriteDriver<W> {
    dialect: Dialect,
    sink: Arc<Mutex<W>>,
    inner: Option<Arc<dyn Driver>>,
}

impl<W: Write + Send + 'static> WriteDriver<W> {
    /// Creates a driver writing `dialect` statements into `w`.
    #[must_use]
    pub fn new(dialect: Dialect, w: W) -> Self {
        Self {
            dialect,
            sink: Arc::new(Mutex::new(w)),
            inner: None,
        }
    }

    /// Forwards queries to `driver` and adopts its dialect.
    #[must_use]
    pub fn with_inner(mut self, driver: Arc<dyn Driver>) -> Self {
        self.dialect = driver.dialect();
        self.inner = Some(driver);
        self
    }

    /// A handle to the sink.
    #[must_use]
    pub fn writer(&self) -> Arc<Mutex<W>> {
        Arc::clone(&self.sink)
    }
}

#[async_trait]
impl<W: Write + Send + 'static> ExecQuerier for WriteDriver<W> {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        write_statement(&self.sink, self.dialect, query, args)?;
        Ok(0)
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        match &self.inner {
            Some(driver) => driver.query(query, args).await,
            None => Ok(Rows::default()),
        }
    }
}

#[async_trait]
impl<W: Write + Send + 'static> Driver for WriteDriver<W> {
    async fn tx(&self) -> Result<Box<dyn Tx>> {
        Ok(Box::new(WriteTx {
            dialect: self.dialect,
            sink: Arc::clone(&self.sink),
            inner: self.inner.clone(),
        }))
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn close(&self) -> Result<()> {
        match &self.inner {
            Some(driver) => driver.close().await,
            None => Ok(()),
        }
    }
}

struct WriteTx<W> {
    dialect: Dialect,
    sink: Arc<Mutex<W>>,
    inner: Option<Arc<dyn Driver>>,
}

#[async_trait]
impl<W: Write + Send + 'static> ExecQuerier for WriteTx<W> {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        write_statement(&self.sink, self.dialect, query, args)?;
        Ok(0)
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        match &self.inner {
            Some(driver) => driver.query(query, args).await,
            None => Ok(Rows::default()),
        }
    }
}

#[async_trait]
impl<W: Write + Send + 'static> Tx for WriteTx<W> {
    async fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

fn write_statement<W: Write>(
    sink: &Mutex<W>,
    dialect: Dialect,
    query: &str,
    args: &[SqlValue],
) -> Result<()> {
    let mut stmt = expand_args(dialect, query, args);
    if !stmt.ends_with(';') {
        stmt.push(';');
    }
    let mut w = sink
        .lock()
        .map_err(|_| MigrateError::InvalidState(String::from("writer lock poisoned")))?;
    writeln!(w, "{stmt}")?;
    Ok(())
}

/// Replaces placeholders in `query` with the inline form of `args`.
///
/// `?` placeholders are consumed in order; Postgres `$n` placeholders are
/// resolved by index. Quoted strings and identifiers are copied verbatim.
#[must_use]
pub fn expand_args(dialect: Dialect, query: &str, args: &[SqlValue]) -> String {
    let postgres = matches!(dialect, Dialect::Postgres);
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();
    let mut next = 0;
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                out.push(c);
                while let Some(d) = chars.next() {
                    out.push(d);
                    if d == '\\' {
                        if let Some(e) = chars.next() {
                            out.push(e);
                        }
                    } else if d == c {
                        break;
                    }
                }
            }
            '?' if !postgres => {
                match args.get(next) {
                    Some(v) => out.push_str(&v.to_sql_inline()),
                    None => out.push('?'),
                }
                next += 1;
            }
            '$' if postgres => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                let arg = digits
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| args.get(i));
                match arg {
                    Some(v) => out.push_str(&v.to_sql_inline()),
                    None => {
                        out.push('$');
                        out.push_str(&digits);
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_args() {
        assert_eq!(
            expand_args(
                Dialect::MySql,
                "INSERT INTO `ent_types` (`type`) VALUES (?)",
                &[SqlValue::Text(String::from("users"))]
            ),
            "INSERT INTO `ent_types` (`type`) VALUES ('users')"
        );
        assert_eq!(
            expand_args(
                Dialect::Postgres,
                r#"SELECT * FROM "t" WHERE "a" = $2 AND "b" = $1 AND "c" = '$1'"#,
                &[SqlValue::Int(1), SqlValue::Text(String::from("it's"))]
            ),
            r#"SELECT * FROM "t" WHERE "a" = 'it''s' AND "b" = 1 AND "c" = '$1'"#
        );
        assert_eq!(
            expand_args(Dialect::Sqlite, "SELECT '?', ?", &[SqlValue::Null]),
            "SELECT '?', NULL"
        );
    }

    #[tokio::test]
    async fn test_write_driver_exec() {
        let driver = WriteDriver::new(Dialect::MySql, Vec::new());
        let tx = driver.tx().await.unwrap();
        tx.exec("CREATE TABLE `users`(`id` bigint)", &[]).await.unwrap();
        tx.exec("ALTER TABLE `users` AUTO_INCREMENT = ?;", &[SqlValue::Int(4_294_967_296)])
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert!(driver.query("SELECT 1", &[]).await.unwrap().is_empty());

        let sink = driver.writer();
        let out = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
        assert_eq!(
            out,
            "CREATE TABLE `users`(`id` bigint);\nALTER TABLE `users` AUTO_INCREMENT = 4294967296;\n"
        );
    }
}
