//! A driver wrapper that logs every operation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use oxide_sqlgraph::{Dialect, SqlValue};

use super::{Driver, ExecQuerier, Rows, Tx};
use crate::error::Result;

/// Logs each statement, query and transaction boundary at debug level
/// before delegating to the wrapped driver.
#[derive(Clone)]
pub struct DebugDriver {
    inner: Arc<dyn Driver>,
}

impl DebugDriver {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Driver>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ExecQuerier for DebugDriver {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        debug!(driver.op = "exec", sql = %query, args = ?args);
        self.inner.exec(query, args).await
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        debug!(driver.op = "query", sql = %query, args = ?args);
        self.inner.query(query, args).await
    }
}

#[async_trait]
impl Driver for DebugDriver {
    async fn tx(&self) -> Result<Box<dyn Tx>> {
        let tx = self.inner.tx().await?;
        debug!(driver.op = "tx", "Transaction started");
        Ok(Box::new(DebugTx { inner: tx }))
    }

    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

struct DebugTx {
    inner: Box<dyn Tx>,
}

#[async_trait]
impl ExecQuerier for DebugTx {
    async fn exec(&self, query: &str, args: &[SqlValue]) -> Result<u64> {
        debug!(driver.op = "tx.exec", sql = %query, args = ?args);
        self.inner.exec(query, args).await
    }

    async fn query(&self, query: &str, args: &[SqlValue]) -> Result<Rows> {
        debug!(driver.op = "tx.query", sql = %query, args = ?args);
        self.inner.query(query, args).await
    }
}

#[async_trait]
impl Tx for DebugTx {
    async fn commit(self: Box<Self>) -> Result<()> {
        debug!(driver.op = "tx.commit");
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        debug!(driver.op = "tx.rollback");
        self.inner.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SqliteDriver;

    #[tokio::test]
    async fn test_debug_driver_delegates() {
        let inner = SqliteDriver::memory().await.unwrap();
        let driver = DebugDriver::new(Arc::new(inner));
        assert_eq!(driver.dialect(), Dialect::Sqlite);

        let tx = driver.tx().await.unwrap();
        tx.exec("CREATE TABLE `t`(`id` integer)", &[]).await.unwrap();
        tx.commit().await.unwrap();

        let rows = driver.query("SELECT COUNT(*) FROM `t`", &[]).await.unwrap();
        assert_eq!(rows.first_int(), Some(0));
    }
}
