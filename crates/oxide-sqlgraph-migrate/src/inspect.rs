//! Reading the live schema.

use std::sync::Arc;

use tracing::debug;

use crate::dialect::adapter;
use crate::driver::Driver;
use crate::error::{Result, ResultExt};
use crate::schema::Table;

/// Describes every table of a database.
pub struct Inspector {
    driver: Arc<dyn Driver>,
    schema: Option<String>,
}

impl Inspector {
    /// Creates an inspector. `schema` selects the MySQL database or Postgres
    /// namespace; the connection's current one is used otherwise.
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, schema: Option<String>) -> Self {
        Self { driver, schema }
    }

    /// Every table, ordered by name, with its columns, primary key and
    /// indexes.
    pub async fn tables(&self) -> Result<Vec<Table>> {
        let mut adapter = adapter(self.driver.dialect(), self.schema.as_deref());
        adapter.init(&self.driver).await?;
        let names = adapter.table_names(&self.driver).await?;
        debug!(count = names.len(), "Inspecting tables");
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let t = adapter
                .table(&self.driver, &name)
                .await
                .context(|| format!("inspecting table \"{name}\""))?;
            tables.push(t);
        }
        Ok(tables)
    }
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("dialect", &self.driver.dialect())
            .field("schema", &self.schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ExecQuerier, SqliteDriver};

    #[tokio::test]
    async fn test_tables() {
        let driver = SqliteDriver::memory().await.unwrap();
        driver
            .exec(
                "CREATE TABLE `users`(`id` integer PRIMARY KEY AUTOINCREMENT NOT NULL, `name` varchar(255) NOT NULL)",
                &[],
            )
            .await
            .unwrap();
        driver
            .exec("CREATE TABLE `groups`(`id` integer PRIMARY KEY AUTOINCREMENT NOT NULL)", &[])
            .await
            .unwrap();

        let tables = Inspector::new(Arc::new(driver), None).tables().await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["groups", "users"]);
        assert_eq!(tables[1].primary_key, vec!["id"]);
        assert!(tables[1].has_column("name"));
    }
}
