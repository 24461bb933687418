//! Versioned migration files.
//!
//! Instead of applying a plan, [`DirWriter`] renders it into a file named
//! `<timestamp>_<name>.sql` inside the migration directory. Each statement
//! is preceded by a `--` comment line and terminated with `;`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use oxide_sqlgraph::Dialect;

use crate::driver::expand_args;
use crate::error::{MigrateError, Result};
use crate::plan::{Plan, Statement};

/// Collects statements and flushes them into a migration directory.
#[derive(Debug, Clone)]
pub struct DirWriter {
    dir: PathBuf,
    dialect: Dialect,
    changes: Vec<(String, String)>,
}

impl DirWriter {
    /// Creates a writer for `dir`, which must exist.
    pub fn new(dir: impl Into<PathBuf>, dialect: Dialect) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(MigrateError::MigrationsDirNotFound(dir));
        }
        Ok(Self {
            dir,
            dialect,
            changes: Vec::new(),
        })
    }

    /// The migration directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Records one statement. Arguments are inlined into the SQL text.
    pub fn change(&mut self, stmt: &Statement) {
        self.changes.push((
            stmt.comment.clone(),
            expand_args(self.dialect, &stmt.sql, &stmt.args),
        ));
    }

    /// Records every statement of `plan`.
    pub fn plan(&mut self, plan: &Plan) {
        for stmt in &plan.statements {
            self.change(stmt);
        }
    }

    /// Number of pending statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Renders the pending statements.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (comment, sql) in &self.changes {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "-- {comment}\n{sql};");
        }
        out
    }

    /// Writes the pending statements to `<timestamp>_<name>.sql` and clears
    /// them. Returns the path of the new file.
    pub fn flush(&mut self, name: &str) -> Result<PathBuf> {
        let file = format!("{}_{name}.sql", Utc::now().format("%Y%m%d%H%M%S"));
        let path = self.dir.join(file);
        fs::write(&path, self.render())?;
        info!(path = %path.display(), statements = self.changes.len(), "Wrote migration file");
        self.changes.clear();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_sqlgraph::builder::insert;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir() {
        let err = DirWriter::new("/definitely/not/here", Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, MigrateError::MigrationsDirNotFound(_)));
    }

    #[test]
    fn test_flush() {
        let dir = TempDir::new().unwrap();
        let mut w = DirWriter::new(dir.path(), Dialect::MySql).unwrap();
        w.change(&Statement::raw(
            "create \"users\" table",
            "CREATE TABLE `users`(`id` bigint)",
        ));
        w.change(&Statement::new(
            "record \"users\" type",
            &insert("ent_types").set("type", "users"),
            Dialect::MySql,
        ));
        assert_eq!(w.len(), 2);

        let path = w.flush("init").unwrap();
        assert!(w.is_empty());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_init.sql"));
        assert_eq!(name.len(), "20260101000000_init.sql".len());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "-- create \"users\" table\nCREATE TABLE `users`(`id` bigint);\n\
             -- record \"users\" type\nINSERT INTO `ent_types` (`type`) VALUES ('users');\n"
        );
    }
}
