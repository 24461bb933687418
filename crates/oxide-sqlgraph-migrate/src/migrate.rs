//! The migration engine.
//!
//! [`Migrate::create`] brings a live database in line with a list of desired
//! tables inside one transaction:
//!
//! 1. the adapter checks the server,
//! 2. the type metadata is loaded when global ids are enabled,
//! 3. missing tables are created and existing ones altered,
//! 4. foreign keys are added once every table exists,
//! 5. the transaction commits, or rolls back on the first failure.
//!
//! When diff or apply hooks (or skipped change kinds) are configured, the
//! same statements are produced through the plan path instead: a
//! [`Differ`] computes a list of [`Change`]s which are rendered into a
//! [`Plan`] and handed to the applier chain.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use oxide_sqlgraph::builder::alter_table;
use oxide_sqlgraph::Dialect;

use crate::change::{Change, ChangeKind};
use crate::dialect::{adapter, SqlDialect};
use crate::driver::{Driver, ExecQuerier, Tx};
use crate::error::{MigrateError, Result};
use crate::global_id::TypeRanges;
use crate::plan::{
    chain_applier, chain_differ, filter_changes, ApplyHook, DiffHook, Differ, ExecApplier, Plan,
    Statement,
};
use crate::schema::{symbol, Column, ForeignKey, Index, Key, Table};
use crate::writer::DirWriter;

/// Migration options.
pub struct MigrateOptions {
    global_unique_id: bool,
    drop_column: bool,
    drop_index: bool,
    foreign_keys: bool,
    schema: Option<String>,
    dir: Option<PathBuf>,
    diff_hooks: Vec<DiffHook>,
    apply_hooks: Vec<ApplyHook>,
    skip: ChangeKind,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            global_unique_id: false,
            drop_column: false,
            drop_index: false,
            foreign_keys: true,
            schema: None,
            dir: None,
            diff_hooks: Vec::new(),
            apply_hooks: Vec::new(),
            skip: ChangeKind::NO_CHANGE,
        }
    }
}

impl fmt::Debug for MigrateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrateOptions")
            .field("global_unique_id", &self.global_unique_id)
            .field("drop_column", &self.drop_column)
            .field("drop_index", &self.drop_index)
            .field("foreign_keys", &self.foreign_keys)
            .field("schema", &self.schema)
            .field("dir", &self.dir)
            .field("diff_hooks", &self.diff_hooks.len())
            .field("apply_hooks", &self.apply_hooks.len())
            .field("skip", &self.skip)
            .finish()
    }
}

impl MigrateOptions {
    /// Creates the default options: foreign keys on, everything else off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives every table with a single-column primary key its own id range.
    #[must_use]
    pub const fn global_unique_id(mut self, enabled: bool) -> Self {
        self.global_unique_id = enabled;
        self
    }

    /// Drops columns missing from the desired tables.
    #[must_use]
    pub const fn drop_column(mut self, enabled: bool) -> Self {
        self.drop_column = enabled;
        self
    }

    /// Drops indexes missing from the desired tables, and allows removing
    /// uniqueness.
    #[must_use]
    pub const fn drop_index(mut self, enabled: bool) -> Self {
        self.drop_index = enabled;
        self
    }

    /// Creates foreign keys.
    #[must_use]
    pub const fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Schema (MySQL database, Postgres namespace) to inspect instead of the
    /// connection's current one.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Directory receiving the files written by [`Migrate::diff`].
    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Appends a diff hook. The first hook added runs outermost.
    #[must_use]
    pub fn diff_hook(mut self, hook: DiffHook) -> Self {
        self.diff_hooks.push(hook);
        self
    }

    /// Appends an apply hook. The first hook added runs outermost.
    #[must_use]
    pub fn apply_hook(mut self, hook: ApplyHook) -> Self {
        self.apply_hooks.push(hook);
        self
    }

    /// Skips every change of the given kinds.
    #[must_use]
    pub fn skip_changes(mut self, skip: ChangeKind) -> Self {
        self.skip |= skip;
        self
    }

    fn uses_plan(&self) -> bool {
        !self.diff_hooks.is_empty() || !self.apply_hooks.is_empty() || self.skip != ChangeKind::NO_CHANGE
    }
}

/// Runs migrations through a [`Driver`].
pub struct Migrate {
    driver: Arc<dyn Driver>,
    options: MigrateOptions,
}

impl fmt::Debug for Migrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrate")
            .field("dialect", &self.driver.dialect())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Migrate {
    /// Creates a migration engine.
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, options: MigrateOptions) -> Self {
        Self { driver, options }
    }

    fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    /// Creates and initializes the adapter of the driver's dialect.
    async fn init(&self, conn: &dyn ExecQuerier) -> Result<Arc<dyn SqlDialect>> {
        let mut adapter = adapter(self.dialect(), self.options.schema.as_deref());
        adapter.init(conn).await?;
        Ok(Arc::from(adapter))
    }

    /// Creates missing tables, alters existing ones and adds foreign keys.
    pub async fn create(&self, tables: &[Table]) -> Result<()> {
        let tables = self.setup(tables);
        let tx = self.driver.tx().await?;
        let result = if self.options.uses_plan() {
            self.apply_plan(&tx, &tables).await
        } else {
            self.create_in(&tx, &tables).await
        };
        finish(tx, result).await
    }

    /// Writes the statements that [`create`](Self::create) would execute to
    /// a new file in the migration directory.
    ///
    /// Returns `None` when the database is already up to date.
    pub async fn diff(&self, name: &str, tables: &[Table]) -> Result<Option<PathBuf>> {
        let dir = self.options.dir.clone().ok_or(MigrateError::NoMigrationDir)?;
        let mut writer = DirWriter::new(dir, self.dialect())?;
        let tables = self.setup(tables);
        let plan = self.plan(&self.driver, name, &tables).await?;
        if plan.is_empty() {
            info!(name, "Schema is up to date");
            return Ok(None);
        }
        writer.plan(&plan);
        writer.flush(name).map(Some)
    }

    /// Computes the plan that brings the database in line with `tables`
    /// without executing it.
    pub async fn plan_for(&self, name: &str, tables: &[Table]) -> Result<Plan> {
        let tables = self.setup(tables);
        self.plan(&self.driver, name, &tables).await
    }

    /// Normalizes the desired tables for this dialect.
    fn setup(&self, tables: &[Table]) -> Vec<Table> {
        tables
            .iter()
            .cloned()
            .map(|t| setup_table(t, self.dialect(), self.options.foreign_keys))
            .collect()
    }

    async fn create_in(&self, conn: &dyn ExecQuerier, tables: &[Table]) -> Result<()> {
        let adapter = self.init(conn).await?;
        let mut ranges = if self.options.global_unique_id {
            let (ranges, stmts) = TypeRanges::load(conn, adapter.as_ref()).await?;
            exec_all(conn, &stmts).await?;
            Some(ranges)
        } else {
            None
        };
        for t in tables {
            if adapter.table_exist(conn, &t.name).await? {
                let curr = adapter.table(conn, &t.name).await?;
                let changes = change_set(adapter.as_ref(), &curr, t, &self.options)?;
                let stmts = modify_statements(conn, adapter.as_ref(), t, &changes).await?;
                exec_all(conn, &stmts).await?;
                if !stmts.is_empty() {
                    info!(table = %t.name, statements = stmts.len(), "Altered table");
                }
            } else {
                let stmts = create_statements(adapter.as_ref(), t)?;
                exec_all(conn, &stmts).await?;
                if let Some(ranges) = ranges.as_mut() {
                    if t.primary_key.len() == 1 {
                        let stmts = ranges.alloc(conn, adapter.as_ref(), t).await?;
                        exec_all(conn, &stmts).await?;
                    }
                }
                info!(table = %t.name, "Created table");
            }
        }
        if adapter.dialect() == Dialect::Sqlite {
            return Ok(());
        }
        for t in tables {
            for fk in &t.foreign_keys {
                if adapter.fk_exist(conn, t, fk).await? {
                    continue;
                }
                foreign_key_statement(adapter.as_ref(), &t.name, fk)
                    .exec(conn)
                    .await?;
            }
        }
        Ok(())
    }

    async fn apply_plan(&self, conn: &dyn ExecQuerier, tables: &[Table]) -> Result<()> {
        let plan = self.plan(conn, "changes", tables).await?;
        if plan.is_empty() {
            debug!("No changes to apply");
            return Ok(());
        }
        let applier = chain_applier(Arc::new(ExecApplier), &self.options.apply_hooks);
        applier.apply(conn, &plan).await?;
        info!(statements = plan.statements.len(), "Applied migration plan");
        Ok(())
    }

    async fn plan(&self, conn: &dyn ExecQuerier, name: &str, tables: &[Table]) -> Result<Plan> {
        let adapter = self.init(conn).await?;
        let mut plan = Plan::new(name);
        let mut ranges = if self.options.global_unique_id {
            let (ranges, stmts) = TypeRanges::load(conn, adapter.as_ref()).await?;
            plan.statements.extend(stmts);
            Some(ranges)
        } else {
            None
        };

        let mut current = Vec::new();
        for t in tables {
            if !adapter.table_exist(conn, &t.name).await? {
                continue;
            }
            let mut curr = adapter.table(conn, &t.name).await?;
            // Introspection does not read foreign keys back; record the
            // desired ones that already exist.
            for fk in &t.foreign_keys {
                if adapter.dialect() != Dialect::Sqlite && adapter.fk_exist(conn, t, fk).await? {
                    curr.foreign_keys.push(fk.clone());
                }
            }
            current.push(curr);
        }

        let base: Arc<dyn Differ> = Arc::new(DefaultDiffer::new(Arc::clone(&adapter), &self.options));
        let mut differ = chain_differ(base, &self.options.diff_hooks);
        if self.options.skip != ChangeKind::NO_CHANGE {
            differ = filter_changes(self.options.skip)(differ);
        }
        let changes = differ.diff(&current, tables)?;

        for change in &changes {
            match change {
                Change::AddTable(t) => {
                    plan.statements.extend(create_statements(adapter.as_ref(), t)?);
                    if let Some(ranges) = ranges.as_mut() {
                        if t.primary_key.len() == 1 {
                            plan.statements
                                .extend(ranges.alloc(conn, adapter.as_ref(), t).await?);
                        }
                    }
                }
                Change::ModifyTable { table, changes } => {
                    let t = tables
                        .iter()
                        .find(|t| t.name == *table)
                        .cloned()
                        .unwrap_or_else(|| Table::new(table.clone()));
                    plan.statements
                        .extend(modify_statements(conn, adapter.as_ref(), &t, changes).await?);
                }
                Change::AddForeignKey { table, fk } => {
                    plan.statements
                        .push(foreign_key_statement(adapter.as_ref(), table, fk));
                }
                other => {
                    warn!(change = %other, "Ignoring change outside of a table modification");
                }
            }
        }
        Ok(plan)
    }
}

/// Commits on success, rolls back on failure.
async fn finish(tx: Box<dyn Tx>, result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => tx.commit().await,
        Err(err) => {
            warn!(error = %err, "Migration failed, rolling back");
            match tx.rollback().await {
                Ok(()) => Err(err),
                Err(rollback) => Err(MigrateError::Rollback {
                    source: Box::new(err),
                    rollback: Box::new(rollback),
                }),
            }
        }
    }
}

async fn exec_all(conn: &dyn ExecQuerier, stmts: &[Statement]) -> Result<()> {
    for stmt in stmts {
        stmt.exec(conn).await?;
    }
    Ok(())
}

/// Shortens index and constraint names to the identifier limit and fills in
/// the key membership of columns.
#[must_use]
pub fn setup_table(mut t: Table, dialect: Dialect, foreign_keys: bool) -> Table {
    for idx in &mut t.indexes {
        idx.name = symbol(&idx.name, dialect);
    }
    if foreign_keys {
        for fk in &mut t.foreign_keys {
            fk.symbol = symbol(&fk.symbol, dialect);
        }
    } else {
        t.foreign_keys.clear();
    }
    for name in t.primary_key.clone() {
        if let Some(c) = t.column_mut(&name) {
            c.key = Key::Primary;
        }
    }
    let indexed: Vec<String> = t
        .indexes
        .iter()
        .flat_map(|idx| idx.columns.iter().cloned())
        .collect();
    for name in indexed {
        if let Some(c) = t.column_mut(&name) {
            if c.key == Key::None {
                c.key = Key::Multiple;
            }
        }
    }
    t
}

/// `CREATE TABLE` followed by the table's indexes.
fn create_statements(adapter: &dyn SqlDialect, t: &Table) -> Result<Vec<Statement>> {
    let dialect = adapter.dialect();
    let mut stmts = vec![Statement::new(
        format!("create \"{}\" table", t.name),
        &adapter.t_builder(t)?,
        dialect,
    )];
    for idx in &t.indexes {
        stmts.push(Statement::new(
            format!("create index \"{}\" to table: \"{}\"", idx.name, t.name),
            &adapter.add_index(idx, &t.name),
            dialect,
        ));
    }
    Ok(stmts)
}

/// Index drops, then column changes, then index additions.
async fn modify_statements(
    conn: &dyn ExecQuerier,
    adapter: &dyn SqlDialect,
    t: &Table,
    changes: &[Change],
) -> Result<Vec<Statement>> {
    let dialect = adapter.dialect();
    let (mut add, mut modify, mut drop) = (Vec::new(), Vec::new(), Vec::new());
    let (mut add_index, mut drop_index) = (Vec::new(), Vec::new());
    for change in changes {
        match change {
            Change::AddColumn(c) => add.push(c.clone()),
            Change::ModifyColumn { to, .. } => modify.push(to.clone()),
            Change::DropColumn(c) => drop.push(c.clone()),
            Change::AddIndex(idx) => add_index.push(idx),
            Change::DropIndex(idx) => drop_index.push(idx),
            other => warn!(change = %other, table = %t.name, "Ignoring nested change"),
        }
    }
    let mut stmts = Vec::new();
    for idx in drop_index {
        stmts.push(adapter.drop_index(conn, idx, &t.name).await?);
    }
    for alter in adapter.alter_columns(t, &add, &modify, &drop)? {
        stmts.push(Statement::new(
            format!("modify \"{}\" table", t.name),
            &alter,
            dialect,
        ));
    }
    for idx in add_index {
        stmts.push(Statement::new(
            format!("create index \"{}\" to table: \"{}\"", idx.name, t.name),
            &adapter.add_index(idx, &t.name),
            dialect,
        ));
    }
    Ok(stmts)
}

fn foreign_key_statement(adapter: &dyn SqlDialect, table: &str, fk: &ForeignKey) -> Statement {
    Statement::new(
        format!("create foreign key \"{}\" on \"{table}\"", fk.symbol),
        &alter_table(table).add_foreign_key(fk.dsl()),
        adapter.dialect(),
    )
}

/// Reports whether `c` is unique in `t`, either by itself or through a
/// unique single-column index.
fn unique_in(t: &Table, c: &Column) -> bool {
    c.unique
        || t
            .indexes
            .iter()
            .any(|idx| idx.unique && idx.columns.len() == 1 && idx.columns[0] == c.name)
}

fn same_primary_key(curr: &Table, desired: &Table) -> bool {
    let mut a = curr.primary_key.clone();
    let mut b = desired.primary_key.clone();
    a.sort();
    b.sort();
    a == b
}

/// Computes the column and index changes that turn `curr` into `desired`.
///
/// Changing the primary key, narrowing a column type, or removing
/// uniqueness without [`MigrateOptions::drop_index`] are rejected.
pub fn change_set(
    adapter: &dyn SqlDialect,
    curr: &Table,
    desired: &Table,
    options: &MigrateOptions,
) -> Result<Vec<Change>> {
    if !same_primary_key(curr, desired) {
        return Err(MigrateError::PrimaryKeyChange {
            table: desired.name.clone(),
        });
    }
    let mut changes = Vec::new();
    let mut dropped: HashSet<String> = HashSet::new();
    let mut drop_index = |changes: &mut Vec<Change>, idx: Index, column: &str| -> Result<()> {
        if !options.drop_index {
            return Err(MigrateError::UniqueChange {
                table: desired.name.clone(),
                column: column.to_string(),
            });
        }
        if dropped.insert(idx.name.clone()) {
            changes.push(Change::DropIndex(idx));
        }
        Ok(())
    };

    for c1 in desired.columns.iter().filter(|c| !c.is_primary()) {
        let Some(c2) = curr.column(&c1.name) else {
            changes.push(Change::AddColumn(c1.clone()));
            continue;
        };
        let (want, have) = (unique_in(desired, c1), unique_in(curr, c2));
        if want != have {
            if want {
                if c1.unique {
                    changes.push(Change::AddIndex(Index::new(
                        c1.name.clone(),
                        true,
                        &[c1.name.as_str()],
                    )));
                }
            } else {
                let idx = curr.index(&c2.name).ok_or_else(|| MigrateError::MissingIndex {
                    column: c2.name.clone(),
                })?;
                drop_index(&mut changes, idx, &c2.name)?;
            }
            continue;
        }
        let (t1, t2) = (adapter.c_type(c1)?, adapter.c_type(c2)?);
        if t1 != t2 {
            if !c2.convertible_to(c1) {
                return Err(MigrateError::InvalidTypeChange {
                    column: c1.name.clone(),
                    from: t2,
                    to: t1,
                });
            }
            changes.push(Change::ModifyColumn {
                from: c2.clone(),
                to: c1.clone(),
            });
        } else if c1.nullable != c2.nullable {
            changes.push(Change::ModifyColumn {
                from: c2.clone(),
                to: c1.clone(),
            });
        }
    }

    if options.drop_column {
        for c in &curr.columns {
            if !c.is_primary() && !desired.has_column(&c.name) {
                changes.push(Change::DropColumn(c.clone()));
            }
        }
    }

    for idx1 in &desired.indexes {
        match curr.index(&idx1.name) {
            None => changes.push(Change::AddIndex(idx1.clone())),
            Some(idx2) if idx2.unique != idx1.unique => {
                drop_index(&mut changes, idx2, &idx1.name)?;
                changes.push(Change::AddIndex(idx1.clone()));
            }
            Some(_) => {}
        }
    }

    if options.drop_index {
        for idx in &curr.indexes {
            let owned_by_fk = desired.foreign_keys.iter().any(|fk| fk.symbol == idx.name);
            if owned_by_fk || desired.index(&idx.name).is_some() || dropped.contains(&idx.name) {
                continue;
            }
            changes.push(Change::DropIndex(idx.clone()));
        }
    }
    Ok(changes)
}

/// The differ used when no hook replaces it.
pub struct DefaultDiffer {
    adapter: Arc<dyn SqlDialect>,
    options: MigrateOptions,
}

impl DefaultDiffer {
    /// Creates a differ rendering column types through `adapter`.
    #[must_use]
    pub fn new(adapter: Arc<dyn SqlDialect>, options: &MigrateOptions) -> Self {
        let options = MigrateOptions::new()
            .drop_column(options.drop_column)
            .drop_index(options.drop_index)
            .foreign_keys(options.foreign_keys);
        Self { adapter, options }
    }
}

impl Differ for DefaultDiffer {
    fn diff(&self, current: &[Table], desired: &[Table]) -> Result<Vec<Change>> {
        let mut changes = Vec::new();
        for t in desired {
            match current.iter().find(|c| c.name == t.name) {
                None => changes.push(Change::AddTable(t.clone())),
                Some(curr) => {
                    let nested = change_set(self.adapter.as_ref(), curr, t, &self.options)?;
                    if !nested.is_empty() {
                        changes.push(Change::ModifyTable {
                            table: t.name.clone(),
                            changes: nested,
                        });
                    }
                }
            }
        }
        // SQLite declares foreign keys inline.
        if self.adapter.dialect() != Dialect::Sqlite {
            for t in desired {
                let existing = current.iter().find(|c| c.name == t.name);
                for fk in &t.foreign_keys {
                    let exists = existing.is_some_and(|c| c.foreign_keys.iter().any(|f| f.symbol == fk.symbol));
                    if !exists {
                        changes.push(Change::AddForeignKey {
                            table: t.name.clone(),
                            fk: fk.clone(),
                        });
                    }
                }
            }
        }
        Ok(changes)
    }
}
