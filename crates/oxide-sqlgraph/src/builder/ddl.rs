//! DDL builders: tables, columns, indexes and foreign keys.
//!
//! These builders only assemble text. Choosing native types and attributes
//! for a dialect is the job of the migration adapters.

use super::{Builder, Querier};

/// A column definition, as used by `CREATE TABLE` and `ALTER TABLE`.
#[derive(Debug, Clone, Default)]
pub struct ColumnBuilder {
    name: String,
    typ: String,
    attr: String,
    modify: bool,
    constraint: Option<ForeignKeyBuilder>,
}

/// Starts a column definition.
#[must_use]
pub fn column(name: &str) -> ColumnBuilder {
    ColumnBuilder {
        name: name.to_string(),
        ..ColumnBuilder::default()
    }
}

impl ColumnBuilder {
    /// Sets the native column type.
    #[must_use]
    pub fn type_(mut self, typ: &str) -> Self {
        self.typ = typ.to_string();
        self
    }

    /// Appends an attribute such as `NOT NULL` or `AUTO_INCREMENT`.
    #[must_use]
    pub fn attr(mut self, attr: &str) -> Self {
        if attr.is_empty() {
            return self;
        }
        if !self.attr.is_empty() {
            self.attr.push(' ');
        }
        self.attr.push_str(attr);
        self
    }

    /// Adds an inline foreign-key constraint.
    #[must_use]
    pub fn constraint(mut self, fk: ForeignKeyBuilder) -> Self {
        self.constraint = Some(fk);
        self
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn modified(mut self) -> Self {
        self.modify = true;
        self
    }
}

impl Querier for ColumnBuilder {
    fn render(&self, b: &mut Builder) {
        b.ident(&self.name);
        if !self.typ.is_empty() {
            if b.postgres() && self.modify {
                b.write_str(" TYPE");
            }
            b.pad().write_str(&self.typ);
        }
        if !self.attr.is_empty() {
            b.pad().write_str(&self.attr);
        }
        if let Some(fk) = &self.constraint {
            b.pad().join(fk);
        }
    }
}

/// A `CREATE TABLE` statement.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    name: String,
    if_not_exists: bool,
    columns: Vec<ColumnBuilder>,
    primary: Vec<String>,
    constraints: Vec<ForeignKeyBuilder>,
    charset: String,
    collation: String,
    options: String,
}

/// Starts a `CREATE TABLE` statement.
#[must_use]
pub fn create_table(name: &str) -> TableBuilder {
    TableBuilder {
        name: name.to_string(),
        ..TableBuilder::default()
    }
}

impl TableBuilder {
    /// Adds `IF NOT EXISTS`.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, c: ColumnBuilder) -> Self {
        self.columns.push(c);
        self
    }

    /// Appends several columns.
    #[must_use]
    pub fn columns(mut self, cs: impl IntoIterator<Item = ColumnBuilder>) -> Self {
        self.columns.extend(cs);
        self
    }

    /// Sets the `PRIMARY KEY(...)` clause.
    #[must_use]
    pub fn primary_key<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.primary = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Appends inline foreign-key constraints.
    #[must_use]
    pub fn foreign_keys(mut self, fks: impl IntoIterator<Item = ForeignKeyBuilder>) -> Self {
        self.constraints.extend(fks);
        self
    }

    /// Sets `CHARACTER SET`.
    #[must_use]
    pub fn charset(mut self, charset: &str) -> Self {
        self.charset = charset.to_string();
        self
    }

    /// Sets `COLLATE`.
    #[must_use]
    pub fn collate(mut self, collation: &str) -> Self {
        self.collation = collation.to_string();
        self
    }

    /// Appends free-form table options.
    #[must_use]
    pub fn options(mut self, options: &str) -> Self {
        self.options = options.to_string();
        self
    }
}

impl Querier for TableBuilder {
    fn render(&self, b: &mut Builder) {
        b.write_str("CREATE TABLE ");
        if self.if_not_exists {
            b.write_str("IF NOT EXISTS ");
        }
        b.ident(&self.name);
        b.nested(|b| {
            for (i, c) in self.columns.iter().enumerate() {
                if i > 0 {
                    b.comma();
                }
                b.join(c);
            }
            if !self.primary.is_empty() {
                b.comma().write_str("PRIMARY KEY");
                b.nested(|b| {
                    b.ident_comma(&self.primary);
                });
            }
            for fk in &self.constraints {
                b.comma().join(fk);
            }
        });
        if !self.charset.is_empty() {
            b.write_str(" CHARACTER SET ").write_str(&self.charset);
        }
        if !self.collation.is_empty() {
            b.write_str(" COLLATE ").write_str(&self.collation);
        }
        if !self.options.is_empty() {
            b.pad().write_str(&self.options);
        }
    }
}

#[derive(Debug, Clone)]
enum AlterClause {
    AddColumn(ColumnBuilder),
    ModifyColumn(ColumnBuilder),
    ChangeColumn(String, ColumnBuilder),
    RenameColumn(String, String),
    DropColumn(ColumnBuilder),
    AddIndex(IndexBuilder),
    RenameIndex(String, String),
    DropIndex(String),
    AddForeignKey(ForeignKeyBuilder),
    DropForeignKey(String),
    DropConstraint(String),
}

impl Querier for AlterClause {
    fn render(&self, b: &mut Builder) {
        match self {
            Self::AddColumn(c) => {
                b.write_str("ADD COLUMN ").join(c);
            }
            Self::ModifyColumn(c) => {
                if b.postgres() {
                    b.write_str("ALTER COLUMN ").join(c);
                } else {
                    b.write_str("MODIFY COLUMN ").join(c);
                }
            }
            Self::ChangeColumn(old, c) => {
                b.write_str("CHANGE COLUMN ").ident(old).pad().join(c);
            }
            Self::RenameColumn(old, new) => {
                b.write_str("RENAME COLUMN ")
                    .ident(old)
                    .write_str(" TO ")
                    .ident(new);
            }
            Self::DropColumn(c) => {
                b.write_str("DROP COLUMN ").join(c);
            }
            Self::AddIndex(idx) => {
                b.write_str("ADD ");
                if idx.unique {
                    b.write_str("UNIQUE ");
                }
                b.write_str("INDEX ").ident(&idx.name);
                b.nested(|b| {
                    b.ident_comma(&idx.columns);
                });
            }
            Self::RenameIndex(old, new) => {
                b.write_str("RENAME INDEX ")
                    .ident(old)
                    .write_str(" TO ")
                    .ident(new);
            }
            Self::DropIndex(name) => {
                b.write_str("DROP INDEX ").ident(name);
            }
            Self::AddForeignKey(fk) => {
                b.write_str("ADD ").join(fk);
            }
            Self::DropForeignKey(symbol) => {
                b.write_str("DROP FOREIGN KEY ").ident(symbol);
            }
            Self::DropConstraint(symbol) => {
                b.write_str("DROP CONSTRAINT ").ident(symbol);
            }
        }
    }
}

/// An `ALTER TABLE` statement with one or more comma separated clauses.
#[derive(Debug, Clone, Default)]
pub struct TableAlter {
    name: String,
    clauses: Vec<AlterClause>,
}

/// Starts an `ALTER TABLE` statement.
#[must_use]
pub fn alter_table(name: &str) -> TableAlter {
    TableAlter {
        name: name.to_string(),
        clauses: Vec::new(),
    }
}

impl TableAlter {
    /// `ADD COLUMN`
    #[must_use]
    pub fn add_column(mut self, c: ColumnBuilder) -> Self {
        self.clauses.push(AlterClause::AddColumn(c));
        self
    }

    /// `MODIFY COLUMN` on MySQL and SQLite, `ALTER COLUMN .. TYPE` on Postgres.
    #[must_use]
    pub fn modify_column(mut self, c: ColumnBuilder) -> Self {
        self.clauses.push(AlterClause::ModifyColumn(c.modified()));
        self
    }

    /// Appends several modify clauses.
    #[must_use]
    pub fn modify_columns(self, cs: impl IntoIterator<Item = ColumnBuilder>) -> Self {
        cs.into_iter().fold(self, Self::modify_column)
    }

    /// `CHANGE COLUMN old new`
    #[must_use]
    pub fn change_column(mut self, old: &str, c: ColumnBuilder) -> Self {
        self.clauses
            .push(AlterClause::ChangeColumn(old.to_string(), c));
        self
    }

    /// `RENAME COLUMN old TO new`
    #[must_use]
    pub fn rename_column(mut self, old: &str, new: &str) -> Self {
        self.clauses
            .push(AlterClause::RenameColumn(old.to_string(), new.to_string()));
        self
    }

    /// `DROP COLUMN`
    #[must_use]
    pub fn drop_column(mut self, c: ColumnBuilder) -> Self {
        self.clauses.push(AlterClause::DropColumn(c));
        self
    }

    /// `ADD [UNIQUE ]INDEX name(columns)`
    #[must_use]
    pub fn add_index(mut self, idx: IndexBuilder) -> Self {
        self.clauses.push(AlterClause::AddIndex(idx));
        self
    }

    /// `RENAME INDEX old TO new`
    #[must_use]
    pub fn rename_index(mut self, old: &str, new: &str) -> Self {
        self.clauses
            .push(AlterClause::RenameIndex(old.to_string(), new.to_string()));
        self
    }

    /// `DROP INDEX name`
    #[must_use]
    pub fn drop_index(mut self, name: &str) -> Self {
        self.clauses.push(AlterClause::DropIndex(name.to_string()));
        self
    }

    /// `ADD CONSTRAINT .. FOREIGN KEY ..`
    #[must_use]
    pub fn add_foreign_key(mut self, fk: ForeignKeyBuilder) -> Self {
        self.clauses.push(AlterClause::AddForeignKey(fk));
        self
    }

    /// `DROP FOREIGN KEY symbol`
    #[must_use]
    pub fn drop_foreign_key(mut self, symbol: &str) -> Self {
        self.clauses
            .push(AlterClause::DropForeignKey(symbol.to_string()));
        self
    }

    /// `DROP CONSTRAINT symbol`
    #[must_use]
    pub fn drop_constraint(mut self, symbol: &str) -> Self {
        self.clauses
            .push(AlterClause::DropConstraint(symbol.to_string()));
        self
    }

    /// Returns true if no clause was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl Querier for TableAlter {
    fn render(&self, b: &mut Builder) {
        b.write_str("ALTER TABLE ").ident(&self.name).pad();
        for (i, c) in self.clauses.iter().enumerate() {
            if i > 0 {
                b.comma();
            }
            b.join(c);
        }
    }
}

/// An `ALTER INDEX` statement.
#[derive(Debug, Clone, Default)]
pub struct IndexAlter {
    name: String,
    rename: Option<String>,
}

/// Starts an `ALTER INDEX` statement.
#[must_use]
pub fn alter_index(name: &str) -> IndexAlter {
    IndexAlter {
        name: name.to_string(),
        rename: None,
    }
}

impl IndexAlter {
    /// `RENAME TO name`
    #[must_use]
    pub fn rename(mut self, name: &str) -> Self {
        self.rename = Some(name.to_string());
        self
    }
}

impl Querier for IndexAlter {
    fn render(&self, b: &mut Builder) {
        b.write_str("ALTER INDEX ").ident(&self.name);
        if let Some(name) = &self.rename {
            b.write_str(" RENAME TO ").ident(name);
        }
    }
}

/// A `FOREIGN KEY` constraint, standalone or inside another statement.
#[derive(Debug, Clone, Default)]
pub struct ForeignKeyBuilder {
    symbol: String,
    columns: Vec<String>,
    reference: Option<ReferenceBuilder>,
    actions: Vec<String>,
}

/// Starts a foreign-key constraint.
#[must_use]
pub fn foreign_key() -> ForeignKeyBuilder {
    ForeignKeyBuilder::default()
}

impl ForeignKeyBuilder {
    /// Sets the constraint name.
    #[must_use]
    pub fn symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }

    /// Sets the referencing columns.
    #[must_use]
    pub fn columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Sets the referenced table and columns.
    #[must_use]
    pub fn reference(mut self, r: ReferenceBuilder) -> Self {
        self.reference = Some(r);
        self
    }

    /// `ON DELETE action`
    #[must_use]
    pub fn on_delete(mut self, action: &str) -> Self {
        self.actions.push(format!("ON DELETE {action}"));
        self
    }

    /// `ON UPDATE action`
    #[must_use]
    pub fn on_update(mut self, action: &str) -> Self {
        self.actions.push(format!("ON UPDATE {action}"));
        self
    }
}

impl Querier for ForeignKeyBuilder {
    fn render(&self, b: &mut Builder) {
        if !self.symbol.is_empty() {
            b.write_str("CONSTRAINT ").ident(&self.symbol).pad();
        }
        b.write_str("FOREIGN KEY");
        b.nested(|b| {
            b.ident_comma(&self.columns);
        });
        if let Some(r) = &self.reference {
            b.pad().join(r);
        }
        for action in &self.actions {
            b.pad().write_str(action);
        }
    }
}

/// `REFERENCES table(columns)`
#[derive(Debug, Clone, Default)]
pub struct ReferenceBuilder {
    table: String,
    columns: Vec<String>,
}

/// Starts a `REFERENCES` clause.
#[must_use]
pub fn reference() -> ReferenceBuilder {
    ReferenceBuilder::default()
}

impl ReferenceBuilder {
    /// Sets the referenced table.
    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Sets the referenced columns.
    #[must_use]
    pub fn columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }
}

impl Querier for ReferenceBuilder {
    fn render(&self, b: &mut Builder) {
        b.write_str("REFERENCES ").ident(&self.table);
        b.nested(|b| {
            b.ident_comma(&self.columns);
        });
    }
}

/// A `CREATE INDEX` statement.
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    name: String,
    unique: bool,
    if_not_exists: bool,
    table: String,
    columns: Vec<String>,
}

/// Starts a `CREATE INDEX` statement.
#[must_use]
pub fn create_index(name: &str) -> IndexBuilder {
    IndexBuilder {
        name: name.to_string(),
        ..IndexBuilder::default()
    }
}

impl IndexBuilder {
    /// Makes the index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Adds `IF NOT EXISTS`.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Sets the indexed table.
    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Appends an indexed column.
    #[must_use]
    pub fn column(mut self, column: &str) -> Self {
        self.columns.push(column.to_string());
        self
    }

    /// Appends indexed columns.
    #[must_use]
    pub fn columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns
            .extend(columns.iter().map(|c| c.as_ref().to_string()));
        self
    }
}

impl Querier for IndexBuilder {
    fn render(&self, b: &mut Builder) {
        b.write_str("CREATE ");
        if self.unique {
            b.write_str("UNIQUE ");
        }
        b.write_str("INDEX ");
        if self.if_not_exists {
            b.write_str("IF NOT EXISTS ");
        }
        b.ident(&self.name).write_str(" ON ").ident(&self.table);
        b.nested(|b| {
            b.ident_comma(&self.columns);
        });
    }
}

/// A `DROP INDEX` statement.
#[derive(Debug, Clone, Default)]
pub struct DropIndexBuilder {
    name: String,
    table: Option<String>,
}

/// Starts a `DROP INDEX` statement.
#[must_use]
pub fn drop_index(name: &str) -> DropIndexBuilder {
    DropIndexBuilder {
        name: name.to_string(),
        table: None,
    }
}

impl DropIndexBuilder {
    /// Adds `ON table`, required by MySQL.
    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }
}

impl Querier for DropIndexBuilder {
    fn render(&self, b: &mut Builder) {
        b.write_str("DROP INDEX ").ident(&self.name);
        if let Some(table) = &self.table {
            b.write_str(" ON ").ident(table);
        }
    }
}

/// A `DESCRIBE table` statement.
#[derive(Debug, Clone, Default)]
pub struct DescribeBuilder {
    name: String,
}

/// Starts a `DESCRIBE` statement.
#[must_use]
pub fn describe(name: &str) -> DescribeBuilder {
    DescribeBuilder {
        name: name.to_string(),
    }
}

impl Querier for DescribeBuilder {
    fn render(&self, b: &mut Builder) {
        b.write_str("DESCRIBE ").ident(&self.name);
    }
}
