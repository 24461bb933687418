//! Schema descriptors.
//!
//! A [`Table`] describes either the desired shape of a table or the shape
//! read back from a live database. Both sides use the same types so the
//! migration engine can diff them directly.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use oxide_sqlgraph::builder::{foreign_key, reference, ForeignKeyBuilder};
use oxide_sqlgraph::Dialect;

use crate::error::{MigrateError, Result};

/// Default size of string columns.
pub const DEFAULT_STRING_LEN: i64 = 255;

/// Logical column types.
///
/// The declaration order matters: integer widening is checked by comparing
/// variants within the signed and unsigned groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Boolean.
    Bool,
    /// Timestamp.
    Time,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
    /// Binary data.
    Bytes,
    /// Enumerated string.
    Enum,
    /// Text.
    #[default]
    String,
    /// A type that only has a per-dialect schema type.
    Other,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// Platform integer (64-bit).
    Int,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    Uint8,
    /// 16-bit unsigned integer.
    Uint16,
    /// 32-bit unsigned integer.
    Uint32,
    /// Platform unsigned integer (64-bit).
    Uint,
    /// 64-bit unsigned integer.
    Uint64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
}

impl FieldType {
    /// Signed integer types.
    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int | Self::Int64
        )
    }

    /// Unsigned integer types.
    #[must_use]
    pub const fn is_uint(self) -> bool {
        matches!(
            self,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint | Self::Uint64
        )
    }

    /// Float types.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Signed or unsigned integer types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        self.is_int() || self.is_uint()
    }

    /// Integer or float types.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Width in bits of integer types.
    #[must_use]
    pub const fn bits(self) -> Option<u8> {
        match self {
            Self::Int8 | Self::Uint8 => Some(8),
            Self::Int16 | Self::Uint16 => Some(16),
            Self::Int32 | Self::Uint32 => Some(32),
            Self::Int | Self::Int64 | Self::Uint | Self::Uint64 => Some(64),
            _ => None,
        }
    }

    /// Lower-case name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Time => "time",
            Self::Json => "json",
            Self::Uuid => "uuid",
            Self::Bytes => "bytes",
            Self::Enum => "enum",
            Self::String => "string",
            Self::Other => "other",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint => "uint",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index membership of a column, as reported by `DESCRIBE`-style output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Not part of a key.
    #[default]
    None,
    /// Part of the primary key (`PRI`).
    Primary,
    /// Unique key (`UNI`).
    Unique,
    /// Part of a non-unique index (`MUL`).
    Multiple,
}

impl Key {
    /// Parses the MySQL `COLUMN_KEY` value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multiple,
            _ => Self::None,
        }
    }
}

/// A column default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// Boolean literal.
    Bool(bool),
    /// Signed integer literal.
    Int(i64),
    /// Unsigned integer literal.
    Uint(u64),
    /// Float literal.
    Float(f64),
    /// String literal, quoted when rendered.
    Text(String),
    /// Binary literal.
    Bytes(Vec<u8>),
    /// SQL expression written verbatim, e.g. `CURRENT_TIMESTAMP`.
    Expr(String),
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Logical type.
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Native type override per dialect name (`mysql`, `postgres`, `sqlite3`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schema_type: BTreeMap<String, String>,
    /// Extra attributes appended to the column definition.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attr: String,
    /// Maximum size for strings and blobs. Zero means the dialect default.
    #[serde(default)]
    pub size: i64,
    /// Key membership.
    #[serde(default)]
    pub key: Key,
    /// Column carries a unique constraint.
    #[serde(default)]
    pub unique: bool,
    /// Auto increment.
    #[serde(default)]
    pub increment: bool,
    /// `NULL` or `NOT NULL`.
    #[serde(default)]
    pub nullable: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Enum values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<String>,
    /// Collation, e.g. `utf8mb4_unicode_ci`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collation: String,
    /// Native type as read from the database.
    #[serde(skip)]
    pub raw_type: String,
}

impl Column {
    /// Creates a `NOT NULL` column.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            ..Self::default()
        }
    }

    /// Sets the size.
    #[must_use]
    pub const fn size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    /// Allows `NULL`.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Adds a unique constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub const fn increment(mut self) -> Self {
        self.increment = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the enum values.
    #[must_use]
    pub fn enums<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.enums = values.iter().map(|v| v.as_ref().to_string()).collect();
        self
    }

    /// Appends an attribute.
    #[must_use]
    pub fn attr(mut self, attr: impl Into<String>) -> Self {
        self.attr = attr.into();
        self
    }

    /// Sets the collation.
    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = collation.into();
        self
    }

    /// Overrides the native type for one dialect.
    #[must_use]
    pub fn schema_type(mut self, dialect: Dialect, ty: impl Into<String>) -> Self {
        self.schema_type.insert(dialect.name().to_string(), ty.into());
        self
    }

    /// The native type override for `dialect`, if any.
    #[must_use]
    pub fn schema_type_for(&self, dialect: Dialect) -> Option<&str> {
        self.schema_type.get(dialect.name()).map(String::as_str)
    }

    /// Part of the primary key.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.key == Key::Primary
    }

    /// Reports whether the column can be altered to `other` without losing data.
    ///
    /// Only the conversions listed here are allowed:
    /// - same type, with a size that does not shrink;
    /// - signed to a wider or equal signed type, unsigned likewise;
    /// - unsigned to a signed type of strictly more bits;
    /// - string to enum and back;
    /// - any integer to string;
    /// - `float32` to `float64`.
    #[must_use]
    pub fn convertible_to(&self, other: &Self) -> bool {
        let (from, to) = (self.ty, other.ty);
        if from == to {
            if self.size != 0 && other.size != 0 {
                return self.size <= other.size;
            }
            return true;
        }
        if (from.is_int() && to.is_int()) || (from.is_uint() && to.is_uint()) {
            return from <= to;
        }
        if from.is_uint() && to.is_int() {
            return match (from.bits(), to.bits()) {
                (Some(f), Some(t)) => f < t,
                _ => false,
            };
        }
        match (from, to) {
            (FieldType::String, FieldType::Enum) | (FieldType::Enum, FieldType::String) => true,
            (f, FieldType::String) if f.is_integer() => true,
            (FieldType::Float32, FieldType::Float64) => true,
            _ => false,
        }
    }

    /// Parses a default value read from the database.
    ///
    /// `NULL` is ignored. UUID defaults that call a function are skipped.
    pub fn scan_default(&mut self, value: &str) -> Result<()> {
        if value.eq_ignore_ascii_case("NULL") {
            return Ok(());
        }
        let invalid = || MigrateError::UnsupportedDefault {
            column: self.name.clone(),
            value: value.to_string(),
        };
        let ty = self.ty;
        let parsed = if ty.is_int() {
            Some(DefaultValue::Int(value.trim().parse().map_err(|_| invalid())?))
        } else if ty.is_uint() {
            Some(DefaultValue::Uint(value.trim().parse().map_err(|_| invalid())?))
        } else if ty.is_float() {
            Some(DefaultValue::Float(value.trim().parse().map_err(|_| invalid())?))
        } else {
            match ty {
                FieldType::Bool => Some(DefaultValue::Bool(parse_bool(value).ok_or_else(invalid)?)),
                FieldType::String | FieldType::Enum | FieldType::Json => {
                    Some(DefaultValue::Text(unquote(value)))
                }
                FieldType::Bytes => Some(DefaultValue::Bytes(value.as_bytes().to_vec())),
                FieldType::Uuid if value.contains("()") => None,
                FieldType::Uuid => Some(DefaultValue::Text(unquote(value))),
                FieldType::Time => Some(DefaultValue::Expr(value.to_string())),
                _ => return Err(invalid()),
            }
        };
        if parsed.is_some() {
            self.default = parsed;
        }
        Ok(())
    }

    /// Reports whether the column type can carry a default value.
    #[must_use]
    pub fn supports_default(&self) -> bool {
        match self.ty {
            FieldType::String | FieldType::Enum => self.size < 1 << 16,
            FieldType::Bool | FieldType::Time | FieldType::Uuid => true,
            t => t.is_numeric(),
        }
    }

    /// The SQL literal of the default value, if it should be rendered.
    #[must_use]
    pub fn default_literal(&self) -> Option<String> {
        if !self.supports_default() {
            return None;
        }
        let literal = match self.default.as_ref()? {
            DefaultValue::Bool(b) => b.to_string(),
            DefaultValue::Int(n) => n.to_string(),
            DefaultValue::Uint(n) => n.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::Text(s) if matches!(self.ty, FieldType::Uuid | FieldType::Time) => {
                s.clone()
            }
            DefaultValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            DefaultValue::Bytes(b) => format!("'{}'", String::from_utf8_lossy(b).replace('\'', "''")),
            DefaultValue::Expr(e) => e.clone(),
        };
        Some(literal)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match unquote(value).to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

fn unquote(value: &str) -> String {
    let v = value.trim();
    if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
        v[1..v.len() - 1].replace("''", "'")
    } else {
        v.to_string()
    }
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceOption {
    /// `NO ACTION`
    #[serde(rename = "NO ACTION")]
    NoAction,
    /// `RESTRICT`
    #[serde(rename = "RESTRICT")]
    Restrict,
    /// `CASCADE`
    #[serde(rename = "CASCADE")]
    Cascade,
    /// `SET NULL`
    #[serde(rename = "SET NULL")]
    SetNull,
    /// `SET DEFAULT`
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
}

impl ReferenceOption {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub symbol: String,
    /// Referencing columns of the owning table.
    pub columns: Vec<String>,
    /// Referenced table.
    pub ref_table: String,
    /// Referenced columns.
    pub ref_columns: Vec<String>,
    /// Action on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferenceOption>,
    /// Action on delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferenceOption>,
}

impl ForeignKey {
    /// Creates a foreign key from `columns` to `ref_table(ref_columns)`.
    #[must_use]
    pub fn new<S: AsRef<str>>(
        symbol: impl Into<String>,
        columns: &[S],
        ref_table: impl Into<String>,
        ref_columns: &[S],
    ) -> Self {
        Self {
            symbol: symbol.into(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.iter().map(|c| c.as_ref().to_string()).collect(),
            on_update: None,
            on_delete: None,
        }
    }

    /// Sets the delete action.
    #[must_use]
    pub const fn on_delete(mut self, action: ReferenceOption) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the update action.
    #[must_use]
    pub const fn on_update(mut self, action: ReferenceOption) -> Self {
        self.on_update = Some(action);
        self
    }

    /// The constraint clause builder.
    #[must_use]
    pub fn dsl(&self) -> ForeignKeyBuilder {
        let mut fk = foreign_key()
            .symbol(&self.symbol)
            .columns(&self.columns)
            .reference(reference().table(&self.ref_table).columns(&self.ref_columns));
        if let Some(action) = self.on_delete {
            fk = fk.on_delete(action.as_str());
        }
        if let Some(action) = self.on_update {
            fk = fk.on_update(action.as_str());
        }
        fk
    }
}

/// A table index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Unique index.
    #[serde(default)]
    pub unique: bool,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
}

impl Index {
    /// Creates an index.
    #[must_use]
    pub fn new<S: AsRef<str>>(name: impl Into<String>, unique: bool, columns: &[S]) -> Self {
        Self {
            name: name.into(),
            unique,
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }
}

/// A table descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns, in definition order.
    pub columns: Vec<Column>,
    /// Primary key column names.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Secondary indexes.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Foreign keys.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a primary key column.
    #[must_use]
    pub fn add_primary(mut self, mut column: Column) -> Self {
        column.key = Key::Primary;
        self.primary_key.push(column.name.clone());
        self.columns.push(column);
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn add_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn add_index<S: AsRef<str>>(mut self, name: impl Into<String>, unique: bool, columns: &[S]) -> Self {
        self.indexes.push(Index::new(name, unique, columns));
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn add_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// The column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Mutable access to the column named `name`.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Reports whether the table has a column named `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Primary key columns, in key order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key.iter().filter_map(|name| self.column(name))
    }

    /// Finds an index by name.
    ///
    /// Falls back to single-column indexes on a column of that name, and to
    /// the implicit index behind a unique column, including the Postgres
    /// `<table>_<column>_key` naming.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<Index> {
        for idx in &self.indexes {
            if idx.name == name || (idx.columns.len() == 1 && idx.columns[0] == name) {
                return Some(idx.clone());
            }
        }
        let column = self.column(name).or_else(|| {
            let trimmed = name
                .strip_prefix(&format!("{}_", self.name))
                .unwrap_or(name);
            let trimmed = trimmed.strip_suffix("_key").unwrap_or(trimmed);
            self.column(trimmed)
        })?;
        column
            .unique
            .then(|| Index::new(column.name.clone(), true, &[column.name.as_str()]))
    }
}

/// Compares two dotted versions, ignoring `-suffix` parts.
///
/// Unparsable versions sort before parsable ones.
#[must_use]
pub fn compare_versions(v1: &str, v2: &str) -> Ordering {
    match (parse_version(v1), parse_version(v2)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

fn parse_version(v: &str) -> Option<[u64; 3]> {
    let mut out = [0; 3];
    for (slot, part) in out.iter_mut().zip(v.split('.')) {
        let number = part.split('-').next().unwrap_or(part);
        *slot = number.parse().ok()?;
    }
    Some(out)
}

/// Shortens `name` to the identifier limit of `dialect`.
///
/// Names within the limit are returned unchanged. Longer names keep a prefix
/// and get the hex MD5 digest of the full name appended.
#[must_use]
pub fn symbol(name: &str, dialect: Dialect) -> String {
    let size = dialect.max_identifier_len();
    if name.len() <= size {
        return name.to_string();
    }
    let mut end = size - 33;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}_{:x}", &name[..end], md5::compute(name.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(ty: FieldType) -> Column {
        Column::new("c", ty)
    }

    #[test]
    fn test_convertible_to() {
        assert!(col(FieldType::Int8).convertible_to(&col(FieldType::Int64)));
        assert!(col(FieldType::Int32).convertible_to(&col(FieldType::Int)));
        assert!(!col(FieldType::Int64).convertible_to(&col(FieldType::Int32)));
        assert!(col(FieldType::Uint8).convertible_to(&col(FieldType::Uint32)));
        assert!(col(FieldType::Uint32).convertible_to(&col(FieldType::Int64)));
        assert!(!col(FieldType::Uint32).convertible_to(&col(FieldType::Int32)));
        assert!(!col(FieldType::Uint64).convertible_to(&col(FieldType::Int64)));
        assert!(col(FieldType::Enum).convertible_to(&col(FieldType::String)));
        assert!(col(FieldType::String).convertible_to(&col(FieldType::Enum)));
        assert!(col(FieldType::Int16).convertible_to(&col(FieldType::String)));
        assert!(col(FieldType::Float32).convertible_to(&col(FieldType::Float64)));
        assert!(!col(FieldType::Float64).convertible_to(&col(FieldType::Float32)));
        assert!(!col(FieldType::String).convertible_to(&col(FieldType::Int64)));
        assert!(!col(FieldType::Bool).convertible_to(&col(FieldType::Int8)));

        let short = col(FieldType::String).size(10);
        let long = col(FieldType::String).size(255);
        assert!(short.convertible_to(&long));
        assert!(!long.convertible_to(&short));
        assert!(long.convertible_to(&col(FieldType::String)));
    }

    #[test]
    fn test_scan_default() {
        let mut c = col(FieldType::Int64);
        c.scan_default("42").unwrap();
        assert_eq!(c.default, Some(DefaultValue::Int(42)));

        let mut c = col(FieldType::Bool);
        c.scan_default("1").unwrap();
        assert_eq!(c.default, Some(DefaultValue::Bool(true)));

        let mut c = col(FieldType::String);
        c.scan_default("'O''Brien'").unwrap();
        assert_eq!(c.default, Some(DefaultValue::Text(String::from("O'Brien"))));

        let mut c = col(FieldType::Uuid);
        c.scan_default("gen_random_uuid()").unwrap();
        assert_eq!(c.default, None);

        let mut c = col(FieldType::Float64);
        c.scan_default("NULL").unwrap();
        assert_eq!(c.default, None);
        assert!(c.scan_default("abc").is_err());
    }

    #[test]
    fn test_default_literal() {
        let c = col(FieldType::String).default_value(DefaultValue::Text(String::from("it's")));
        assert_eq!(c.default_literal().as_deref(), Some("'it''s'"));

        let c = col(FieldType::Bool).default_value(DefaultValue::Bool(false));
        assert_eq!(c.default_literal().as_deref(), Some("false"));

        let text = col(FieldType::String)
            .size(1 << 16)
            .default_value(DefaultValue::Text(String::from("x")));
        assert!(!text.supports_default());
        assert_eq!(text.default_literal(), None);

        let json = col(FieldType::Json).default_value(DefaultValue::Text(String::from("{}")));
        assert_eq!(json.default_literal(), None);
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("5.7.26", "5.7.8"), Ordering::Greater);
        assert_eq!(compare_versions("8.0.19-log", "8.0.19"), Ordering::Equal);
        assert_eq!(compare_versions("10.2", "10.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("5.6", "5.7.8"), Ordering::Less);
        assert_eq!(compare_versions("x", "1"), Ordering::Less);
    }

    #[test]
    fn test_symbol() {
        assert_eq!(symbol("users_groups", Dialect::MySql), "users_groups");

        let long = "a".repeat(70);
        let s = symbol(&long, Dialect::MySql);
        assert_eq!(s.len(), 64);
        assert!(s.starts_with(&"a".repeat(31)));
        assert_eq!(&s[31..32], "_");
        assert_eq!(&s[32..], format!("{:x}", md5::compute(long.as_bytes())));

        let pg = symbol(&"b".repeat(64), Dialect::Postgres);
        assert_eq!(pg.len(), 63);
    }

    #[test]
    fn test_table_index_fallbacks() {
        let t = Table::new("users")
            .add_primary(Column::new("id", FieldType::Int64).increment())
            .add_column(Column::new("email", FieldType::String).unique())
            .add_column(Column::new("name", FieldType::String))
            .add_index("user_name", false, &["name"]);

        assert_eq!(t.index("user_name").map(|i| i.name), Some(String::from("user_name")));
        assert_eq!(t.index("name").map(|i| i.name), Some(String::from("user_name")));
        assert_eq!(
            t.index("users_email_key"),
            Some(Index::new("email", true, &["email"]))
        );
        assert_eq!(t.index("email").map(|i| i.unique), Some(true));
        assert_eq!(t.index("missing"), None);
        assert!(t.column("id").is_some_and(Column::is_primary));
    }

    #[test]
    fn test_table_json() {
        let t = Table::new("pets")
            .add_primary(Column::new("id", FieldType::Int64).increment())
            .add_column(Column::new("owner_id", FieldType::Int64).nullable())
            .add_foreign_key(
                ForeignKey::new("pets_users_pets", &["owner_id"], "users", &["id"])
                    .on_delete(ReferenceOption::SetNull),
            );
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains(r#""on_delete":"SET NULL""#));
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
