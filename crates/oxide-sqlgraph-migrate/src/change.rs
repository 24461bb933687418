//! Schema changes and the bitmask used to filter them.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::schema::{Column, ForeignKey, Index, Table};

/// A set of change kinds.
///
/// Each kind is a single bit; [`ChangeKind::NO_CHANGE`] is the empty set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeKind(u32);

impl ChangeKind {
    /// The empty set.
    pub const NO_CHANGE: Self = Self(0);
    /// Schema creation.
    pub const ADD_SCHEMA: Self = Self(1 << 0);
    /// Schema modification.
    pub const MODIFY_SCHEMA: Self = Self(1 << 1);
    /// Schema removal.
    pub const DROP_SCHEMA: Self = Self(1 << 2);
    /// Table creation.
    pub const ADD_TABLE: Self = Self(1 << 3);
    /// Table modification.
    pub const MODIFY_TABLE: Self = Self(1 << 4);
    /// Table removal.
    pub const DROP_TABLE: Self = Self(1 << 5);
    /// Column creation.
    pub const ADD_COLUMN: Self = Self(1 << 6);
    /// Column modification.
    pub const MODIFY_COLUMN: Self = Self(1 << 7);
    /// Column removal.
    pub const DROP_COLUMN: Self = Self(1 << 8);
    /// Index creation.
    pub const ADD_INDEX: Self = Self(1 << 9);
    /// Index modification.
    pub const MODIFY_INDEX: Self = Self(1 << 10);
    /// Index removal.
    pub const DROP_INDEX: Self = Self(1 << 11);
    /// Foreign key creation.
    pub const ADD_FOREIGN_KEY: Self = Self(1 << 12);
    /// Foreign key modification.
    pub const MODIFY_FOREIGN_KEY: Self = Self(1 << 13);
    /// Foreign key removal.
    pub const DROP_FOREIGN_KEY: Self = Self(1 << 14);
    /// Check constraint creation.
    pub const ADD_CHECK: Self = Self(1 << 15);
    /// Check constraint modification.
    pub const MODIFY_CHECK: Self = Self(1 << 16);
    /// Check constraint removal.
    pub const DROP_CHECK: Self = Self(1 << 17);

    /// The raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Reports whether `self` equals `other` or shares a bit with it.
    #[must_use]
    pub const fn is(self, other: Self) -> bool {
        self.0 == other.0 || self.0 & other.0 != 0
    }
}

impl BitOr for ChangeKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeKind {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A single schema change computed by the differ.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Create a table.
    AddTable(Table),
    /// Alter an existing table.
    ModifyTable {
        /// Table name.
        table: String,
        /// Column and index changes.
        changes: Vec<Change>,
    },
    /// Add a column.
    AddColumn(Column),
    /// Change a column's type or nullability.
    ModifyColumn {
        /// Current column.
        from: Column,
        /// Desired column.
        to: Column,
    },
    /// Drop a column.
    DropColumn(Column),
    /// Create an index.
    AddIndex(Index),
    /// Drop an index.
    DropIndex(Index),
    /// Add a foreign key to `table`.
    AddForeignKey {
        /// Owning table.
        table: String,
        /// The constraint.
        fk: ForeignKey,
    },
}

impl Change {
    /// The kind of this change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::AddTable(_) => ChangeKind::ADD_TABLE,
            Self::ModifyTable { .. } => ChangeKind::MODIFY_TABLE,
            Self::AddColumn(_) => ChangeKind::ADD_COLUMN,
            Self::ModifyColumn { .. } => ChangeKind::MODIFY_COLUMN,
            Self::DropColumn(_) => ChangeKind::DROP_COLUMN,
            Self::AddIndex(_) => ChangeKind::ADD_INDEX,
            Self::DropIndex(_) => ChangeKind::DROP_INDEX,
            Self::AddForeignKey { .. } => ChangeKind::ADD_FOREIGN_KEY,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddTable(t) => write!(f, "create \"{}\" table", t.name),
            Self::ModifyTable { table, .. } => write!(f, "modify \"{table}\" table"),
            Self::AddColumn(c) => write!(f, "add column \"{}\"", c.name),
            Self::ModifyColumn { to, .. } => write!(f, "modify column \"{}\"", to.name),
            Self::DropColumn(c) => write!(f, "drop column \"{}\"", c.name),
            Self::AddIndex(i) => write!(f, "create index \"{}\"", i.name),
            Self::DropIndex(i) => write!(f, "drop index \"{}\"", i.name),
            Self::AddForeignKey { table, fk } => {
                write!(f, "create foreign key \"{}\" on \"{table}\"", fk.symbol)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_change_kind_is() {
        let skip = ChangeKind::DROP_INDEX | ChangeKind::DROP_COLUMN;
        assert!(skip.is(ChangeKind::DROP_INDEX));
        assert!(skip.is(ChangeKind::DROP_COLUMN));
        assert!(!skip.is(ChangeKind::ADD_COLUMN));
        assert!(ChangeKind::NO_CHANGE.is(ChangeKind::NO_CHANGE));
        assert!(!ChangeKind::NO_CHANGE.is(ChangeKind::ADD_TABLE));
        assert_eq!(ChangeKind::DROP_CHECK.bits(), 1 << 17);
    }

    #[test]
    fn test_change_kind_of_change() {
        let c = Change::AddColumn(Column::new("age", FieldType::Int));
        assert_eq!(c.kind(), ChangeKind::ADD_COLUMN);
        assert_eq!(c.to_string(), "add column \"age\"");
        let fk = Change::AddForeignKey {
            table: String::from("pets"),
            fk: ForeignKey::new("pets_owner", &["owner_id"], "users", &["id"]),
        };
        assert_eq!(fk.kind(), ChangeKind::ADD_FOREIGN_KEY);
    }
}
