//! The closed set of tables the gateway operates on, with their known fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Invalid table type: {0}")]
    UnknownTable(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Clients,
    Tasks,
    Meetings,
    Files,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Users,
        Table::Clients,
        Table::Tasks,
        Table::Meetings,
        Table::Files,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Clients => "clients",
            Table::Tasks => "tasks",
            Table::Meetings => "meetings",
            Table::Files => "files",
        }
    }

    /// Documented camelCase fields a caller may write. Server-assigned
    /// `id` and `created_at` are deliberately absent.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Table::Clients => &[
                "name",
                "contact",
                "email",
                "phone",
                "status",
                "category",
                "lastInteraction",
                "instagram",
                "ownerId",
                "role",
                "relationship",
                "businessType",
                "hasTraffic",
                "website",
                "prospectingDay",
                "notes",
                "source",
            ],
            Table::Tasks => &[
                "title",
                "assigneeId",
                "status",
                "priority",
                "dueDate",
                "description",
                "type",
                "ownerId",
            ],
            Table::Users => &["name", "email", "password", "role", "avatar"],
            Table::Meetings => &[
                "title", "clientId", "date", "time", "duration", "type", "notes", "status", "ownerId",
            ],
            Table::Files => &[
                "name",
                "type",
                "size",
                "date",
                "ownerId",
                "recipientId",
                "category",
                "notes",
                "storageKey",
            ],
        }
    }

    /// Case-insensitive lookup, since PostgreSQL folds unquoted identifiers.
    pub fn knows_field(&self, name: &str) -> bool {
        self.fields().iter().any(|f| f.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| IdentifierError::UnknownTable(s.to_string()))
    }
}

/// Columns that only the database assigns.
pub const SYSTEM_FIELDS: &[&str] = &["id", "created_at"];

/// A column identifier that is safe to splice into SQL text unquoted.
///
/// PostgreSQL folds unquoted identifiers to lower case, so `ownerId` and
/// `ownerid` address the same column. `sql()` returns the folded form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
}

impl Column {
    pub fn parse(name: &str) -> Result<Self, IdentifierError> {
        let mut chars = name.chars();
        let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_head || name.len() > 63 || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(IdentifierError::InvalidColumn(name.to_string()));
        }
        Ok(Self { name: name.to_string() })
    }

    /// For names fixed in source, which never need validation.
    pub(crate) fn trusted(name: &'static str) -> Self {
        Self { name: name.to_string() }
    }

    /// The name as the caller wrote it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as PostgreSQL stores it.
    pub fn sql(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Type for a column the gateway adds on its own: foreign-key-looking
    /// names (`ownerId`, `clientId`) get INTEGER, everything else TEXT.
    pub fn inferred_type(&self) -> &'static str {
        if self.name.ends_with("Id") {
            "INTEGER"
        } else {
            "TEXT"
        }
    }

    pub fn is_system(&self) -> bool {
        SYSTEM_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(&self.name))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
