use std::fmt;

use serde::{Deserialize, Serialize};

/// Dialect-independent column type.
///
/// Types without a portable counterpart are kept verbatim in
/// [`ColumnType::Native`] (e.g. `integer[]`, `inet`, enum type names). Build
/// values through [`ColumnType::from_name`] so that a native name that matches
/// a portable keyword collapses into the portable variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    String,
    Char,
    Text,
    SmallInteger,
    Integer,
    BigInteger,
    Float,
    Double,
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    /// Date and time with time zone.
    Timestamp,
    Binary,
    Json,
    Jsonb,
    Uuid,
    Native(String),
}

impl ColumnType {
    /// Parse a type name as written in snapshot files.
    pub fn from_name(name: &str) -> Self {
        match name {
            "string" => ColumnType::String,
            "char" => ColumnType::Char,
            "text" => ColumnType::Text,
            "smallinteger" => ColumnType::SmallInteger,
            "integer" => ColumnType::Integer,
            "biginteger" => ColumnType::BigInteger,
            "float" => ColumnType::Float,
            "double" => ColumnType::Double,
            "decimal" => ColumnType::Decimal,
            "boolean" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "time" => ColumnType::Time,
            "datetime" => ColumnType::DateTime,
            "timestamp" => ColumnType::Timestamp,
            "binary" => ColumnType::Binary,
            "json" => ColumnType::Json,
            "jsonb" => ColumnType::Jsonb,
            "uuid" => ColumnType::Uuid,
            other => ColumnType::Native(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::String => "string",
            ColumnType::Char => "char",
            ColumnType::Text => "text",
            ColumnType::SmallInteger => "smallinteger",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "biginteger",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Binary => "binary",
            ColumnType::Json => "json",
            ColumnType::Jsonb => "jsonb",
            ColumnType::Uuid => "uuid",
            ColumnType::Native(name) => name,
        }
    }

    /// True for integer types that can back an auto-increment column.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::SmallInteger | ColumnType::Integer | ColumnType::BigInteger
        )
    }

    /// True for types whose values are dates or instants.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::DateTime | ColumnType::Timestamp
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ColumnType {
    fn from(value: String) -> Self {
        ColumnType::from_name(&value)
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.as_str().to_string()
    }
}

/// Referential action for `ON UPDATE` / `ON DELETE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl FkAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "no_action" => Some(FkAction::NoAction),
            "restrict" => Some(FkAction::Restrict),
            "cascade" => Some(FkAction::Cascade),
            "set_null" => Some(FkAction::SetNull),
            "set_default" => Some(FkAction::SetDefault),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FkAction::NoAction => "no_action",
            FkAction::Restrict => "restrict",
            FkAction::Cascade => "cascade",
            FkAction::SetNull => "set_null",
            FkAction::SetDefault => "set_default",
        }
    }

    /// SQL spelling of the action.
    pub fn sql(&self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::Cascade => "CASCADE",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
        }
    }
}
