use crate::types::FkAction;

/// Foreign key definition preserving column ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
}

/// Kind-specific payload of a table constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    PrimaryKey { columns: Vec<String> },
    Unique { columns: Vec<String> },
    Check { expression: String },
    /// `definition` is the clause as the server prints it, starting at `EXCLUDE`.
    Exclusion {
        columns: Vec<String>,
        definition: String,
    },
    ForeignKey(ForeignKey),
}

impl ConstraintKind {
    /// Type tag used in snapshot files.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey { .. } => "primary",
            ConstraintKind::Unique { .. } => "unique",
            ConstraintKind::Check { .. } => "check",
            ConstraintKind::Exclusion { .. } => "exclude",
            ConstraintKind::ForeignKey(_) => "foreign",
        }
    }

    /// Local columns covered by the constraint (empty for checks).
    pub fn columns(&self) -> &[String] {
        match self {
            ConstraintKind::PrimaryKey { columns }
            | ConstraintKind::Unique { columns }
            | ConstraintKind::Exclusion { columns, .. } => columns,
            ConstraintKind::ForeignKey(fk) => &fk.columns,
            ConstraintKind::Check { .. } => &[],
        }
    }
}

/// Named table constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDefinition {
    pub name: String,
    pub kind: ConstraintKind,
}

impl ConstraintDefinition {
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn primary_key(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(
            name,
            ConstraintKind::PrimaryKey {
                columns: owned(columns),
            },
        )
    }

    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(
            name,
            ConstraintKind::Unique {
                columns: owned(columns),
            },
        )
    }

    pub fn check(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(
            name,
            ConstraintKind::Check {
                expression: expression.into(),
            },
        )
    }

    pub fn exclusion(
        name: impl Into<String>,
        columns: &[&str],
        definition: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            ConstraintKind::Exclusion {
                columns: owned(columns),
                definition: definition.into(),
            },
        )
    }

    pub fn foreign_key(
        name: impl Into<String>,
        columns: &[&str],
        referenced_table: impl Into<String>,
        referenced_columns: &[&str],
    ) -> Self {
        Self::new(
            name,
            ConstraintKind::ForeignKey(ForeignKey {
                columns: owned(columns),
                referenced_table: referenced_table.into(),
                referenced_columns: owned(referenced_columns),
                on_update: FkAction::NoAction,
                on_delete: FkAction::NoAction,
            }),
        )
    }

    pub fn as_foreign_key(&self) -> Option<&ForeignKey> {
        match &self.kind {
            ConstraintKind::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        self.as_foreign_key().is_some()
    }
}

/// Index definition.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    /// Access method such as `btree` or `gin`.
    pub kind: Option<String>,
    /// Text after `USING` for indexes a column list cannot express (expression
    /// keys, predicates, operator classes). Replayed verbatim when set.
    pub definition: Option<String>,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: owned(columns),
            unique: false,
            kind: None,
            definition: None,
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
