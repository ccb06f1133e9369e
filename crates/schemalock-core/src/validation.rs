use crate::constraints::ConstraintKind;
use crate::error::{Error, Result};
use crate::schema::TableSchema;
use crate::snapshot::Snapshot;

/// Check that DDL can be generated for every table of a snapshot.
///
/// Snapshot files may be edited by hand, so this checks:
/// - constraint and index columns exist in their table
/// - foreign keys reference a table of the snapshot and existing columns
/// - foreign key column lists have matching lengths
///
/// The first problem is returned as [`Error::DdlGeneration`] naming the table
/// and the offending constraint or index.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<()> {
    for table in snapshot.tables() {
        validate_table(snapshot, table)?;
    }
    Ok(())
}

fn validate_table(snapshot: &Snapshot, table: &TableSchema) -> Result<()> {
    for constraint in table.constraints() {
        let name = constraint.name.as_str();
        if !matches!(
            constraint.kind,
            ConstraintKind::Check { .. } | ConstraintKind::Exclusion { .. }
        ) && constraint.kind.columns().is_empty()
        {
            return Err(Error::ddl(&table.name, name, "constraint has no columns"));
        }
        require_columns(table, name, constraint.kind.columns())?;

        match &constraint.kind {
            ConstraintKind::Check { expression } if expression.trim().is_empty() => {
                return Err(Error::ddl(&table.name, name, "check expression is empty"));
            }
            ConstraintKind::Exclusion { definition, .. } if definition.trim().is_empty() => {
                return Err(Error::ddl(&table.name, name, "exclusion definition is empty"));
            }
            ConstraintKind::ForeignKey(fk) => {
                let target = snapshot.table(&fk.referenced_table).ok_or_else(|| {
                    Error::ddl(
                        &table.name,
                        name,
                        format!("referenced table `{}` does not exist", fk.referenced_table),
                    )
                })?;

                if fk.referenced_columns.len() != fk.columns.len() {
                    return Err(Error::ddl(
                        &table.name,
                        name,
                        format!(
                            "{} local columns but {} referenced columns",
                            fk.columns.len(),
                            fk.referenced_columns.len()
                        ),
                    ));
                }

                for column in &fk.referenced_columns {
                    if !target.has_column(column) {
                        return Err(Error::ddl(
                            &table.name,
                            name,
                            format!(
                                "referenced column `{}.{}` does not exist",
                                fk.referenced_table, column
                            ),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    for index in table.indexes() {
        match &index.definition {
            Some(definition) if definition.trim().is_empty() => {
                return Err(Error::ddl(&table.name, &index.name, "index definition is empty"));
            }
            None if index.columns.is_empty() => {
                return Err(Error::ddl(&table.name, &index.name, "index has no columns"));
            }
            _ => {}
        }
        require_columns(table, &index.name, &index.columns)?;
    }

    Ok(())
}

fn require_columns(table: &TableSchema, owner: &str, columns: &[String]) -> Result<()> {
    match columns.iter().find(|column| !table.has_column(column)) {
        Some(missing) => Err(Error::ddl(
            &table.name,
            owner,
            format!("column `{missing}` does not exist"),
        )),
        None => Ok(()),
    }
}
