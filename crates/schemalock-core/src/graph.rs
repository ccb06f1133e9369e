use std::collections::BTreeMap;

use crate::schema::TableSchema;

/// A table listed before a table it references through a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub table: String,
    pub constraint: String,
    pub references: String,
}

/// Report foreign keys that point forward in `order`.
///
/// Only tables named in `order` are considered; self references and
/// references to tables outside `order` are ignored. Nothing is reordered.
pub fn forward_references<'a, I>(tables: I, order: &[&str]) -> Vec<OrderViolation>
where
    I: IntoIterator<Item = &'a TableSchema>,
{
    let position: BTreeMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, name)| (*name, idx))
        .collect();

    let mut violations = Vec::new();
    for table in tables {
        let Some(&own) = position.get(table.name.as_str()) else {
            continue;
        };
        for (name, fk) in table.foreign_keys() {
            if fk.referenced_table == table.name {
                continue;
            }
            if let Some(&target) = position.get(fk.referenced_table.as_str()) {
                if target > own {
                    violations.push(OrderViolation {
                        table: table.name.clone(),
                        constraint: name.to_string(),
                        references: fk.referenced_table.clone(),
                    });
                }
            }
        }
    }

    violations.sort_by_key(|violation| position.get(violation.table.as_str()).copied());
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintDefinition;
    use crate::schema::ColumnDefinition;
    use crate::types::ColumnType;

    fn table(name: &str, fk_target: Option<&str>) -> TableSchema {
        let mut table = TableSchema::new(name);
        table
            .add_column(ColumnDefinition::new("id", ColumnType::Integer))
            .unwrap()
            .add_column(ColumnDefinition::new("parent_id", ColumnType::Integer))
            .unwrap();
        if let Some(target) = fk_target {
            table
                .add_constraint(ConstraintDefinition::foreign_key(
                    format!("{name}_parent_fk"),
                    &["parent_id"],
                    target,
                    &["id"],
                ))
                .unwrap();
        }
        table
    }

    #[test]
    fn detects_child_before_parent() {
        let tables = [table("users", None), table("orders", Some("users"))];
        let violations = forward_references(&tables, &["orders", "users"]);
        assert_eq!(
            violations,
            vec![OrderViolation {
                table: "orders".to_string(),
                constraint: "orders_parent_fk".to_string(),
                references: "users".to_string(),
            }]
        );
        assert!(forward_references(&tables, &["users", "orders"]).is_empty());
    }

    #[test]
    fn ignores_self_and_outside_references() {
        let tables = [table("nodes", Some("nodes")), table("orders", Some("users"))];
        assert!(forward_references(&tables, &["nodes", "orders"]).is_empty());
    }
}
