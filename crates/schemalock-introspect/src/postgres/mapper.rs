use serde_json::{Number, Value};

use schemalock_core::{
    ColumnDefinition, ColumnType, ConstraintDefinition, ConstraintKind, FkAction, ForeignKey,
    IndexDefinition, TableSchema,
};

use crate::options::IntrospectOptions;

use super::queries::{RawColumn, RawConstraint, RawIndex, RawTable};

/// How a catalog default expression maps onto the column model.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDefault {
    None,
    Literal(Value),
    AutoIncrement,
    Expression(String),
}

pub fn map_column_type(udt_name: &str, data_type: &str) -> ColumnType {
    match udt_name {
        "varchar" => ColumnType::String,
        "bpchar" => ColumnType::Char,
        "text" => ColumnType::Text,
        "int2" => ColumnType::SmallInteger,
        "int4" => ColumnType::Integer,
        "int8" => ColumnType::BigInteger,
        "float4" => ColumnType::Float,
        "float8" => ColumnType::Double,
        "numeric" => ColumnType::Decimal,
        "bool" => ColumnType::Boolean,
        "date" => ColumnType::Date,
        "time" => ColumnType::Time,
        "timestamp" => ColumnType::DateTime,
        "timestamptz" => ColumnType::Timestamp,
        "bytea" => ColumnType::Binary,
        "json" => ColumnType::Json,
        "jsonb" => ColumnType::Jsonb,
        "uuid" => ColumnType::Uuid,
        _ => ColumnType::from_name(data_type),
    }
}

pub fn map_column(raw: RawColumn, opts: &IntrospectOptions) -> ColumnDefinition {
    let column_type = map_column_type(&raw.udt_name, &raw.data_type);
    let mut column = ColumnDefinition::new(raw.name, column_type.clone());
    column.nullable = raw.is_nullable;

    match column_type {
        ColumnType::String | ColumnType::Char => {
            column.length = raw.character_max_length.and_then(to_u32);
        }
        ColumnType::Decimal => {
            column.precision = raw.numeric_precision.and_then(to_u32);
            column.scale = raw.numeric_scale.and_then(to_u32);
        }
        ColumnType::Time | ColumnType::DateTime | ColumnType::Timestamp => {
            // 6 is the server default and is left implicit
            column.precision = raw
                .datetime_precision
                .filter(|precision| *precision != 6)
                .and_then(to_u32);
        }
        _ => {}
    }

    if let Some(identity) = raw.identity {
        column.auto_increment = true;
        column.extra.insert("identity".to_string(), Value::String(identity));
    }

    if let Some(expression) = raw.default {
        match parse_default(&expression, &column.column_type) {
            ParsedDefault::None => {}
            ParsedDefault::Literal(value) => column.default = Some(value),
            ParsedDefault::AutoIncrement => column.auto_increment = true,
            ParsedDefault::Expression(expression) => {
                column
                    .extra
                    .insert("default_expression".to_string(), Value::String(expression));
            }
        }
    }

    if let Some(collation) = raw.collation {
        column.extra.insert("collate".to_string(), Value::String(collation));
    }
    if opts.include_comments {
        if let Some(comment) = raw.comment {
            column.extra.insert("comment".to_string(), Value::String(comment));
        }
    }

    column
}

fn to_u32(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}

/// Classify a default expression as rendered by `pg_get_expr`.
pub fn parse_default(expression: &str, column_type: &ColumnType) -> ParsedDefault {
    let expression = expression.trim();

    if expression.starts_with("nextval(") {
        return ParsedDefault::AutoIncrement;
    }
    if expression.eq_ignore_ascii_case("null") || expression.to_ascii_uppercase().starts_with("NULL::") {
        return ParsedDefault::None;
    }
    if let Some(text) = quoted_literal(expression) {
        return ParsedDefault::Literal(typed_literal(text, column_type));
    }
    if let Some(value) = bare_literal(expression) {
        return ParsedDefault::Literal(value);
    }
    ParsedDefault::Expression(expression.to_string())
}

/// Body of `'text'` or `'text'::type`, with doubled quotes collapsed.
fn quoted_literal(expression: &str) -> Option<String> {
    let rest = expression.strip_prefix('\'')?;
    let mut text = String::new();
    let mut chars = rest.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != '\'' {
            text.push(ch);
            continue;
        }
        if chars.peek().map(|(_, next)| *next) == Some('\'') {
            chars.next();
            text.push('\'');
            continue;
        }

        let tail = &rest[idx + 1..];
        return match tail.strip_prefix("::") {
            None if tail.is_empty() => Some(text),
            Some(cast) if is_type_name(cast) => Some(text),
            _ => None,
        };
    }
    None
}

fn is_type_name(cast: &str) -> bool {
    !cast.is_empty()
        && cast
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | ' ' | '"' | '.' | '[' | ']' | '(' | ')' | ','))
}

/// Quoted literals of numeric and boolean columns carry their typed value.
fn typed_literal(text: String, column_type: &ColumnType) -> Value {
    let typed = match column_type {
        ColumnType::SmallInteger | ColumnType::Integer | ColumnType::BigInteger => {
            text.parse::<i64>().ok().map(Value::from)
        }
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal => exact_number(&text),
        ColumnType::Boolean => match text.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    typed.unwrap_or(Value::String(text))
}

fn bare_literal(expression: &str) -> Option<Value> {
    match expression {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    let number = expression
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(expression);
    if number.chars().any(|ch| ch.is_ascii_digit())
        && number.chars().all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | 'e' | 'E' | '+'))
    {
        return Some(exact_number(number).unwrap_or_else(|| Value::String(number.to_string())));
    }
    None
}

/// A JSON number only when it prints back as the same text. Wider or
/// differently spelled numerics (`1.50`, 30 digits) are kept as strings.
fn exact_number(text: &str) -> Option<Value> {
    if let Ok(integer) = text.parse::<i64>() {
        return Some(Value::from(integer));
    }
    let number = text.parse::<f64>().ok().and_then(Number::from_f64)?;
    (number.to_string() == text).then_some(Value::Number(number))
}

pub fn map_fk_action(code: Option<&str>) -> FkAction {
    match code {
        Some("r") => FkAction::Restrict,
        Some("c") => FkAction::Cascade,
        Some("n") => FkAction::SetNull,
        Some("d") => FkAction::SetDefault,
        _ => FkAction::NoAction,
    }
}

pub fn map_constraint(raw: RawConstraint) -> Option<ConstraintDefinition> {
    let kind = match raw.kind.as_str() {
        "p" => ConstraintKind::PrimaryKey {
            columns: raw.columns,
        },
        "u" => ConstraintKind::Unique {
            columns: raw.columns,
        },
        "c" => ConstraintKind::Check {
            expression: raw.expression?,
        },
        "x" => ConstraintKind::Exclusion {
            columns: raw.columns,
            definition: raw.definition?,
        },
        "f" => ConstraintKind::ForeignKey(ForeignKey {
            columns: raw.columns,
            referenced_table: raw.referenced_table?,
            referenced_columns: raw.referenced_columns,
            on_update: map_fk_action(raw.on_update_code.as_deref()),
            on_delete: map_fk_action(raw.on_delete_code.as_deref()),
        }),
        _ => return None,
    };
    Some(ConstraintDefinition::new(raw.name, kind))
}

/// Map an index. The server's definition is kept only when a plain column
/// list would not recreate the same index.
pub fn map_index(raw: RawIndex) -> IndexDefinition {
    let plain = format!(
        "{} ({})",
        raw.method,
        raw.columns
            .iter()
            .map(|column| printed_identifier(column))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let definition = raw.definition.filter(|definition| *definition != plain);
    if let Some(definition) = &definition {
        tracing::debug!(event = "index_verbatim", index = %raw.name, definition = %definition);
    }

    IndexDefinition {
        name: raw.name,
        columns: raw.columns,
        unique: raw.is_unique,
        kind: Some(raw.method),
        definition,
    }
}

/// Identifier as `pg_get_indexdef` prints it: bare when lowercase, quoted otherwise.
fn printed_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars
        .next()
        .is_some_and(|first| first.is_ascii_lowercase() || first == '_')
        && chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '$'));
    if bare {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

pub fn apply_table_options(table: &mut TableSchema, raw: RawTable, opts: &IntrospectOptions) {
    if opts.include_comments {
        if let Some(comment) = raw.comment {
            table.set_option("comment", Value::String(comment));
        }
    }
    if let Some(storage) = raw.storage.filter(|storage| !storage.is_empty()) {
        table.set_option(
            "storage",
            Value::Array(storage.into_iter().map(Value::String).collect()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw_column(name: &str, udt: &str, data_type: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            udt_name: udt.to_string(),
            is_nullable: true,
            default: None,
            identity: None,
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
            datetime_precision: None,
            collation: None,
            comment: None,
        }
    }

    #[test]
    fn serial_defaults_become_auto_increment() {
        assert_eq!(
            parse_default("nextval('users_id_seq'::regclass)", &ColumnType::Integer),
            ParsedDefault::AutoIncrement
        );
    }

    #[test]
    fn quoted_literals_are_unescaped() {
        assert_eq!(
            parse_default("'it''s'::character varying", &ColumnType::String),
            ParsedDefault::Literal(json!("it's"))
        );
        assert_eq!(
            parse_default("'{}'::jsonb", &ColumnType::Jsonb),
            ParsedDefault::Literal(json!("{}"))
        );
    }

    #[test]
    fn negative_numbers_are_typed_by_column() {
        assert_eq!(
            parse_default("'-1'::integer", &ColumnType::Integer),
            ParsedDefault::Literal(json!(-1))
        );
        assert_eq!(
            parse_default("0.5", &ColumnType::Decimal),
            ParsedDefault::Literal(json!(0.5))
        );
        assert_eq!(
            parse_default("'0.25'::real", &ColumnType::Float),
            ParsedDefault::Literal(json!(0.25))
        );
        assert_eq!(
            parse_default("42", &ColumnType::BigInteger),
            ParsedDefault::Literal(json!(42))
        );
        assert_eq!(
            parse_default("false", &ColumnType::Boolean),
            ParsedDefault::Literal(json!(false))
        );
    }

    #[test]
    fn nulls_and_expressions() {
        assert_eq!(
            parse_default("NULL::character varying", &ColumnType::String),
            ParsedDefault::None
        );
        assert_eq!(
            parse_default("now()", &ColumnType::Timestamp),
            ParsedDefault::Expression("now()".to_string())
        );
        assert_eq!(
            parse_default("'a'::text || 'b'::text", &ColumnType::Text),
            ParsedDefault::Expression("'a'::text || 'b'::text".to_string())
        );
        assert_eq!(
            parse_default("('now'::text)::date", &ColumnType::Date),
            ParsedDefault::Expression("('now'::text)::date".to_string())
        );
    }

    #[test]
    fn maps_bounds_by_type() {
        let opts = IntrospectOptions::default();

        let mut email = raw_column("email", "varchar", "character varying(120)");
        email.character_max_length = Some(120);
        email.is_nullable = false;
        let email = map_column(email, &opts);
        assert_eq!(email.column_type, ColumnType::String);
        assert_eq!(email.length, Some(120));
        assert!(!email.nullable);

        let mut price = raw_column("price", "numeric", "numeric(10,2)");
        price.numeric_precision = Some(10);
        price.numeric_scale = Some(2);
        let price = map_column(price, &opts);
        assert_eq!((price.precision, price.scale), (Some(10), Some(2)));

        let mut stamp = raw_column("created", "timestamptz", "timestamp with time zone");
        stamp.datetime_precision = Some(6);
        assert_eq!(map_column(stamp, &opts).precision, None);
    }

    #[test]
    fn unknown_types_keep_native_spelling() {
        let tags = map_column(raw_column("tags", "_text", "text[]"), &IntrospectOptions::default());
        assert_eq!(tags.column_type, ColumnType::Native("text[]".to_string()));
    }

    #[test]
    fn identity_columns_carry_generation_kind() {
        let mut id = raw_column("id", "int8", "bigint");
        id.identity = Some("always".to_string());
        id.is_nullable = false;
        let id = map_column(id, &IntrospectOptions::default());
        assert!(id.auto_increment);
        assert_eq!(id.extra_str("identity"), Some("always"));
    }

    #[test]
    fn comments_respect_options() {
        let mut raw = raw_column("note", "text", "text");
        raw.comment = Some("free text".to_string());

        let opts = IntrospectOptions {
            include_comments: false,
            ..IntrospectOptions::default()
        };
        assert!(map_column(raw.clone(), &opts).extra.is_empty());
        assert_eq!(
            map_column(raw, &IntrospectOptions::default()).extra_str("comment"),
            Some("free text")
        );
    }

    #[test]
    fn maps_foreign_key_actions() {
        let raw = RawConstraint {
            name: "orders_user_fk".to_string(),
            kind: "f".to_string(),
            columns: vec!["user_id".to_string()],
            expression: None,
            definition: None,
            referenced_table: Some("users".to_string()),
            referenced_columns: vec!["id".to_string()],
            on_update_code: Some("a".to_string()),
            on_delete_code: Some("c".to_string()),
        };
        let constraint = map_constraint(raw).unwrap();
        let fk = constraint.as_foreign_key().unwrap();
        assert_eq!(fk.referenced_table, "users");
        assert_eq!(fk.on_update, FkAction::NoAction);
        assert_eq!(fk.on_delete, FkAction::Cascade);
    }

    #[test]
    fn wide_numerics_stay_exact_as_text() {
        assert_eq!(
            parse_default("12345678901234567890.123456789", &ColumnType::Decimal),
            ParsedDefault::Literal(json!("12345678901234567890.123456789"))
        );
        assert_eq!(
            parse_default("'0.12345678901234567890123'::numeric", &ColumnType::Decimal),
            ParsedDefault::Literal(json!("0.12345678901234567890123"))
        );
        assert_eq!(
            parse_default("1.50", &ColumnType::Decimal),
            ParsedDefault::Literal(json!("1.50"))
        );
        assert_eq!(
            parse_default("(-99999999999999999999)", &ColumnType::Decimal),
            ParsedDefault::Literal(json!("-99999999999999999999"))
        );
    }

    fn raw_index(name: &str, columns: &[&str], definition: &str) -> RawIndex {
        RawIndex {
            name: name.to_string(),
            is_unique: false,
            method: "btree".to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            definition: Some(definition.to_string()),
        }
    }

    #[test]
    fn plain_indexes_drop_the_server_definition() {
        let index = map_index(raw_index(
            "users_created_idx",
            &["created_at", "id"],
            "btree (created_at, id)",
        ));
        assert_eq!(index.columns, vec!["created_at", "id"]);
        assert_eq!(index.kind.as_deref(), Some("btree"));
        assert_eq!(index.definition, None);

        let quoted = map_index(raw_index(
            "users_mixed_idx",
            &["createdAt"],
            "btree (\"createdAt\")",
        ));
        assert_eq!(quoted.definition, None);
    }

    #[test]
    fn expression_and_partial_indexes_keep_their_definition() {
        let expression = map_index(raw_index(
            "users_lower_email_idx",
            &[],
            "btree (lower((email)::text))",
        ));
        assert_eq!(expression.definition.as_deref(), Some("btree (lower((email)::text))"));
        assert!(expression.columns.is_empty());

        let partial = map_index(raw_index(
            "users_active_idx",
            &["email"],
            "btree (email) WHERE active",
        ));
        assert_eq!(partial.columns, vec!["email"]);
        assert_eq!(partial.definition.as_deref(), Some("btree (email) WHERE active"));
    }

    #[test]
    fn exclusion_constraints_keep_their_clause() {
        let raw = RawConstraint {
            name: "bookings_no_overlap".to_string(),
            kind: "x".to_string(),
            columns: vec!["during".to_string()],
            expression: None,
            definition: Some("EXCLUDE USING gist (during WITH &&)".to_string()),
            referenced_table: None,
            referenced_columns: Vec::new(),
            on_update_code: None,
            on_delete_code: None,
        };
        let constraint = map_constraint(raw).unwrap();
        assert_eq!(constraint.kind.type_name(), "exclude");
        assert_eq!(
            constraint.kind,
            ConstraintKind::Exclusion {
                columns: vec!["during".to_string()],
                definition: "EXCLUDE USING gist (during WITH &&)".to_string(),
            }
        );
    }
}
