use sqlx::PgConnection;

use schemalock_core::{Error, Result};

fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

pub async fn list_tables(conn: &mut PgConnection, schema: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select c.relname::text
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relkind in ('r', 'p')
          and not c.relispartition
        order by c.relname
        "#,
    )
    .bind(schema)
    .fetch_all(conn)
    .await
    .map_err(db_error)
}

#[derive(Debug, sqlx::FromRow)]
pub struct RawTable {
    pub comment: Option<String>,
    pub storage: Option<Vec<String>>,
}

pub async fn fetch_table(
    conn: &mut PgConnection,
    schema: &str,
    table: &str,
) -> Result<Option<RawTable>> {
    sqlx::query_as::<_, RawTable>(
        r#"
        select
          pg_catalog.obj_description(c.oid, 'pg_class')::text as comment,
          c.reloptions::text[] as storage
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and c.relkind in ('r', 'p')
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_optional(conn)
    .await
    .map_err(db_error)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
    pub udt_name: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub identity: Option<String>,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub datetime_precision: Option<i32>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

pub async fn list_columns(
    conn: &mut PgConnection,
    schema: &str,
    table: &str,
) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type,
          t.typname::text as udt_name,
          (not a.attnotnull) as is_nullable,
          case when a.attgenerated = '' then pg_get_expr(ad.adbin, ad.adrelid) end as "default",
          case a.attidentity
            when 'a' then 'always'
            when 'd' then 'by_default'
          end as identity,
          ic.character_maximum_length::int4 as character_max_length,
          ic.numeric_precision::int4 as numeric_precision,
          ic.numeric_scale::int4 as numeric_scale,
          ic.datetime_precision::int4 as datetime_precision,
          ic.collation_name::text as collation,
          pg_catalog.col_description(a.attrelid, a.attnum)::text as comment
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        join pg_type t on t.oid = a.atttypid
        left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
        left join information_schema.columns ic
          on ic.table_schema = n.nspname and ic.table_name = c.relname and ic.column_name = a.attname
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(conn)
    .await
    .map_err(db_error)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawConstraint {
    pub name: String,
    /// One of `p`, `u`, `c`, `x`, `f`.
    pub kind: String,
    pub columns: Vec<String>,
    pub expression: Option<String>,
    pub definition: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_columns: Vec<String>,
    pub on_update_code: Option<String>,
    pub on_delete_code: Option<String>,
}

pub async fn list_constraints(
    conn: &mut PgConnection,
    schema: &str,
    table: &str,
) -> Result<Vec<RawConstraint>> {
    sqlx::query_as::<_, RawConstraint>(
        r#"
        select
          con.conname::text as name,
          con.contype::text as kind,
          array(
            select att.attname::text
            from unnest(con.conkey) with ordinality as k(attnum, ord)
            join pg_attribute att on att.attrelid = con.conrelid and att.attnum = k.attnum
            order by k.ord
          ) as columns,
          case when con.contype = 'c' then pg_get_expr(con.conbin, con.conrelid) end as expression,
          case when con.contype = 'x' then pg_get_constraintdef(con.oid) end as definition,
          ref.relname::text as referenced_table,
          array(
            select att.attname::text
            from unnest(con.confkey) with ordinality as k(attnum, ord)
            join pg_attribute att on att.attrelid = con.confrelid and att.attnum = k.attnum
            order by k.ord
          ) as referenced_columns,
          case when con.contype = 'f' then con.confupdtype::text end as on_update_code,
          case when con.contype = 'f' then con.confdeltype::text end as on_delete_code
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        left join pg_class ref on ref.oid = con.confrelid
        where nsp.nspname = $1
          and rel.relname = $2
          and con.contype in ('p', 'u', 'c', 'x', 'f')
          and con.conparentid = 0
        order by
          case con.contype when 'p' then 0 when 'u' then 1 when 'c' then 2 when 'x' then 3 else 4 end,
          con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(conn)
    .await
    .map_err(db_error)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawIndex {
    pub name: String,
    pub is_unique: bool,
    pub method: String,
    pub columns: Vec<String>,
    /// `pg_get_indexdef` text after `USING`.
    pub definition: Option<String>,
}

/// Indexes of a table that are not backing a primary key, unique or
/// exclusion constraint. Expression keys are absent from `columns`.
pub async fn list_indexes(
    conn: &mut PgConnection,
    schema: &str,
    table: &str,
) -> Result<Vec<RawIndex>> {
    sqlx::query_as::<_, RawIndex>(
        r#"
        select
          idx.relname::text as name,
          i.indisunique as is_unique,
          am.amname::text as method,
          array(
            select att.attname::text
            from unnest(i.indkey::int2[]) with ordinality as k(attnum, ord)
            join pg_attribute att on att.attrelid = i.indrelid and att.attnum = k.attnum
            where k.ord <= i.indnkeyatts
            order by k.ord
          ) as columns,
          substring(pg_get_indexdef(i.indexrelid) from ' USING (.*)$') as definition
        from pg_index i
        join pg_class tbl on tbl.oid = i.indrelid
        join pg_namespace nsp on nsp.oid = tbl.relnamespace
        join pg_class idx on idx.oid = i.indexrelid
        join pg_am am on am.oid = idx.relam
        where nsp.nspname = $1
          and tbl.relname = $2
          and not exists (
            select 1
            from pg_constraint con
            where con.conindid = i.indexrelid
              and con.conrelid = i.indrelid
              and con.contype in ('p', 'u', 'x')
          )
        order by idx.relname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(conn)
    .await
    .map_err(db_error)
}
