//! Self-healing schema: add a column the database says is missing, then let
//! the caller retry its write once.

use sqlx::PgPool;
use tracing::warn;

use super::manager::DatabaseError;
use super::record::Record;
use super::table::{Column, Table};

/// SQLSTATE `undefined_column`.
const UNDEFINED_COLUMN: &str = "42703";

/// Name of the missing column, when `err` is an undefined-column failure.
pub fn missing_column(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if db_err.code().as_deref() != Some(UNDEFINED_COLUMN) {
        return None;
    }
    parse_missing_column(db_err.message())
}

/// Pull the column out of PostgreSQL's wording. Seen forms:
/// `column "x" of relation "t" does not exist`, `column "x" does not exist`
/// and `column r.x does not exist`.
pub fn parse_missing_column(message: &str) -> Option<String> {
    let rest = message.strip_prefix("column ")?;
    let end = rest.find(" of relation ").or_else(|| rest.find(" does not exist"))?;
    let name = rest[..end].trim().trim_matches('"');
    let name = name.rsplit('.').next().unwrap_or(name).trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn add_column_ddl(table: Table, column: &Column) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
        table.as_str(),
        column.sql(),
        column.inferred_type()
    )
}

/// If `err` names a column from `record` that `table` lacks, add it.
/// Returns whether the schema changed, i.e. whether a retry can succeed.
pub async fn repair(
    pool: &PgPool,
    table: Table,
    record: &Record,
    err: &sqlx::Error,
) -> Result<bool, DatabaseError> {
    let Some(db_name) = missing_column(err) else {
        return Ok(false);
    };
    let Some(column) = record.column_matching(&db_name) else {
        return Ok(false);
    };

    let ddl = add_column_ddl(table, column);
    warn!(table = %table, column = %column, "adding missing column: {}", ddl);
    sqlx::query(&ddl)
        .execute(pool)
        .await
        .map_err(DatabaseError::classify)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_target_message() {
        assert_eq!(
            parse_missing_column(r#"column "leadscore" of relation "clients" does not exist"#),
            Some("leadscore".to_string())
        );
    }

    #[test]
    fn parses_plain_and_qualified_messages() {
        assert_eq!(
            parse_missing_column(r#"column "leadscore" does not exist"#),
            Some("leadscore".to_string())
        );
        assert_eq!(
            parse_missing_column("column r.leadscore does not exist"),
            Some("leadscore".to_string())
        );
    }

    #[test]
    fn ignores_other_messages() {
        assert_eq!(parse_missing_column(r#"relation "clientes" does not exist"#), None);
        assert_eq!(parse_missing_column("column \"\" does not exist"), None);
    }

    #[test]
    fn ddl_uses_heuristic_type() {
        let score = Column::parse("leadScore").unwrap();
        assert_eq!(
            add_column_ddl(Table::Clients, &score),
            "ALTER TABLE clients ADD COLUMN IF NOT EXISTS leadscore TEXT"
        );
        let partner = Column::parse("partnerId").unwrap();
        assert_eq!(
            add_column_ddl(Table::Tasks, &partner),
            "ALTER TABLE tasks ADD COLUMN IF NOT EXISTS partnerid INTEGER"
        );
    }
}
