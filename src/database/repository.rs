use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::config::SchemaPolicy;
use crate::filter::Filter;

use super::manager::DatabaseError;
use super::record::{Record, RecordError};
use super::repair;
use super::table::Table;

/// Errors from a write: the body can be refused before or by the database.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for WriteError {
    fn from(err: sqlx::Error) -> Self {
        WriteError::Database(DatabaseError::classify(err))
    }
}

/// CRUD over one allowlisted table, rows as JSON objects.
pub struct Repository {
    table: Table,
    pool: PgPool,
    policy: SchemaPolicy,
}

impl Repository {
    pub fn new(table: Table, pool: PgPool, policy: SchemaPolicy) -> Self {
        Self { table, pool, policy }
    }

    pub async fn select_any(&self, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        let sql_result = filter.to_sql();
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = q.bind(p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(DatabaseError::classify)?;
        rows.iter().map(row_value).collect()
    }

    pub async fn select_one(&self, id: i64) -> Result<Option<Value>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM {} t WHERE t.id = $1",
            self.table.as_str()
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::classify)?;
        row.as_ref().map(row_value).transpose()
    }

    pub async fn insert(&self, record: &Record) -> Result<Value, WriteError> {
        self.check_policy(record)?;
        let err = match self.insert_once(record).await {
            Ok(row) => return Ok(row),
            Err(err) => err,
        };
        if self.heal(record, &err).await? {
            Ok(self.insert_once(record).await?)
        } else {
            Err(err.into())
        }
    }

    /// Replace the given fields only; `None` when no row has `id`.
    pub async fn update(&self, id: i64, record: &Record) -> Result<Option<Value>, WriteError> {
        self.check_policy(record)?;
        let err = match self.update_once(id, record).await {
            Ok(row) => return Ok(row),
            Err(err) => err,
        };
        if self.heal(record, &err).await? {
            Ok(self.update_once(id, record).await?)
        } else {
            Err(err.into())
        }
    }

    /// Hard delete. Reports how many rows went, which may be zero.
    pub async fn delete(&self, id: i64) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table.as_str());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::classify)?;
        Ok(result.rows_affected())
    }

    fn check_policy(&self, record: &Record) -> Result<(), RecordError> {
        match self.policy {
            SchemaPolicy::Strict => record.ensure_known(self.table),
            SchemaPolicy::SelfHeal => Ok(()),
        }
    }

    async fn heal(&self, record: &Record, err: &sqlx::Error) -> Result<bool, DatabaseError> {
        if self.policy != SchemaPolicy::SelfHeal {
            return Ok(false);
        }
        repair::repair(&self.pool, self.table, record, err).await
    }

    async fn insert_once(&self, record: &Record) -> Result<Value, sqlx::Error> {
        let sql = insert_sql(self.table, record);
        let row = sqlx::query(&sql)
            .bind(record.to_payload())
            .fetch_one(&self.pool)
            .await?;
        row.try_get::<Value, _>("row")
    }

    async fn update_once(&self, id: i64, record: &Record) -> Result<Option<Value>, sqlx::Error> {
        let sql = update_sql(self.table, record);
        let row = sqlx::query(&sql)
            .bind(record.to_payload())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get::<Value, _>("row")).transpose()
    }
}

fn row_value(row: &sqlx::postgres::PgRow) -> Result<Value, DatabaseError> {
    row.try_get::<Value, _>("row").map_err(DatabaseError::Sqlx)
}

/// `jsonb_populate_record` lets PostgreSQL coerce each JSON value to the
/// column's own type, so a number bound for a TEXT column lands as text.
fn insert_sql(table: Table, record: &Record) -> String {
    let columns: Vec<String> = record.columns().map(|c| c.sql()).collect();
    let selected: Vec<String> = columns.iter().map(|c| format!("r.{}", c)).collect();
    format!(
        "WITH inserted AS (INSERT INTO {table} ({cols}) SELECT {sel} FROM jsonb_populate_record(NULL::{table}, $1) r RETURNING *) \
         SELECT row_to_json(inserted) AS row FROM inserted",
        table = table.as_str(),
        cols = columns.join(", "),
        sel = selected.join(", "),
    )
}

fn update_sql(table: Table, record: &Record) -> String {
    let assignments: Vec<String> = record
        .columns()
        .map(|c| format!("{col} = r.{col}", col = c.sql()))
        .collect();
    format!(
        "WITH updated AS (UPDATE {table} t SET {set} FROM jsonb_populate_record(NULL::{table}, $1) r WHERE t.id = $2 RETURNING t.*) \
         SELECT row_to_json(updated) AS row FROM updated",
        table = table.as_str(),
        set = assignments.join(", "),
    )
}
