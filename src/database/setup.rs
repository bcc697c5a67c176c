//! Explicit, reviewable schema setup: the five tables plus the column
//! migrations added since. Every statement is idempotent.

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;
use super::table::Table;

/// A column added after the initial table layout.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub table: Table,
    pub column: &'static str,
    pub sql_type: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration { table: Table::Clients, column: "source", sql_type: "TEXT" },
    Migration { table: Table::Tasks, column: "ownerId", sql_type: "INTEGER" },
];

impl Migration {
    pub fn ddl(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
            self.table.as_str(),
            self.column,
            self.sql_type
        )
    }
}

pub fn create_table_ddl(table: Table) -> &'static str {
    match table {
        Table::Users => {
            "CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                role TEXT DEFAULT 'employee',
                avatar TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        }
        Table::Clients => {
            "CREATE TABLE IF NOT EXISTS clients (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                contact TEXT,
                email TEXT,
                phone TEXT,
                status TEXT DEFAULT 'Lead',
                category TEXT,
                lastInteraction DATE,
                instagram TEXT,
                ownerId INTEGER,
                role TEXT,
                relationship TEXT,
                businessType TEXT,
                hasTraffic TEXT,
                website TEXT,
                prospectingDay TEXT,
                notes TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        }
        Table::Tasks => {
            "CREATE TABLE IF NOT EXISTS tasks (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                assigneeId INTEGER,
                status TEXT DEFAULT 'Pendente',
                priority TEXT DEFAULT 'Media',
                dueDate DATE,
                description TEXT,
                type TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        }
        Table::Meetings => {
            "CREATE TABLE IF NOT EXISTS meetings (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                clientId INTEGER,
                date DATE,
                time TIME,
                duration TEXT,
                type TEXT,
                notes TEXT,
                status TEXT DEFAULT 'Agendada',
                ownerId INTEGER,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        }
        Table::Files => {
            "CREATE TABLE IF NOT EXISTS files (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT,
                size TEXT,
                date DATE,
                ownerId INTEGER,
                recipientId INTEGER,
                category TEXT,
                notes TEXT,
                storageKey TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupReport {
    pub tables: Vec<String>,
    pub migrations: Vec<String>,
}

/// Create any missing table, then apply every migration.
pub async fn run(pool: &PgPool) -> Result<SetupReport, DatabaseError> {
    let mut report = SetupReport::default();

    for table in Table::ALL {
        sqlx::query(create_table_ddl(table))
            .execute(pool)
            .await
            .map_err(DatabaseError::classify)?;
        info!("Table '{}' verified", table);
        report.tables.push(table.to_string());
    }

    for migration in MIGRATIONS {
        let ddl = migration.ddl();
        sqlx::query(&ddl)
            .execute(pool)
            .await
            .map_err(DatabaseError::classify)?;
        info!("Applied: {}", ddl);
        report.migrations.push(ddl);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_has_idempotent_ddl() {
        for table in Table::ALL {
            let ddl = create_table_ddl(table);
            assert!(ddl.starts_with(&format!("CREATE TABLE IF NOT EXISTS {} (", table)));
            assert!(ddl.contains("id SERIAL PRIMARY KEY"));
            assert!(ddl.contains("created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP"));
        }
    }

    #[test]
    fn layout_plus_migrations_covers_known_fields() {
        for table in Table::ALL {
            let ddl = create_table_ddl(table).to_ascii_lowercase();
            for field in table.fields() {
                let needle = format!("\n                {} ", field.to_ascii_lowercase());
                let migrated = MIGRATIONS
                    .iter()
                    .any(|m| m.table == table && m.column.eq_ignore_ascii_case(field));
                assert!(ddl.contains(&needle) || migrated, "{table}.{field} never created");
            }
        }
    }

    #[test]
    fn migrations_are_rerunnable() {
        assert_eq!(
            MIGRATIONS[1].ddl(),
            "ALTER TABLE tasks ADD COLUMN IF NOT EXISTS ownerId INTEGER"
        );
        assert!(MIGRATIONS.iter().all(|m| m.ddl().contains("IF NOT EXISTS")));
    }
}
