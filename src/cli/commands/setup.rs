use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::{setup, DatabaseManager};

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let db = DatabaseManager::new(config::config().database.clone());
    let pool = db.pool().await?;
    let report = setup::run(&pool).await?;
    db.close().await;

    if let OutputFormat::Text = output_format {
        for table in &report.tables {
            println!("  table     {}", table);
        }
        for migration in &report.migrations {
            println!("  migration {}", migration);
        }
    }
    output_success(
        &output_format,
        "Database setup complete",
        Some(json!(report)),
    )
}
