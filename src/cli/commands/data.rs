use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_records, output_success, read_json_input};
use crate::cli::OutputFormat;
use crate::client::CrmClient;
use crate::database::Table;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List records, newest first")]
    List {
        #[arg(help = "Table name (users, clients, tasks, meetings, files)")]
        table: Table,
        #[arg(long = "where", value_name = "FIELD=VALUE", help = "Equality filter, repeatable")]
        filters: Vec<String>,
    },

    #[command(about = "Get one record by id")]
    Get {
        #[arg(help = "Table name")]
        table: Table,
        #[arg(help = "Record ID")]
        id: i64,
    },

    #[command(about = "Create a record from a JSON argument or stdin")]
    Create {
        #[arg(help = "Table name")]
        table: Table,
        #[arg(help = "Record JSON (read from stdin when omitted)")]
        data: Option<String>,
    },

    #[command(about = "Update a record from a JSON argument or stdin")]
    Update {
        #[arg(help = "Table name")]
        table: Table,
        #[arg(help = "Record ID to update")]
        id: i64,
        #[arg(help = "Changed fields as JSON (read from stdin when omitted)")]
        data: Option<String>,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(help = "Table name")]
        table: Table,
        #[arg(help = "Record ID to delete")]
        id: i64,
    },
}

fn parse_filters(filters: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    filters
        .iter()
        .map(|f| {
            f.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow::anyhow!("Filter must look like field=value: {}", f))
        })
        .collect()
}

pub async fn handle(cmd: DataCommands, gateway_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = CrmClient::new(gateway_url)?;

    match cmd {
        DataCommands::List { table, filters } => {
            let filters = parse_filters(&filters)?;
            let pairs: Vec<(&str, &str)> = filters.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let rows = client.get_where(table, &pairs).await;
            output_records(&output_format, &Value::Array(rows))
        }
        DataCommands::Get { table, id } => {
            let row = client.get_by_id(table, id).await.unwrap_or(Value::Null);
            output_records(&output_format, &row)
        }
        DataCommands::Create { table, data } => {
            let item = read_json_input(data)?;
            let row = client.add(table, &item).await?;
            let id = row.get("id").cloned().unwrap_or(Value::Null);
            output_success(&output_format, &format!("Created {} {}", table, id), Some(row))
        }
        DataCommands::Update { table, id, data } => {
            let updates = read_json_input(data)?;
            match client.update(table, id, &updates).await {
                Some(row) => output_success(&output_format, &format!("Updated {} {}", table, id), Some(row)),
                None => {
                    output_error(&output_format, &format!("Could not update {} {}", table, id), None)?;
                    Err(anyhow::anyhow!("Update failed"))
                }
            }
        }
        DataCommands::Delete { table, id } => {
            if client.delete(table, id).await {
                output_success(
                    &output_format,
                    &format!("Deleted {} {}", table, id),
                    Some(json!({ "id": id })),
                )
            } else {
                output_error(&output_format, &format!("Could not delete {} {}", table, id), None)?;
                Err(anyhow::anyhow!("Delete failed"))
            }
        }
    }
}
