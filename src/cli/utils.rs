use std::io::Read;

use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Print records. Text mode lists one line per row, JSON mode the raw value.
pub fn output_records(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => match value {
            Value::Array(rows) if rows.is_empty() => println!("No records"),
            Value::Array(rows) => {
                for row in rows {
                    println!("{}", summarize(row));
                }
            }
            Value::Null => println!("Not found"),
            row => println!("{}", serde_json::to_string_pretty(row)?),
        },
    }
    Ok(())
}

fn summarize(row: &Value) -> String {
    let id = row.get("id").map(Value::to_string).unwrap_or_else(|| "-".to_string());
    let label = ["name", "title", "email"]
        .iter()
        .find_map(|key| row.get(*key).and_then(Value::as_str))
        .unwrap_or("");
    format!("{:>6}  {}", id, label)
}

/// Parse JSON from the argument, or from stdin when it is absent.
pub fn read_json_input(arg: Option<String>) -> anyhow::Result<Value> {
    let raw = match arg {
        Some(raw) => raw,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("Invalid JSON input: {}", e))
}
