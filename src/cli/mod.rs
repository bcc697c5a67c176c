pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "crm")]
#[command(about = "CRM CLI - records, sessions and schema setup for the CRM gateway")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Gateway URL (defaults to CRM_GATEWAY_URL or the saved config)")]
    pub gateway: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create tables and apply pending column migrations")]
    Setup,

    #[command(about = "Record operations through the gateway")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },

    #[command(about = "Login, registration and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let gateway_url = config::resolve_gateway_url(cli.gateway)?;

    match cli.command {
        Commands::Setup => commands::setup::handle(output_format).await,
        Commands::Data { cmd } => commands::data::handle(cmd, &gateway_url, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, &gateway_url, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_the_default_output() {
        let cli = Cli::try_parse_from(["crm", "auth", "logout"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Text);
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["crm", "data", "get", "clients", "7", "--json"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        assert!(Cli::try_parse_from(["crm", "--text", "auth", "logout"]).is_err());
    }

    #[test]
    fn table_names_are_validated_by_the_parser() {
        assert!(Cli::try_parse_from(["crm", "data", "list", "invoices"]).is_err());
        let cli = Cli::try_parse_from(["crm", "data", "list", "clients", "--where", "status=Lead"]).unwrap();
        assert!(matches!(cli.command, Commands::Data { .. }));
    }
}
