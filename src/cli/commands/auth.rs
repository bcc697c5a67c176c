use clap::Subcommand;
use serde_json::json;

use crate::cli::config::session_file;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::client::CrmClient;
use crate::config;
use crate::session::{AuthService, FileSessionStore, TokenSigner};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with email and password")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password")]
        password: String,
    },

    #[command(about = "Register a new user and log in")]
    Register {
        #[arg(help = "Display name")]
        name: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password")]
        password: String,
    },

    #[command(about = "Forget the current session")]
    Logout,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Re-issue the session token with a new expiry")]
    Refresh,
}

pub async fn handle(cmd: AuthCommands, gateway_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = CrmClient::new(gateway_url)?;
    let signer = TokenSigner::from_config(&config::config().security)?;
    let auth = AuthService::new(client, FileSessionStore::new(session_file()?), signer);

    match cmd {
        AuthCommands::Login { email, password } => {
            let session = auth.login(&email, &password).await?;
            output_success(
                &output_format,
                &format!("Logged in as {}", email),
                Some(json!({ "user": session.user, "expires_at": session.expires_at })),
            )
        }
        AuthCommands::Register { name, email, password } => {
            let session = auth.register(&name, &email, &password).await?;
            output_success(
                &output_format,
                &format!("Registered {}", email),
                Some(json!({ "user": session.user, "expires_at": session.expires_at })),
            )
        }
        AuthCommands::Logout => {
            auth.logout().await?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => match auth.current().await? {
            Some(session) => {
                let email = session.user.get("email").and_then(|v| v.as_str()).unwrap_or("unknown");
                output_success(
                    &output_format,
                    &format!("Logged in as {} until {}", email, session.expires_at),
                    Some(json!({ "user": session.user, "expires_at": session.expires_at })),
                )
            }
            None => output_error(&output_format, "Not logged in", Some("NO_SESSION")),
        },
        AuthCommands::Refresh => {
            let session = auth.refresh().await?;
            output_success(
                &output_format,
                &format!("Session extended until {}", session.expires_at),
                Some(json!({ "expires_at": session.expires_at })),
            )
        }
    }
}
