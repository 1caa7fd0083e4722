//! Lost & Found operator CLI.
//!
//! Reads the same environment as the API (`DATABASE_URL`, `JWT_SECRET`,
//! `STAFF_EMAIL_DOMAIN`, ...).

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use validator::Validate;

use lostfound_api::auth::JwtService;
use lostfound_cli::{format_client_table, generate_secret, init_tracing};
use lostfound_core::models::{RegisterClientRequest, SessionContext};
use lostfound_core::{Config, ServiceConfig};
use lostfound_db::{run_migrations, ClientRepository};

#[derive(Parser)]
#[command(name = "lostfound", about = "Lost & Found operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Client directory
    Clients {
        #[command(subcommand)]
        sub: ClientCommands,
    },
    /// Issue a session token
    Token {
        #[command(subcommand)]
        sub: TokenCommands,
    },
    /// Print a random value for JWT_SECRET
    GenSecret,
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Register a client or update their contact details
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// List registered clients
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Token for a hotel employee
    Staff {
        /// Must belong to STAFF_EMAIL_DOMAIN when that is set
        #[arg(long)]
        email: String,
        /// Employee identifier; defaults to the email
        #[arg(long)]
        subject: Option<String>,
    },
    /// Token for a registered client
    Client {
        #[arg(long)]
        id: String,
    },
}

async fn connect(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await
        .context("Failed to connect to the database")
}

/// Loads the configuration without the API's startup checks, which the
/// commands that never touch JWT or SMTP do not need.
fn load_config() -> Result<Config> {
    Ok(ServiceConfig::from_env_unchecked()?.into())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::GenSecret => {
            println!("{}", generate_secret());
        }
        Commands::Migrate => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            run_migrations(&pool).await?;
            println!("Migrations applied");
        }
        Commands::Clients { sub } => {
            let config = load_config()?;
            let repo = ClientRepository::new(connect(&config).await?);
            match sub {
                ClientCommands::Add { id, name, email } => {
                    let request = RegisterClientRequest { id, name, email };
                    request.validate().context("Invalid client")?;
                    let client = repo
                        .upsert_client(&request.id, &request.name, &request.email)
                        .await?;
                    println!("{}", serde_json::to_string_pretty(&client)?);
                }
                ClientCommands::List { json } => {
                    let clients = repo.list_clients().await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&clients)?);
                    } else {
                        print!("{}", format_client_table(&clients));
                    }
                }
            }
        }
        Commands::Token { sub } => {
            let config = load_config()?;
            if config.jwt_secret().len() < 32 {
                return Err(anyhow!("JWT_SECRET must be at least 32 characters long"));
            }
            let jwt = JwtService::from_config(&config);

            let session = match sub {
                TokenCommands::Staff { email, subject } => {
                    SessionContext::staff(subject.unwrap_or_else(|| email.clone()), email)
                }
                TokenCommands::Client { id } => {
                    let repo = ClientRepository::new(connect(&config).await?);
                    let client = repo
                        .get_client(&id)
                        .await?
                        .ok_or_else(|| anyhow!("Client {} is not registered", id))?;
                    SessionContext::client(client.id, client.email)
                }
            };

            let token = jwt.issue(&session)?;
            tracing::info!(role = %session.role, subject = %session.subject, "Token issued");
            println!("{}", token);
        }
    }

    Ok(())
}
