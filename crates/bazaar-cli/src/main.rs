use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bazaar_core::TokenIssuer;
use bazaar_core::models::{Collection, Document, Filter, Role};
use bazaar_core::traits::DocumentStore;
use bazaar_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "bazaar", version, about = "Bazaar marketplace operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Print a signed access token for a user
    Token {
        /// Email the token is issued for
        #[arg(short, long)]
        email: String,

        /// Signing secret shared with the server
        #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
        secret: String,

        /// Token lifetime in seconds
        #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 86_400)]
        ttl_secs: i64,
    },

    /// Set the role stored on a user, creating the user if needed
    SetRole {
        /// User email
        #[arg(short, long)]
        email: String,

        /// One of: admin, seller, buyer
        #[arg(short, long)]
        role: String,
    },

    /// Show document counts per collection
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bazaar=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            connect_db().await?;
            tracing::info!("Migrations applied");
        }
        Commands::Token {
            email,
            secret,
            ttl_secs,
        } => cmd_token(&email, &secret, ttl_secs)?,
        Commands::SetRole { email, role } => {
            let db = connect_db().await?;
            cmd_set_role(&db, &email, &role).await?;
        }
        Commands::Stats => {
            let db = connect_db().await?;
            cmd_stats(&db).await?;
        }
    }

    Ok(())
}

/// Connect using `DATABASE_*` settings and bring the schema up to date.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().context("DATABASE_URL not set")?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.map_err(|e| anyhow::anyhow!(e))?;

    Ok(db)
}

fn cmd_token(email: &str, secret: &str, ttl_secs: i64) -> Result<()> {
    anyhow::ensure!(!secret.is_empty(), "ACCESS_TOKEN_SECRET must not be empty");
    anyhow::ensure!(ttl_secs > 0, "--ttl-secs must be positive");

    let issuer = TokenIssuer::new(secret).with_ttl(TimeDelta::seconds(ttl_secs));
    let token = issuer.issue(email).map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(%email, ttl_secs, "Token issued");
    println!("{token}");

    Ok(())
}

async fn cmd_set_role(db: &Database, email: &str, role: &str) -> Result<()> {
    let role: Role = role.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let result = db
        .documents()
        .update_one(
            Collection::Users,
            &Filter::all().eq("email", email),
            Document::new().with("role", role.as_str()),
            true,
        )
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if result.upserted_id.is_some() {
        tracing::info!(%email, %role, "User created");
    } else if result.modified_count == 0 {
        tracing::info!(%email, %role, "Role unchanged");
    } else {
        tracing::info!(%email, %role, "Role updated");
    }

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

async fn cmd_stats(db: &Database) -> Result<()> {
    let repo = db.documents();

    println!("Documents per collection:\n");
    let mut total = 0;
    for collection in Collection::ALL {
        let count = repo
            .count(collection)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        total += count;
        println!("  {:<12} {count}", collection.as_str());
    }
    println!("\nTotal: {total}");

    Ok(())
}
