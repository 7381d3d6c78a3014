//! # Recetario
//!
//! Personal recipe book with scheduled email reminders.
//!
//! Usage:
//!   recetario                               # Start the HTTP server
//!   recetario serve --port 8080             # Custom port
//!   recetario remind --frequency semanal    # Send one bulk round from a system crontab
//!   recetario search "tomate, queso"        # Find recipes by ingredients
//!   recetario --json-logs                   # Structured logs for a log collector

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use recetario_channels::ReminderMailer;
use recetario_core::config::RecetarioConfig;
use recetario_core::search::search_by_ingredients;
use recetario_core::traits::RecipeStore;
use recetario_gateway::{AppState, RecetarioDb};
use recetario_scheduler::{SequentialRunner, dispatch_reminders};

#[derive(Parser)]
#[command(
    name = "recetario",
    version,
    about = "🍳 Recetario: recipe book with email reminders"
)]
struct Cli {
    /// Config file (defaults to $RECETARIO_CONFIG or ~/.recetario/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send the reminder for one cadence to every matching subscriber
    Remind {
        /// Cadence label, e.g. "semanal" (defaults to reminders.default_frequency)
        #[arg(short, long)]
        frequency: Option<String>,
    },
    /// List recipes containing every comma-separated ingredient
    Search { query: String },
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

fn load_config(path: Option<&Path>) -> Result<RecetarioConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("RECETARIO_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(RecetarioConfig::default_path);

    let mut config = if path.exists() {
        tracing::debug!("Loading config from {}", path.display());
        RecetarioConfig::load_from(&path)?
    } else {
        tracing::debug!("No config at {}; using defaults", path.display());
        RecetarioConfig::default()
    };
    config.apply_env();
    Ok(config)
}

fn open_db(config: &RecetarioConfig) -> Result<Arc<RecetarioDb>> {
    let db_path = expand_path(&config.database.path);
    if let Some(parent) = Path::new(&db_path).parent().filter(|_| db_path != ":memory:") {
        std::fs::create_dir_all(parent)?;
    }
    let db = RecetarioDb::open(Path::new(&db_path))?;
    tracing::info!("💾 Database: {db_path}");
    Ok(Arc::new(db))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "recetario=debug,recetario_gateway=debug,recetario_scheduler=debug,recetario_channels=debug,tower_http=debug"
    } else {
        "recetario=info,recetario_gateway=info,recetario_scheduler=info,recetario_channels=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let logs = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);
    if cli.json_logs {
        logs.json().init();
    } else {
        logs.init();
    }

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }

            let db = open_db(&config)?;
            let mailer = ReminderMailer::from_config(&config.email, &config.reminders);

            println!("🍳 Recetario v{}", env!("CARGO_PKG_VERSION"));
            println!("   Environment: {}", config.environment);
            println!("   Listening:   http://{}:{}", config.gateway.host, config.gateway.port);

            recetario_gateway::serve(AppState::new(config, db, mailer)).await?;
        }
        Command::Remind { frequency } => {
            let label = frequency.unwrap_or_else(|| config.reminders.default_frequency.clone());
            let db = open_db(&config)?;
            let mailer = ReminderMailer::from_config(&config.email, &config.reminders);
            let runner = SequentialRunner::from_millis(config.reminders.send_delay_ms);

            let summary = dispatch_reminders(&*db, &mailer, &runner, &label).await?;
            println!(
                "📬 '{label}': sent {} of {} ({} errors)",
                summary.sent, summary.total, summary.errors
            );
        }
        Command::Search { query } => {
            let db = open_db(&config)?;
            let all = db.list_recipes()?;
            let found = search_by_ingredients(&all, &query);
            if found.is_empty() {
                println!("No recipes match '{query}'.");
            }
            for recipe in found {
                println!(
                    "🍽️  {} ({} min, {} servings)",
                    recipe.name, recipe.prep_time, recipe.servings
                );
                println!("    {}", recipe.ingredients.join(", "));
            }
        }
    }

    Ok(())
}
