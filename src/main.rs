use budget_tracker::{
    cli::{self, CliContext, Command},
    config::{database, settings},
    core::{budget, category},
    errors::Result,
};
use chrono::Local;
use dotenvy::dotenv;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    debug!("Attempted to load .env file.");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("\u{274C} {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    // 3. Load settings
    let config = settings::load_app_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Initialize database
    let db = database::init_database(&database::get_database_url())
        .await
        .inspect(|_| debug!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Seed categories on first run
    let monthly_budget = budget::get_monthly_budget(&db).await?;
    let seeded = category::seed_categories(&db, &config.category_budgets(), monthly_budget)
        .await
        .inspect_err(|e| error!("Failed to seed categories: {e}"))?;
    if seeded > 0 {
        info!("Created {seeded} budget categories");
    }

    // 6. Run the command
    let ctx = CliContext::new(db, config);
    match cli::run(&ctx, command, Local::now().naive_local()).await {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            debug!("Command failed: {e:?}");
            eprintln!("\u{274C} {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
