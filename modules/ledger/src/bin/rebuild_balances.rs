//! Rebuild cached balances tool
//!
//! Admin-only tool that recomputes `accounts.balance_minor` for one company
//! from its posted journal lines. The lines are the source of truth; the
//! cached column is advisory.
//!
//! # Usage
//! ```bash
//! DATABASE_URL=postgres://... ./rebuild_balances --company COMPANY_ID
//! ```

use std::env;
use uuid::Uuid;

use ledger_rs::{db, services::balance_service, PostgresLedgerStore};

/// Parse command-line arguments manually (no external crate needed)
struct Args {
    company_id: Uuid,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();

        if args.len() != 3 {
            return Err(format!(
                "Usage: {} --company COMPANY_ID",
                args.first().map(|s| s.as_str()).unwrap_or("rebuild_balances")
            ));
        }

        match args[1].as_str() {
            "--company" => {
                let company_id = Uuid::parse_str(&args[2])
                    .map_err(|e| format!("Invalid --company id: {}", e))?;
                Ok(Args { company_id })
            }
            other => Err(format!("Unknown argument: {}", other)),
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting balance rebuild for company={}", args.company_id);

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let settings = db::PoolSettings::from_env().expect("Invalid DB_* pool settings");

    let pool = db::init_pool(&database_url, &settings)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let store = PostgresLedgerStore::new(pool);
    match balance_service::rebuild_cached_balances(&store, args.company_id).await {
        Ok(balances) => {
            for b in balances.iter().filter(|b| b.balance_minor != b.previous_balance_minor) {
                tracing::info!(
                    "{}: {} -> {}",
                    b.account_code,
                    b.previous_balance_minor,
                    b.balance_minor
                );
            }
            tracing::info!("Balance rebuild complete ({} accounts)", balances.len());
        }
        Err(e) => {
            tracing::error!("Balance rebuild failed: {}", e);
            std::process::exit(1);
        }
    }
}
