use std::env;

use crate::db::PoolSettings;
use crate::services::event_resolver::WellKnownAccounts;

/// Which [`LedgerStore`](crate::store::LedgerStore) backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Postgres,
    InMemory,
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub store_type: StoreType,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub posting_max_attempts: u32,
    pub well_known_accounts: WellKnownAccounts,
    pub pool: PoolSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_type = match lookup("STORE_TYPE")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreType::Postgres,
            "inmemory" => StoreType::InMemory,
            other => {
                return Err(format!(
                    "Invalid STORE_TYPE: {}. Must be 'postgres' or 'inmemory'",
                    other
                ))
            }
        };

        let database_url = lookup("DATABASE_URL");
        if store_type == StoreType::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set".to_string());
        }

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "8091".to_string())
            .parse()
            .map_err(|_| "PORT must be a valid u16".to_string())?;

        let posting_max_attempts: u32 = lookup("POSTING_MAX_ATTEMPTS")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| "POSTING_MAX_ATTEMPTS must be a positive integer".to_string())?;

        let defaults = WellKnownAccounts::default();
        let code = |key: &str, default: String| lookup(key).unwrap_or(default);
        let well_known_accounts = WellKnownAccounts {
            cash_on_hand: code("ACCOUNT_CODE_CASH_ON_HAND", defaults.cash_on_hand),
            bank: code("ACCOUNT_CODE_BANK", defaults.bank),
            fixed_assets: code("ACCOUNT_CODE_FIXED_ASSETS", defaults.fixed_assets),
            accounts_payable: code("ACCOUNT_CODE_ACCOUNTS_PAYABLE", defaults.accounts_payable),
            operating_expenses: code(
                "ACCOUNT_CODE_OPERATING_EXPENSES",
                defaults.operating_expenses,
            ),
        };

        let pool = PoolSettings::from_lookup(&lookup)?;

        Ok(Config {
            store_type,
            database_url,
            host,
            port,
            posting_max_attempts,
            well_known_accounts,
            pool,
        })
    }
}
