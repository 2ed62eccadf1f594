//! Chart of Accounts lookups and maintenance
//!
//! Every lookup is scoped by company; an account id or code from another
//! company resolves exactly like a missing one.

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Account, AccountStatus, NewAccount};
use crate::store::{LedgerStore, StoreError};

/// Deepest parent chain [`AccountRegistry::full_code`] will follow
pub const MAX_HIERARCHY_DEPTH: usize = 32;

/// Errors that can occur during account registry operations
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Account not configured: company_id={company_id}, code={code}")]
    NotConfigured { company_id: Uuid, code: String },

    #[error("Account is inactive: company_id={company_id}, code={code}")]
    Inactive { company_id: Uuid, code: String },

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Account hierarchy above {0} is cyclic or too deep")]
    HierarchyTooDeep(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Company-scoped access to the Chart of Accounts
#[derive(Clone)]
pub struct AccountRegistry {
    store: Arc<dyn LedgerStore>,
}

impl AccountRegistry {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Find an active account by company and code
    /// Returns an error if the account doesn't exist or is inactive
    pub async fn resolve_by_code(&self, company_id: Uuid, code: &str) -> Result<Account, AccountError> {
        match self.store.find_account_by_code(company_id, code).await? {
            Some(account) if account.is_active() => Ok(account),
            Some(_) => Err(AccountError::Inactive {
                company_id,
                code: code.to_string(),
            }),
            None => Err(AccountError::NotConfigured {
                company_id,
                code: code.to_string(),
            }),
        }
    }

    /// Dotted code path from the root down to this account ("1000.1100")
    pub async fn full_code(&self, account: &Account) -> Result<String, AccountError> {
        let mut codes = vec![account.code.clone()];
        let mut seen = HashSet::from([account.id]);
        let mut parent_id = account.parent_id;

        while let Some(id) = parent_id {
            if !seen.insert(id) || seen.len() > MAX_HIERARCHY_DEPTH {
                return Err(AccountError::HierarchyTooDeep(account.id));
            }
            let parent = self
                .store
                .find_account(account.company_id, id)
                .await?
                .ok_or(StoreError::AccountNotFound(id))?;
            codes.push(parent.code);
            parent_id = parent.parent_id;
        }

        codes.reverse();
        Ok(codes.join("."))
    }

    /// All accounts of a company (ordered by code) paired with their full codes
    ///
    /// Builds the paths from one listing instead of walking the store per
    /// account.
    pub async fn list_with_full_codes(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<(Account, String)>, AccountError> {
        let accounts = self.store.list_accounts(company_id).await?;

        let mut result = Vec::with_capacity(accounts.len());
        for account in &accounts {
            let mut codes = vec![account.code.as_str()];
            let mut parent_id = account.parent_id;
            let mut depth = 0;
            while let Some(id) = parent_id {
                depth += 1;
                if depth >= MAX_HIERARCHY_DEPTH {
                    return Err(AccountError::HierarchyTooDeep(account.id));
                }
                let parent = accounts
                    .iter()
                    .find(|a| a.id == id)
                    .ok_or(StoreError::AccountNotFound(id))?;
                codes.push(parent.code.as_str());
                parent_id = parent.parent_id;
            }
            codes.reverse();
            result.push((account.clone(), codes.join(".")));
        }

        Ok(result)
    }

    pub async fn create_account(&self, account: NewAccount) -> Result<Account, AccountError> {
        if account.code.trim().is_empty() {
            return Err(AccountError::InvalidAccount("code cannot be empty".to_string()));
        }
        if account.name.trim().is_empty() {
            return Err(AccountError::InvalidAccount("name cannot be empty".to_string()));
        }

        let created = self.store.create_account(account).await?;
        tracing::info!(
            company_id = %created.company_id,
            account_id = %created.id,
            code = %created.code,
            "Account created"
        );
        Ok(created)
    }

    pub async fn set_status(
        &self,
        company_id: Uuid,
        account_id: Uuid,
        status: AccountStatus,
    ) -> Result<Account, AccountError> {
        let account = self
            .store
            .set_account_status(company_id, account_id, status)
            .await?;
        tracing::info!(
            company_id = %company_id,
            account_id = %account_id,
            status = ?status,
            "Account status changed"
        );
        Ok(account)
    }

    pub async fn delete_account(&self, company_id: Uuid, account_id: Uuid) -> Result<(), AccountError> {
        self.store.delete_account(company_id, account_id).await?;
        tracing::info!(company_id = %company_id, account_id = %account_id, "Account deleted");
        Ok(())
    }

    pub async fn list_accounts(&self, company_id: Uuid) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_accounts(company_id).await?)
    }
}
