use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Account, AccountStatus, NewAccount};

const ACCOUNT_COLUMNS: &str =
    "id, company_id, code, name, account_type, parent_id, balance_minor, status, created_at";

/// Insert a new account; the caller maps unique/foreign key violations
pub async fn insert(pool: &PgPool, account: &NewAccount) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        r#"
        INSERT INTO accounts (id, company_id, code, name, account_type, parent_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(account.company_id)
    .bind(&account.code)
    .bind(&account.name)
    .bind(account.account_type)
    .bind(account.parent_id)
    .fetch_one(pool)
    .await
}

/// Find an account by company_id and id
pub async fn find_by_id(
    pool: &PgPool,
    company_id: Uuid,
    account_id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

/// Find an account by company_id and code
/// Returns None if account doesn't exist
pub async fn find_by_code(
    pool: &PgPool,
    company_id: Uuid,
    code: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE company_id = $1 AND code = $2"
    ))
    .bind(company_id)
    .bind(code)
    .fetch_optional(pool)
    .await
}

/// Code and status of a company's account, share-locked until the
/// transaction ends so a concurrent status change waits for the posting
pub async fn lock_for_posting_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    account_id: Uuid,
) -> Result<Option<(String, AccountStatus)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT code, status FROM accounts WHERE company_id = $1 AND id = $2 FOR SHARE",
    )
    .bind(company_id)
    .bind(account_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn list(pool: &PgPool, company_id: Uuid) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE company_id = $1 ORDER BY code"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn update_status(
    pool: &PgPool,
    company_id: Uuid,
    account_id: Uuid,
    status: AccountStatus,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        r#"
        UPDATE accounts SET status = $3
        WHERE company_id = $1 AND id = $2
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(company_id)
    .bind(account_id)
    .bind(status)
    .fetch_optional(pool)
    .await
}

/// Delete an account. Returns the number of rows removed (0 or 1).
pub async fn delete(pool: &PgPool, company_id: Uuid, account_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM accounts WHERE company_id = $1 AND id = $2")
        .bind(company_id)
        .bind(account_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Overwrite cached balances for the listed accounts
pub async fn update_balances_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    balances: &[(Uuid, i64)],
) -> Result<(), sqlx::Error> {
    for (account_id, balance_minor) in balances {
        sqlx::query("UPDATE accounts SET balance_minor = $3 WHERE company_id = $1 AND id = $2")
            .bind(company_id)
            .bind(account_id)
            .bind(balance_minor)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
