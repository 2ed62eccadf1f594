use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Allocate the next journal entry sequence value for a company.
///
/// The `journal_sequences` row is locked by the upsert until the surrounding
/// transaction ends, which serializes numbering per company. The first
/// allocation seeds from the highest existing `JE-` suffix so that entries
/// imported without a sequence row are never renumbered.
pub async fn next_value_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let (value,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO journal_sequences (company_id, last_value)
        SELECT $1, COALESCE(MAX(CAST(SUBSTRING(entry_number FROM 4) AS BIGINT)), 0) + 1
        FROM journal_entries
        WHERE company_id = $1 AND entry_number ~ '^JE-[0-9]+$'
        ON CONFLICT (company_id)
        DO UPDATE SET last_value = journal_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(company_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(value)
}
