use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{
    JournalEntry, JournalEntryLine, JournalEntryWithLines, LedgerLine, LineQuery, SourceReference,
};

const ENTRY_COLUMNS: &str = r#"
    id, company_id, entry_number, entry_date, description, status,
    total_debit_minor, total_credit_minor, reference_type, reference_id,
    created_by, posted_at, reversed_at, created_at
"#;

/// Numeric suffix of `JE-NNNNNN`; text order breaks once numbers pass six digits
const ENTRY_SEQUENCE: &str = "CAST(SUBSTRING(entry_number FROM 4) AS BIGINT)";

const LINE_COLUMNS: &str =
    "id, journal_entry_id, line_number, account_id, debit_minor, credit_minor, description";

/// Find the posted entry carrying a source reference, if any
pub async fn find_posted_by_reference(
    pool: &PgPool,
    company_id: Uuid,
    reference: &SourceReference,
) -> Result<Option<JournalEntry>, sqlx::Error> {
    sqlx::query_as::<_, JournalEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM journal_entries
        WHERE company_id = $1 AND reference_type = $2 AND reference_id = $3
          AND status = 'posted'
        "#
    ))
    .bind(company_id)
    .bind(&reference.reference_type)
    .bind(&reference.reference_id)
    .fetch_optional(pool)
    .await
}

/// Same as [`find_posted_by_reference`] within a transaction
pub async fn find_posted_by_reference_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    reference: &SourceReference,
) -> Result<Option<JournalEntry>, sqlx::Error> {
    sqlx::query_as::<_, JournalEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM journal_entries
        WHERE company_id = $1 AND reference_type = $2 AND reference_id = $3
          AND status = 'posted'
        "#
    ))
    .bind(company_id)
    .bind(&reference.reference_type)
    .bind(&reference.reference_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Insert a journal entry header
pub async fn insert_entry_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &JournalEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO journal_entries
            (id, company_id, entry_number, entry_date, description, status,
             total_debit_minor, total_credit_minor, reference_type, reference_id,
             created_by, posted_at, reversed_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(entry.id)
    .bind(entry.company_id)
    .bind(&entry.entry_number)
    .bind(entry.entry_date)
    .bind(&entry.description)
    .bind(entry.status)
    .bind(entry.total_debit_minor)
    .bind(entry.total_credit_minor)
    .bind(&entry.reference_type)
    .bind(&entry.reference_id)
    .bind(entry.created_by)
    .bind(entry.posted_at)
    .bind(entry.reversed_at)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Insert journal lines for an entry, one statement per line
pub async fn insert_lines_tx(
    tx: &mut Transaction<'_, Postgres>,
    lines: &[JournalEntryLine],
) -> Result<(), sqlx::Error> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO journal_entry_lines
                (id, journal_entry_id, line_number, account_id, debit_minor, credit_minor, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(line.id)
        .bind(line.journal_entry_id)
        .bind(line.line_number)
        .bind(line.account_id)
        .bind(line.debit_minor)
        .bind(line.credit_minor)
        .bind(&line.description)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub async fn fetch_header(
    pool: &PgPool,
    company_id: Uuid,
    entry_id: Uuid,
) -> Result<Option<JournalEntry>, sqlx::Error> {
    sqlx::query_as::<_, JournalEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE company_id = $1 AND id = $2"
    ))
    .bind(company_id)
    .bind(entry_id)
    .fetch_optional(pool)
    .await
}

/// Fetch a journal entry by ID with its lines
pub async fn fetch_entry_with_lines(
    pool: &PgPool,
    company_id: Uuid,
    entry_id: Uuid,
) -> Result<Option<JournalEntryWithLines>, sqlx::Error> {
    let Some(header) = fetch_header(pool, company_id, entry_id).await? else {
        return Ok(None);
    };

    let lines = sqlx::query_as::<_, JournalEntryLine>(&format!(
        r#"
        SELECT {LINE_COLUMNS}
        FROM journal_entry_lines
        WHERE journal_entry_id = $1
        ORDER BY line_number
        "#
    ))
    .bind(entry_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(JournalEntryWithLines { header, lines }))
}

/// Flip a posted entry to reversed. Returns None when no posted entry
/// with this id exists for the company.
pub async fn mark_reversed(
    pool: &PgPool,
    company_id: Uuid,
    entry_id: Uuid,
) -> Result<Option<JournalEntry>, sqlx::Error> {
    sqlx::query_as::<_, JournalEntry>(&format!(
        r#"
        UPDATE journal_entries
        SET status = 'reversed', reversed_at = NOW()
        WHERE company_id = $1 AND id = $2 AND status = 'posted'
        RETURNING {ENTRY_COLUMNS}
        "#
    ))
    .bind(company_id)
    .bind(entry_id)
    .fetch_optional(pool)
    .await
}

/// Every entry of a company with its lines, ordered by entry number
pub async fn list_with_lines(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<JournalEntryWithLines>, sqlx::Error> {
    let headers = sqlx::query_as::<_, JournalEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE company_id = $1 ORDER BY {ENTRY_SEQUENCE}"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    let lines = sqlx::query_as::<_, JournalEntryLine>(
        r#"
        SELECT l.id, l.journal_entry_id, l.line_number, l.account_id,
               l.debit_minor, l.credit_minor, l.description
        FROM journal_entry_lines l
        JOIN journal_entries e ON e.id = l.journal_entry_id
        WHERE e.company_id = $1
        ORDER BY l.journal_entry_id, l.line_number
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    let mut by_entry: HashMap<Uuid, Vec<JournalEntryLine>> = HashMap::new();
    for line in lines {
        by_entry.entry(line.journal_entry_id).or_default().push(line);
    }

    Ok(headers
        .into_iter()
        .map(|header| {
            let lines = by_entry.remove(&header.id).unwrap_or_default();
            JournalEntryWithLines { header, lines }
        })
        .collect())
}

/// Lines joined with their headers for the ledger read side
///
/// Drafts are never returned. Reversed entries only when requested.
pub async fn query_lines(
    pool: &PgPool,
    company_id: Uuid,
    query: &LineQuery,
) -> Result<Vec<LedgerLine>, sqlx::Error> {
    sqlx::query_as::<_, LedgerLine>(
        r#"
        SELECT
            e.id AS entry_id,
            e.entry_number,
            e.entry_date,
            e.status AS entry_status,
            e.description AS entry_description,
            l.line_number,
            l.account_id,
            l.debit_minor,
            l.credit_minor,
            l.description AS line_description
        FROM journal_entry_lines l
        JOIN journal_entries e ON e.id = l.journal_entry_id
        WHERE e.company_id = $1
          AND (e.status = 'posted' OR ($2 AND e.status = 'reversed'))
          AND ($3::uuid IS NULL OR l.account_id = $3)
          AND ($4::date IS NULL OR e.entry_date >= $4)
          AND ($5::date IS NULL OR e.entry_date <= $5)
        ORDER BY e.entry_date, CAST(SUBSTRING(e.entry_number FROM 4) AS BIGINT), l.line_number
        "#,
    )
    .bind(company_id)
    .bind(query.include_reversed)
    .bind(query.account_id)
    .bind(query.from)
    .bind(query.to)
    .fetch_all(pool)
    .await
}
