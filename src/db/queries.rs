//! Database queries for quotes, history, actuals, and overrides.
//!
//! All queries are runtime sqlx over Postgres. Row structs mirror the
//! persisted schema; conversion into domain types happens in the route
//! layer so a malformed row surfaces as an application error, not a panic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{HistoricalQuote, ProjectActual};

/// One persisted quote, audit-relevant columns only
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuoteRow {
    pub id: String,
    pub quote_number: String,
    pub client_name: Option<String>,
    pub project_address: String,
    /// Serialized `Vec<Area>`
    pub areas: serde_json::Value,
    pub dispatch_location: String,
    pub distance: Option<i32>,
    pub custom_travel_cost: Option<Decimal>,
    pub total_price: Option<Decimal>,
    /// Serialized `PricingBreakdown`
    pub pricing_breakdown: Option<serde_json::Value>,
    pub integrity_status: Option<String>,
    pub requires_override: Option<bool>,
    pub override_approved: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// One pending/decided override request
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditExceptionRow {
    pub id: String,
    pub quote_id: String,
    pub requested_by: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub status: String,
    pub flag_codes: serde_json::Value,
    pub justification: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct HistoricalQuoteRow {
    id: String,
    client_name: Option<String>,
    total_price: Decimal,
    total_sqft: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProjectActualRow {
    normalized_address: String,
    actual_sqft: i32,
    last_scan_date: DateTime<Utc>,
}

/// Normalize a street address for actuals lookup: lowercased, punctuation
/// stripped, whitespace collapsed. Must match the normalization used when
/// actuals rows are written.
pub fn normalize_address(address: &str) -> String {
    address
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Get a quote by id
pub async fn get_quote(pool: &PgPool, quote_id: &str) -> Result<QuoteRow, AppError> {
    sqlx::query_as::<_, QuoteRow>(
        r#"
        SELECT
            id, quote_number, client_name, project_address,
            areas, dispatch_location, distance, custom_travel_cost,
            total_price, pricing_breakdown,
            integrity_status, requires_override, override_approved,
            created_at
        FROM quotes
        WHERE id = $1
        "#,
    )
    .bind(quote_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}

/// Latest priced quotes for a client, newest first, excluding the quote
/// being audited. Total sqft is summed from the areas JSON in SQL so the
/// auditor never re-parses historical area lists. Landscape areas (types
/// 14/15) are sized in acres and converted at 43,560 sqft/acre, matching
/// `QuoteSnapshot::total_sqft` so the historical $/sqft average and the
/// current quote's $/sqft share one basis.
pub async fn get_historical_quotes(
    pool: &PgPool,
    client_name: &str,
    exclude_quote_id: &str,
    limit: i64,
) -> Result<Vec<HistoricalQuote>, AppError> {
    let rows = sqlx::query_as::<_, HistoricalQuoteRow>(
        r#"
        SELECT
            q.id, q.client_name, q.total_price,
            COALESCE((
                SELECT SUM(
                    CASE
                        WHEN (a->>'buildingType')::int IN (14, 15)
                            THEN ROUND((a->>'size')::numeric * 43560)
                        WHEN (a->>'buildingType')::int = 17
                            THEN 0
                        ELSE (a->>'size')::numeric
                    END
                )
                FROM jsonb_array_elements(q.areas) a
            ), 0) AS total_sqft,
            q.created_at
        FROM quotes q
        WHERE q.client_name = $1
          AND q.id <> $2
          AND q.total_price IS NOT NULL
        ORDER BY q.created_at DESC
        LIMIT $3
        "#,
    )
    .bind(client_name)
    .bind(exclude_quote_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| HistoricalQuote {
            id: r.id,
            client_name: r.client_name,
            total_price: r.total_price,
            total_sqft: r.total_sqft,
            created_at: r.created_at,
        })
        .collect())
}

/// Most recent scanned actual for a normalized address
pub async fn get_project_actual(
    pool: &PgPool,
    normalized_address: &str,
) -> Result<Option<ProjectActual>, AppError> {
    let row = sqlx::query_as::<_, ProjectActualRow>(
        r#"
        SELECT normalized_address, actual_sqft, last_scan_date
        FROM projects_actuals
        WHERE normalized_address = $1
        ORDER BY last_scan_date DESC
        LIMIT 1
        "#,
    )
    .bind(normalized_address)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ProjectActual {
        normalized_address: r.normalized_address,
        actual_sqft: r.actual_sqft as i64,
        last_scan_date: r.last_scan_date,
    }))
}

/// Persist the latest audit outcome onto the quote
pub async fn update_quote_audit(
    pool: &PgPool,
    quote_id: &str,
    status: &str,
    flags: &serde_json::Value,
    requires_override: bool,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE quotes
        SET integrity_status = $2,
            integrity_flags = $3,
            requires_override = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(quote_id)
    .bind(status)
    .bind(flags)
    .bind(requires_override)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Insert a pending override request for a blocked quote
pub async fn create_override_request(
    pool: &PgPool,
    quote_id: &str,
    requested_by: &str,
    justification: &str,
    flag_codes: &[String],
) -> Result<AuditExceptionRow, AppError> {
    let id = Uuid::new_v4().to_string();
    sqlx::query_as::<_, AuditExceptionRow>(
        r#"
        INSERT INTO audit_exceptions
            (id, quote_id, requested_by, status, flag_codes, justification)
        VALUES ($1, $2, $3, 'pending', $4, $5)
        RETURNING
            id, quote_id, requested_by, requested_at, status,
            flag_codes, justification, reviewed_by, reviewed_at, review_notes
        "#,
    )
    .bind(&id)
    .bind(quote_id)
    .bind(requested_by)
    .bind(serde_json::json!(flag_codes))
    .bind(justification)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

/// Decide a pending override request and mirror the approval onto the quote.
///
/// Only a pending request can be decided; deciding twice is a NotFound.
pub async fn decide_override_request(
    pool: &PgPool,
    exception_id: &str,
    reviewed_by: &str,
    approve: bool,
    review_notes: Option<&str>,
) -> Result<AuditExceptionRow, AppError> {
    let mut tx = pool.begin().await?;

    let status = if approve { "approved" } else { "rejected" };
    let exception = sqlx::query_as::<_, AuditExceptionRow>(
        r#"
        UPDATE audit_exceptions
        SET status = $2,
            reviewed_by = $3,
            reviewed_at = NOW(),
            review_notes = $4
        WHERE id = $1
          AND status = 'pending'
        RETURNING
            id, quote_id, requested_by, requested_at, status,
            flag_codes, justification, reviewed_by, reviewed_at, review_notes
        "#,
    )
    .bind(exception_id)
    .bind(status)
    .bind(reviewed_by)
    .bind(review_notes)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound)?;

    sqlx::query(
        r#"
        UPDATE quotes
        SET override_approved = $2,
            override_approved_by = $3,
            override_approved_at = CASE WHEN $2 THEN NOW() ELSE NULL END,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(&exception.quote_id)
    .bind(approve)
    .bind(reviewed_by)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(exception)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("100 Main St., Troy NY"), "100 main st troy ny");
        assert_eq!(normalize_address("  100   MAIN  st  "), "100 main st");
        assert_eq!(
            normalize_address("100 Main St, Troy, NY"),
            normalize_address("100 main st troy ny")
        );
    }
}
