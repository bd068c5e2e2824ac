//! Response DTOs for the pricing and audit API endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::AuditReport;
use crate::db::AuditExceptionRow;
use crate::models::PricingBreakdown;

/// Response for a priced quote
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuoteResponse {
    #[serde(flatten)]
    pub breakdown: PricingBreakdown,
}

/// Response for an audit run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub quote_id: String,
    #[serde(flatten)]
    pub report: AuditReport,
    /// How many prior quotes fed the historical comparison
    pub historical_quote_count: usize,
}

/// Response for override create/decide endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideResponse {
    pub id: String,
    pub quote_id: String,
    pub status: String,
    pub requested_by: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub flag_codes: serde_json::Value,
    pub justification: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
}

impl From<AuditExceptionRow> for OverrideResponse {
    fn from(row: AuditExceptionRow) -> Self {
        Self {
            id: row.id,
            quote_id: row.quote_id,
            status: row.status,
            requested_by: row.requested_by,
            requested_at: row.requested_at,
            flag_codes: row.flag_codes,
            justification: row.justification,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            review_notes: row.review_notes,
        }
    }
}

/// Generic pricing error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
