//! Quote pricing and audit route handlers.
//!
//! Handlers stay thin: parse, delegate to the engine or auditor, persist,
//! respond. All policy lives in `RateBook` and `Guardrails`.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::audit::{audit_quote, Guardrails, IntegrityStatus};
use crate::cache::CacheStats;
use crate::db;
use crate::error::{AppError, Result};
use crate::models::{Area, DispatchLocation, PricingBreakdown, QuoteSnapshot};
use crate::pricing::requests::{DecideOverrideRequest, OverrideRequest, PriceQuoteRequest};
use crate::pricing::responses::{AuditResponse, OverrideResponse, PriceQuoteResponse};
use crate::pricing::calculate_pricing;
use crate::AppState;

/// Build the quote API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pricing/calculate", post(price_quote))
        .route("/api/quotes/:id/audit", post(run_audit))
        .route("/api/quotes/:id/override", post(request_override))
        .route("/api/overrides/:id/decision", post(decide_override))
        .route("/api/cache/stats", get(cache_stats))
}

/// Price a quote from form input
async fn price_quote(
    State(state): State<AppState>,
    Json(request): Json<PriceQuoteRequest>,
) -> Result<Json<PriceQuoteResponse>> {
    let input = request.into_input()?;
    let rate_book = state.cache.rate_book(&state.db).await?;
    let breakdown = calculate_pricing(&input, &rate_book)?;
    Ok(Json(PriceQuoteResponse { breakdown }))
}

/// Run the integrity audit on a stored quote and persist the outcome
async fn run_audit(
    State(state): State<AppState>,
    Path(quote_id): Path<String>,
) -> Result<Json<AuditResponse>> {
    let quote = db::get_quote(&state.db, &quote_id).await?;
    let snapshot = snapshot_from_row(&quote)?;

    let rules = Guardrails::default();
    let historical = match &quote.client_name {
        Some(client) => {
            db::get_historical_quotes(
                &state.db,
                client,
                &quote.id,
                rules.historical.lookback_quotes as i64,
            )
            .await?
        }
        None => Vec::new(),
    };

    let actual = lookup_actual(&state, &quote.project_address).await?;
    let report = audit_quote(&snapshot, &historical, actual.as_deref(), &rules);

    let status = match report.status {
        IntegrityStatus::Pass => "pass",
        IntegrityStatus::Warning => "warning",
        IntegrityStatus::Blocked => "blocked",
    };
    let flags = serde_json::to_value(&report.flags)
        .map_err(|e| AppError::Internal(format!("failed to serialize audit flags: {}", e)))?;
    db::update_quote_audit(&state.db, &quote.id, status, &flags, report.requires_override).await?;

    tracing::info!(
        "Audited quote {}: {} ({} flags)",
        quote.quote_number,
        status,
        report.flags.len()
    );

    Ok(Json(AuditResponse {
        quote_id: quote.id,
        report,
        historical_quote_count: historical.len(),
    }))
}

/// Open an override request for a blocked quote
async fn request_override(
    State(state): State<AppState>,
    Path(quote_id): Path<String>,
    Json(request): Json<OverrideRequest>,
) -> Result<Json<OverrideResponse>> {
    // The quote must exist and actually be blocked
    let quote = db::get_quote(&state.db, &quote_id).await?;
    if !quote.requires_override.unwrap_or(false) {
        return Err(AppError::Internal(format!(
            "quote {} does not require an override",
            quote.quote_number
        )));
    }

    let row = db::create_override_request(
        &state.db,
        &quote.id,
        &request.requested_by,
        &request.justification,
        &request.flag_codes,
    )
    .await?;

    Ok(Json(row.into()))
}

/// Approve or reject a pending override request
async fn decide_override(
    State(state): State<AppState>,
    Path(exception_id): Path<String>,
    Json(request): Json<DecideOverrideRequest>,
) -> Result<Json<OverrideResponse>> {
    let row = db::decide_override_request(
        &state.db,
        &exception_id,
        &request.reviewed_by,
        request.approve,
        request.review_notes.as_deref(),
    )
    .await?;

    tracing::info!(
        "Override {} for quote {} {}",
        row.id,
        row.quote_id,
        row.status
    );

    Ok(Json(row.into()))
}

/// Cache statistics for monitoring
async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Rebuild the auditor's view of a quote from its persisted columns.
fn snapshot_from_row(quote: &db::QuoteRow) -> Result<QuoteSnapshot> {
    let areas: Vec<Area> = serde_json::from_value(quote.areas.clone())
        .map_err(|e| AppError::Internal(format!("malformed areas on quote {}: {}", quote.id, e)))?;

    let dispatch: DispatchLocation =
        serde_json::from_value(serde_json::Value::String(quote.dispatch_location.clone()))
            .map_err(|e| {
                AppError::Internal(format!("malformed dispatch on quote {}: {}", quote.id, e))
            })?;

    let upteam_cost = quote
        .pricing_breakdown
        .clone()
        .and_then(|v| serde_json::from_value::<PricingBreakdown>(v).ok())
        .map(|b| b.upteam_cost)
        .unwrap_or(Decimal::ZERO);

    Ok(QuoteSnapshot {
        areas,
        dispatch,
        distance_miles: quote.distance.unwrap_or(0).max(0) as u32,
        custom_travel_cost: quote.custom_travel_cost,
        total_price: quote.total_price.unwrap_or(Decimal::ZERO),
        upteam_cost,
    })
}

/// Look up scanned actuals for the quote's address, through the cache.
async fn lookup_actual(
    state: &AppState,
    project_address: &str,
) -> Result<Option<Arc<crate::models::ProjectActual>>> {
    let key = db::normalize_address(project_address);
    if key.is_empty() {
        return Ok(None);
    }

    if let Some(cached) = state.cache.actuals.get(&key).await {
        return Ok(Some(cached));
    }

    match db::get_project_actual(&state.db, &key).await? {
        Some(actual) => {
            let actual = Arc::new(actual);
            state.cache.actuals.insert(key, Arc::clone(&actual)).await;
            Ok(Some(actual))
        }
        None => Ok(None),
    }
}
