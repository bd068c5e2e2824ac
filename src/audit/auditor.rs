//! Quote integrity auditor.
//!
//! `audit_quote` runs six independent checks over a finished quote snapshot.
//! Each check is fault-isolated: if it cannot evaluate (zero price, missing
//! history) it contributes no flags rather than failing the run. The same
//! inputs always produce the same flag set; only `audited_at` differs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::audit::guardrails::{
    determine_status, AuditReport, Category, Guardrails, IntegrityFlag, IntegrityStatus, Severity,
};
use crate::models::{DispatchLocation, HistoricalQuote, ProjectActual, QuoteSnapshot};
use crate::pricing::calculators::round_money;

/// Audit a quote snapshot against the guardrail policy.
pub fn audit_quote(
    quote: &QuoteSnapshot,
    historical: &[HistoricalQuote],
    actual: Option<&ProjectActual>,
    rules: &Guardrails,
) -> AuditReport {
    let mut flags = Vec::new();

    check_margin_floor(quote, rules, &mut flags);
    check_travel_rules(quote, rules, &mut flags);
    check_lod_premiums(quote, &mut flags);
    check_scan_duration(quote, rules, &mut flags);
    check_historical_pricing(quote, historical, rules, &mut flags);
    check_sqft_against_actuals(quote, actual, rules, &mut flags);

    let status = determine_status(&flags);
    AuditReport {
        requires_override: status == IntegrityStatus::Blocked,
        status,
        flags,
        ..AuditReport::empty()
    }
}

/// Check 1: gross margin floor
fn check_margin_floor(quote: &QuoteSnapshot, rules: &Guardrails, flags: &mut Vec<IntegrityFlag>) {
    if quote.total_price <= Decimal::ZERO {
        return;
    }

    let margin = (quote.total_price - quote.upteam_cost) / quote.total_price;

    if margin < rules.margin.minimum_gross_margin {
        flags.push(
            IntegrityFlag::new(
                "MARGIN_BELOW_MINIMUM",
                Severity::Error,
                Category::Policy,
                "Gross Margin Below Policy Minimum",
                format!(
                    "This quote has a {}% gross margin. Our policy minimum is {}%. CEO override required.",
                    round_money(margin * dec!(100), 1),
                    round_money(rules.margin.minimum_gross_margin * dec!(100), 0),
                ),
            )
            .with_detail("actualMargin", margin.to_string())
            .with_detail("minimumRequired", rules.margin.minimum_gross_margin.to_string())
            .with_detail("totalPrice", quote.total_price.to_string())
            .with_detail("upteamCost", quote.upteam_cost.to_string()),
        );
    } else if margin < rules.margin.warning_threshold {
        flags.push(
            IntegrityFlag::new(
                "MARGIN_BELOW_TARGET",
                Severity::Warning,
                Category::Policy,
                "Gross Margin Below Target",
                format!(
                    "This quote has a {}% gross margin, which is below our {}% target.",
                    round_money(margin * dec!(100), 1),
                    round_money(rules.margin.warning_threshold * dec!(100), 0),
                ),
            )
            .with_detail("actualMargin", margin.to_string())
            .with_detail("targetMargin", rules.margin.warning_threshold.to_string()),
        );
    }
}

/// Check 2: fly-out travel cost sanity
fn check_travel_rules(quote: &QuoteSnapshot, rules: &Guardrails, flags: &mut Vec<IntegrityFlag>) {
    let custom = quote.custom_travel_cost.unwrap_or(Decimal::ZERO);
    let is_fly_out = quote.distance_miles > rules.travel.fly_out_distance_threshold
        || quote.dispatch == DispatchLocation::Remote;

    if !is_fly_out {
        return;
    }

    if custom == Decimal::ZERO && rules.travel.require_travel_cost_for_remote {
        flags.push(
            IntegrityFlag::new(
                "FLYOUT_NO_TRAVEL_COST",
                Severity::Error,
                Category::Travel,
                "Fly-out Scenario Missing Travel Cost",
                format!(
                    "This is a fly-out project ({} miles, {} dispatch) but travel cost is $0. Please add travel expenses.",
                    quote.distance_miles,
                    quote.dispatch.label(),
                ),
            )
            .with_detail("distance", quote.distance_miles)
            .with_detail("dispatch", quote.dispatch.label())
            .with_detail("minimumExpected", rules.travel.minimum_fly_out_cost.to_string()),
        );
    } else if custom < rules.travel.minimum_fly_out_cost {
        flags.push(
            IntegrityFlag::new(
                "FLYOUT_LOW_TRAVEL_COST",
                Severity::Warning,
                Category::Travel,
                "Travel Cost May Be Underestimated",
                format!(
                    "Fly-out travel cost of ${} seems low for a {}-mile project. Expected minimum: ${}.",
                    custom, quote.distance_miles, rules.travel.minimum_fly_out_cost,
                ),
            )
            .with_detail("distance", quote.distance_miles)
            .with_detail("customTravelCost", custom.to_string())
            .with_detail("minimumExpected", rules.travel.minimum_fly_out_cost.to_string()),
        );
    }
}

/// Check 3: LoD 350 advisory (informational only)
fn check_lod_premiums(quote: &QuoteSnapshot, flags: &mut Vec<IntegrityFlag>) {
    use crate::models::Lod;

    for area in &quote.areas {
        let has_lod_350 = area.disciplines.values().any(|&lod| lod == Lod::Lod350)
            || area
                .mixed_lods
                .map(|m| m.interior == Lod::Lod350 || m.exterior == Lod::Lod350)
                .unwrap_or(false);

        if has_lod_350 {
            flags.push(
                IntegrityFlag::new(
                    "LOD_350_DETECTED",
                    Severity::Info,
                    Category::Policy,
                    "High Detail LoD 350 Work",
                    format!(
                        "Area \"{}\" includes LoD 350 disciplines. Verify the premium is applied.",
                        area.name,
                    ),
                )
                .with_detail("areaId", area.id.clone())
                .with_detail("areaName", area.name.clone()),
            );
        }
    }
}

/// Check 4: scan duration vs square footage
fn check_scan_duration(quote: &QuoteSnapshot, rules: &Guardrails, flags: &mut Vec<IntegrityFlag>) {
    let mut total_sqft = Decimal::ZERO;
    let mut expected_hours = Decimal::ZERO;

    for area in &quote.areas {
        let sqft = area.sqft();
        total_sqft += sqft;
        let rate = rules.scan_duration.productivity(area.building_type.scan_complexity());
        expected_hours += sqft / Decimal::from(rate);
    }

    if total_sqft <= Decimal::ZERO {
        return;
    }

    if expected_hours < rules.scan_duration.minimum_hours_per_project && total_sqft > dec!(5000) {
        flags.push(
            IntegrityFlag::new(
                "SCAN_DURATION_MISMATCH",
                Severity::Warning,
                Category::Logic,
                "Scan Duration Check",
                format!(
                    "{} sqft typically requires {} hours of scanning. Verify scope is complete.",
                    total_sqft,
                    round_money(expected_hours, 1),
                ),
            )
            .with_detail("totalSqft", total_sqft.to_string())
            .with_detail("expectedHours", round_money(expected_hours, 1).to_string())
            .with_detail(
                "minimumHours",
                rules.scan_duration.minimum_hours_per_project.to_string(),
            ),
        );
    }
}

/// Check 5: price vs historical average for the same client
fn check_historical_pricing(
    quote: &QuoteSnapshot,
    historical: &[HistoricalQuote],
    rules: &Guardrails,
    flags: &mut Vec<IntegrityFlag>,
) {
    if historical.is_empty() {
        return;
    }

    let total_sqft = quote.total_sqft();
    if total_sqft <= Decimal::ZERO || quote.total_price <= Decimal::ZERO {
        return;
    }
    let current_per_sqft = quote.total_price / total_sqft;

    let per_sqft: Vec<Decimal> = historical
        .iter()
        .take(rules.historical.lookback_quotes)
        .filter(|hq| hq.total_sqft > Decimal::ZERO && hq.total_price > Decimal::ZERO)
        .map(|hq| hq.total_price / hq.total_sqft)
        .collect();

    if per_sqft.is_empty() {
        return;
    }

    let avg = per_sqft.iter().sum::<Decimal>() / Decimal::from(per_sqft.len() as u32);
    // Positive variance means the current quote is cheaper than history
    let variance = (avg - current_per_sqft) / avg;

    if variance > rules.historical.price_per_sqft_variance_block {
        flags.push(
            IntegrityFlag::new(
                "PRICE_SIGNIFICANTLY_LOWER",
                Severity::Error,
                Category::Historical,
                "Price Significantly Below Historical Average",
                format!(
                    "This price per sqft (${}) is {}% lower than the last {} projects for this client (${}/sqft avg).",
                    round_money(current_per_sqft, 2),
                    round_money(variance * dec!(100), 0),
                    per_sqft.len(),
                    round_money(avg, 2),
                ),
            )
            .with_detail("currentPricePerSqft", round_money(current_per_sqft, 2).to_string())
            .with_detail("avgHistoricalPricePerSqft", round_money(avg, 2).to_string())
            .with_detail("variancePercent", variance.to_string())
            .with_detail("historicalQuoteCount", per_sqft.len()),
        );
    } else if variance > rules.historical.price_per_sqft_variance_warning {
        flags.push(
            IntegrityFlag::new(
                "PRICE_BELOW_HISTORICAL",
                Severity::Warning,
                Category::Historical,
                "Price Below Historical Average",
                format!(
                    "This price per sqft is {}% lower than our last {} projects for this client.",
                    round_money(variance * dec!(100), 0),
                    per_sqft.len(),
                ),
            )
            .with_detail("currentPricePerSqft", round_money(current_per_sqft, 2).to_string())
            .with_detail("avgHistoricalPricePerSqft", round_money(avg, 2).to_string())
            .with_detail("variancePercent", variance.to_string()),
        );
    }
}

/// Check 6: quoted sqft vs previously scanned actuals
fn check_sqft_against_actuals(
    quote: &QuoteSnapshot,
    actual: Option<&ProjectActual>,
    rules: &Guardrails,
    flags: &mut Vec<IntegrityFlag>,
) {
    let actual = match actual {
        Some(a) if a.actual_sqft > 0 => a,
        Some(_) => return,
        None => {
            if rules.sqft.flag_if_no_history {
                flags.push(IntegrityFlag::new(
                    "NO_SQFT_HISTORY",
                    Severity::Info,
                    Category::Sqft,
                    "No Previous Scan History",
                    "This address has not been scanned before. Square footage cannot be verified.",
                ));
            }
            return;
        }
    };

    let quoted = quote.total_sqft();
    let actual_sqft = Decimal::from(actual.actual_sqft);
    let variance = (quoted - actual_sqft).abs() / actual_sqft;

    if variance > rules.sqft.tolerance {
        flags.push(
            IntegrityFlag::new(
                "SQFT_MISMATCH",
                Severity::Warning,
                Category::Sqft,
                "Square Footage Mismatch",
                format!(
                    "Quoted sqft ({}) differs from actual scanned sqft ({}) by {}%. Please verify.",
                    quoted,
                    actual.actual_sqft,
                    round_money(variance * dec!(100), 1),
                ),
            )
            .with_detail("quotedSqft", quoted.to_string())
            .with_detail("actualSqft", actual.actual_sqft)
            .with_detail("variancePercent", variance.to_string())
            .with_detail("lastScanDate", actual.last_scan_date.to_rfc3339()),
        );
    }
}
