//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access. Everything here is
//! deterministic over its inputs; the aggregator in `engine` composes these
//! into the final line-item list.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{DispatchLocation, LandscapeCategory, Lod};
use crate::pricing::rates::{
    LandscapeRates, TravelRates, MIN_SQFT_FLOOR, SCAN_DAY_SQFT, SQFT_PER_ACRE, TIER_A_THRESHOLD,
};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is
/// exactly halfway between two possibilities, reducing cumulative bias across
/// many line items.
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

// ==================== area tiers ====================

/// Pricing-matrix tier label for a square footage
pub fn area_tier(sqft: u32) -> &'static str {
    if sqft < 3_000 {
        "0-3k"
    } else if sqft < 5_000 {
        "3k-5k"
    } else if sqft < 10_000 {
        "5k-10k"
    } else if sqft < 25_000 {
        "10k-25k"
    } else if sqft < 50_000 {
        "25k-50k"
    } else if sqft < 75_000 {
        "50k-75k"
    } else if sqft < 100_000 {
        "75k-100k"
    } else {
        "100k+"
    }
}

/// Billable square footage: declared sqft with the minimum floor applied.
///
/// The floor guarantees minimum job economics regardless of how small a
/// declared area is.
pub fn billable_sqft(declared: u32) -> u32 {
    declared.max(MIN_SQFT_FLOOR)
}

// ==================== landscape ====================

/// Acreage tier index (0-4) by lower bound: <5, 5, 20, 50, 100
pub fn landscape_acreage_tier(acres: Decimal) -> usize {
    if acres >= dec!(100) {
        4
    } else if acres >= dec!(50) {
        3
    } else if acres >= dec!(20) {
        2
    } else if acres >= dec!(5) {
        1
    } else {
        0
    }
}

/// Convert acres to square feet, rounded to the nearest whole foot.
///
/// Derived purely for display and auditing; landscape pricing itself is
/// per-acre and never touches this value.
pub fn acres_to_sqft(acres: Decimal) -> Decimal {
    round_money(acres * Decimal::from(SQFT_PER_ACRE), 0)
}

/// Landscape area price: acres x per-acre rate for (category, LoD, tier)
pub fn landscape_price(
    category: LandscapeCategory,
    acres: Decimal,
    lod: Lod,
    rates: &LandscapeRates,
) -> Decimal {
    let tier = landscape_acreage_tier(acres);
    acres * rates.per_acre_rate(category, lod, tier)
}

// ==================== travel ====================

/// Brooklyn dispatch base-fee tier, selected by total project sqft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrooklynTier {
    /// 50k+ sqft
    A,
    /// 10k - 50k sqft
    B,
    /// < 10k sqft
    C,
}

impl BrooklynTier {
    pub fn for_sqft(total_sqft: u32) -> Self {
        if total_sqft >= 50_000 {
            BrooklynTier::A
        } else if total_sqft >= 10_000 {
            BrooklynTier::B
        } else {
            BrooklynTier::C
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BrooklynTier::A => "Tier A",
            BrooklynTier::B => "Tier B",
            BrooklynTier::C => "Tier C",
        }
    }

    fn base_fee_index(&self) -> usize {
        match self {
            BrooklynTier::C => 0,
            BrooklynTier::B => 1,
            BrooklynTier::A => 2,
        }
    }
}

/// Estimated scan days for a project: ceil(total sqft / 10k), at least one
pub fn estimated_scan_days(total_sqft: u32) -> u32 {
    total_sqft.div_ceil(SCAN_DAY_SQFT).max(1)
}

/// Computed travel cost with its display breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct TravelResult {
    pub base_cost: Decimal,
    pub extra_miles_cost: Decimal,
    pub scan_day_fee: Decimal,
    pub total_cost: Decimal,
    pub label: String,
    pub tier: Option<&'static str>,
}

/// Travel cost for standard dispatches (Troy, Woodstock): flat $/mile, plus
/// a per-scan-day surcharge once the distance crosses the long-haul
/// threshold.
pub fn standard_travel(distance_miles: u32, total_sqft: u32, rates: &TravelRates) -> TravelResult {
    let base_cost = Decimal::from(distance_miles) * rates.standard_rate_per_mile;
    let scan_day_fee = if distance_miles >= rates.scan_day_distance_threshold {
        rates.scan_day_fee * Decimal::from(estimated_scan_days(total_sqft))
    } else {
        Decimal::ZERO
    };
    let total_cost = base_cost + scan_day_fee;

    let mut label = format!(
        "Travel - {} mi @ ${}/mi",
        distance_miles, rates.standard_rate_per_mile
    );
    if scan_day_fee > Decimal::ZERO {
        label.push_str(&format!(" + ${} scan day fee", scan_day_fee));
    }

    TravelResult {
        base_cost,
        extra_miles_cost: Decimal::ZERO,
        scan_day_fee,
        total_cost,
        label,
        tier: None,
    }
}

/// Travel cost for the Brooklyn dispatch: a size-tiered base fee plus
/// $/mile beyond the included radius.
pub fn brooklyn_travel(distance_miles: u32, total_sqft: u32, rates: &TravelRates) -> TravelResult {
    let tier = BrooklynTier::for_sqft(total_sqft);
    let base_cost = rates.brooklyn_base_fees[tier.base_fee_index()];

    let extra_miles = distance_miles.saturating_sub(rates.brooklyn_included_miles);
    let extra_miles_cost = Decimal::from(extra_miles) * rates.brooklyn_rate_per_mile;
    let total_cost = base_cost + extra_miles_cost;

    let mut label = format!("Travel - Brooklyn {} (${} base", tier.label(), base_cost);
    if extra_miles > 0 {
        label.push_str(&format!(
            " + {} mi @ ${}/mi",
            extra_miles, rates.brooklyn_rate_per_mile
        ));
    }
    label.push(')');

    TravelResult {
        base_cost,
        extra_miles_cost,
        scan_day_fee: Decimal::ZERO,
        total_cost,
        label,
        tier: Some(tier.label()),
    }
}

/// Travel cost for a dispatch location. Remote dispatches are fly-out and
/// have no computed cost; the operator enters a custom figure instead.
pub fn travel_cost(
    dispatch: DispatchLocation,
    distance_miles: u32,
    total_sqft: u32,
    rates: &TravelRates,
) -> Option<TravelResult> {
    match dispatch {
        DispatchLocation::Brooklyn => Some(brooklyn_travel(distance_miles, total_sqft, rates)),
        DispatchLocation::Troy | DispatchLocation::Woodstock => {
            Some(standard_travel(distance_miles, total_sqft, rates))
        }
        DispatchLocation::Remote => None,
    }
}

// ==================== tier A ====================

/// Projects at or above the Tier A threshold may be priced manually
pub fn is_tier_a_project(total_sqft: u32) -> bool {
    total_sqft >= TIER_A_THRESHOLD
}

/// Tier A client price: (scanning + modeling cost) x margin multiplier
pub fn tier_a_price(
    scanning_cost: Decimal,
    modeling_cost: Decimal,
    margin_multiplier: Decimal,
) -> Decimal {
    (scanning_cost + modeling_cost) * margin_multiplier
}

// ==================== interior CAD elevations ====================

/// Tiered pricing for additional interior CAD elevations:
/// $25/ea for 1-10, $20/ea for 11-20, $15/ea for 21-100, $10/ea for 101-300,
/// $5/ea beyond 300.
pub fn additional_elevations_price(count: u32) -> Decimal {
    const TIERS: [(u32, u32); 4] = [(10, 25), (10, 20), (80, 15), (200, 10)];

    let mut total = Decimal::ZERO;
    let mut remaining = count;

    for (width, rate) in TIERS {
        let in_tier = remaining.min(width);
        total += Decimal::from(in_tier) * Decimal::from(rate);
        remaining -= in_tier;
        if remaining == 0 {
            return total;
        }
    }
    total + Decimal::from(remaining) * dec!(5)
}
