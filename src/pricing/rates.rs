//! Rate tables and pricing policy configuration.
//!
//! All pricing policy lives here as an explicitly passed `RateBook` snapshot,
//! never as process-wide mutable state. One snapshot is used consistently
//! within a single pricing or audit run; concurrent runs over different
//! snapshots cannot interfere.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{BuildingType, Discipline, LandscapeCategory, Lod, PaymentTerms, RiskFactor};

/// Minimum billable square footage for non-landscape areas
pub const MIN_SQFT_FLOOR: u32 = 3_000;

/// Square feet per acre, used only for display/audit conversion
pub const SQFT_PER_ACRE: u32 = 43_560;

/// Projects at or above this size qualify for Tier A manual pricing
pub const TIER_A_THRESHOLD: u32 = 50_000;

/// Estimated square footage scanned per day, for scan-day fee math
pub const SCAN_DAY_SQFT: u32 = 10_000;

/// Upteam cost as a fraction of client price when no cost matrix row exists
pub const UPTEAM_FALLBACK_MULTIPLIER: Decimal = dec!(0.70);

/// Pricing-domain error types
#[derive(Debug, Clone, PartialEq)]
pub enum PricingError {
    MissingRate {
        building_type: BuildingType,
        area_tier: String,
        discipline: Discipline,
        lod: Lod,
    },
    UnknownBuildingType {
        id: u8,
    },
    InvalidInput {
        message: String,
    },
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::MissingRate {
                building_type,
                area_tier,
                discipline,
                lod,
            } => {
                write!(
                    f,
                    "No rate for ({}, {}, {}, LoD {})",
                    building_type.label(),
                    area_tier,
                    discipline.label(),
                    lod.code()
                )
            }
            PricingError::UnknownBuildingType { id } => {
                write!(f, "Unknown building type id: {}", id)
            }
            PricingError::InvalidInput { message } => {
                write!(f, "Invalid pricing input: {}", message)
            }
        }
    }
}

impl std::error::Error for PricingError {}

/// Whether risk premiums are computed on the architecture base before or
/// after the scope discount is subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBasis {
    #[default]
    PreDiscount,
    PostDiscount,
}

/// Key into the discipline rate matrices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub building_type_id: u8,
    pub area_tier: String,
    pub discipline: Discipline,
    pub lod: String,
}

impl RateKey {
    pub fn new(building_type: BuildingType, tier: &str, discipline: Discipline, lod: &str) -> Self {
        Self {
            building_type_id: building_type.id(),
            area_tier: tier.to_string(),
            discipline,
            lod: lod.to_string(),
        }
    }
}

/// Travel rate schedule
#[derive(Debug, Clone, PartialEq)]
pub struct TravelRates {
    /// $/mile for standard dispatches (Troy, Woodstock)
    pub standard_rate_per_mile: Decimal,
    /// $/mile beyond the included radius for Brooklyn
    pub brooklyn_rate_per_mile: Decimal,
    /// Miles included in the Brooklyn base fee
    pub brooklyn_included_miles: u32,
    /// Brooklyn base fees by project-sqft tier: [<10k, 10k-50k, 50k+]
    pub brooklyn_base_fees: [Decimal; 3],
    /// Daily surcharge once distance crosses the long-distance threshold
    pub scan_day_fee: Decimal,
    /// Distance in miles that triggers the scan-day surcharge
    pub scan_day_distance_threshold: u32,
}

impl Default for TravelRates {
    fn default() -> Self {
        Self {
            standard_rate_per_mile: dec!(3),
            brooklyn_rate_per_mile: dec!(4),
            brooklyn_included_miles: 20,
            brooklyn_base_fees: [dec!(150), dec!(300), dec!(0)],
            scan_day_fee: dec!(300),
            scan_day_distance_threshold: 75,
        }
    }
}

/// Additive risk premiums, applied to the architecture base only
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRates {
    pub occupied: Decimal,
    pub hazardous: Decimal,
    pub no_power: Decimal,
    pub flood: Decimal,
}

impl Default for RiskRates {
    fn default() -> Self {
        Self {
            occupied: dec!(0.15),
            hazardous: dec!(0.25),
            no_power: dec!(0.20),
            flood: dec!(0.10),
        }
    }
}

impl RiskRates {
    pub fn premium(&self, risk: RiskFactor) -> Decimal {
        match risk {
            RiskFactor::Occupied => self.occupied,
            RiskFactor::Hazardous => self.hazardous,
            RiskFactor::NoPower => self.no_power,
            RiskFactor::Flood => self.flood,
        }
    }
}

/// Scope discounts, applied to the architecture discipline's line only
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeDiscounts {
    pub interior: Decimal,
    pub exterior: Decimal,
    pub roof: Decimal,
}

impl Default for ScopeDiscounts {
    fn default() -> Self {
        Self {
            interior: dec!(0.25),
            exterior: dec!(0.50),
            roof: dec!(0.65),
        }
    }
}

impl ScopeDiscounts {
    pub fn discount(&self, scope: crate::models::Scope) -> Decimal {
        use crate::models::Scope;
        match scope {
            Scope::Interior => self.interior,
            Scope::Exterior => self.exterior,
            Scope::Roof => self.roof,
            Scope::Full | Scope::Mixed => Decimal::ZERO,
        }
    }
}

/// Interest surcharge by payment terms
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTermRates {
    pub net30: Decimal,
    pub net60: Decimal,
    pub net90: Decimal,
}

impl Default for PaymentTermRates {
    fn default() -> Self {
        Self {
            net30: dec!(0),
            net60: dec!(0.10),
            net90: dec!(0.20),
        }
    }
}

impl PaymentTermRates {
    pub fn premium(&self, terms: PaymentTerms) -> Decimal {
        match terms {
            // Partner/owner terms carry no interest; they are a separate
            // commercial arrangement, not a net-N surcharge.
            PaymentTerms::Partner | PaymentTerms::Owner => Decimal::ZERO,
            PaymentTerms::Net30 => self.net30,
            PaymentTerms::Net60 => self.net60,
            PaymentTerms::Net90 => self.net90,
        }
    }
}

/// Unit prices for ancillary services.
///
/// Single source of truth: the divergent inline constants scattered across
/// the legacy calculator components are reconciled here.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRates {
    /// Flat fee per invocation, regardless of entered quantity
    pub georeferencing_flat: Decimal,
    pub cad_per_set: Decimal,
    /// Minimum charged for any non-zero CAD deliverable order
    pub cad_minimum: Decimal,
    pub matterport_per_unit: Decimal,
    /// Fraction of the running subtotal at the point the line is evaluated
    pub expedited_pct: Decimal,
    pub act_per_sqft: Decimal,
}

impl Default for ServiceRates {
    fn default() -> Self {
        Self {
            georeferencing_flat: dec!(500),
            cad_per_set: dec!(750),
            cad_minimum: dec!(300),
            matterport_per_unit: dec!(150),
            expedited_pct: dec!(0.20),
            act_per_sqft: dec!(5),
        }
    }
}

/// Per-acre landscape rates: one 5-tier row per LoD, per category.
///
/// Tier bounds (acres): <5, 5-20, 20-50, 50-100, 100+. Rates are monotone
/// non-increasing across tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeRates {
    pub built: [[Decimal; 5]; 3],
    pub natural: [[Decimal; 5]; 3],
}

impl Default for LandscapeRates {
    fn default() -> Self {
        Self {
            built: [
                [dec!(875), dec!(625), dec!(375), dec!(250), dec!(160)],
                [dec!(1000), dec!(750), dec!(500), dec!(375), dec!(220)],
                [dec!(1250), dec!(1000), dec!(750), dec!(500), dec!(260)],
            ],
            natural: [
                [dec!(625), dec!(375), dec!(250), dec!(200), dec!(140)],
                [dec!(750), dec!(500), dec!(375), dec!(275), dec!(200)],
                [dec!(1000), dec!(750), dec!(500), dec!(325), dec!(240)],
            ],
        }
    }
}

impl LandscapeRates {
    fn lod_row(&self, category: LandscapeCategory, lod: Lod) -> &[Decimal; 5] {
        let table = match category {
            LandscapeCategory::Built => &self.built,
            LandscapeCategory::Natural => &self.natural,
        };
        match lod {
            Lod::Lod200 => &table[0],
            Lod::Lod300 => &table[1],
            Lod::Lod350 => &table[2],
        }
    }

    pub fn per_acre_rate(&self, category: LandscapeCategory, lod: Lod, tier_index: usize) -> Decimal {
        self.lod_row(category, lod)[tier_index.min(4)]
    }
}

/// Resolved client/upteam rate pair for one (area, discipline) combination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRate {
    pub client: Decimal,
    pub upteam: Decimal,
}

/// One rate-book snapshot: the two discipline matrices plus every other
/// pricing parameter the engine reads.
#[derive(Debug, Clone, PartialEq)]
pub struct RateBook {
    client_matrix: HashMap<RateKey, Decimal>,
    upteam_matrix: HashMap<RateKey, Decimal>,
    /// When set, a matrix miss falls back to the per-discipline default card
    /// instead of surfacing a `MissingRate` error.
    use_fallback_rates: bool,
    pub travel: TravelRates,
    pub risk: RiskRates,
    pub scope: ScopeDiscounts,
    pub payment: PaymentTermRates,
    pub services: ServiceRates,
    pub landscape: LandscapeRates,
    pub risk_basis: RiskBasis,
}

impl RateBook {
    /// Empty matrices with the default per-discipline rate card enabled.
    pub fn with_defaults() -> Self {
        Self {
            client_matrix: HashMap::new(),
            upteam_matrix: HashMap::new(),
            use_fallback_rates: true,
            travel: TravelRates::default(),
            risk: RiskRates::default(),
            scope: ScopeDiscounts::default(),
            payment: PaymentTermRates::default(),
            services: ServiceRates::default(),
            landscape: LandscapeRates::default(),
            risk_basis: RiskBasis::default(),
        }
    }

    /// Strict book over loaded matrices: a missing tuple is an error, since
    /// a silently zeroed line is indistinguishable from a free service.
    pub fn from_matrices(
        client_matrix: HashMap<RateKey, Decimal>,
        upteam_matrix: HashMap<RateKey, Decimal>,
    ) -> Self {
        Self {
            client_matrix,
            upteam_matrix,
            use_fallback_rates: false,
            ..Self::with_defaults()
        }
    }

    pub fn allow_fallback_rates(mut self, allow: bool) -> Self {
        self.use_fallback_rates = allow;
        self
    }

    pub fn insert_client_rate(&mut self, key: RateKey, rate: Decimal) {
        self.client_matrix.insert(key, rate);
    }

    pub fn insert_upteam_rate(&mut self, key: RateKey, rate: Decimal) {
        self.upteam_matrix.insert(key, rate);
    }

    pub fn matrix_len(&self) -> usize {
        self.client_matrix.len()
    }

    /// Default client rate card, $/sqft at LoD 200
    pub fn default_client_rate(discipline: Discipline) -> Decimal {
        match discipline {
            Discipline::Architecture => dec!(2.50),
            Discipline::Mepf => dec!(3.00),
            Discipline::Structure => dec!(2.00),
            Discipline::Site => dec!(1.50),
        }
    }

    /// Resolve the client/upteam rate pair for a combination.
    ///
    /// Matrix rates already carry their LoD row; the fallback card applies
    /// the LoD multiplier to the per-discipline default. Upteam cost falls
    /// back to client x `UPTEAM_FALLBACK_MULTIPLIER` when the cost matrix
    /// has no matching row.
    pub fn resolve(
        &self,
        building_type: BuildingType,
        area_tier: &str,
        discipline: Discipline,
        lod: Lod,
    ) -> Result<ResolvedRate, PricingError> {
        let key = RateKey::new(building_type, area_tier, discipline, lod.code());

        if let Some(&client) = self.client_matrix.get(&key) {
            let upteam = self
                .upteam_matrix
                .get(&key)
                .copied()
                .unwrap_or(client * UPTEAM_FALLBACK_MULTIPLIER);
            return Ok(ResolvedRate { client, upteam });
        }

        if self.use_fallback_rates {
            let client = Self::default_client_rate(discipline) * lod.multiplier();
            return Ok(ResolvedRate {
                client,
                upteam: client * UPTEAM_FALLBACK_MULTIPLIER,
            });
        }

        Err(PricingError::MissingRate {
            building_type,
            area_tier: area_tier.to_string(),
            discipline,
            lod,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scope;

    #[test]
    fn test_fallback_rates_apply_lod_multiplier() {
        let book = RateBook::with_defaults();
        let rate = book
            .resolve(BuildingType::Office, "0-3k", Discipline::Architecture, Lod::Lod300)
            .unwrap();
        assert_eq!(rate.client, dec!(3.25)); // 2.50 * 1.3
        assert_eq!(rate.upteam, dec!(3.25) * UPTEAM_FALLBACK_MULTIPLIER);
    }

    #[test]
    fn test_matrix_rate_preferred_over_fallback() {
        let mut book = RateBook::with_defaults();
        book.insert_client_rate(
            RateKey::new(BuildingType::Office, "0-3k", Discipline::Architecture, "300"),
            dec!(4.10),
        );
        let rate = book
            .resolve(BuildingType::Office, "0-3k", Discipline::Architecture, Lod::Lod300)
            .unwrap();
        assert_eq!(rate.client, dec!(4.10));
    }

    #[test]
    fn test_strict_book_reports_missing_rate() {
        let book = RateBook::from_matrices(HashMap::new(), HashMap::new());
        let err = book
            .resolve(BuildingType::Retail, "5k-10k", Discipline::Mepf, Lod::Lod200)
            .unwrap_err();
        match err {
            PricingError::MissingRate { discipline, .. } => {
                assert_eq!(discipline, Discipline::Mepf);
            }
            other => panic!("expected MissingRate, got {:?}", other),
        }
    }

    #[test]
    fn test_upteam_matrix_row_wins_over_multiplier() {
        let mut book = RateBook::with_defaults();
        let key = RateKey::new(BuildingType::Office, "0-3k", Discipline::Architecture, "200");
        book.insert_client_rate(key.clone(), dec!(2.50));
        book.insert_upteam_rate(key, dec!(1.25));
        let rate = book
            .resolve(BuildingType::Office, "0-3k", Discipline::Architecture, Lod::Lod200)
            .unwrap();
        assert_eq!(rate.upteam, dec!(1.25));
    }

    #[test]
    fn test_scope_discounts() {
        let scope = ScopeDiscounts::default();
        assert_eq!(scope.discount(Scope::Full), dec!(0));
        assert_eq!(scope.discount(Scope::Interior), dec!(0.25));
        assert_eq!(scope.discount(Scope::Exterior), dec!(0.50));
        assert_eq!(scope.discount(Scope::Roof), dec!(0.65));
        assert_eq!(scope.discount(Scope::Mixed), dec!(0));
    }

    #[test]
    fn test_payment_term_premiums() {
        let payment = PaymentTermRates::default();
        assert_eq!(payment.premium(PaymentTerms::Partner), dec!(0));
        assert_eq!(payment.premium(PaymentTerms::Owner), dec!(0));
        assert_eq!(payment.premium(PaymentTerms::Net30), dec!(0));
        assert_eq!(payment.premium(PaymentTerms::Net60), dec!(0.10));
        assert_eq!(payment.premium(PaymentTerms::Net90), dec!(0.20));
    }

    #[test]
    fn test_landscape_rates_monotone_across_tiers() {
        let rates = LandscapeRates::default();
        for category in [LandscapeCategory::Built, LandscapeCategory::Natural] {
            for lod in [Lod::Lod200, Lod::Lod300, Lod::Lod350] {
                for tier in 0..4 {
                    assert!(
                        rates.per_acre_rate(category, lod, tier)
                            >= rates.per_acre_rate(category, lod, tier + 1),
                        "rate must not increase with acreage tier"
                    );
                }
            }
        }
    }

    #[test]
    fn test_missing_rate_display() {
        let err = PricingError::MissingRate {
            building_type: BuildingType::Office,
            area_tier: "5k-10k".to_string(),
            discipline: Discipline::Architecture,
            lod: Lod::Lod300,
        };
        let msg = err.to_string();
        assert!(msg.contains("Office"));
        assert!(msg.contains("5k-10k"));
        assert!(msg.contains("300"));
    }
}
