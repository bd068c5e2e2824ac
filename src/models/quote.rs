//! Quote domain model
//!
//! These types are the engine-facing view of a quote: areas, disciplines,
//! risks, travel, services, and payment terms. They are created by the form
//! collaborator (or parsed from the quote record's JSON columns) and consumed
//! read-only by the pricing engine and integrity auditor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Building type codes from the pricing matrix (1-17).
///
/// Types 14/15 are landscape (sized in acres, site discipline only),
/// 16 is the flat-rate acoustic ceiling path, 17 is Matterport-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BuildingType {
    Office,
    Educational,
    Healthcare,
    Industrial,
    ResidentialMultiFamily,
    ResidentialSingleFamily,
    Retail,
    Hospitality,
    MixedUse,
    Warehouse,
    Religious,
    Government,
    ParkingStructure,
    BuiltLandscape,
    NaturalLandscape,
    ActCeilingsOnly,
    MatterportOnly,
}

impl BuildingType {
    pub fn id(&self) -> u8 {
        match self {
            BuildingType::Office => 1,
            BuildingType::Educational => 2,
            BuildingType::Healthcare => 3,
            BuildingType::Industrial => 4,
            BuildingType::ResidentialMultiFamily => 5,
            BuildingType::ResidentialSingleFamily => 6,
            BuildingType::Retail => 7,
            BuildingType::Hospitality => 8,
            BuildingType::MixedUse => 9,
            BuildingType::Warehouse => 10,
            BuildingType::Religious => 11,
            BuildingType::Government => 12,
            BuildingType::ParkingStructure => 13,
            BuildingType::BuiltLandscape => 14,
            BuildingType::NaturalLandscape => 15,
            BuildingType::ActCeilingsOnly => 16,
            BuildingType::MatterportOnly => 17,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(BuildingType::Office),
            2 => Some(BuildingType::Educational),
            3 => Some(BuildingType::Healthcare),
            4 => Some(BuildingType::Industrial),
            5 => Some(BuildingType::ResidentialMultiFamily),
            6 => Some(BuildingType::ResidentialSingleFamily),
            7 => Some(BuildingType::Retail),
            8 => Some(BuildingType::Hospitality),
            9 => Some(BuildingType::MixedUse),
            10 => Some(BuildingType::Warehouse),
            11 => Some(BuildingType::Religious),
            12 => Some(BuildingType::Government),
            13 => Some(BuildingType::ParkingStructure),
            14 => Some(BuildingType::BuiltLandscape),
            15 => Some(BuildingType::NaturalLandscape),
            16 => Some(BuildingType::ActCeilingsOnly),
            17 => Some(BuildingType::MatterportOnly),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildingType::Office => "Office Building",
            BuildingType::Educational => "Educational",
            BuildingType::Healthcare => "Healthcare",
            BuildingType::Industrial => "Industrial",
            BuildingType::ResidentialMultiFamily => "Residential Multi-Family",
            BuildingType::ResidentialSingleFamily => "Residential Single-Family",
            BuildingType::Retail => "Retail",
            BuildingType::Hospitality => "Hospitality",
            BuildingType::MixedUse => "Mixed-Use",
            BuildingType::Warehouse => "Warehouse",
            BuildingType::Religious => "Religious",
            BuildingType::Government => "Government",
            BuildingType::ParkingStructure => "Parking Structure",
            BuildingType::BuiltLandscape => "Built Landscape",
            BuildingType::NaturalLandscape => "Natural Landscape",
            BuildingType::ActCeilingsOnly => "ACT Ceilings Only",
            BuildingType::MatterportOnly => "Matterport Only",
        }
    }

    /// Landscape types are sized in acres and only carry the site discipline.
    pub fn landscape_category(&self) -> Option<LandscapeCategory> {
        match self {
            BuildingType::BuiltLandscape => Some(LandscapeCategory::Built),
            BuildingType::NaturalLandscape => Some(LandscapeCategory::Natural),
            _ => None,
        }
    }

    pub fn is_landscape(&self) -> bool {
        self.landscape_category().is_some()
    }

    /// Scan productivity class used by the scan-duration audit check.
    pub fn scan_complexity(&self) -> ScanComplexity {
        match self {
            BuildingType::Healthcare | BuildingType::Industrial | BuildingType::MixedUse => {
                ScanComplexity::Complex
            }
            BuildingType::Warehouse
            | BuildingType::ParkingStructure
            | BuildingType::BuiltLandscape
            | BuildingType::NaturalLandscape => ScanComplexity::Simple,
            _ => ScanComplexity::Standard,
        }
    }
}

impl TryFrom<u8> for BuildingType {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        BuildingType::from_id(id).ok_or_else(|| format!("unknown building type id: {}", id))
    }
}

impl From<BuildingType> for u8 {
    fn from(bt: BuildingType) -> u8 {
        bt.id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandscapeCategory {
    Built,
    Natural,
}

/// Scan productivity class for duration estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanComplexity {
    Simple,
    Standard,
    Complex,
}

/// Modeling discipline, independently priced per area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Discipline {
    #[serde(rename = "arch")]
    Architecture,
    #[serde(rename = "structure")]
    Structure,
    #[serde(rename = "mepf")]
    Mepf,
    #[serde(rename = "site")]
    Site,
}

impl Discipline {
    pub fn code(&self) -> &'static str {
        match self {
            Discipline::Architecture => "arch",
            Discipline::Structure => "structure",
            Discipline::Mepf => "mepf",
            Discipline::Site => "site",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Discipline::Architecture => "Architecture",
            Discipline::Structure => "Structure",
            Discipline::Mepf => "MEPF",
            Discipline::Site => "Site",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "arch" => Some(Discipline::Architecture),
            "structure" => Some(Discipline::Structure),
            "mepf" => Some(Discipline::Mepf),
            "site" => Some(Discipline::Site),
            _ => None,
        }
    }
}

/// Level of Detail (modeling fidelity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lod {
    #[serde(rename = "200")]
    Lod200,
    #[serde(rename = "300")]
    Lod300,
    #[serde(rename = "350")]
    Lod350,
}

impl Lod {
    pub fn code(&self) -> &'static str {
        match self {
            Lod::Lod200 => "200",
            Lod::Lod300 => "300",
            Lod::Lod350 => "350",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "200" => Some(Lod::Lod200),
            "300" => Some(Lod::Lod300),
            "350" => Some(Lod::Lod350),
            _ => None,
        }
    }

    /// Price multiplier over the LoD 200 base rate
    pub fn multiplier(&self) -> Decimal {
        match self {
            Lod::Lod200 => Decimal::ONE,
            Lod::Lod300 => rust_decimal_macros::dec!(1.3),
            Lod::Lod350 => rust_decimal_macros::dec!(1.5),
        }
    }
}

/// Scope of the scan/model work for an area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Full,
    Interior,
    Exterior,
    Roof,
    Mixed,
}

impl Scope {
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Full => "Full",
            Scope::Interior => "Interior",
            Scope::Exterior => "Exterior",
            Scope::Roof => "Roof/Facades",
            Scope::Mixed => "Mixed",
        }
    }
}

/// Site risk factors; premiums apply additively to Architecture only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Occupied,
    Hazardous,
    NoPower,
    Flood,
}

impl RiskFactor {
    pub fn label(&self) -> &'static str {
        match self {
            RiskFactor::Occupied => "Occupied Building",
            RiskFactor::Hazardous => "Hazardous Environment",
            RiskFactor::NoPower => "No Power / No HVAC",
            RiskFactor::Flood => "Flood Damage",
        }
    }
}

/// Dispatch location for the scan crew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchLocation {
    Troy,
    Woodstock,
    Brooklyn,
    Remote,
}

impl DispatchLocation {
    pub fn label(&self) -> &'static str {
        match self {
            DispatchLocation::Troy => "Troy",
            DispatchLocation::Woodstock => "Woodstock",
            DispatchLocation::Brooklyn => "Brooklyn",
            DispatchLocation::Remote => "Remote",
        }
    }

    /// Brooklyn uses the tiered base-fee regime instead of flat $/mile.
    pub fn is_tiered(&self) -> bool {
        matches!(self, DispatchLocation::Brooklyn)
    }
}

/// Payment terms select an interest surcharge on the running total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentTerms {
    Partner,
    Owner,
    Net30,
    Net60,
    Net90,
}

impl PaymentTerms {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentTerms::Partner => "Partner",
            PaymentTerms::Owner => "Owner",
            PaymentTerms::Net30 => "Net 30",
            PaymentTerms::Net60 => "Net 60",
            PaymentTerms::Net90 => "Net 90",
        }
    }
}

/// Ancillary service line, one variant per service kind.
///
/// A closed enum (rather than a string-keyed quantity map) so the service
/// pricer is exhaustive: adding a service without a pricing rule is a
/// compile error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Service {
    Georeferencing { quantity: u32 },
    CadDeliverable { sets: u32 },
    Matterport { units: u32 },
    ExpeditedService,
    ActModeling { sqft: u32 },
    InteriorElevations { count: u32 },
}

/// Per-portion LoD selection for mixed-scope areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedScopeLods {
    pub interior: Lod,
    pub exterior: Lod,
}

/// One physically distinct portion of a project.
///
/// `size` is square feet for building types, acres for landscape types.
/// Landscape areas carry only the site discipline; the form collaborator
/// enforces that and the engine re-checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    pub building_type: BuildingType,
    pub size: Decimal,
    pub scope: Scope,
    pub disciplines: BTreeMap<Discipline, Lod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixed_lods: Option<MixedScopeLods>,
}

impl Area {
    /// Square footage of this area with landscape acres converted.
    ///
    /// Matterport-only areas are sized in tour units, not square feet, and
    /// contribute nothing to project footage.
    pub fn sqft(&self) -> Decimal {
        if self.building_type == BuildingType::MatterportOnly {
            Decimal::ZERO
        } else if self.building_type.is_landscape() {
            crate::pricing::calculators::acres_to_sqft(self.size)
        } else {
            self.size
        }
    }
}

/// Travel inputs for one quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelInput {
    pub dispatch: DispatchLocation,
    pub distance_miles: u32,
    /// Operator-entered travel cost for fly-out projects; replaces the
    /// mileage formula entirely when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "rust_decimal::serde::str_option")]
    pub custom_travel_cost: Option<Decimal>,
}

/// Manual cost inputs for Tier A (>=50k sqft) projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAInput {
    #[serde(with = "rust_decimal::serde::str")]
    pub scanning_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub modeling_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin_multiplier: Decimal,
}

/// Fully-formed pricing input; the aggregator is a pure function of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    pub areas: Vec<Area>,
    #[serde(default)]
    pub risks: Vec<RiskFactor>,
    pub travel: TravelInput,
    #[serde(default)]
    pub services: Vec<Service>,
    pub payment_terms: PaymentTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_a: Option<TierAInput>,
}

/// One row of the final quote summary.
///
/// Ordering within the list is significant; downstream PDF rendering relies
/// on positions and the `is_total` marker, not on label matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "rust_decimal::serde::str_option")]
    pub upteam_cost: Option<Decimal>,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub is_discount: bool,
    #[serde(default)]
    pub is_total: bool,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
            upteam_cost: None,
            editable: false,
            is_discount: false,
            is_total: false,
        }
    }

    pub fn with_upteam_cost(mut self, cost: Decimal) -> Self {
        self.upteam_cost = Some(cost);
        self
    }

    pub fn total(mut self) -> Self {
        self.is_total = true;
        self
    }

    pub fn discounted(mut self) -> Self {
        self.is_discount = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }
}

/// Result of one `calculate_pricing` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "rust_decimal::serde::str_option")]
    pub total_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub upteam_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_sqft: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "rust_decimal::serde::str_option")]
    pub effective_price_per_sqft: Option<Decimal>,
}

/// Snapshot of a finished quote, as consumed by the integrity auditor
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub areas: Vec<Area>,
    pub dispatch: DispatchLocation,
    pub distance_miles: u32,
    pub custom_travel_cost: Option<Decimal>,
    pub total_price: Decimal,
    pub upteam_cost: Decimal,
}

impl QuoteSnapshot {
    /// Total quoted square footage, landscape acres converted.
    pub fn total_sqft(&self) -> Decimal {
        self.areas.iter().map(|a| a.sqft()).sum()
    }
}

/// One prior quote, used for the historical price comparison check
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalQuote {
    pub id: String,
    pub client_name: Option<String>,
    pub total_price: Decimal,
    pub total_sqft: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Most recent actually-scanned footage for a normalized address
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectActual {
    pub normalized_address: String,
    pub actual_sqft: i64,
    pub last_scan_date: DateTime<Utc>,
}
