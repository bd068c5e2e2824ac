//! Request DTOs for the pricing and audit API endpoints.
//!
//! Numeric fields arrive from form state and may be strings, blank, or
//! garbage; the lenient deserializers coerce anything unusable to zero so a
//! half-filled form still prices instead of rejecting the request. Unknown
//! building type ids surface as a pricing error at conversion time.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::models::{
    Area, BuildingType, Discipline, DispatchLocation, Lod, MixedScopeLods, PaymentTerms,
    QuoteInput, RiskFactor, Scope, Service, TierAInput, TravelInput,
};
use crate::pricing::rates::PricingError;

/// Accept a JSON number or numeric string; anything else (or a negative
/// value) becomes zero.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    Ok(parsed.filter(|d| *d >= Decimal::ZERO).unwrap_or(Decimal::ZERO))
}

fn lenient_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let parsed = match &value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) if !s.trim().is_empty() => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    Ok(parsed.filter(|d| *d >= Decimal::ZERO))
}

fn lenient_miles<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(parsed.unwrap_or(0))
}

/// One area as submitted by the quote form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRequest {
    pub id: String,
    pub name: String,
    pub building_type: u8,
    #[serde(deserialize_with = "lenient_decimal")]
    pub size: Decimal,
    pub scope: Scope,
    #[serde(default)]
    pub disciplines: BTreeMap<Discipline, Lod>,
    #[serde(default)]
    pub mixed_lods: Option<MixedScopeLods>,
}

impl AreaRequest {
    fn into_area(self) -> Result<Area, PricingError> {
        let building_type = BuildingType::from_id(self.building_type)
            .ok_or(PricingError::UnknownBuildingType { id: self.building_type })?;
        Ok(Area {
            id: self.id,
            name: self.name,
            building_type,
            size: self.size,
            scope: self.scope,
            disciplines: self.disciplines,
            mixed_lods: self.mixed_lods,
        })
    }
}

/// Travel fields as submitted by the quote form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRequest {
    pub dispatch: DispatchLocation,
    #[serde(default, deserialize_with = "lenient_miles")]
    pub distance_miles: u32,
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub custom_travel_cost: Option<Decimal>,
}

/// Tier A manual cost inputs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierARequest {
    #[serde(deserialize_with = "lenient_decimal")]
    pub scanning_cost: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub modeling_cost: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub margin_multiplier: Decimal,
}

/// Request to price a quote
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuoteRequest {
    pub areas: Vec<AreaRequest>,
    #[serde(default)]
    pub risks: Vec<RiskFactor>,
    pub travel: TravelRequest,
    #[serde(default)]
    pub services: Vec<Service>,
    pub payment_terms: PaymentTerms,
    #[serde(default)]
    pub tier_a: Option<TierARequest>,
}

impl PriceQuoteRequest {
    /// Convert into the engine's input, resolving building type ids.
    pub fn into_input(self) -> Result<QuoteInput, PricingError> {
        let areas = self
            .areas
            .into_iter()
            .map(AreaRequest::into_area)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QuoteInput {
            areas,
            risks: self.risks,
            travel: TravelInput {
                dispatch: self.travel.dispatch,
                distance_miles: self.travel.distance_miles,
                custom_travel_cost: self.travel.custom_travel_cost,
            },
            services: self.services,
            payment_terms: self.payment_terms,
            tier_a: self.tier_a.map(|t| TierAInput {
                scanning_cost: t.scanning_cost,
                modeling_cost: t.modeling_cost,
                margin_multiplier: t.margin_multiplier,
            }),
        })
    }
}

/// Request to open an override for a blocked quote
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    pub requested_by: String,
    pub justification: String,
    #[serde(default)]
    pub flag_codes: Vec<String>,
}

/// Request to approve or reject a pending override
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideOverrideRequest {
    pub reviewed_by: String,
    pub approve: bool,
    #[serde(default)]
    pub review_notes: Option<String>,
}
