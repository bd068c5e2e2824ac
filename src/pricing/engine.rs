//! Quote aggregator.
//!
//! `calculate_pricing` is a pure function over (areas, risks, travel,
//! services, payment terms) and one `RateBook` snapshot. It returns the
//! ordered line-item list and grand total; identical inputs always yield
//! identical outputs. Line order is a contract: per-area discipline lines,
//! modeling subtotal, risk premiums, travel, services, payment interest,
//! grand total, effective price per sqft.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    Area, BuildingType, Discipline, LineItem, Lod, PricingBreakdown, QuoteInput, Scope, Service,
};
use crate::pricing::calculators::{
    self, area_tier, billable_sqft, landscape_price, round_money, travel_cost,
};
use crate::pricing::rates::{PricingError, RateBook, RiskBasis, UPTEAM_FALLBACK_MULTIPLIER};

/// Interior/exterior portions used for mixed-scope areas
const INTERIOR_PORTION: Decimal = dec!(0.65);
const EXTERIOR_PORTION: Decimal = dec!(0.35);

/// Result of pricing one (area, discipline) combination
struct DisciplineLine {
    label: String,
    client: Decimal,
    upteam: Decimal,
    /// Architecture base retained for risk-premium math, per the configured
    /// pre/post-discount basis
    risk_base: Decimal,
    /// A scope discount was folded into this line's amount
    discounted: bool,
}

/// Compute the full ordered pricing breakdown for a quote.
pub fn calculate_pricing(
    input: &QuoteInput,
    rates: &RateBook,
) -> Result<PricingBreakdown, PricingError> {
    validate(input)?;

    let total_sqft: Decimal = input.areas.iter().map(|a| a.sqft()).sum();
    let total_sqft_u32 = total_sqft.trunc().to_u32().unwrap_or(u32::MAX);

    let mut items: Vec<LineItem> = Vec::new();
    let mut running_total = Decimal::ZERO;
    let mut upteam_total = Decimal::ZERO;
    let mut arch_risk_base = Decimal::ZERO;

    // Base modeling lines
    let mut modeling_subtotal = Decimal::ZERO;
    if let Some(tier_a) = &input.tier_a {
        let price = round_money(
            calculators::tier_a_price(
                tier_a.scanning_cost,
                tier_a.modeling_cost,
                tier_a.margin_multiplier,
            ),
            2,
        );
        let cost = tier_a.scanning_cost + tier_a.modeling_cost;
        items.push(LineItem::new("Tier A Modeling (manual)", price).with_upteam_cost(cost));
        running_total += price;
        modeling_subtotal += price;
        upteam_total += cost;
    } else {
        for area in &input.areas {
            for line in price_area(area, rates)? {
                let amount = round_money(line.client, 2);
                let upteam = round_money(line.upteam, 2);
                let mut item = LineItem::new(line.label, amount).with_upteam_cost(upteam);
                if line.discounted {
                    item = item.discounted();
                }
                items.push(item);
                running_total += amount;
                modeling_subtotal += amount;
                upteam_total += upteam;
                arch_risk_base += line.risk_base;
            }
        }
    }

    if !items.is_empty() {
        items.push(LineItem::new("Modeling Subtotal", modeling_subtotal));
    }

    // Risk premiums, architecture base only, one labeled line per factor
    for risk in dedup_risks(&input.risks) {
        let premium = rates.risk.premium(risk);
        let amount = round_money(arch_risk_base * premium, 2);
        if amount > Decimal::ZERO {
            items.push(LineItem::new(
                format!("Risk Premium - {} (+{}%)", risk.label(), percent(premium)),
                amount,
            ));
            running_total += amount;
        }
    }

    // Travel
    match input.travel.custom_travel_cost {
        Some(custom) if custom > Decimal::ZERO => {
            let amount = round_money(custom, 2);
            items.push(LineItem::new("Travel - Custom (Fly-out)", amount).editable());
            running_total += amount;
        }
        _ => {
            if input.travel.distance_miles > 0 {
                if let Some(travel) = travel_cost(
                    input.travel.dispatch,
                    input.travel.distance_miles,
                    total_sqft_u32,
                    &rates.travel,
                ) {
                    if travel.total_cost > Decimal::ZERO {
                        items.push(LineItem::new(travel.label, round_money(travel.total_cost, 2)));
                        running_total += round_money(travel.total_cost, 2);
                    }
                }
            }
        }
    }

    // Services. Expedited is percentage-of-subtotal and must be evaluated
    // after every other line except payment interest.
    let mut expedited_requested = false;
    for service in &input.services {
        let line = match service {
            Service::ExpeditedService => {
                expedited_requested = true;
                None
            }
            other => price_service(other, rates),
        };
        if let Some((label, amount)) = line {
            let amount = round_money(amount, 2);
            items.push(LineItem::new(label, amount));
            running_total += amount;
        }
    }
    if expedited_requested && running_total > Decimal::ZERO {
        let amount = round_money(running_total * rates.services.expedited_pct, 2);
        items.push(LineItem::new(
            format!("Expedited Service ({}%)", percent(rates.services.expedited_pct)),
            amount,
        ));
        running_total += amount;
    }

    // Payment-term interest, last line before the grand total
    let term_premium = rates.payment.premium(input.payment_terms);
    if term_premium > Decimal::ZERO && running_total > Decimal::ZERO {
        let amount = round_money(running_total * term_premium, 2);
        items.push(LineItem::new(
            format!(
                "Payment Terms - {} (+{}%)",
                input.payment_terms.label(),
                percent(term_premium)
            ),
            amount,
        ));
        running_total += amount;
    }

    // A quote that priced nothing omits the total lines entirely rather
    // than reporting a zero grand total.
    if items.is_empty() {
        return Ok(PricingBreakdown {
            line_items: items,
            total_price: None,
            upteam_cost: Decimal::ZERO,
            total_sqft,
            effective_price_per_sqft: None,
        });
    }

    items.push(LineItem::new("Total", running_total).total());

    let effective = if total_sqft > Decimal::ZERO {
        let per_sqft = round_money(running_total / total_sqft, 2);
        items.push(LineItem::new("Effective Price / sqft", per_sqft));
        Some(per_sqft)
    } else {
        None
    };

    Ok(PricingBreakdown {
        line_items: items,
        total_price: Some(running_total),
        upteam_cost: upteam_total,
        total_sqft,
        effective_price_per_sqft: effective,
    })
}

fn validate(input: &QuoteInput) -> Result<(), PricingError> {
    for area in &input.areas {
        if area.size < Decimal::ZERO {
            return Err(PricingError::InvalidInput {
                message: format!("area \"{}\" has negative size", area.name),
            });
        }
        if area.building_type.is_landscape()
            && area.disciplines.keys().any(|d| *d != Discipline::Site)
        {
            return Err(PricingError::InvalidInput {
                message: format!(
                    "landscape area \"{}\" may only carry the site discipline",
                    area.name
                ),
            });
        }
    }
    if let Some(custom) = input.travel.custom_travel_cost {
        if custom < Decimal::ZERO {
            return Err(PricingError::InvalidInput {
                message: "custom travel cost must not be negative".to_string(),
            });
        }
    }
    Ok(())
}

/// Price every discipline line for one area.
fn price_area(area: &Area, rates: &RateBook) -> Result<Vec<DisciplineLine>, PricingError> {
    // ACT-only and Matterport-only types price through their ancillary
    // paths, not the discipline rate matrix.
    if area.building_type == BuildingType::ActCeilingsOnly {
        let amount = area.size * rates.services.act_per_sqft;
        return Ok(vec![DisciplineLine {
            label: format!("{} - ACT Modeling", area.name),
            client: amount,
            upteam: amount * UPTEAM_FALLBACK_MULTIPLIER,
            risk_base: Decimal::ZERO,
            discounted: false,
        }]);
    }
    if area.building_type == BuildingType::MatterportOnly {
        let amount = area.size * rates.services.matterport_per_unit;
        return Ok(vec![DisciplineLine {
            label: format!("{} - Matterport Virtual Tour", area.name),
            client: amount,
            upteam: Decimal::ZERO,
            risk_base: Decimal::ZERO,
            discounted: false,
        }]);
    }

    if let Some(category) = area.building_type.landscape_category() {
        let lod = area
            .disciplines
            .get(&Discipline::Site)
            .copied()
            .unwrap_or(Lod::Lod200);
        let amount = landscape_price(category, area.size, lod, &rates.landscape);
        return Ok(vec![DisciplineLine {
            label: format!("{} - Site (LoD {})", area.name, lod.code()),
            client: amount,
            upteam: amount * UPTEAM_FALLBACK_MULTIPLIER,
            risk_base: Decimal::ZERO,
            discounted: false,
        }]);
    }

    let declared = area.size.trunc().to_u32().unwrap_or(0);
    let billable = billable_sqft(declared);
    let tier = area_tier(billable);
    let billable_dec = Decimal::from(billable);

    let mut lines = Vec::with_capacity(area.disciplines.len());
    for (&discipline, &lod) in &area.disciplines {
        let (client, upteam, lod_label) = if area.scope == Scope::Mixed {
            match area.mixed_lods {
                Some(mixed) => {
                    let interior =
                        rates.resolve(area.building_type, tier, discipline, mixed.interior)?;
                    let exterior =
                        rates.resolve(area.building_type, tier, discipline, mixed.exterior)?;
                    let client = billable_dec
                        * (interior.client * INTERIOR_PORTION
                            + exterior.client * EXTERIOR_PORTION);
                    let upteam = billable_dec
                        * (interior.upteam * INTERIOR_PORTION
                            + exterior.upteam * EXTERIOR_PORTION);
                    let label =
                        format!("LoD {}/{} mixed", mixed.interior.code(), mixed.exterior.code());
                    (client, upteam, label)
                }
                // Mixed scope without a split falls back to the selected LoD
                None => {
                    let rate = rates.resolve(area.building_type, tier, discipline, lod)?;
                    (
                        billable_dec * rate.client,
                        billable_dec * rate.upteam,
                        format!("LoD {}", lod.code()),
                    )
                }
            }
        } else {
            let rate = rates.resolve(area.building_type, tier, discipline, lod)?;
            (
                billable_dec * rate.client,
                billable_dec * rate.upteam,
                format!("LoD {}", lod.code()),
            )
        };

        // The scope discount applies to the architecture line only; other
        // disciplines always bill their full computed price.
        let (amount, upteam, risk_base, discounted) = if discipline == Discipline::Architecture {
            let discount = rates.scope.discount(area.scope);
            let after_discount = client * (Decimal::ONE - discount);
            let base = match rates.risk_basis {
                RiskBasis::PreDiscount => client,
                RiskBasis::PostDiscount => after_discount,
            };
            (
                after_discount,
                upteam * (Decimal::ONE - discount),
                base,
                discount > Decimal::ZERO,
            )
        } else {
            (client, upteam, Decimal::ZERO, false)
        };

        lines.push(DisciplineLine {
            label: format!("{} - {} ({})", area.name, discipline.label(), lod_label),
            client: amount,
            upteam,
            risk_base,
            discounted,
        });
    }
    Ok(lines)
}

/// Price one non-expedited ancillary service; returns None for zero-quantity
/// entries.
fn price_service(service: &Service, rates: &RateBook) -> Option<(String, Decimal)> {
    match service {
        Service::Georeferencing { quantity } => {
            // Flat fee per invocation regardless of the quantity entered
            (*quantity > 0)
                .then(|| ("Georeferencing".to_string(), rates.services.georeferencing_flat))
        }
        Service::CadDeliverable { sets } => (*sets > 0).then(|| {
            let amount =
                (Decimal::from(*sets) * rates.services.cad_per_set).max(rates.services.cad_minimum);
            (format!("CAD Deliverable (PDF & DWG) x {}", sets), amount)
        }),
        Service::Matterport { units } => (*units > 0).then(|| {
            (
                format!("Matterport Virtual Tours x {}", units),
                Decimal::from(*units) * rates.services.matterport_per_unit,
            )
        }),
        Service::ActModeling { sqft } => (*sqft > 0).then(|| {
            (
                format!("ACT Modeling ({} sqft)", sqft),
                Decimal::from(*sqft) * rates.services.act_per_sqft,
            )
        }),
        Service::InteriorElevations { count } => (*count > 0).then(|| {
            (
                format!("Additional Interior Elevations x {}", count),
                calculators::additional_elevations_price(*count),
            )
        }),
        Service::ExpeditedService => None,
    }
}

fn dedup_risks(risks: &[crate::models::RiskFactor]) -> Vec<crate::models::RiskFactor> {
    let mut seen = Vec::with_capacity(risks.len());
    for &risk in risks {
        if !seen.contains(&risk) {
            seen.push(risk);
        }
    }
    seen
}

fn percent(fraction: Decimal) -> Decimal {
    (fraction * dec!(100)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DispatchLocation, MixedScopeLods, PaymentTerms, RiskFactor, TierAInput, TravelInput,
    };
    use std::collections::BTreeMap;

    fn area(
        name: &str,
        building_type: BuildingType,
        size: Decimal,
        scope: Scope,
        disciplines: &[(Discipline, Lod)],
    ) -> Area {
        Area {
            id: format!("area-{}", name),
            name: name.to_string(),
            building_type,
            size,
            scope,
            disciplines: disciplines.iter().copied().collect::<BTreeMap<_, _>>(),
            mixed_lods: None,
        }
    }

    fn quote(areas: Vec<Area>) -> QuoteInput {
        QuoteInput {
            areas,
            risks: vec![],
            travel: TravelInput {
                dispatch: DispatchLocation::Troy,
                distance_miles: 0,
                custom_travel_cost: None,
            },
            services: vec![],
            payment_terms: PaymentTerms::Net30,
            tier_a: None,
        }
    }

    // ==================== end-to-end scenario ====================

    #[test]
    fn test_small_office_arch_only() {
        // 2,000 sqft office, arch only, LoD 300, full scope, no travel:
        // billable 3,000 sqft, 3000 * 2.50 * 1.3 = $9,750
        let input = quote(vec![area(
            "Main Building",
            BuildingType::Office,
            dec!(2000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod300)],
        )]);
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();

        assert_eq!(breakdown.total_price, Some(dec!(9750.00)));
        // One discipline line, subtotal, total, effective price
        assert_eq!(breakdown.line_items.len(), 4);
        assert_eq!(breakdown.line_items[0].label, "Main Building - Architecture (LoD 300)");
        assert_eq!(breakdown.line_items[0].amount, dec!(9750.00));
        assert_eq!(breakdown.line_items[1].label, "Modeling Subtotal");
        assert!(breakdown.line_items[2].is_total);
        assert!(!breakdown
            .line_items
            .iter()
            .any(|i| i.label.starts_with("Travel") || i.label.starts_with("Risk")));
    }

    #[test]
    fn test_empty_quote_omits_total_lines() {
        let breakdown = calculate_pricing(&quote(vec![]), &RateBook::with_defaults()).unwrap();
        assert!(breakdown.line_items.is_empty());
        assert_eq!(breakdown.total_price, None);
        assert_eq!(breakdown.effective_price_per_sqft, None);
    }

    #[test]
    fn test_idempotent_over_identical_inputs() {
        let mut input = quote(vec![area(
            "Warehouse",
            BuildingType::Warehouse,
            dec!(18500),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod300), (Discipline::Mepf, Lod::Lod300)],
        )]);
        input.risks = vec![RiskFactor::Occupied];
        input.travel.distance_miles = 40;

        let rates = RateBook::with_defaults();
        let first = calculate_pricing(&input, &rates).unwrap();
        let second = calculate_pricing(&input, &rates).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_price_scales_linearly_with_lod_multiplier() {
        // Fixed rate and sqft: the total at each LoD is the LoD 200 total
        // times that LoD's multiplier
        let rates = RateBook::with_defaults();
        let price_at = |lod: Lod| {
            let input = quote(vec![area(
                "A",
                BuildingType::Office,
                dec!(10000),
                Scope::Full,
                &[(Discipline::Architecture, lod)],
            )]);
            calculate_pricing(&input, &rates).unwrap().total_price.unwrap()
        };

        let base = price_at(Lod::Lod200);
        assert_eq!(base, dec!(25000.00));
        assert_eq!(price_at(Lod::Lod300), base * Lod::Lod300.multiplier());
        assert_eq!(price_at(Lod::Lod350), base * Lod::Lod350.multiplier());
        assert!(base < price_at(Lod::Lod300) && price_at(Lod::Lod300) < price_at(Lod::Lod350));
    }

    // ==================== scope discounts ====================

    #[test]
    fn test_scope_discount_architecture_only() {
        let full = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(10000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200), (Discipline::Mepf, Lod::Lod200)],
        )]);
        let interior = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(10000),
            Scope::Interior,
            &[(Discipline::Architecture, Lod::Lod200), (Discipline::Mepf, Lod::Lod200)],
        )]);

        let rates = RateBook::with_defaults();
        let full_b = calculate_pricing(&full, &rates).unwrap();
        let interior_b = calculate_pricing(&interior, &rates).unwrap();

        let line = |b: &PricingBreakdown, needle: &str| {
            b.line_items
                .iter()
                .find(|i| i.label.contains(needle))
                .unwrap()
                .amount
        };

        // MEPF identical across scopes; architecture differs by exactly 25%
        assert_eq!(line(&full_b, "MEPF"), line(&interior_b, "MEPF"));
        assert_eq!(line(&full_b, "Architecture"), dec!(25000.00));
        assert_eq!(line(&interior_b, "Architecture"), dec!(18750.00));

        // Only the discounted architecture line carries the discount marker
        let marker = |b: &PricingBreakdown, needle: &str| {
            b.line_items
                .iter()
                .find(|i| i.label.contains(needle))
                .unwrap()
                .is_discount
        };
        assert!(marker(&interior_b, "Architecture"));
        assert!(!marker(&full_b, "Architecture"));
        assert!(!marker(&interior_b, "MEPF"));
    }

    // ==================== risk premiums ====================

    #[test]
    fn test_risk_premiums_additive_architecture_only() {
        // 4,000 sqft arch at LoD 200 full scope = 4000 * 2.50 = $10,000 base
        let mut input = quote(vec![area(
            "Plant",
            BuildingType::Industrial,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200), (Discipline::Mepf, Lod::Lod200)],
        )]);
        input.risks = vec![RiskFactor::Occupied, RiskFactor::Hazardous];

        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        let risk_lines: Vec<_> = breakdown
            .line_items
            .iter()
            .filter(|i| i.label.starts_with("Risk Premium"))
            .collect();

        assert_eq!(risk_lines.len(), 2);
        assert_eq!(risk_lines[0].label, "Risk Premium - Occupied Building (+15%)");
        assert_eq!(risk_lines[0].amount, dec!(1500.00));
        assert_eq!(risk_lines[1].label, "Risk Premium - Hazardous Environment (+25%)");
        assert_eq!(risk_lines[1].amount, dec!(2500.00));

        // MEPF base (4000 * 3.00 = 12,000) is untouched by risks
        let mepf = breakdown.line_items.iter().find(|i| i.label.contains("MEPF")).unwrap();
        assert_eq!(mepf.amount, dec!(12000.00));
    }

    #[test]
    fn test_risk_basis_pre_vs_post_discount() {
        let mut input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Interior,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        input.risks = vec![RiskFactor::Occupied];

        // Default: premium on the pre-discount base (4000 * 2.50 = 10,000)
        let rates = RateBook::with_defaults();
        let pre = calculate_pricing(&input, &rates).unwrap();
        let pre_risk = pre.line_items.iter().find(|i| i.label.starts_with("Risk")).unwrap();
        assert_eq!(pre_risk.amount, dec!(1500.00));

        // Post-discount basis: 10,000 * 0.75 = 7,500 base
        let mut rates = RateBook::with_defaults();
        rates.risk_basis = RiskBasis::PostDiscount;
        let post = calculate_pricing(&input, &rates).unwrap();
        let post_risk = post.line_items.iter().find(|i| i.label.starts_with("Risk")).unwrap();
        assert_eq!(post_risk.amount, dec!(1125.00));
    }

    #[test]
    fn test_no_risk_lines_for_landscape_only_quote() {
        let mut input = quote(vec![area(
            "Grounds",
            BuildingType::BuiltLandscape,
            dec!(3),
            Scope::Full,
            &[(Discipline::Site, Lod::Lod300)],
        )]);
        input.risks = vec![RiskFactor::Hazardous];

        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        assert!(!breakdown.line_items.iter().any(|i| i.label.starts_with("Risk")));
    }

    // ==================== landscape / ACT ====================

    #[test]
    fn test_landscape_area_priced_per_acre() {
        let input = quote(vec![area(
            "Campus Grounds",
            BuildingType::BuiltLandscape,
            dec!(3.2),
            Scope::Full,
            &[(Discipline::Site, Lod::Lod300)],
        )]);
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();

        // Built landscape, <5 ac, LoD 300 = $1,000/acre
        assert_eq!(breakdown.line_items[0].amount, dec!(3200.00));
        assert_eq!(breakdown.line_items[0].label, "Campus Grounds - Site (LoD 300)");
        // Derived sqft for display: 3.2 acres * 43,560
        assert_eq!(breakdown.total_sqft, dec!(139392));
    }

    #[test]
    fn test_landscape_rejects_non_site_disciplines() {
        let input = quote(vec![area(
            "Grounds",
            BuildingType::NaturalLandscape,
            dec!(3),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        let err = calculate_pricing(&input, &RateBook::with_defaults()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput { .. }));
    }

    #[test]
    fn test_act_only_area_flat_rate() {
        let input = quote(vec![area(
            "Drop Ceilings",
            BuildingType::ActCeilingsOnly,
            dec!(15000),
            Scope::Full,
            &[],
        )]);
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        // Flat $5/sqft, no tiering, no minimum floor
        assert_eq!(breakdown.line_items[0].amount, dec!(75000.00));
    }

    #[test]
    fn test_matterport_only_area_contributes_no_sqft() {
        // Type 17 areas are sized in tour units; they price per unit but
        // must not inflate footage or the effective $/sqft
        let input = quote(vec![area(
            "Walkthrough",
            BuildingType::MatterportOnly,
            dec!(4),
            Scope::Full,
            &[],
        )]);
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();

        assert_eq!(breakdown.line_items[0].amount, dec!(600.00)); // 4 x $150
        assert_eq!(breakdown.total_sqft, Decimal::ZERO);
        assert_eq!(breakdown.effective_price_per_sqft, None);
        assert_eq!(breakdown.total_price, Some(dec!(600.00)));
    }

    // ==================== mixed scope ====================

    #[test]
    fn test_mixed_scope_blends_portion_lods() {
        let mut a = area(
            "Hotel",
            BuildingType::Hospitality,
            dec!(28000),
            Scope::Mixed,
            &[(Discipline::Architecture, Lod::Lod300)],
        );
        a.mixed_lods = Some(MixedScopeLods {
            interior: Lod::Lod350,
            exterior: Lod::Lod300,
        });
        let breakdown = calculate_pricing(&quote(vec![a]), &RateBook::with_defaults()).unwrap();

        // 28000 * (3.75 * 0.65 + 3.25 * 0.35) = 28000 * 3.575 = 100,100
        assert_eq!(breakdown.line_items[0].amount, dec!(100100.00));
        assert!(breakdown.line_items[0].label.contains("LoD 350/300 mixed"));
    }

    // ==================== travel ====================

    #[test]
    fn test_travel_line_appended_after_modeling() {
        let mut input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(5000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        input.travel.distance_miles = 30;

        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        let travel = breakdown
            .line_items
            .iter()
            .find(|i| i.label.starts_with("Travel"))
            .unwrap();
        assert_eq!(travel.amount, dec!(90.00));
        assert_eq!(breakdown.total_price, Some(dec!(12500.00) + dec!(90)));
    }

    #[test]
    fn test_custom_travel_cost_replaces_formula() {
        let mut input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(5000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        input.travel.dispatch = DispatchLocation::Remote;
        input.travel.distance_miles = 600;
        input.travel.custom_travel_cost = Some(dec!(4500));

        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        let travel = breakdown
            .line_items
            .iter()
            .find(|i| i.label.starts_with("Travel"))
            .unwrap();
        assert_eq!(travel.label, "Travel - Custom (Fly-out)");
        assert_eq!(travel.amount, dec!(4500.00));
        assert!(travel.editable);
    }

    // ==================== services / ordering ====================

    #[test]
    fn test_service_lines_and_expedited_ordering() {
        let mut input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        input.services = vec![
            Service::ExpeditedService,
            Service::Georeferencing { quantity: 3 },
            Service::Matterport { units: 2 },
        ];

        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        let labels: Vec<&str> = breakdown.line_items.iter().map(|i| i.label.as_str()).collect();

        // Expedited lands after the other services despite being listed first
        let geo = labels.iter().position(|l| *l == "Georeferencing").unwrap();
        let matterport = labels.iter().position(|l| l.starts_with("Matterport")).unwrap();
        let expedited = labels.iter().position(|l| l.starts_with("Expedited")).unwrap();
        assert!(geo < expedited && matterport < expedited);

        // Georeferencing is flat regardless of quantity
        assert_eq!(breakdown.line_items[geo].amount, dec!(500.00));
        assert_eq!(breakdown.line_items[matterport].amount, dec!(300.00));

        // Expedited = 20% of (10,000 + 500 + 300)
        assert_eq!(breakdown.line_items[expedited].amount, dec!(2160.00));
        assert_eq!(breakdown.total_price, Some(dec!(12960.00)));
    }

    #[test]
    fn test_cad_deliverable_minimum_floor() {
        let mut rates = RateBook::with_defaults();
        rates.services.cad_per_set = dec!(100);
        let mut input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        input.services = vec![Service::CadDeliverable { sets: 1 }];

        let breakdown = calculate_pricing(&input, &rates).unwrap();
        let cad = breakdown
            .line_items
            .iter()
            .find(|i| i.label.starts_with("CAD"))
            .unwrap();
        assert_eq!(cad.amount, dec!(300.00));
    }

    #[test]
    fn test_zero_quantity_services_emit_no_lines() {
        let mut input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        input.services = vec![
            Service::Georeferencing { quantity: 0 },
            Service::Matterport { units: 0 },
            Service::ActModeling { sqft: 0 },
        ];
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        assert_eq!(breakdown.line_items.len(), 4); // arch, subtotal, total, effective
    }

    // ==================== payment terms ====================

    #[test]
    fn test_payment_interest_applied_last() {
        let mut input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        input.payment_terms = PaymentTerms::Net60;
        input.services = vec![Service::Georeferencing { quantity: 1 }];

        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        let labels: Vec<&str> = breakdown.line_items.iter().map(|i| i.label.as_str()).collect();
        let interest = labels.iter().position(|l| l.starts_with("Payment Terms")).unwrap();
        let total = labels.iter().position(|l| *l == "Total").unwrap();
        assert_eq!(interest + 1, total);

        // 10% of (10,000 + 500)
        assert_eq!(breakdown.line_items[interest].amount, dec!(1050.00));
        assert_eq!(breakdown.total_price, Some(dec!(11550.00)));
    }

    #[test]
    fn test_net30_carries_no_interest() {
        let input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        assert!(!breakdown.line_items.iter().any(|i| i.label.starts_with("Payment Terms")));
    }

    // ==================== tier A ====================

    #[test]
    fn test_tier_a_manual_pricing_replaces_matrix_lines() {
        let mut input = quote(vec![area(
            "Complex",
            BuildingType::Industrial,
            dec!(80000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod300)],
        )]);
        input.tier_a = Some(TierAInput {
            scanning_cost: dec!(35000),
            modeling_cost: dec!(55000),
            margin_multiplier: dec!(1.55),
        });

        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        assert_eq!(breakdown.line_items[0].label, "Tier A Modeling (manual)");
        assert_eq!(breakdown.line_items[0].amount, dec!(139500.00));
        assert_eq!(breakdown.line_items[0].upteam_cost, Some(dec!(90000)));
        assert!(!breakdown.line_items.iter().any(|i| i.label.contains("Architecture")));
    }

    // ==================== upteam cost / effective price ====================

    #[test]
    fn test_upteam_cost_tracks_fallback_multiplier() {
        let input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        assert_eq!(breakdown.upteam_cost, dec!(7000.00)); // 10,000 * 0.70
    }

    #[test]
    fn test_effective_price_per_sqft() {
        let input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(5000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        let breakdown = calculate_pricing(&input, &RateBook::with_defaults()).unwrap();
        // 12,500 / 5,000 declared sqft
        assert_eq!(breakdown.effective_price_per_sqft, Some(dec!(2.50)));
        assert_eq!(breakdown.line_items.last().unwrap().label, "Effective Price / sqft");
    }

    // ==================== error handling ====================

    #[test]
    fn test_negative_size_rejected() {
        let input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(-100),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        assert!(matches!(
            calculate_pricing(&input, &RateBook::with_defaults()),
            Err(PricingError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_missing_rate_surfaces_not_zeroes() {
        let strict = RateBook::from_matrices(Default::default(), Default::default());
        let input = quote(vec![area(
            "A",
            BuildingType::Office,
            dec!(4000),
            Scope::Full,
            &[(Discipline::Architecture, Lod::Lod200)],
        )]);
        assert!(matches!(
            calculate_pricing(&input, &strict),
            Err(PricingError::MissingRate { .. })
        ));
    }
}
