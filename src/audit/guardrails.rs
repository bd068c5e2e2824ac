//! Guardrail policy configuration and audit report types.
//!
//! All thresholds live in an explicitly passed `Guardrails` value, mirroring
//! how the pricing engine takes a `RateBook` snapshot. A flag is data: checks
//! report findings, they never abort the audit run.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::ScanComplexity;

/// Flag severity, in escalation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Which guardrail family produced a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Logic,
    Policy,
    Historical,
    Travel,
    Sqft,
}

/// Overall audit outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Pass,
    Warning,
    Blocked,
}

/// One finding from one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityFlag {
    pub code: String,
    pub severity: Severity,
    pub category: Category,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl IntegrityFlag {
    pub fn new(
        code: impl Into<String>,
        severity: Severity,
        category: Category,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            category,
            title: title.into(),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Full audit result for one quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub status: IntegrityStatus,
    pub flags: Vec<IntegrityFlag>,
    pub audited_at: DateTime<Utc>,
    pub requires_override: bool,
    pub override_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl AuditReport {
    /// A clean report with no findings
    pub fn empty() -> Self {
        Self {
            status: IntegrityStatus::Pass,
            flags: Vec::new(),
            audited_at: Utc::now(),
            requires_override: false,
            override_approved: false,
            approved_by: None,
            approved_at: None,
        }
    }
}

/// Derive the overall status: any error blocks, any warning downgrades.
pub fn determine_status(flags: &[IntegrityFlag]) -> IntegrityStatus {
    if flags.iter().any(|f| f.severity == Severity::Error) {
        IntegrityStatus::Blocked
    } else if flags.iter().any(|f| f.severity == Severity::Warning) {
        IntegrityStatus::Warning
    } else {
        IntegrityStatus::Pass
    }
}

/// Gross-margin policy thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct MarginRules {
    /// Below this margin the quote is blocked pending override
    pub minimum_gross_margin: Decimal,
    /// Below this margin the quote carries a warning
    pub warning_threshold: Decimal,
}

impl Default for MarginRules {
    fn default() -> Self {
        Self {
            minimum_gross_margin: dec!(0.20),
            warning_threshold: dec!(0.30),
        }
    }
}

/// Fly-out travel sanity thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct TravelRules {
    /// Distance in miles beyond which a project counts as fly-out
    pub fly_out_distance_threshold: u32,
    /// Expected minimum operator-entered travel cost for fly-outs
    pub minimum_fly_out_cost: Decimal,
    pub require_travel_cost_for_remote: bool,
}

impl Default for TravelRules {
    fn default() -> Self {
        Self {
            fly_out_distance_threshold: 300,
            minimum_fly_out_cost: dec!(500),
            require_travel_cost_for_remote: true,
        }
    }
}

/// Scan-duration sanity thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct ScanDurationRules {
    /// Scannable sqft per hour by building complexity class
    pub productivity_simple: u32,
    pub productivity_standard: u32,
    pub productivity_complex: u32,
    /// Projects expected to take fewer hours than this get a second look
    pub minimum_hours_per_project: Decimal,
}

impl Default for ScanDurationRules {
    fn default() -> Self {
        Self {
            productivity_simple: 3_000,
            productivity_standard: 2_000,
            productivity_complex: 1_000,
            minimum_hours_per_project: dec!(4),
        }
    }
}

impl ScanDurationRules {
    pub fn productivity(&self, complexity: ScanComplexity) -> u32 {
        match complexity {
            ScanComplexity::Simple => self.productivity_simple,
            ScanComplexity::Standard => self.productivity_standard,
            ScanComplexity::Complex => self.productivity_complex,
        }
    }
}

/// Historical price comparison thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRules {
    /// Current $/sqft this fraction below the client average warns
    pub price_per_sqft_variance_warning: Decimal,
    /// This fraction below the client average blocks
    pub price_per_sqft_variance_block: Decimal,
    /// How many recent quotes feed the average
    pub lookback_quotes: usize,
}

impl Default for HistoricalRules {
    fn default() -> Self {
        Self {
            price_per_sqft_variance_warning: dec!(0.15),
            price_per_sqft_variance_block: dec!(0.30),
            lookback_quotes: 5,
        }
    }
}

/// Quoted-vs-actual square footage thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct SqftAuditRules {
    /// Relative variance beyond which quoted sqft is flagged
    pub tolerance: Decimal,
    /// Emit an info flag when the address has never been scanned
    pub flag_if_no_history: bool,
}

impl Default for SqftAuditRules {
    fn default() -> Self {
        Self {
            tolerance: dec!(0.10),
            flag_if_no_history: false,
        }
    }
}

/// Complete guardrail policy, one value per audit run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Guardrails {
    pub margin: MarginRules,
    pub travel: TravelRules,
    pub scan_duration: ScanDurationRules,
    pub historical: HistoricalRules,
    pub sqft: SqftAuditRules,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== status derivation tests ====================

    #[test]
    fn test_determine_status_empty_passes() {
        assert_eq!(determine_status(&[]), IntegrityStatus::Pass);
    }

    #[test]
    fn test_determine_status_info_only_passes() {
        let flags = [IntegrityFlag::new("X", Severity::Info, Category::Policy, "t", "m")];
        assert_eq!(determine_status(&flags), IntegrityStatus::Pass);
    }

    #[test]
    fn test_determine_status_warning_downgrades() {
        let flags = [
            IntegrityFlag::new("A", Severity::Info, Category::Policy, "t", "m"),
            IntegrityFlag::new("B", Severity::Warning, Category::Logic, "t", "m"),
        ];
        assert_eq!(determine_status(&flags), IntegrityStatus::Warning);
    }

    #[test]
    fn test_determine_status_any_error_blocks() {
        let flags = [
            IntegrityFlag::new("A", Severity::Warning, Category::Policy, "t", "m"),
            IntegrityFlag::new("B", Severity::Error, Category::Travel, "t", "m"),
        ];
        assert_eq!(determine_status(&flags), IntegrityStatus::Blocked);
    }

    #[test]
    fn test_flag_details_builder() {
        let flag = IntegrityFlag::new("X", Severity::Info, Category::Sqft, "t", "m")
            .with_detail("quotedSqft", 12_000)
            .with_detail("actualSqft", 10_000);
        assert_eq!(flag.details.len(), 2);
        assert_eq!(flag.details["quotedSqft"], serde_json::json!(12_000));
    }
}
