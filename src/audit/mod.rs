//! Quote integrity audit.
//!
//! Guardrail policy lives in `guardrails`; the checks themselves live in
//! `auditor`. The audit is synchronous and pure: callers load history and
//! actuals first, then hand everything to `audit_quote`.

pub mod auditor;
pub mod guardrails;

pub use auditor::audit_quote;
pub use guardrails::{
    determine_status, AuditReport, Category, Guardrails, IntegrityFlag, IntegrityStatus, Severity,
};
