//! Pricing engine for scan-to-BIM quotes.
//!
//! Pure calculation lives in `calculators` and `engine`; rate configuration
//! in `rates`; the database and HTTP edges in `queries`, `requests`, and
//! `responses`.

pub mod calculators;
pub mod engine;
pub mod queries;
pub mod rates;
pub mod requests;
pub mod responses;

// Re-export commonly used items
pub use calculators::round_money;
pub use engine::calculate_pricing;
pub use rates::{PricingError, RateBook, RiskBasis};
