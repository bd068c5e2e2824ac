//! Domain models for quotes, areas, and audit inputs

pub mod quote;

pub use quote::{
    Area, BuildingType, Discipline, DispatchLocation, HistoricalQuote, LandscapeCategory,
    LineItem, Lod, MixedScopeLods, PaymentTerms, PricingBreakdown, ProjectActual, QuoteInput,
    QuoteSnapshot, RiskFactor, ScanComplexity, Scope, Service, TierAInput, TravelInput,
};
