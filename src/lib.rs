//! Scan-to-BIM CPQ pricing engine and integrity audit service.
//!
//! The pricing engine turns a configured quote (areas, risks, travel,
//! services, payment terms) into an ordered line-item breakdown. The
//! integrity auditor checks finished quotes against guardrail policy before
//! they go out the door. Both are pure cores with thin sqlx/axum edges.

pub mod audit;
pub mod cache;
pub mod db;
pub mod error;
pub mod models;
pub mod pricing;
pub mod routes;

use sqlx::PgPool;

use crate::cache::AppCache;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            cache: AppCache::new(),
        }
    }
}
