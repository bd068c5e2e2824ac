//! In-memory caching using moka
//!
//! Caches the rate-book snapshot and per-address scan actuals. A pricing run
//! reads one cached snapshot for its whole duration, so concurrent matrix
//! edits never produce a half-old, half-new quote.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::models::ProjectActual;
use crate::pricing::queries as pricing_queries;
use crate::pricing::RateBook;

/// Key for the single cached rate-book snapshot
const RATE_BOOK_KEY: &str = "rate_book";

/// Application cache holding the rate book and project actuals
#[derive(Clone)]
pub struct AppCache {
    /// Rate-book snapshot (singleton)
    pub rate_books: Cache<String, Arc<RateBook>>,
    /// Scanned actuals (normalized address -> ProjectActual)
    pub actuals: Cache<String, Arc<ProjectActual>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Rate book: 1 entry, 10 min TTL. Matrix edits are infrequent
            // and a stale snapshot prices consistently, just not freshly.
            rate_books: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(10 * 60))
                .build(),

            // Actuals: 1000 addresses, 30 min TTL, 10 min idle
            actuals: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),
        }
    }

    /// Get the cached rate book, loading from the database on a miss.
    pub async fn rate_book(&self, db: &PgPool) -> crate::error::Result<Arc<RateBook>> {
        if let Some(book) = self.rate_books.get(RATE_BOOK_KEY).await {
            tracing::debug!("Cache HIT for rate book");
            return Ok(book);
        }
        tracing::debug!("Cache MISS for rate book");
        let book = Arc::new(pricing_queries::load_rate_book(db).await?);
        self.rate_books
            .insert(RATE_BOOK_KEY.to_string(), Arc::clone(&book))
            .await;
        Ok(book)
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            rate_book_cached: self.rate_books.entry_count() > 0,
            actuals_size: self.actuals.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.rate_books.invalidate_all();
        self.actuals.invalidate_all();
        info!("All caches invalidated");
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub rate_book_cached: bool,
    pub actuals_size: u64,
}

/// Start background cache warmer
///
/// Warms the rate book on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    warm_cache(&cache, &db).await;

    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match pricing_queries::load_rate_book(db).await {
        Ok(book) => {
            cache
                .rate_books
                .insert(RATE_BOOK_KEY.to_string(), Arc::new(book))
                .await;
        }
        Err(e) => warn!("Failed to warm rate book cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
