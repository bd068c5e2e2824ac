//! Database reads for the pricing rate matrices.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::warn;

use crate::error::AppError;
use crate::models::{BuildingType, Discipline};
use crate::pricing::rates::{RateBook, RateKey};

#[derive(Debug, Clone, sqlx::FromRow)]
struct RateRow {
    building_type_id: i32,
    area_tier: String,
    discipline: String,
    lod: String,
    rate_per_sq_ft: Decimal,
}

/// Load a complete rate-book snapshot from the client and upteam matrices.
///
/// The resulting book is strict: a lookup miss at pricing time is a
/// `MissingRate` error. Rows with an unknown building type or discipline are
/// skipped with a warning rather than poisoning the whole snapshot.
pub async fn load_rate_book(pool: &PgPool) -> Result<RateBook, AppError> {
    let client_rows = fetch_matrix(pool, "pricing_matrix").await?;
    let upteam_rows = fetch_matrix(pool, "upteam_pricing_matrix").await?;

    let client = build_matrix(client_rows, "pricing_matrix");
    let upteam = build_matrix(upteam_rows, "upteam_pricing_matrix");

    Ok(RateBook::from_matrices(client, upteam))
}

async fn fetch_matrix(pool: &PgPool, table: &str) -> Result<Vec<RateRow>, AppError> {
    // Table name comes from the two call sites above, never user input
    let sql = format!(
        "SELECT building_type_id, area_tier, discipline, lod, rate_per_sq_ft FROM {}",
        table
    );
    let rows = sqlx::query_as::<_, RateRow>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

fn build_matrix(rows: Vec<RateRow>, table: &str) -> HashMap<RateKey, Decimal> {
    let mut matrix = HashMap::with_capacity(rows.len());
    for row in rows {
        let building_type = match u8::try_from(row.building_type_id)
            .ok()
            .and_then(BuildingType::from_id)
        {
            Some(bt) => bt,
            None => {
                warn!(
                    "Skipping {} row with unknown building type id {}",
                    table, row.building_type_id
                );
                continue;
            }
        };
        let discipline = match Discipline::from_code(&row.discipline) {
            Some(d) => d,
            None => {
                warn!(
                    "Skipping {} row with unknown discipline '{}'",
                    table, row.discipline
                );
                continue;
            }
        };
        matrix.insert(
            RateKey::new(building_type, &row.area_tier, discipline, &row.lod),
            row.rate_per_sq_ft,
        );
    }
    matrix
}
