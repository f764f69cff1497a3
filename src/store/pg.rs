//! PostgreSQL persistence gateway.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{info, warn};

use super::MatchStore;
use crate::error::{ConnectionError, PersistenceError};
use crate::model::{MatchRecord, ResultOdds};

const CONNECT_ATTEMPTS: u32 = 5;

/// The `id` column is an identity column; supplying fixture ids as primary
/// keys therefore needs `OVERRIDING SYSTEM VALUE` on each insert. The
/// override is scoped to the statement, so it can never remain in force
/// after the batch, whether the transaction commits or not.
///
/// Reprocessing a fixture id overwrites the previous record: each record is
/// a snapshot of the latest bookmaker state, and last-write-wins also makes
/// broker redelivery idempotent.
const INSERT_MATCH: &str = r#"
    INSERT INTO football_matches (
        id, home_team_id, home_team_name, away_team_id, away_team_name,
        result_odds, update_timestamp, version
    ) OVERRIDING SYSTEM VALUE
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (id) DO UPDATE SET
        home_team_id = EXCLUDED.home_team_id,
        home_team_name = EXCLUDED.home_team_name,
        away_team_id = EXCLUDED.away_team_id,
        away_team_name = EXCLUDED.away_team_name,
        result_odds = EXCLUDED.result_odds,
        update_timestamp = EXCLUDED.update_timestamp,
        version = EXCLUDED.version
"#;

/// Match record gateway backed by PostgreSQL.
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database, retrying with exponential backoff.
    pub async fn connect(url: &str) -> Result<Self, ConnectionError> {
        let mut attempt = 0;
        loop {
            match PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await
            {
                Ok(pool) => {
                    info!("connected to PostgreSQL");
                    return Ok(Self { pool });
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= CONNECT_ATTEMPTS {
                        return Err(ConnectionError::Database {
                            attempts: attempt,
                            reason: e.to_string(),
                        });
                    }
                    warn!(attempt, error = %e, "database connection failed, retrying");
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
            }
        }
    }

    /// Create the match table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS football_matches (
                id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                home_team_id INTEGER NOT NULL,
                home_team_name TEXT NOT NULL,
                away_team_id INTEGER NOT NULL,
                away_team_name TEXT NOT NULL,
                result_odds JSONB NOT NULL,
                update_timestamp TIMESTAMPTZ NOT NULL,
                version TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn persist_batch(&self, records: &[MatchRecord]) -> Result<(), PersistenceError> {
        if records.is_empty() {
            return Ok(());
        }

        // Dropping the transaction without commit rolls the batch back.
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(INSERT_MATCH)
                .bind(record.id)
                .bind(record.home_team_id)
                .bind(&record.home_team_name)
                .bind(record.away_team_id)
                .bind(&record.away_team_name)
                .bind(sqlx::types::Json(&record.result_odds))
                .bind(record.update_timestamp)
                .bind(&record.version)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(records = records.len(), "stored match batch");
        Ok(())
    }

    async fn all_matches(&self) -> Result<Vec<MatchRecord>, PersistenceError> {
        let rows = sqlx::query(
            r#"
            SELECT id, home_team_id, home_team_name, away_team_id, away_team_name,
                   result_odds, update_timestamp, version
            FROM football_matches
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| MatchRecord {
                id: row.get("id"),
                home_team_id: row.get("home_team_id"),
                home_team_name: row.get("home_team_name"),
                away_team_id: row.get("away_team_id"),
                away_team_name: row.get("away_team_name"),
                result_odds: row.get::<sqlx::types::Json<ResultOdds>, _>("result_odds").0,
                update_timestamp: row.get("update_timestamp"),
                version: row.get("version"),
            })
            .collect();

        Ok(records)
    }
}
