//! Stitchduel Database Layer
//!
//! PostgreSQL persistence for the duel lifecycle engine.
//!
//! # Architecture
//!
//! - Repository per aggregate (users, requests, duels, reports, rating)
//! - [`PgDuelStore`] implements the engine's `DuelStore` port on top of
//!   the repositories, translating rows and errors at the boundary
//! - The invariant-bearing writes (duel creation, completion) run their
//!   checks and inserts inside one transaction
//! - The `duels_rating` materialized view backs current-period rating
//!   reads and is refreshed after every duel completion

pub mod config;
pub mod error;
pub mod models;
pub mod repos;
pub mod store;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use repos::*;
pub use store::PgDuelStore;

/// Database connection pool with repository accessors
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pool = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.pg_acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests and embedded tooling)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// Create repository instances
    pub fn users(&self) -> UserRepo {
        UserRepo::new(self.pool.clone())
    }

    pub fn duel_requests(&self) -> DuelRequestRepo {
        DuelRequestRepo::new(self.pool.clone())
    }

    pub fn duels(&self) -> DuelRepo {
        DuelRepo::new(self.pool.clone())
    }

    pub fn duel_reports(&self) -> DuelReportRepo {
        DuelReportRepo::new(self.pool.clone())
    }

    pub fn rating(&self) -> RatingRepo {
        RatingRepo::new(self.pool.clone())
    }

    /// The engine-facing persistence port
    pub fn duel_store(&self) -> PgDuelStore {
        PgDuelStore::new(self.clone())
    }
}
