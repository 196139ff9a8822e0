//! PostgreSQL connection pool for the job store
use crate::log_info;
use crate::shared::errors::{AppError, AppResult};
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::{Duration, Instant};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const MAX_POOL_SIZE: u32 = 16;
const SLOW_CHECKOUT: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn new(database_url: &str) -> AppResult<Self> {
        let host = Self::host_of(database_url)?;
        log_info!("Connecting to PostgreSQL at {}", host);

        let (max_size, min_idle) = pool_size(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        );

        let pool = r2d2::Pool::builder()
            .max_size(max_size)
            .min_idle(Some(min_idle))
            .connection_timeout(Duration::from_secs(10))
            .idle_timeout(Some(Duration::from_secs(300)))
            .test_on_check_out(true)
            .build(ConnectionManager::<PgConnection>::new(database_url))
            .map_err(|e| AppError::DatabaseError(format!("Failed to create connection pool: {}", e)))?;

        log_info!("Job store pool ready ({} connections max)", max_size);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Host part of the URL, for logging without credentials
    fn host_of(database_url: &str) -> AppResult<&str> {
        let rest = database_url
            .strip_prefix("postgres://")
            .or_else(|| database_url.strip_prefix("postgresql://"))
            .ok_or_else(|| {
                AppError::ConfigError(
                    "DATABASE_URL must start with postgres:// or postgresql://".to_string(),
                )
            })?;
        Ok(rest.rsplit('@').next().unwrap_or(rest))
    }

    /// Apply pending embedded migrations
    pub fn run_migrations(&self) -> AppResult<()> {
        let mut conn = self.get_connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;
        log_info!("Applied {} pending migrations", applied.len());
        Ok(())
    }

    pub fn get_connection(&self) -> AppResult<DbConnection> {
        let started = Instant::now();
        let conn = self.pool.get()?;
        if started.elapsed() > SLOW_CHECKOUT {
            log::warn!("Slow database checkout: {:?}", started.elapsed());
        }
        Ok(conn)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// (max_size, min_idle) for a machine with `cpus` cores
fn pool_size(cpus: usize) -> (u32, u32) {
    let max_size = u32::try_from(cpus * 2).unwrap_or(MAX_POOL_SIZE).clamp(2, MAX_POOL_SIZE);
    (max_size, (max_size / 4).max(1))
}
