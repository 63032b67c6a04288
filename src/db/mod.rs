mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::gateway::PaymentGateway;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool, configuration, and the
/// payment gateway client.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub gateway: Arc<dyn PaymentGateway>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // Busy timeout lets concurrent write transactions (webhook deliveries)
    // queue on SQLite's lock instead of failing with SQLITE_BUSY.
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(std::time::Duration::from_secs(5)));
    Pool::builder().max_size(10).build(manager)
}
