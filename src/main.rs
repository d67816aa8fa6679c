use std::sync::Arc;

use color_eyre::eyre::Result;
use dotenv::dotenv;
use scheddy_api::config::{load_booking_config, ApiConfig};
use scheddy_api::ApiState;
use scheddy_core::store::TracingNotifier;
use scheddy_core::BookingArbiter;
use scheddy_db::{create_pool, schema::initialize_database, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;
    let booking_config = load_booking_config()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    let store = Arc::new(PgStore::new(db_pool));
    let arbiter = BookingArbiter::new(store.clone(), Arc::new(TracingNotifier), booking_config);
    let state = Arc::new(ApiState {
        store: store.clone(),
        identity: store,
        arbiter: Arc::new(arbiter),
    });

    // Start API server
    scheddy_api::start_server(config, state).await?;

    Ok(())
}
