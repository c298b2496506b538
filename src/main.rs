//! Alumnet backend
//!
//! Main application entry point

use std::sync::Arc;

use tracing::info;

use alumnet::api::{self, AppState};
use alumnet::config::Settings;
use alumnet::database::connection::{create_pool, run_migrations, DatabaseConfig};
use alumnet::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use alumnet::services::cache::{Cache, NoopCache, RedisCache};
use alumnet::services::notification::{NotificationService, SmtpNotifier};
use alumnet::services::ServiceFactory;
use alumnet::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting Alumnet backend...");

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        ..DatabaseConfig::default()
    };
    let pool = create_pool(&db_config).await?;

    // Run database migrations
    run_migrations(&pool).await?;

    // Initialize the cache layer
    let cache: Arc<dyn Cache> = if settings.features.read_cache {
        info!("Connecting to Redis...");
        Arc::new(RedisCache::new(settings.redis.clone())?)
    } else {
        info!("Read cache disabled, running without Redis");
        Arc::new(NoopCache)
    };

    // Initialize email delivery
    let notifier = Arc::new(SmtpNotifier::new(&settings.email)?);
    let notifications = Arc::new(NotificationService::new(
        notifier,
        settings.features.email_notifications,
    ));

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::from_pool(pool, notifications);

    let rate_limiter = RateLimiter::new(RateLimitConfig {
        max_requests: settings.server.rate_limit_requests,
        window_duration: std::time::Duration::from_secs(
            settings.server.rate_limit_window_seconds,
        ),
    });

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState {
        services,
        cache,
        settings: Arc::new(settings),
        rate_limiter,
    };

    let app = api::router(state);

    info!(address = %address, "Alumnet backend is ready");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
