use std::sync::Arc;

use blogicum::{AppState, config::Config, db::DBClient, routes, tracing_config};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() {
    let _guard = tracing_config::init_tracing();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Failed to run migrations: {:?}", err);
        std::process::exit(1);
    }

    let db_client = DBClient::new(pool);

    // Hourly cleanup of expired reset tokens; the scheduler lives as long
    // as this binding.
    let _scheduler = match db_client.start_cleanup_task().await {
        Ok(scheduler) => Some(scheduler),
        Err(err) => {
            tracing::error!("Failed to start the cleanup scheduler: {}", err);
            None
        }
    };

    if config.smtp.is_none() {
        tracing::warn!("SMTP is not configured; outgoing mail will be logged");
    }

    let port = config.port;
    let app_state = AppState {
        env: Arc::new(config),
        db_client,
    };

    let app = routes::create_router(app_state);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
