use ideiaprint_api::config::Config;
use ideiaprint_api::services::bootstrap::bootstrap_admin;
use ideiaprint_api::{app, middleware};
use persistence::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Ideia Print API"
    );

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    tracing::info!("Database migrations applied");

    let store = Store::postgres(pool, &config.storage.root);
    bootstrap_admin(&store, &config.bootstrap).await?;

    let addr = config.socket_addr();
    let app = app::create_app(config, store);

    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
