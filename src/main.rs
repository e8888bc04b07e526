mod admin;
mod agents;
mod auth;
mod config;
mod db;
mod error;
mod export;
mod images;
mod routes;
mod state;
mod submission;

use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signature_analyzer=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(config::Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Connected to database and applied migrations");

    let gateway = agents::OpenAiAgent::new(&config);
    tracing::info!("Signature analysis model: {}", gateway.model());

    let state = Arc::new(state::AppState {
        store: Arc::new(db::PgRecordStore::new(pool)),
        gateway: Arc::new(gateway),
        config: config.clone(),
    });

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Signature analyzer listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
