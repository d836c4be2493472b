use std::sync::Arc;

use skinmatch_api::{
    api::{create_router, AppState},
    config::Config,
    db,
    services::{
        ontology::SparqlHttpClient, EngineSettings, PgProductRepository, RecommendationEngine,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skinmatch_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let settings = EngineSettings::from(&config);

    let pool = db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.repository_timeout(),
    )
    .await?;
    let repository = Arc::new(PgProductRepository::new(pool));
    let graph = Arc::new(SparqlHttpClient::new(
        config.graph_endpoint.clone(),
        config.graph_timeout(),
    )?);

    let engine = RecommendationEngine::new(graph, repository, &settings);
    let app = create_router(AppState::new(engine));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        address = %addr,
        graph_endpoint = %config.graph_endpoint,
        "Server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
