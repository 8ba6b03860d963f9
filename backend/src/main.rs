use std::sync::Arc;

use clap::Parser;
use parkfinder::{
    AppState, create_router,
    config::ServerArgs,
    directions::{DirectionsProvider, NaverDirections, RouteService},
    repository::JsonFileRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkfinder=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = ServerArgs::parse();

    let repository = JsonFileRepository::from_file(&args.lots)?;
    tracing::info!(
        "loaded {} parking lots from {}",
        repository.len(),
        args.lots.display()
    );

    let provider: Option<Arc<dyn DirectionsProvider>> = match args.directions_config() {
        Some(config) => {
            tracing::info!("live directions via {}", config.base_url);
            Some(Arc::new(NaverDirections::new(config)?))
        }
        None => {
            tracing::warn!("no directions credentials set, every route will be synthesized");
            None
        }
    };

    let region = args.region_policy();
    if let Some(policy) = region {
        tracing::info!("accepting coordinates within {:?}", policy);
    }

    let state = AppState {
        lots: Arc::new(repository),
        routes: RouteService::new(provider, args.route_seed),
        region,
    };
    let app = create_router(state);

    tracing::info!("starting parkfinder on http://{}", args.addr);
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
