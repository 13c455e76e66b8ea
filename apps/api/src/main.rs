use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{ClinicStore, InMemoryStore, SupabaseStore};
use shared_utils::clock::{Clock, SystemClock};
use video_conferencing_cell::{StubVideoProvider, VideoApiClient, VideoSessionProvider};

use crate::router::AppServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MediMeet API server");

    let config = Arc::new(AppConfig::from_env());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn ClinicStore> = match config.store_backend {
        StoreBackend::Supabase => Arc::new(SupabaseStore::new(&config)),
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            let clock = Arc::clone(&clock);
            Arc::new(InMemoryStore::with_time_source(move || clock.now()))
        }
    };

    let video: Arc<dyn VideoSessionProvider> = match VideoApiClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("Video provider unavailable ({}); using stub sessions", e);
            Arc::new(StubVideoProvider::new())
        }
    };

    let services = AppServices {
        config: Arc::clone(&config),
        store,
        video,
        clock,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let listener = TcpListener::bind(config.bind_address.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
