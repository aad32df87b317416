mod config;
mod error;
mod handler;
mod logger;
mod middleware;
mod models;
mod pipeline;
mod response;
mod routes;
mod service;
mod state;
mod tracer;

use log::info;
use opentelemetry::global;
use opentelemetry::global::shutdown_tracer_provider;
use tokio::signal;

use crate::config::settings::SETTINGS;
use crate::logger::logger::setup_logger;
use crate::pipeline::artifact::store::ArtifactConfig;
use crate::pipeline::classify_pipeline::classify_pipeline::ClassificationPipeline;
use crate::routes::root::{root_routes, RouterState};
use crate::tracer::tracer::init_tracer_provider;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() {
    // Setup logger
    setup_logger();
    let addr = format!("0.0.0.0:{}", SETTINGS.server.http_port);

    // Load artifacts and assemble the pipeline. Failing here kills the
    // process before it can accept a single request.
    let artifact_cfg = ArtifactConfig::from(&SETTINGS.artifact);
    let classify_pipeline = ClassificationPipeline::new(&artifact_cfg)
        .unwrap_or_else(|e| panic!("Failed to load classification artifacts: {}", e));
    info!("completed initializing classification pipeline");

    // Setup tracing
    let tracer_provider = init_tracer_provider().expect("Failed to initialize tracer provider.");
    global::set_tracer_provider(tracer_provider.clone());

    // Init server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to create new listener: {}", e));
    info!("starting api server on {:?}", addr);
    let router_state = RouterState::new(classify_pipeline);

    axum::serve(listener, root_routes(router_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| panic!("Failed to start api server: {}", e));

    shutdown_tracer_provider();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
