//! Tidewater Storefront - cart and session API.
//!
//! This binary serves the storefront's cart/session JSON API on port 8000.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Commerce backend REST API for regions, carts, pricing, methods, identity
//! - `moka` caches for regions and checkout methods
//! - Optional fetch proxy routing backend calls through a same-origin relay
//!
//! # State
//!
//! The only state this binary persists is the client's `cart-id` cookie,
//! and only with the client's cookie consent. Carts live in the backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::middleware as axum_middleware;
use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tidewater_storefront::commerce::CommerceClient;
use tidewater_storefront::config::StorefrontConfig;
use tidewater_storefront::middleware::request_id_middleware;
use tidewater_storefront::routes;
use tidewater_storefront::state::AppState;
use tidewater_storefront::transport::{ProxyActivation, ProxyPolicy, RewriteRule};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the fetch proxy if a relay is configured.
fn install_proxy(config: &StorefrontConfig, client: &CommerceClient) -> Option<ProxyActivation> {
    let relay = config.commerce.relay.as_ref()?;

    let policy = ProxyPolicy::new().with_rule(RewriteRule::new(
        &config.commerce.backend_url,
        relay.url.clone(),
        relay.mode,
    ));
    let activation = client
        .transport()
        .install(policy)
        .expect("Fetch proxy installed twice");

    tracing::info!(relay = %relay.url, mode = ?relay.mode, "Fetch proxy installed");
    Some(activation)
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tidewater_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let client =
        CommerceClient::new(&config.commerce).expect("Failed to create commerce backend client");
    tracing::info!(backend = %config.commerce.backend_url, "Commerce client created");

    // Held for the server's lifetime; dropping it restores the plain transport
    let proxy = install_proxy(&config, &client);

    let state = AppState::new(config.clone(), Arc::new(client));

    // Build router
    let app = routes::routes()
        .with_state(state)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    if let Some(proxy) = proxy {
        proxy.deactivate();
        tracing::info!("Fetch proxy deactivated");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
