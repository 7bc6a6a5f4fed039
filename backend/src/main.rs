use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Level};

mod db;
mod domain;
mod rest;

use domain::{CalendarService, IdentityCipher, LastWriteWinsResolver, LoggingRemoteGateway, PaymentService};
use rest::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up offline action queue");
    let db = db::DbConnection::init().await?;

    // Collaborators are constructed here and injected; deployments swap in
    // the hosted gateway, the real resolver and the keychain-backed cipher
    let payment_service = PaymentService::new(
        db,
        Arc::new(LoggingRemoteGateway),
        Arc::new(LastWriteWinsResolver),
        Arc::new(IdentityCipher),
    );
    let calendar_service = CalendarService::new();

    // Drain anything a previous offline run left behind
    match payment_service.replay_offline_actions().await {
        Ok(0) => {}
        Ok(n) => info!("Replayed {} offline actions from a previous run", n),
        Err(e) => warn!("Offline replay on startup failed: {:?}", e),
    }

    let state = AppState::new(calendar_service, payment_service);

    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/calendar/month", get(rest::get_calendar_month))
        .route(
            "/calendar/focus",
            get(rest::get_focus_date).post(rest::set_focus_date),
        )
        .route("/calendar/focus/previous", post(rest::navigate_previous_month))
        .route("/calendar/focus/next", post(rest::navigate_next_month))
        .route(
            "/payments",
            get(rest::list_payments).put(rest::load_payments),
        )
        .route("/payments/:id/mark-paid", post(rest::mark_paid))
        .route("/payments/conflicts/resolve", post(rest::resolve_conflicts))
        .route("/payments/replay", post(rest::replay_offline_actions))
        .route("/logs", post(rest::log_message));

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
