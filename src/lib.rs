//! # CirclEats Backend
//!
//! Food donation coordination service connecting three roles through a
//! shared registry of donation offers:
//!
//! - **Donors** create offers and watch their status
//! - **Shelters** request offers, for volunteer delivery or self pickup
//! - **Volunteers** collect requested offers and hand them to shelters
//!
//! Every offer walks `Pending -> Requested -> In Transit -> Donated`, with
//! role-scoped dashboards (my donations, my requests, my deliveries) and an
//! embedded notification log telling the counterpart role about each step.
//!
//!
//!
//! # Notes
//!
//! ## MongoDB
//! One document per donation keeps every state transition a single atomic
//! update. Status guards ride along in the update filter, so two volunteers
//! racing to accept the same delivery cannot both win; the loser gets a
//! conflict instead of silently overwriting.
//!
//! Accounts live in their own collection with a unique email index.
//!
//! ## Geocoding
//! Shelters may submit their location as a raw `"lat,lon"` pair. We resolve
//! it through a Nominatim-style reverse lookup before storing, behind a
//! bounded timeout. If the lookup fails, the request fails; no half-written
//! records.
//!
//!
//!
//! # Setup
//!
//! Required environment:
//! ```sh
//! export MONGO_URI="mongodb://localhost:27017"
//! ```
//!
//! Optional, with defaults:
//! ```sh
//! export RUST_PORT=7860
//! export GEOCODER_URL="https://nominatim.openstreetmap.org"
//! export GEOCODER_TIMEOUT_MS=3000
//! ```
//!
//! Run:
//! ```sh
//! RUST_LOG=info cargo run
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod accounts;
pub mod config;
pub mod database;
pub mod donations;
pub mod error;
pub mod geocode;
pub mod models;
pub mod routes;
pub mod state;

use routes::{
    accept_delivery_handler, collect_donation_handler, create_donation_handler,
    donate_to_shelter_handler, donations_handler, home_handler, login_handler,
    my_deliveries_handler, my_donations_handler, my_notifications_handler, my_requests_handler,
    notifications_handler, shelter_accept_handler, shelter_request_handler,
    shelter_requests_handler, signup_handler,
};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(home_handler))
        .route("/api/signup", post(signup_handler))
        .route("/api/login", post(login_handler))
        .route("/api/create_donation", post(create_donation_handler))
        .route("/api/donations", get(donations_handler))
        .route("/api/my_donations/{user_id}", get(my_donations_handler))
        .route("/api/my_notifications/{user_id}", get(my_notifications_handler))
        .route("/api/notifications/{email}", get(notifications_handler))
        .route("/api/shelter_request/{donation_id}", put(shelter_request_handler))
        .route("/api/shelter_requests", get(shelter_requests_handler))
        .route("/api/my_requests/{email}", get(my_requests_handler))
        .route("/api/my_shelter_requests/{email}", get(my_requests_handler))
        .route("/api/accept_delivery/{donation_id}", put(accept_delivery_handler))
        .route("/api/collect_donation/{donation_id}", put(collect_donation_handler))
        .route("/api/my_deliveries/{email}", get(my_deliveries_handler))
        .route("/api/shelter_accept/{donation_id}", put(shelter_accept_handler))
        .route("/api/donate_to_shelter/{donation_id}", put(donate_to_shelter_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
