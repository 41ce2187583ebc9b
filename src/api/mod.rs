use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod engagement;
mod error;
mod extract;
mod movies;
mod observability;
mod payments;
mod system;
mod types;
mod users;
pub(crate) mod validation;

pub use error::ApiError;
pub use extract::ApiJson;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(create_public_router())
        .merge(create_protected_router(state.clone()))
        .merge(create_admin_router(state.clone()))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/google/token", post(auth::google_token))
        .route("/auth/google/verify", post(auth::google_token))
        .route("/movies/{tmdb_id}/comments", get(engagement::list_comments))
        .route("/movies/{tmdb_id}/reviews", get(engagement::list_reviews))
        .route("/genres", get(movies::list_genres))
        .route("/payments/webhook", post(payments::webhook))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/change-password", post(auth::change_password))
        .route("/movies", get(movies::list_movies))
        .route("/movies/by-type/{kind}", get(movies::movies_by_type))
        .route("/movies/{tmdb_id}", get(movies::get_movie))
        .route("/movies/{tmdb_id}/comments", post(engagement::add_comment))
        .route("/movies/{tmdb_id}/reviews", post(engagement::add_review))
        .route("/users/me", get(users::me))
        .route("/users/me/username", put(users::update_username))
        .route("/users/favorites", get(users::favorites))
        .route("/users/favorites/{movie_id}", post(users::toggle_favorite))
        .route(
            "/users/watch-history",
            get(users::watch_history).delete(users::clear_history),
        )
        .route("/users/watch-history/{movie_id}", post(users::add_to_history))
        .route(
            "/payments/create-subscription",
            post(payments::create_subscription),
        )
        .route(
            "/payments/confirm-subscription",
            post(payments::confirm_subscription),
        )
        .route(
            "/payments/subscription-status",
            get(payments::subscription_status),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies/admin/movies", post(movies::add_movie))
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
