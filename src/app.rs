use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes::{financial_data, health, statistics};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .merge(health::router())
        .merge(financial_data::router())
        .merge(statistics::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
