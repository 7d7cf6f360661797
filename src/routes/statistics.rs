use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

use crate::response::{Envelope, ResponseMode};
use crate::routes::required_params;
use crate::services::query_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/statistics", get(get_statistics))
}

pub async fn get_statistics(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Envelope {
    info!("GET /api/statistics - {:?}", params);

    let [start_date, end_date, symbol] =
        match required_params(&params, ["start_date", "end_date", "symbol"]) {
            Ok(values) => values,
            Err(e) => {
                warn!("GET /api/statistics rejected: {}", e);
                return Envelope::error(ResponseMode::Info, e.to_string());
            }
        };

    query_service::calculate(state.store.as_ref(), symbol, start_date, end_date).await
}
