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
        .route("/api/financial_data", get(get_financial_data))
}

pub async fn get_financial_data(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Envelope {
    info!("GET /api/financial_data - {:?}", params);

    let [start_date, end_date, symbol, limit, page] =
        match required_params(&params, ["start_date", "end_date", "symbol", "limit", "page"]) {
            Ok(values) => values,
            Err(e) => {
                warn!("GET /api/financial_data rejected: {}", e);
                return Envelope::error(ResponseMode::Info, e.to_string());
            }
        };

    query_service::paginate(state.store.as_ref(), symbol, start_date, end_date, limit, page).await
}
