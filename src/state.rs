use std::sync::Arc;
use crate::db::FinancialStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FinancialStore>,
}
