pub mod handlers;

pub use handlers::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::service::ReconciliationService;

/// 构建全部路由
pub fn router(service: Arc<ReconciliationService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/reco/2b", post(reconcile_2b))
        .route("/api/reco/2b/portal", post(reconcile_2b_portal))
        .route("/api/reco/2b/export", post(export_2b))
        .route("/api/reco/2b/batch", post(reconcile_batch))
        .route("/api/reco/returns", post(compare_returns))
        .with_state(service)
}
