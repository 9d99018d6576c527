//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::context::AppContext;

/// GET /health
pub async fn health_check(State(ctx): State<AppContext>) -> Json<Value> {
    let database = interiors_db::pool::get_conn(&ctx.db)
        .and_then(|conn| interiors_db::queries::interiors::count_interiors(&conn))
        .is_ok();

    Json(json!({
        "status": if database { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
