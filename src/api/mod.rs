use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{models::LocationRecord, orchestrator::Orchestrator};

/// Form or query parameters of a lookup
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FindQuery {
    /// Free-text location name, echoed verbatim as the record's `name`
    #[serde(default)]
    pub location: String,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route(
            "/find-all-about",
            get(find_all_about).post(find_all_about_form),
        )
        .route("/health", get(health))
        .with_state(orchestrator)
}

async fn find_all_about(
    State(orchestrator): State<Arc<Orchestrator>>,
    Query(query): Query<FindQuery>,
) -> Json<LocationRecord> {
    Json(orchestrator.find_all_about(&query.location).await)
}

async fn find_all_about_form(
    State(orchestrator): State<Arc<Orchestrator>>,
    Form(query): Form<FindQuery>,
) -> Json<LocationRecord> {
    Json(orchestrator.find_all_about(&query.location).await)
}

async fn health() -> &'static str {
    "ok"
}
