//! Route definitions

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers::{
    create_session, delete_session, get_session, health, identify, index, upload_image, weather,
};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{session_id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{session_id}/image", put(upload_image))
        .route("/api/sessions/{session_id}/identify", post(identify))
        .route("/api/sessions/{session_id}/weather", post(weather))
}
