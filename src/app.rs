use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/mood/log", post(handlers::log_mood_form))
        .route("/community/post", post(handlers::post_form))
        .route("/community/support/:id", post(handlers::support_form))
        .route("/api/moods", get(handlers::get_moods))
        .route("/api/history", get(handlers::get_history))
        .route("/api/series", get(handlers::get_series))
        .route("/api/mood", post(handlers::log_mood))
        .route("/api/posts", get(handlers::get_posts).post(handlers::create_post))
        .route("/api/posts/:id/support", post(handlers::support_post))
        .route("/api/chat", get(handlers::get_chat).post(handlers::chat))
        .with_state(state)
}
