pub mod dto;
pub mod handlers;
pub mod interpreter;
pub mod models;
mod repo;
pub mod services;
pub mod session;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::session_routes())
        .merge(handlers::scan_routes())
        .merge(handlers::qr_routes())
}
