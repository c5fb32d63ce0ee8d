use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::{LoginRequest, PublicUser},
    rewards::{dto::SessionView, handlers::unavailable, services::Intent},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    if !payload.has_credentials() {
        warn!("login with empty credentials");
        return Err((
            StatusCode::BAD_REQUEST,
            "Email and password are required".into(),
        ));
    }

    let view = state
        .session
        .send(Intent::Login {
            email: payload.email,
            password: payload.password,
        })
        .await
        .map_err(unavailable)?;

    if let Some(user) = &view.user {
        info!(user_id = %user.id, email = %user.email, "login accepted");
    }
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let view = state.session.send(Intent::Logout).await.map_err(unavailable)?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let view = state.session.view().await.map_err(unavailable)?;
    match view.user {
        Some(user) => Ok(Json(user.into())),
        None => Err((StatusCode::UNAUTHORIZED, "Not logged in".into())),
    }
}
