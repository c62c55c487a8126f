use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::{basic::decode_basic, extractors::strip_scheme, password::verify_password},
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "authToken")]
    pub auth_token: String,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Exchanges a Basic credential for a bearer token.
#[instrument(skip(state, headers))]
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<LoginResponse>> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| strip_scheme(h, "basic"))
        .ok_or_else(|| ApiError::Unauthorized("Missing basic token".into()))?;

    let (email, password) = decode_basic(token).map_err(|e| {
        warn!(error = %e, "undecodable basic token");
        ApiError::unauthorized()
    })?;
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::unauthorized());
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!("login unknown email");
        return Err(ApiError::BadCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::BadCredentials);
    }

    let auth_token = state.keys.sign(&user.email, user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse { auth_token }))
}
