use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{PublicUser, RegisterRequest},
    password_policy::validate_password,
    repo::NewUser,
};
use crate::{
    auth::{extractors::AuthUser, password::hash_password},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(get_me))
}

/// Returns the value of a required text field, treating an empty string as missing.
fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_field(field))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, [(header::HeaderName, String); 1], Json<PublicUser>)> {
    let Json(body) = payload?;

    let fullname = required(body.fullname, "fullname")?;
    let email = required(body.email, "email")?;
    let zipcode = required(body.zipcode, "zipcode")?;
    let password = required(body.password, "password")?;

    validate_password(&password).map_err(|msg| ApiError::Validation(msg.into()))?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!("email already registered");
        return Err(ApiError::Conflict("Email already taken".into()));
    }

    let password_hash = hash_password(&password)?;
    let user = state
        .users
        .insert(NewUser {
            fullname,
            email,
            password_hash,
            zipcode,
            lat: body.lat,
            lng: body.lng,
        })
        .await?
        // lost a race with a concurrent registration
        .ok_or_else(|| ApiError::Conflict("Email already taken".into()))?;

    info!(user_id = user.id, "user registered");
    let location = format!("/api/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(PublicUser::from(user)),
    ))
}

#[instrument(skip(user))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}
