use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::{error::ApiError, state::AppState, users::repo::User};

/// Strips a case-insensitive auth scheme such as `Bearer ` from a header value.
pub(crate) fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let prefix = header.get(..scheme.len() + 1)?;
    if prefix.eq_ignore_ascii_case(&format!("{} ", scheme)) {
        Some(&header[scheme.len() + 1..])
    } else {
        None
    }
}

/// Verifies the bearer token and resolves the user it was issued to.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| strip_scheme(h, "bearer"))
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;

        let claims = state.keys.verify(token.trim()).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            ApiError::unauthorized()
        })?;

        let user = state
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = claims.user_id, "token subject has no user");
                ApiError::unauthorized()
            })?;

        Ok(AuthUser(user))
    }
}

/// The caller as seen by observation routes: the authenticated user when
/// owner scoping is enabled, anonymous otherwise.
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn owner_id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.config.owner_scoping {
            return Ok(Viewer(None));
        }
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        Ok(Viewer(Some(user)))
    }
}
