use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateObservationRequest, ObservationResponse, UpdateObservationRequest},
    repo::{Observation, ObservationChanges},
};
use crate::{
    auth::extractors::{AuthUser, Viewer},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn observation_routes() -> Router<AppState> {
    Router::new()
        .route("/observations", get(list_observations).post(create_observation))
        .route("/observations/user", get(list_user_observations))
        .route(
            "/observations/:id",
            get(get_observation)
                .patch(update_observation)
                .delete(delete_observation),
        )
}

fn not_found() -> ApiError {
    ApiError::NotFound("Observation doesn't exist".into())
}

/// Ids that do not parse as a record key cannot name an existing observation.
fn observation_id(path: Result<Path<i32>, PathRejection>) -> ApiResult<i32> {
    path.map(|Path(id)| id).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "unparseable observation id");
        not_found()
    })
}

/// Loads an observation the viewer may act on. Records owned by someone
/// else are reported as missing.
async fn find_visible(state: &AppState, viewer: &Viewer, id: i32) -> ApiResult<Observation> {
    let obs = state.observations.get_by_id(id).await?.ok_or_else(not_found)?;
    match viewer.owner_id() {
        Some(owner) if obs.user_id != Some(owner) => {
            warn!(id, owner, "observation belongs to another user");
            Err(not_found())
        }
        _ => Ok(obs),
    }
}

// --- handlers ---

#[instrument(skip(state, viewer))]
pub async fn list_observations(
    State(state): State<AppState>,
    viewer: Viewer,
) -> ApiResult<Json<Vec<ObservationResponse>>> {
    let rows = match viewer.owner_id() {
        Some(owner) => state.observations.list_by_owner(owner).await?,
        None => state.observations.list().await?,
    };
    Ok(Json(rows.into_iter().map(ObservationResponse::from).collect()))
}

#[instrument(skip(state, user))]
pub async fn list_user_observations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ObservationResponse>>> {
    let rows = state.observations.list_by_owner(user.id).await?;
    Ok(Json(rows.into_iter().map(ObservationResponse::from).collect()))
}

#[instrument(skip(state, viewer, path))]
pub async fn get_observation(
    State(state): State<AppState>,
    viewer: Viewer,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<ObservationResponse>> {
    let id = observation_id(path)?;
    let obs = find_visible(&state, &viewer, id).await?;
    Ok(Json(obs.into()))
}

/// POST /observations
/// The owner comes from the authenticated caller, never from the body.
#[instrument(skip(state, viewer, payload))]
pub async fn create_observation(
    State(state): State<AppState>,
    viewer: Viewer,
    payload: Result<Json<CreateObservationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, [(header::HeaderName, String); 1], Json<ObservationResponse>)> {
    let Json(body) = payload?;
    let new = body.into_new(viewer.owner_id())?;

    let obs = state.observations.insert(new).await?;
    info!(id = obs.id, "observation created");

    let location = format!("/api/observations/{}", obs.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(obs.into()),
    ))
}

#[instrument(skip(state, viewer, path, payload))]
pub async fn update_observation(
    State(state): State<AppState>,
    viewer: Viewer,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateObservationRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let id = observation_id(path)?;
    find_visible(&state, &viewer, id).await?;

    let Json(body) = payload?;
    let changes = ObservationChanges::from(body);
    if changes.is_empty() {
        return Err(ApiError::Validation(
            "Request body is missing a required field".into(),
        ));
    }

    if !state.observations.update(id, changes).await? {
        return Err(not_found());
    }
    info!(id, "observation updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, viewer, path))]
pub async fn delete_observation(
    State(state): State<AppState>,
    viewer: Viewer,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = observation_id(path)?;
    find_visible(&state, &viewer, id).await?;
    if !state.observations.delete(id).await? {
        return Err(not_found());
    }
    info!(id, "observation deleted");
    Ok(StatusCode::NO_CONTENT)
}
