mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;
use time::{Date, Time};

time::serde::format_description!(obs_date, Date, "[year]-[month]-[day]");
time::serde::format_description!(obs_time, Time, "[hour]:[minute]:[second]");

pub fn router() -> Router<AppState> {
    handlers::observation_routes()
}
