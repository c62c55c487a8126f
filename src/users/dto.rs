use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::User;
use crate::sanitize::sanitize_html;

/// Request body for user registration.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub zipcode: Option<String>,
    pub password: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub fullname: String,
    pub email: String,
    pub zipcode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            fullname: sanitize_html(&u.fullname),
            email: u.email,
            zipcode: u.zipcode,
            lat: u.lat,
            lng: u.lng,
            date_created: u.date_created,
        }
    }
}
