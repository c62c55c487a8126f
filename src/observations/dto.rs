use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

use super::repo::{NewObservation, Observation, ObservationChanges};
use crate::{
    error::{ApiError, ApiResult},
    sanitize::sanitize_html,
};

/// Request body for creating an observation. Every field is required.
#[derive(Debug, Default, Deserialize)]
pub struct CreateObservationRequest {
    pub species: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, with = "super::obs_date::option")]
    pub date: Option<Date>,
    #[serde(default, with = "super::obs_time::option")]
    pub time: Option<Time>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl CreateObservationRequest {
    /// Checks fields in declaration order, naming the first one missing.
    pub fn into_new(self, user_id: Option<i32>) -> ApiResult<NewObservation> {
        let species = self.species.ok_or_else(|| ApiError::missing_field("species"))?;
        let kind = self.kind.ok_or_else(|| ApiError::missing_field("type"))?;
        let date = self.date.ok_or_else(|| ApiError::missing_field("date"))?;
        let time = self.time.ok_or_else(|| ApiError::missing_field("time"))?;
        let description = self
            .description
            .ok_or_else(|| ApiError::missing_field("description"))?;
        let lat = self.lat.ok_or_else(|| ApiError::missing_field("lat"))?;
        let lng = self.lng.ok_or_else(|| ApiError::missing_field("lng"))?;
        Ok(NewObservation {
            species,
            kind,
            date,
            time,
            description,
            lat,
            lng,
            user_id,
        })
    }
}

/// Request body for a partial update. Unknown fields are ignored; null counts as absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateObservationRequest {
    pub species: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, with = "super::obs_date::option")]
    pub date: Option<Date>,
    #[serde(default, with = "super::obs_time::option")]
    pub time: Option<Time>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<UpdateObservationRequest> for ObservationChanges {
    fn from(r: UpdateObservationRequest) -> Self {
        Self {
            species: r.species,
            kind: r.kind,
            date: r.date,
            time: r.time,
            description: r.description,
            lat: r.lat,
            lng: r.lng,
        }
    }
}

/// Observation as returned to clients, with free-text fields sanitized.
#[derive(Debug, Serialize)]
pub struct ObservationResponse {
    pub id: i32,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "super::obs_date")]
    pub date: Date,
    #[serde(with = "super::obs_time")]
    pub time: Time,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub date_added: OffsetDateTime,
    pub user_id: Option<i32>,
}

impl From<Observation> for ObservationResponse {
    fn from(o: Observation) -> Self {
        Self {
            id: o.id,
            species: sanitize_html(&o.species),
            kind: o.kind,
            date: o.date,
            time: o.time,
            description: sanitize_html(&o.description),
            lat: o.lat,
            lng: o.lng,
            date_added: o.date_added,
            user_id: o.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::{date, time};

    #[test]
    fn parses_full_create_body() {
        let req: CreateObservationRequest = serde_json::from_value(json!({
            "species": "Flicker",
            "type": "Bird",
            "date": "2021-01-08",
            "time": "07:30:00",
            "description": "Two flickers at my feeder this morning",
            "lat": 51.593,
            "lng": -123.755,
        }))
        .unwrap();
        let new = req.into_new(Some(3)).unwrap();
        assert_eq!(new.kind, "Bird");
        assert_eq!(new.date, date!(2021 - 01 - 08));
        assert_eq!(new.time, time!(07:30:00));
        assert_eq!(new.user_id, Some(3));
    }

    #[test]
    fn null_counts_as_missing() {
        let req: CreateObservationRequest = serde_json::from_value(json!({
            "species": "Flicker",
            "type": null,
        }))
        .unwrap();
        let err = req.into_new(None).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'type' in request body");
    }

    #[test]
    fn update_ignores_unknown_fields() {
        let req: UpdateObservationRequest =
            serde_json::from_value(json!({ "randomField": "foo" })).unwrap();
        assert!(ObservationChanges::from(req).is_empty());

        let req: UpdateObservationRequest =
            serde_json::from_value(json!({ "lat": 0.0, "species": "" })).unwrap();
        let changes = ObservationChanges::from(req);
        assert!(!changes.is_empty());
        assert_eq!(changes.lat, Some(0.0));
        assert_eq!(changes.species.as_deref(), Some(""));
    }
}
