use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime, Time};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Observation {
    pub id: i32,
    pub species: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub date: Date,
    pub time: Time,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub date_added: OffsetDateTime,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewObservation {
    pub species: String,
    pub kind: String,
    pub date: Date,
    pub time: Time,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub user_id: Option<i32>,
}

/// Fields to change on an existing observation; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationChanges {
    pub species: Option<String>,
    pub kind: Option<String>,
    pub date: Option<Date>,
    pub time: Option<Time>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl ObservationChanges {
    pub fn is_empty(&self) -> bool {
        self.species.is_none()
            && self.kind.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.description.is_none()
            && self.lat.is_none()
            && self.lng.is_none()
    }

    pub fn apply(self, obs: &mut Observation) {
        if let Some(v) = self.species {
            obs.species = v;
        }
        if let Some(v) = self.kind {
            obs.kind = v;
        }
        if let Some(v) = self.date {
            obs.date = v;
        }
        if let Some(v) = self.time {
            obs.time = v;
        }
        if let Some(v) = self.description {
            obs.description = v;
        }
        if let Some(v) = self.lat {
            obs.lat = v;
        }
        if let Some(v) = self.lng {
            obs.lng = v;
        }
    }
}

#[async_trait]
pub trait ObservationStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Observation>>;
    async fn list_by_owner(&self, user_id: i32) -> anyhow::Result<Vec<Observation>>;
    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Observation>>;
    async fn insert(&self, obs: NewObservation) -> anyhow::Result<Observation>;
    /// Returns `false` when no row has this id.
    async fn update(&self, id: i32, changes: ObservationChanges) -> anyhow::Result<bool>;
    /// Returns `false` when no row has this id.
    async fn delete(&self, id: i32) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgObservationStore {
    db: PgPool,
}

impl PgObservationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ObservationStore for PgObservationStore {
    async fn list(&self) -> anyhow::Result<Vec<Observation>> {
        let rows = sqlx::query_as::<_, Observation>(
            r#"
            SELECT id, species, "type", date, time, description, lat, lng, date_added, user_id
            FROM observations
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_owner(&self, user_id: i32) -> anyhow::Result<Vec<Observation>> {
        let rows = sqlx::query_as::<_, Observation>(
            r#"
            SELECT id, species, "type", date, time, description, lat, lng, date_added, user_id
            FROM observations
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Observation>> {
        let row = sqlx::query_as::<_, Observation>(
            r#"
            SELECT id, species, "type", date, time, description, lat, lng, date_added, user_id
            FROM observations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert(&self, obs: NewObservation) -> anyhow::Result<Observation> {
        let row = sqlx::query_as::<_, Observation>(
            r#"
            INSERT INTO observations (species, "type", date, time, description, lat, lng, user_id, date_added)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            RETURNING id, species, "type", date, time, description, lat, lng, date_added, user_id
            "#,
        )
        .bind(&obs.species)
        .bind(&obs.kind)
        .bind(obs.date)
        .bind(obs.time)
        .bind(&obs.description)
        .bind(obs.lat)
        .bind(obs.lng)
        .bind(obs.user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, changes: ObservationChanges) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE observations SET
                species = COALESCE($2, species),
                "type" = COALESCE($3, "type"),
                date = COALESCE($4, date),
                time = COALESCE($5, time),
                description = COALESCE($6, description),
                lat = COALESCE($7, lat),
                lng = COALESCE($8, lng)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.species)
        .bind(changes.kind)
        .bind(changes.date)
        .bind(changes.time)
        .bind(changes.description)
        .bind(changes.lat)
        .bind(changes.lng)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i32) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM observations WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
