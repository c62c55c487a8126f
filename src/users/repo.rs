use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub zipcode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub date_created: OffsetDateTime,
}

/// Fields supplied when registering; id and creation time are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub zipcode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<User>>;
    /// Inserts the user, returning `None` when the email is already taken.
    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, email, password_hash, zipcode, lat, lng, date_created
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, email, password_hash, zipcode, lat, lng, date_created
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        // The unique index on email settles concurrent registrations.
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (fullname, email, password_hash, zipcode, lat, lng, date_created)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (email) DO NOTHING
            RETURNING id, fullname, email, password_hash, zipcode, lat, lng, date_created
            "#,
        )
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.zipcode)
        .bind(user.lat)
        .bind(user.lng)
        .fetch_optional(&self.db)
        .await?;
        Ok(created)
    }
}
