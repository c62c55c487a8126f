use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::{
    observations::repo::{NewObservation, Observation, ObservationChanges, ObservationStore},
    users::repo::{NewUser, User, UserStore},
};

struct Table<T> {
    rows: Vec<T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Table<User>>,
    observations: RwLock<Table<Observation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        if users.rows.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let created = User {
            id: users.allocate_id(),
            fullname: user.fullname,
            email: user.email,
            password_hash: user.password_hash,
            zipcode: user.zipcode,
            lat: user.lat,
            lng: user.lng,
            date_created: OffsetDateTime::now_utc(),
        };
        users.rows.push(created.clone());
        Ok(Some(created))
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Observation>> {
        Ok(self.observations.read().await.rows.clone())
    }

    async fn list_by_owner(&self, user_id: i32) -> anyhow::Result<Vec<Observation>> {
        let observations = self.observations.read().await;
        Ok(observations
            .rows
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Observation>> {
        let observations = self.observations.read().await;
        Ok(observations.rows.iter().find(|o| o.id == id).cloned())
    }

    async fn insert(&self, obs: NewObservation) -> anyhow::Result<Observation> {
        let mut observations = self.observations.write().await;
        let created = Observation {
            id: observations.allocate_id(),
            species: obs.species,
            kind: obs.kind,
            date: obs.date,
            time: obs.time,
            description: obs.description,
            lat: obs.lat,
            lng: obs.lng,
            date_added: OffsetDateTime::now_utc(),
            user_id: obs.user_id,
        };
        observations.rows.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: ObservationChanges) -> anyhow::Result<bool> {
        let mut observations = self.observations.write().await;
        match observations.rows.iter_mut().find(|o| o.id == id) {
            Some(obs) => {
                changes.apply(obs);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i32) -> anyhow::Result<bool> {
        let mut observations = self.observations.write().await;
        let before = observations.rows.len();
        observations.rows.retain(|o| o.id != id);
        Ok(observations.rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            fullname: "Test User".into(),
            email: email.into(),
            password_hash: "hash".into(),
            zipcode: "97203".into(),
            lat: None,
            lng: None,
        }
    }

    fn new_observation(user_id: Option<i32>) -> NewObservation {
        NewObservation {
            species: "Robin".into(),
            kind: "Bird".into(),
            date: date!(2020 - 12 - 25),
            time: time!(08:30:00),
            description: "I saw a robin at my feeder".into(),
            lat: 45.593,
            lng: -122.755,
            user_id,
        }
    }

    #[tokio::test]
    async fn user_insert_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let first = UserStore::insert(&store, new_user("a@example.com")).await.unwrap();
        assert_eq!(first.map(|u| u.id), Some(1));
        let second = UserStore::insert(&store, new_user("a@example.com")).await.unwrap();
        assert!(second.is_none());
        let found = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(UserStore::get_by_id(&store, found.id).await.unwrap().unwrap().email, "a@example.com");
    }

    #[tokio::test]
    async fn observations_are_scoped_by_owner() {
        let store = MemoryStore::new();
        ObservationStore::insert(&store, new_observation(Some(1))).await.unwrap();
        ObservationStore::insert(&store, new_observation(Some(2))).await.unwrap();
        ObservationStore::insert(&store, new_observation(None)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 3);
        let mine = store.list_by_owner(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, Some(1));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = MemoryStore::new();
        let obs = ObservationStore::insert(&store, new_observation(None)).await.unwrap();
        let changes = ObservationChanges {
            species: Some("Skunk".into()),
            ..Default::default()
        };
        assert!(store.update(obs.id, changes.clone()).await.unwrap());
        assert!(!store.update(999, changes).await.unwrap());

        let updated = ObservationStore::get_by_id(&store, obs.id).await.unwrap().unwrap();
        assert_eq!(updated.species, "Skunk");
        assert_eq!(updated.description, obs.description);

        assert!(store.delete(obs.id).await.unwrap());
        assert!(!store.delete(obs.id).await.unwrap());
    }
}
