use tracing::{info, warn};

use super::Repository;
use crate::models::{User, UserRecord};
use crate::store::{Counter, CredentialFailure, Entity, Outcome, StoreError, StoreResult};

impl Repository {
    /// Registers a user. Emails are compared exactly, so addresses that
    /// differ only in case are treated as distinct.
    pub async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let user = self
            .store
            .with_snapshot(|snapshot| {
                if snapshot.users.values().any(|user| user.email == email) {
                    return Err(StoreError::Conflict(email.to_string()));
                }

                let id = snapshot.allocate_id(Counter::User)?;
                let record = UserRecord {
                    id,
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    is_privileged: false,
                };
                let user = User::from(&record);
                snapshot.users.insert(id, record);
                Ok(Outcome::Write(user))
            })
            .await?;

        info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: u64) -> StoreResult<User> {
        self.store
            .with_snapshot(|snapshot| {
                snapshot
                    .users
                    .get(&id)
                    .map(|record| Outcome::Read(User::from(record)))
                    .ok_or(StoreError::NotFound(Entity::User, id))
            })
            .await
    }

    /// Replaces a user's email and password hash. Email uniqueness is only
    /// enforced by [`Repository::create_user`].
    pub async fn update_user(
        &self,
        id: u64,
        new_email: &str,
        new_password_hash: &str,
    ) -> StoreResult<User> {
        let user = self
            .store
            .with_snapshot(|snapshot| {
                let record = snapshot
                    .users
                    .get_mut(&id)
                    .ok_or(StoreError::NotFound(Entity::User, id))?;

                record.email = new_email.to_string();
                record.password_hash = new_password_hash.to_string();
                Ok(Outcome::Write(User::from(&*record)))
            })
            .await?;

        info!(user_id = id, "user updated");
        Ok(user)
    }

    /// Checks an email/password pair. The store lock is only held for the
    /// lookup; the bcrypt comparison runs on the blocking pool afterwards.
    pub async fn authenticate(&self, email: &str, password: &str) -> StoreResult<User> {
        let record = self
            .store
            .with_snapshot(|snapshot| {
                snapshot
                    .users
                    .values()
                    .find(|user| user.email == email)
                    .cloned()
                    .map(Outcome::Read)
                    .ok_or(StoreError::InvalidCredentials(CredentialFailure::UserNotFound))
            })
            .await?;

        let password = password.to_string();
        let hash = record.password_hash.clone();
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(std::io::Error::other)?;

        match matched {
            Ok(true) => Ok(User::from(&record)),
            Ok(false) => Err(StoreError::InvalidCredentials(
                CredentialFailure::PasswordMismatch,
            )),
            Err(err) => {
                warn!(user_id = record.id, error = %err, "stored password hash is unreadable");
                Err(StoreError::InvalidCredentials(
                    CredentialFailure::PasswordMismatch,
                ))
            }
        }
    }

    /// Marks a user as a Chirpy Red member. Granting twice is a no-op
    /// that still succeeds.
    pub async fn grant_privilege(&self, id: u64) -> StoreResult<User> {
        let user = self
            .store
            .with_snapshot(|snapshot| {
                let record = snapshot
                    .users
                    .get_mut(&id)
                    .ok_or(StoreError::NotFound(Entity::User, id))?;

                record.is_privileged = true;
                Ok(Outcome::Write(User::from(&*record)))
            })
            .await?;

        info!(user_id = id, "user upgraded to chirpy red");
        Ok(user)
    }
}
