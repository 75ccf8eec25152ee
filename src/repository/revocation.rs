use chrono::Utc;
use tracing::info;

use super::Repository;
use crate::store::{Outcome, StoreResult};

impl Repository {
    /// Records `token` as revoked. Revoking again refreshes the timestamp;
    /// entries are never pruned.
    pub async fn revoke(&self, token: &str) -> StoreResult<()> {
        self.store
            .with_snapshot(|snapshot| {
                snapshot.revoked_tokens.insert(token.to_string(), Utc::now());
                Ok(Outcome::Write(()))
            })
            .await?;

        info!("refresh token revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, token: &str) -> StoreResult<bool> {
        self.store
            .with_snapshot(|snapshot| {
                Ok(Outcome::Read(snapshot.revoked_tokens.contains_key(token)))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::repository;
    use crate::store::Snapshot;

    #[tokio::test]
    async fn revocation_is_recorded_and_persisted() {
        let (_dir, repo) = repository().await;
        assert!(!repo.is_revoked("tok").await.unwrap());

        repo.revoke("tok").await.unwrap();
        assert!(repo.is_revoked("tok").await.unwrap());
        assert!(!repo.is_revoked("other").await.unwrap());

        let bytes = tokio::fs::read(repo.store().path()).await.unwrap();
        let snapshot: Snapshot = serde_json::from_slice(&bytes).unwrap();
        assert!(snapshot.revoked_tokens.contains_key("tok"));
    }

    #[tokio::test]
    async fn revoking_twice_overwrites_timestamp() {
        let (_dir, repo) = repository().await;
        repo.revoke("tok").await.unwrap();
        let first = read_time(&repo).await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.revoke("tok").await.unwrap();
        let second = read_time(&repo).await;

        assert!(second > first);
        assert!(repo.is_revoked("tok").await.unwrap());
    }

    async fn read_time(repo: &crate::repository::Repository) -> chrono::DateTime<chrono::Utc> {
        let bytes = tokio::fs::read(repo.store().path()).await.unwrap();
        let snapshot: Snapshot = serde_json::from_slice(&bytes).unwrap();
        snapshot.revoked_tokens["tok"]
    }
}
