use serde::Deserialize;
use tracing::info;

use super::{Repository, SortOrder};
use crate::models::Post;
use crate::store::{Counter, Entity, Outcome, StoreError, StoreResult};

/// Filter and ordering for [`Repository::list_posts`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PostQuery {
    pub author_id: Option<u64>,
    #[serde(default, rename = "sort")]
    pub order: SortOrder,
}

impl Repository {
    /// Stores a new chirp. The author must exist at this moment; the link is
    /// not re-checked later.
    pub async fn create_post(&self, author_id: u64, body: &str) -> StoreResult<Post> {
        let post = self
            .store
            .with_snapshot(|snapshot| {
                if !snapshot.users.contains_key(&author_id) {
                    return Err(StoreError::NotFound(Entity::User, author_id));
                }

                let id = snapshot.allocate_id(Counter::Post)?;
                let post = Post {
                    id,
                    author_id,
                    body: body.to_string(),
                };
                snapshot.posts.insert(id, post.clone());
                Ok(Outcome::Write(post))
            })
            .await?;

        info!(post_id = post.id, author_id, "chirp created");
        Ok(post)
    }

    pub async fn get_post(&self, id: u64) -> StoreResult<Post> {
        self.store
            .with_snapshot(|snapshot| {
                snapshot
                    .posts
                    .get(&id)
                    .cloned()
                    .map(Outcome::Read)
                    .ok_or(StoreError::NotFound(Entity::Post, id))
            })
            .await
    }

    /// Returns chirps sorted by numeric ID, optionally restricted to one
    /// author.
    pub async fn list_posts(&self, query: PostQuery) -> StoreResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .store
            .with_snapshot(|snapshot| {
                let posts = snapshot
                    .posts
                    .values()
                    .filter(|post| query.author_id.is_none_or(|author| post.author_id == author))
                    .cloned()
                    .collect();
                Ok(Outcome::Read(posts))
            })
            .await?;

        match query.order {
            SortOrder::Asc => posts.sort_by_key(|post| post.id),
            SortOrder::Desc => posts.sort_by(|a, b| b.id.cmp(&a.id)),
        }
        Ok(posts)
    }

    /// Removes a chirp on behalf of its author.
    pub async fn delete_post(&self, id: u64, requesting_user_id: u64) -> StoreResult<()> {
        self.store
            .with_snapshot(|snapshot| {
                let post = snapshot
                    .posts
                    .get(&id)
                    .ok_or(StoreError::NotFound(Entity::Post, id))?;

                if post.author_id != requesting_user_id {
                    return Err(StoreError::Unauthorized {
                        post_id: id,
                        user_id: requesting_user_id,
                    });
                }

                snapshot.posts.remove(&id);
                Ok(Outcome::Write(()))
            })
            .await?;

        info!(post_id = id, user_id = requesting_user_id, "chirp deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{hash, repository};
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn ids_are_sequential_and_never_reused() {
        let (_dir, repo) = repository().await;
        let author = repo.create_user("a@x.com", &hash("pw")).await.unwrap();

        let first = repo.create_post(author.id, "one").await.unwrap();
        let second = repo.create_post(author.id, "two").await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        repo.delete_post(second.id, author.id).await.unwrap();
        let third = repo.create_post(author.id, "three").await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn concurrent_creation_leaves_no_gaps() {
        let (_dir, repo) = repository().await;
        let author_id = repo.create_user("a@x.com", &hash("pw")).await.unwrap().id;

        let handles: Vec<_> = (0..24)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create_post(author_id, &format!("post {i}")).await })
            })
            .collect();

        let mut ids = BTreeSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }
        assert_eq!(ids, (1..=24).collect::<BTreeSet<u64>>());

        let listed = repo.list_posts(PostQuery::default()).await.unwrap();
        assert_eq!(listed.len(), 24);
    }

    #[tokio::test]
    async fn create_requires_existing_author() {
        let (_dir, repo) = repository().await;
        let err = repo.create_post(9, "orphan").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Entity::User, 9)));

        // the counter was not consumed
        let author = repo.create_user("a@x.com", &hash("pw")).await.unwrap();
        assert_eq!(repo.create_post(author.id, "first").await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn get_missing_post_is_not_found() {
        let (_dir, repo) = repository().await;
        assert!(matches!(
            repo.get_post(1).await,
            Err(StoreError::NotFound(Entity::Post, 1))
        ));
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let (_dir, repo) = repository().await;
        let alice = repo.create_user("alice@x.com", &hash("pw")).await.unwrap();
        let bob = repo.create_user("bob@x.com", &hash("pw")).await.unwrap();

        for (author, body) in [(alice.id, "a1"), (bob.id, "b1"), (alice.id, "a2")] {
            repo.create_post(author, body).await.unwrap();
        }

        let all = repo.list_posts(PostQuery::default()).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let alice_desc = repo
            .list_posts(PostQuery {
                author_id: Some(alice.id),
                order: SortOrder::Desc,
            })
            .await
            .unwrap();
        assert_eq!(
            alice_desc.iter().map(|p| p.body.as_str()).collect::<Vec<_>>(),
            vec!["a2", "a1"]
        );

        let nobody = repo
            .list_posts(PostQuery {
                author_id: Some(77),
                order: SortOrder::Asc,
            })
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn only_the_author_can_delete() {
        let (_dir, repo) = repository().await;
        let alice = repo.create_user("alice@x.com", &hash("pw")).await.unwrap();
        let bob = repo.create_user("bob@x.com", &hash("pw")).await.unwrap();
        let post = repo.create_post(alice.id, "mine").await.unwrap();

        let err = repo.delete_post(post.id, bob.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized { .. }));
        assert_eq!(repo.get_post(post.id).await.unwrap(), post);

        repo.delete_post(post.id, alice.id).await.unwrap();
        assert!(matches!(
            repo.get_post(post.id).await,
            Err(StoreError::NotFound(Entity::Post, _))
        ));
        assert!(matches!(
            repo.delete_post(post.id, alice.id).await,
            Err(StoreError::NotFound(Entity::Post, _))
        ));
    }
}
