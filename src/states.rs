use crate::{
    auth::TokenManager,
    config::Config,
    repository::Repository,
    store::{RecordStore, StoreResult},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::{Arc, atomic::AtomicUsize};

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Built once from [`Config`] and cloned into every handler. Everything
/// mutable lives behind an `Arc`, so clones share the same store, hit
/// counter and rate limiter.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub tokens: TokenManager,
    pub polka_api_key: Arc<str>,
    pub bcrypt_cost: u32,
    pub hits: Arc<AtomicUsize>,
    pub limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    /// Opens (or creates) the database file named by `config`.
    pub async fn from_config(config: &Config) -> StoreResult<Self> {
        let store = RecordStore::initialize(config.database_path()).await?;
        Ok(Self::new(store, config))
    }

    pub fn new(store: RecordStore, config: &Config) -> Self {
        let repo = Repository::new(Arc::new(store));

        Self {
            tokens: TokenManager::new(&config.jwt_secret, repo.clone()),
            repo,
            polka_api_key: Arc::from(config.polka_api_key.as_str()),
            bcrypt_cost: config.bcrypt_cost,
            hits: Arc::new(AtomicUsize::new(0)),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(config.rate_limit))),
        }
    }
}
