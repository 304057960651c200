//! Application state - shared across all handlers.

use std::sync::Arc;

use futures::FutureExt;

use inkwell_core::ports::{KeyVerifier, LikeRepository, PostRepository, ViewRepository};
use inkwell_core::services::{EngagementLedger, PostService};
use inkwell_infra::{
    ApiKeyVerifier, InMemoryLikeRepository, InMemoryPostRepository, InMemoryTaskQueue,
    InMemoryViewRepository, SlidingWindowRateLimiter,
};

use crate::config::AppConfig;

/// The three stores the services run against.
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub views: Arc<dyn ViewRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            posts: Arc::new(InMemoryPostRepository::new()),
            likes: Arc::new(InMemoryLikeRepository::new()),
            views: Arc::new(InMemoryViewRepository::new()),
        }
    }

    /// Connect to PostgreSQL and bootstrap the schema.
    #[cfg(feature = "postgres")]
    pub async fn postgres(config: &inkwell_infra::DatabaseConfig) -> anyhow::Result<Self> {
        use inkwell_infra::database::{
            self, PostgresLikeRepository, PostgresPostRepository, PostgresViewRepository,
        };

        let db = Arc::new(database::connect(config).await?);
        database::ensure_schema(&db).await?;

        Ok(Self {
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            likes: Arc::new(PostgresLikeRepository::new(db.clone())),
            views: Arc::new(PostgresViewRepository::new(db)),
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub engagement: Arc<EngagementLedger>,
    pub key_verifier: Arc<dyn KeyVerifier>,
    pub admin_limiter: Arc<SlidingWindowRateLimiter>,
    pub public_limiter: Arc<SlidingWindowRateLimiter>,
    pub view_queue: Arc<InMemoryTaskQueue>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build the application state with the configured store.
    ///
    /// A configured but unreachable database is an error; without a database
    /// URL the server runs on in-memory storage.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        #[cfg(feature = "postgres")]
        let repositories = match &config.database {
            Some(db_config) => Repositories::postgres(db_config).await?,
            None => {
                tracing::warn!("DATABASE_URL not set. Running with in-memory storage; data is lost on restart.");
                Repositories::in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repositories = {
            tracing::info!("Running without postgres feature - using in-memory storage");
            Repositories::in_memory()
        };

        Ok(Self::with_repositories(config, repositories))
    }

    /// Wire services, limiters and the view worker pool around the given stores.
    /// Must be called inside a Tokio runtime.
    pub fn with_repositories(config: AppConfig, repositories: Repositories) -> Self {
        let key_verifier = ApiKeyVerifier::from_csv(&config.admin_api_keys);
        if !key_verifier.is_configured() {
            tracing::warn!("ADMIN_API_KEYS not set. Protected routes will answer 500 until it is configured.");
        }

        let view_queue = Arc::new(InMemoryTaskQueue::new(config.view_queue.clone()));
        let engagement = Arc::new(EngagementLedger::new(
            repositories.posts.clone(),
            repositories.likes,
            repositories.views,
            view_queue.clone(),
            config.like_policy,
        ));

        let worker_ledger = engagement.clone();
        view_queue.start_workers(move |task| {
            let ledger = worker_ledger.clone();
            async move { ledger.run_task(task).await }.boxed()
        });

        let sweep_threshold = config.rate_limits.sweep_threshold;

        tracing::info!(
            like_policy = ?config.like_policy,
            view_workers = config.view_queue.workers,
            public_rate_limit = config.rate_limits.public_enabled,
            "Application state initialized"
        );

        Self {
            posts: Arc::new(PostService::new(repositories.posts)),
            engagement,
            key_verifier: Arc::new(key_verifier),
            admin_limiter: Arc::new(SlidingWindowRateLimiter::with_sweep_threshold(sweep_threshold)),
            public_limiter: Arc::new(SlidingWindowRateLimiter::with_sweep_threshold(sweep_threshold)),
            view_queue,
            config: Arc::new(config),
        }
    }
}
