//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::BlogService;
use blog_core::ports::{CommentRepository, Mailer, PostRepository, RateLimiter, TagRepository};
use blog_infra::database::DatabaseConnections;
use blog_infra::{ConsoleMailer, Fixtures, InMemoryBlogStore, InMemoryMailer};

#[cfg(feature = "postgres")]
use blog_infra::{PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository};

use crate::config::{AppConfig, MailBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub db: Option<Arc<DatabaseConnections>>,
    /// Applied to share and comment submissions. `None` disables limiting.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
}

struct Repositories {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    tags: Arc<dyn TagRepository>,
}

impl Repositories {
    fn in_memory(store: Arc<InMemoryBlogStore>) -> Self {
        Self {
            posts: store.clone(),
            comments: store.clone(),
            tags: store,
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (db, repos) = Self::repositories(config).await?;
        let mailer = Self::mailer(config)?;
        let rate_limiter = Self::rate_limiter(config);

        let blog = BlogService::new(
            repos.posts,
            repos.comments,
            repos.tags,
            mailer,
            config.mail.from.clone(),
        );

        tracing::info!("Application state initialized");

        Ok(Self {
            blog: Arc::new(blog),
            db,
            rate_limiter,
        })
    }

    /// State around an existing service, without a database.
    pub fn from_parts(blog: Arc<BlogService>, rate_limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self {
            blog,
            db: None,
            rate_limiter,
        }
    }

    async fn repositories(
        config: &AppConfig,
    ) -> anyhow::Result<(Option<Arc<DatabaseConnections>>, Repositories)> {
        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let conn = Arc::new(connections);
                    let repos = Repositories {
                        posts: Arc::new(PostgresPostRepository::new(Arc::clone(&conn.main))),
                        comments: Arc::new(PostgresCommentRepository::new(Arc::clone(&conn.main))),
                        tags: Arc::new(PostgresTagRepository::new(Arc::clone(&conn.main))),
                    };
                    return Ok((Some(conn), repos));
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        #[cfg(not(feature = "postgres"))]
        if config.database.is_some() {
            tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
        }

        let store = Arc::new(InMemoryBlogStore::new());
        if let Some(path) = &config.fixtures {
            Fixtures::from_file(path)?.load_into(&store).await?;
            tracing::info!(path = %path.display(), posts = store.post_count().await, "Fixtures loaded");
        }

        Ok((None, Repositories::in_memory(store)))
    }

    fn mailer(config: &AppConfig) -> anyhow::Result<Arc<dyn Mailer>> {
        let mailer: Arc<dyn Mailer> = match config.mail.backend {
            MailBackend::Console => Arc::new(ConsoleMailer),
            MailBackend::Memory => Arc::new(InMemoryMailer::new()),
            #[cfg(feature = "smtp")]
            MailBackend::Smtp => Arc::new(blog_infra::SmtpMailer::new(
                &blog_infra::SmtpConfig::from_env(),
            )?),
            #[cfg(not(feature = "smtp"))]
            MailBackend::Smtp => {
                tracing::warn!("Built without smtp feature - mail goes to the console");
                Arc::new(ConsoleMailer)
            }
        };
        tracing::info!(backend = ?config.mail.backend, "Mailer configured");
        Ok(mailer)
    }

    #[cfg(feature = "rate-limit")]
    fn rate_limiter(config: &AppConfig) -> Option<Arc<dyn RateLimiter>> {
        match blog_infra::InMemoryRateLimiter::new(config.rate_limit.clone()) {
            Ok(limiter) => {
                let limiter = Arc::new(limiter);
                let sweeper = limiter.clone();
                let period = config.rate_limit.window;
                actix_rt::spawn(async move {
                    let mut interval = tokio::time::interval(period);
                    loop {
                        interval.tick().await;
                        sweeper.retain_recent();
                    }
                });
                Some(limiter)
            }
            Err(e) => {
                tracing::error!("Rate limiting disabled: {}", e);
                None
            }
        }
    }

    #[cfg(not(feature = "rate-limit"))]
    fn rate_limiter(_config: &AppConfig) -> Option<Arc<dyn RateLimiter>> {
        tracing::info!("Running without rate-limit feature");
        None
    }
}
