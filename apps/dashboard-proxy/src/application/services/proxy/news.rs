//! News proxy (`/news`).

use std::sync::Arc;

use tracing::instrument;

use super::{ProxyError, Served, UpstreamPacing, serve_with_cache};
use crate::application::ports::{ClockPort, NewsPort};
use crate::domain::cache::{Fingerprint, NEWS_TTL, ResponseCache};
use crate::domain::news::NewsFeed;

const FAILURE_MESSAGE: &str = "Failed to fetch news";

/// Cached proxy over the news provider. The feed has a single entry.
pub struct NewsProxy {
    upstream: Arc<dyn NewsPort>,
    clock: Arc<dyn ClockPort>,
    pacing: UpstreamPacing,
    cache: ResponseCache<NewsFeed>,
}

impl NewsProxy {
    /// Create the proxy with an empty cache.
    #[must_use]
    pub fn new(upstream: Arc<dyn NewsPort>, clock: Arc<dyn ClockPort>, pacing: UpstreamPacing) -> Self {
        Self {
            upstream,
            clock,
            pacing,
            cache: ResponseCache::new(NEWS_TTL),
        }
    }

    /// The response cache.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache<NewsFeed> {
        &self.cache
    }

    /// Serve the latest news.
    ///
    /// # Errors
    ///
    /// `RateLimited` / `Upstream` when the provider fails and no feed is
    /// cached.
    #[instrument(skip(self))]
    pub async fn news(&self) -> Result<Served<NewsFeed>, ProxyError> {
        let upstream = self.upstream.as_ref();
        serve_with_cache(
            &self.cache,
            self.clock.as_ref(),
            Fingerprint::news(),
            self.pacing,
            |_| FAILURE_MESSAGE,
            move || upstream.latest_news(),
        )
        .await
    }
}
