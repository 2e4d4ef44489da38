//! News Port (Driven Port)
//!
//! Interface to the news provider.

use async_trait::async_trait;

use super::UpstreamError;
use crate::domain::news::NewsFeed;

/// Port for the latest cryptocurrency business news.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsPort: Send + Sync {
    /// Fetch the latest articles.
    async fn latest_news(&self) -> Result<NewsFeed, UpstreamError>;
}
