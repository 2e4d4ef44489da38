//! NewsData Client
//!
//! Latest cryptocurrency business headlines from NewsData.io.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use super::fetch_json;
use crate::application::ports::{NewsPort, UpstreamError};
use crate::domain::news::{NewsArticle, NewsFeed, normalize_published_at};
use crate::infrastructure::config::ApiKey;
use crate::infrastructure::metrics::Provider;

/// Articles requested per call.
const PAGE_SIZE: &str = "5";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeed {
    status: String,
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    results: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
}

/// NewsData.io client.
#[derive(Debug, Clone)]
pub struct NewsDataClient {
    http: Client,
    endpoint: String,
    api_key: Option<ApiKey>,
}

impl NewsDataClient {
    /// Create a client against the latest-news `endpoint`.
    ///
    /// Without an API key every request fails with
    /// [`UpstreamError::NotConfigured`].
    #[must_use]
    pub fn new(http: Client, endpoint: impl Into<String>, api_key: Option<ApiKey>) -> Self {
        if api_key.is_none() {
            tracing::warn!("NEWSDATA_API_KEY not set, news requests will fail");
        }
        Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl NewsPort for NewsDataClient {
    async fn latest_news(&self) -> Result<NewsFeed, UpstreamError> {
        let api_key = self.api_key.as_ref().ok_or(UpstreamError::NotConfigured {
            setting: "NEWSDATA_API_KEY",
        })?;

        let request = self.http.get(&self.endpoint).query(&[
            ("apikey", api_key.expose()),
            ("q", "cryptocurrency"),
            ("language", "en"),
            ("category", "business"),
            ("size", PAGE_SIZE),
        ]);
        let raw: RawFeed = fetch_json(Provider::NewsData, request).await?;

        let now = Utc::now();
        let results = raw
            .results
            .into_iter()
            .map(|article| NewsArticle {
                published_at: normalize_published_at(article.pub_date.as_deref(), now),
                title: article.title.unwrap_or_default(),
                description: article.description,
                url: article.link,
                source_id: article.source_id,
            })
            .collect::<Vec<_>>();
        tracing::debug!(articles = results.len(), "Fetched news");

        Ok(NewsFeed {
            status: raw.status,
            total_results: raw.total_results,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, key: Option<&str>) -> NewsDataClient {
        NewsDataClient::new(
            Client::new(),
            format!("{}/api/1/news", server.uri()),
            key.map(|k| ApiKey::new(k.to_string())),
        )
    }

    #[tokio::test]
    async fn articles_are_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("apikey", "secret"))
            .and(query_param("q", "cryptocurrency"))
            .and(query_param("category", "business"))
            .and(query_param("size", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "totalResults": 120,
                "results": [{
                    "title": "Bitcoin rallies",
                    "link": "https://example.com/a",
                    "description": null,
                    "source_id": "example",
                    "pubDate": "2024-03-31 08:15:00"
                }],
                "nextPage": "abc"
            })))
            .mount(&server)
            .await;

        let feed = client(&server, Some("secret")).latest_news().await.unwrap();
        assert_eq!(feed.status, "success");
        assert_eq!(feed.total_results, 120);
        let article = &feed.results[0];
        assert_eq!(article.url.as_deref(), Some("https://example.com/a"));
        assert_eq!(article.published_at, "2024-03-31T08:15:00.000Z");
        assert!(article.description.is_none());
    }

    #[tokio::test]
    async fn untitled_article_keeps_the_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "totalResults": 2,
                "results": [
                    {"title": null, "pubDate": "2024-03-31 08:15:00"},
                    {"title": "Ether steady", "pubDate": "2024-03-31 09:00:00"}
                ]
            })))
            .mount(&server)
            .await;

        let feed = client(&server, Some("secret")).latest_news().await.unwrap();
        assert_eq!(feed.results.len(), 2);
        assert_eq!(feed.results[0].title, "");
        assert_eq!(feed.results[1].title, "Ether steady");
    }

    #[tokio::test]
    async fn missing_key_fails_without_calling_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server, None).latest_news().await.unwrap_err();
        assert_eq!(
            err,
            UpstreamError::NotConfigured {
                setting: "NEWSDATA_API_KEY"
            }
        );
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server, Some("secret")).latest_news().await.unwrap_err();
        assert!(err.is_rate_limited());
    }
}
