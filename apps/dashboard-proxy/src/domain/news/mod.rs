//! News Types
//!
//! Articles as served by `/news` and the timestamp normalization applied
//! to upstream publication dates.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    /// Headline.
    pub title: String,
    /// Summary, when provided.
    pub description: Option<String>,
    /// Link to the full article.
    pub url: Option<String>,
    /// Publisher identifier, when provided.
    pub source_id: Option<String>,
    /// Publication time as ISO-8601 UTC.
    pub published_at: String,
}

/// The `/news` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    /// Upstream status string, e.g. `success`.
    pub status: String,
    /// Total matches reported by the upstream.
    pub total_results: u64,
    /// Articles in upstream order.
    pub results: Vec<NewsArticle>,
}

/// Convert an upstream publication date to ISO-8601 UTC.
///
/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS` form (taken as UTC).
/// Missing or unparseable dates fall back to `now`.
#[must_use]
pub fn normalize_published_at(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let parsed = raw.map(str::trim).and_then(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    });
    parsed
        .unwrap_or(now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    #[test_case(Some("2024-03-31 08:15:00"), "2024-03-31T08:15:00.000Z" ; "newsdata format")]
    #[test_case(Some("2024-03-31T08:15:00+02:00"), "2024-03-31T06:15:00.000Z" ; "rfc3339 with offset")]
    #[test_case(Some("yesterday"), "2024-04-01T12:00:00.000Z" ; "garbage falls back to now")]
    #[test_case(None, "2024-04-01T12:00:00.000Z" ; "missing falls back to now")]
    fn published_at_is_normalized(raw: Option<&str>, expected: &str) {
        assert_eq!(normalize_published_at(raw, now()), expected);
    }

    #[test]
    fn feed_wire_shape() {
        let feed = NewsFeed {
            status: "success".to_string(),
            total_results: 1,
            results: vec![NewsArticle {
                title: "Bitcoin rallies".to_string(),
                description: None,
                url: Some("https://example.com/a".to_string()),
                source_id: Some("example".to_string()),
                published_at: "2024-03-31T08:15:00.000Z".to_string(),
            }],
        };
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["totalResults"], 1);
        assert_eq!(json["results"][0]["publishedAt"], "2024-03-31T08:15:00.000Z");
        assert_eq!(json["results"][0]["sourceId"], "example");
    }
}
