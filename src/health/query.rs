//! Search-backend query for the newest liveness record this instance shipped.

use super::{HealthCheckError, LIVENESS_MESSAGE};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Source,
}

#[derive(Debug, Deserialize)]
struct Source {
    timestamp: String,
}

pub(super) struct Querier {
    client: reqwest::Client,
    search_url: String,
    body: serde_json::Value,
}

impl Querier {
    pub(super) fn new(
        url: &str,
        index: &str,
        instance_id: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            search_url: search_url(url, index),
            body: search_body(instance_id),
        })
    }

    pub(super) async fn fetch_last_timestamp(&self) -> Result<DateTime<Utc>, HealthCheckError> {
        let response = self
            .client
            .post(&self.search_url)
            .json(&self.body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HealthCheckError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        parse_response(&bytes)
    }
}

fn request_error(e: reqwest::Error) -> HealthCheckError {
    if e.is_timeout() {
        HealthCheckError::Timeout
    } else {
        HealthCheckError::Request(e.to_string())
    }
}

pub(super) fn search_url(base: &str, index: &str) -> String {
    format!(
        "{}/{}/_search?filter_path=hits.hits._source.timestamp",
        base.trim_end_matches('/'),
        index
    )
}

pub(super) fn search_body(instance_id: &str) -> serde_json::Value {
    json!({
        "size": 1,
        "sort": [{ "timestamp": "desc" }],
        "query": {
            "bool": {
                "must": [
                    { "term": { "instance_uuid.keyword": instance_id } },
                    { "term": { "msg.keyword": LIVENESS_MESSAGE } }
                ]
            }
        },
        "_source": ["timestamp"]
    })
}

/// The filtered response is `{}` when nothing matched.
pub(super) fn parse_response(body: &[u8]) -> Result<DateTime<Utc>, HealthCheckError> {
    let response: SearchResponse =
        serde_json::from_slice(body).map_err(|e| HealthCheckError::Decode(e.to_string()))?;
    let hit = response
        .hits
        .hits
        .into_iter()
        .next()
        .ok_or(HealthCheckError::NoResults)?;
    DateTime::parse_from_rfc3339(&hit.source.timestamp)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| HealthCheckError::Timestamp(format!("{}: {e}", hit.source.timestamp)))
}
