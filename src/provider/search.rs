// src/provider/search.rs — Google Programmable Search client

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infra::errors::DevicefixError;

const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// Web search needs two secrets (API key and search engine id). Missing
/// either leaves the client unconfigured, which makes the search stages
/// skip rather than fail.
pub struct SearchClient {
    api_key: Option<String>,
    engine_id: Option<String>,
    client: reqwest::Client,
}

impl SearchClient {
    pub fn new(api_key: Option<String>, engine_id: Option<String>) -> Self {
        Self {
            api_key,
            engine_id,
            client: reqwest::Client::new(),
        }
    }

    pub fn unconfigured() -> Self {
        Self::new(None, None)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    fn api_url(&self) -> &str {
        "https://www.googleapis.com/customsearch/v1"
    }

    /// Run a query, returning up to five title+snippet hits. Zero results
    /// is an adapter failure, not an empty success.
    pub async fn search(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<SearchHit>, DevicefixError> {
        let (Some(api_key), Some(engine_id)) = (&self.api_key, &self.engine_id) else {
            return Err(DevicefixError::adapter("search", "search not configured"));
        };

        let response = self
            .client
            .get(self.api_url())
            .query(&[
                ("key", api_key.as_str()),
                ("cx", engine_id.as_str()),
                ("q", query),
                ("num", "5"),
            ])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DevicefixError::adapter("search", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(DevicefixError::adapter(
                "search",
                format!("HTTP {status}: {error_body}"),
            ));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DevicefixError::adapter("search", format!("bad response body: {e}")))?;

        let hits = parse_hits(&resp);
        if hits.is_empty() {
            return Err(DevicefixError::adapter("search", "no results"));
        }

        Ok(hits)
    }
}

fn parse_hits(resp: &serde_json::Value) -> Vec<SearchHit> {
    resp["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .take(MAX_RESULTS)
                .filter_map(|item| {
                    let title = item["title"].as_str()?;
                    let snippet = item["snippet"].as_str().unwrap_or("");
                    Some(SearchHit {
                        title: title.to_string(),
                        snippet: snippet.to_string(),
                        link: item["link"].as_str().unwrap_or("").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
