use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::SearchIndex;
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::models::{Report, ReportSummary, SearchHit};

/// Elasticsearch-compatible search backend.
///
/// Documents are written with `PUT {url}/{index}/{type}/{id}` where `type`
/// is `[index].doc_type` or `_doc`. Searches send a `match` query on the
/// `text` field and keep the hit order the backend returns.
pub struct ElasticIndex {
    client: reqwest::Client,
    base_url: String,
    index_name: String,
    doc_type: Option<String>,
}

impl ElasticIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::MalformedInput("index.url required for elasticsearch".into()))?
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            index_name: config.name.clone(),
            doc_type: config.doc_type.clone(),
        })
    }

    fn document_url(&self, id: i64) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            self.index_name,
            self.doc_type.as_deref().unwrap_or("_doc"),
            id
        )
    }

    fn search_url(&self) -> String {
        match &self.doc_type {
            Some(doc_type) => format!("{}/{}/{}/_search", self.base_url, self.index_name, doc_type),
            None => format!("{}/{}/_search", self.base_url, self.index_name),
        }
    }
}

// ============ Wire format ============

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: MatchQuery<'a>,
}

#[derive(Serialize)]
struct MatchQuery<'a> {
    #[serde(rename = "match")]
    match_: MatchText<'a>,
}

#[derive(Serialize)]
struct MatchText<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    took: u64,
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Option<HitsTotal>,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// Older backends report a bare count, newer ones an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HitsTotal {
    Count(u64),
    Object { value: u64 },
}

impl HitsTotal {
    fn value(&self) -> u64 {
        match self {
            HitsTotal::Count(n) => *n,
            HitsTotal::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HitSource {
    id: i64,
    file_name: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    synopsis: String,
}

fn parse_search_response(body: &str) -> Result<Vec<SearchHit>> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
        Error::IndexUnavailable(format!("unexpected search response shape: {}", e))
    })?;

    debug!(
        total = response.hits.total.as_ref().map(HitsTotal::value),
        took_ms = response.took,
        "search response"
    );

    Ok(response
        .hits
        .hits
        .into_iter()
        .map(|hit| SearchHit {
            report: ReportSummary {
                id: hit.source.id,
                name: hit.source.name,
                author: hit.source.author,
                file_name: hit.source.file_name,
                synopsis: hit.source.synopsis,
            },
            score: hit.score.unwrap_or(0.0),
        })
        .collect())
}

async fn error_for_status(method: &str, url: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(%status, url, "search index request failed");
    Error::IndexUnavailable(format!("{} {} returned {}: {}", method, url, status, body))
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn index(&self, report: &Report) -> Result<()> {
        let url = self.document_url(report.id);
        let response = self.client.put(&url).json(report).send().await?;

        if !response.status().is_success() {
            return Err(error_for_status("PUT", &url, response).await);
        }
        debug!(id = report.id, "indexed report");
        Ok(())
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>> {
        let url = self.search_url();
        let request = SearchRequest {
            query: MatchQuery {
                match_: MatchText { text: term },
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(error_for_status("POST", &url, response).await);
        }

        let body = response.text().await?;
        parse_search_response(&body)
    }
}
