use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use cn_core::{ArticleSource, Error, PageRequest, RawArticle, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::logging::Logger;

pub const DEFAULT_BASE_URL: &str = "https://data-api.coindesk.com";
const ARTICLE_LIST_PATH: &str = "news/v1/article/list";
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Clone)]
pub struct CoinDeskConfig {
    pub api_key: String,
    pub base_url: String,
}

impl CoinDeskConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for CoinDeskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinDeskConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct ArticleListResponse {
    #[serde(rename = "Data", default)]
    data: Vec<RawArticle>,
}

/// Client for the CoinDesk news article list endpoint.
pub struct CoinDeskSource {
    client: Client,
    api_key: String,
    endpoint: Url,
    logger: Logger,
}

impl fmt::Debug for CoinDeskSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinDeskSource")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl CoinDeskSource {
    pub fn new(config: CoinDeskConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let base = if base.path().ends_with('/') {
            base
        } else {
            Url::parse(&format!("{}/", base)).map_err(|e| Error::InvalidUrl(e.to_string()))?
        };
        let endpoint = base
            .join(ARTICLE_LIST_PATH)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key,
            endpoint,
            logger: Logger::new().with_prefix("[CoinDesk]"),
        })
    }

    pub fn page_url(&self, request: &PageRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("lang", &request.language);
            query.append_pair("limit", &request.limit.to_string());
            if let Some(bound) = request.upper_bound_timestamp {
                query.append_pair("to_ts", &bound.to_string());
            }
            if request.include_sentiment {
                query.append_pair("includeSentiment", "true");
            }
        }
        url
    }

    async fn try_fetch_page(&self, request: &PageRequest) -> Result<Vec<RawArticle>> {
        let response = self
            .client
            .get(self.page_url(request))
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::SourceUnavailable {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ArticleListResponse = serde_json::from_str(&body)?;
        Ok(parsed.data)
    }
}

/// Drops articles published before the `days_back` window. Articles without
/// a timestamp cannot be placed and are kept.
pub fn within_window(articles: Vec<RawArticle>, days_back: u32, now: i64) -> Vec<RawArticle> {
    let cutoff = now - i64::from(days_back) * SECONDS_PER_DAY;
    articles
        .into_iter()
        .filter(|article| article.published_on().map_or(true, |ts| ts >= cutoff))
        .collect()
}

#[async_trait]
impl ArticleSource for CoinDeskSource {
    fn name(&self) -> &str {
        "CoinDesk"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Vec<RawArticle> {
        match self.try_fetch_page(request).await {
            Ok(articles) => {
                self.logger
                    .info(&format!("✅ Successfully fetched {} articles", articles.len()));
                within_window(articles, request.days_back, Utc::now().timestamp())
            }
            Err(e) => {
                let status = match &e {
                    Error::SourceUnavailable { status, .. } => *status,
                    Error::Http(http) => http.status().map(|s| s.as_u16()),
                    _ => None,
                };
                tracing::error!(?status, "[CoinDesk] Error fetching articles: {}", e);
                Vec::new()
            }
        }
    }
}
