use async_trait::async_trait;

use crate::types::RawArticle;

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub days_back: u32,
    pub limit: usize,
    /// Only articles published at or before this UNIX time, when set.
    pub upper_bound_timestamp: Option<i64>,
    pub language: String,
    pub include_sentiment: bool,
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Returns the name of the news source
    fn name(&self) -> &str;

    /// Fetches one page of articles.
    ///
    /// Implementations log transport, status and decoding failures and
    /// report them as an empty page; callers never see an error.
    async fn fetch_page(&self, request: &PageRequest) -> Vec<RawArticle>;
}
