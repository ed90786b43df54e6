use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cn_core::{ArticleSource, PageRequest, RawArticle};

use crate::logging::Logger;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Pause between two page requests.
    pub courtesy_delay: Duration,
    pub language: String,
    pub include_sentiment: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            courtesy_delay: Duration::from_secs(1),
            language: "EN".to_string(),
            include_sentiment: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_articles` reached.
    Filled,
    /// The source returned an empty page (or failed).
    Exhausted,
    /// Every article on the page had been seen already.
    NoProgress,
    /// The page was shorter than the requested batch size.
    ShortPage,
}

/// State of one collection run. Never shared between runs.
#[derive(Debug, Default)]
pub struct FetchWindow {
    collected: Vec<RawArticle>,
    seen_guids: HashSet<String>,
    upper_bound_timestamp: Option<i64>,
}

impl FetchWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collected(&self) -> &[RawArticle] {
        &self.collected
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn seen_count(&self) -> usize {
        self.seen_guids.len()
    }

    pub fn upper_bound_timestamp(&self) -> Option<i64> {
        self.upper_bound_timestamp
    }

    /// Appends, in page order, the articles with a GUID not seen before.
    /// Returns how many were appended.
    pub fn absorb(&mut self, page: &[RawArticle]) -> usize {
        let before = self.collected.len();
        for article in page {
            let Some(guid) = article.guid() else {
                continue;
            };
            if self.seen_guids.insert(guid) {
                self.collected.push(article.clone());
            }
        }
        self.collected.len() - before
    }

    /// Moves the watermark below the oldest article of `page`.
    ///
    /// The bound never moves forward: a page containing articles newer than
    /// the current bound still lowers it by one second.
    pub fn advance(&mut self, page: &[RawArticle]) {
        self.upper_bound_timestamp = match (next_upper_bound(page), self.upper_bound_timestamp) {
            (Some(next), Some(current)) if next >= current => Some(current - 1).filter(|b| *b > 0),
            (next, _) => next,
        };
    }

    pub fn into_articles(mut self, max_articles: usize) -> Vec<RawArticle> {
        self.collected.truncate(max_articles);
        self.collected
    }
}

/// One second before the oldest article on the page. Articles without a
/// timestamp count as 0, and a bound that is not positive means "unbounded".
pub fn next_upper_bound(page: &[RawArticle]) -> Option<i64> {
    let oldest = page
        .iter()
        .map(|article| article.published_on().unwrap_or(0))
        .min()
        .unwrap_or(0);
    oldest.checked_sub(1).filter(|bound| *bound > 0)
}

#[derive(Debug)]
pub struct FetchReport {
    pub articles: Vec<RawArticle>,
    pub pages: usize,
    pub stop: StopReason,
}

/// Walks a time-ordered source backwards, one page at a time, using the
/// oldest timestamp seen as the upper bound of the next request.
pub struct PaginatedFetcher {
    source: Arc<dyn ArticleSource>,
    config: FetchConfig,
    logger: Logger,
}

impl PaginatedFetcher {
    pub fn new(source: Arc<dyn ArticleSource>, config: FetchConfig) -> Self {
        let logger = Logger::new().with_prefix(format!("[{}]", source.name()));
        Self { source, config, logger }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn collect(
        &self,
        days_back: u32,
        batch_size: usize,
        max_articles: usize,
    ) -> Vec<RawArticle> {
        self.run(days_back, batch_size, max_articles).await.articles
    }

    pub async fn run(&self, days_back: u32, batch_size: usize, max_articles: usize) -> FetchReport {
        let mut window = FetchWindow::new();
        let mut pages = 0;

        let stop = loop {
            if window.len() >= max_articles {
                break StopReason::Filled;
            }
            if pages > 0 {
                tokio::time::sleep(self.config.courtesy_delay).await;
            }

            let request = PageRequest {
                days_back,
                limit: batch_size,
                upper_bound_timestamp: window.upper_bound_timestamp(),
                language: self.config.language.clone(),
                include_sentiment: self.config.include_sentiment,
            };
            self.logger.debug(&format!(
                "Requesting page {} (limit {}, before {:?})",
                pages + 1,
                batch_size,
                request.upper_bound_timestamp
            ));
            let page = self.source.fetch_page(&request).await;
            pages += 1;

            if page.is_empty() {
                break StopReason::Exhausted;
            }
            if window.absorb(&page) == 0 {
                self.logger.warn("Page contained no new articles, stopping");
                break StopReason::NoProgress;
            }
            window.advance(&page);
            self.logger.info(&format!("📰 Fetched {} articles so far", window.len()));

            if page.len() < batch_size {
                break StopReason::ShortPage;
            }
        };

        self.logger.info(&format!(
            "🏁 Collection finished after {} pages ({:?}), {} unique articles",
            pages,
            stop,
            window.len()
        ));

        FetchReport {
            articles: window.into_articles(max_articles),
            pages,
            stop,
        }
    }
}
