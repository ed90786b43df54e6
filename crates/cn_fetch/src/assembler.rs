use std::sync::Arc;

use cn_core::{normalize_all, ArticleSource, Dataset, DatasetSink, Result};

use crate::engine::{FetchConfig, PaginatedFetcher};
use crate::logging::Logger;

pub const DEFAULT_DATASET_PATH: &str = "crypto_sentiment_dataset.csv";
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Fetches, normalizes and persists one dataset.
pub struct DatasetAssembler {
    fetcher: PaginatedFetcher,
    sink: Arc<dyn DatasetSink>,
    output: String,
    batch_size: usize,
    logger: Logger,
}

impl DatasetAssembler {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        sink: Arc<dyn DatasetSink>,
        config: FetchConfig,
    ) -> Self {
        Self {
            fetcher: PaginatedFetcher::new(source, config),
            sink,
            output: DEFAULT_DATASET_PATH.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            logger: Logger::new().with_prefix("[dataset]"),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns `Ok(None)` when nothing could be fetched; only sink failures
    /// are reported as errors.
    pub async fn build(&self, days_back: u32, max_articles: usize) -> Result<Option<Dataset>> {
        let articles = self
            .fetcher
            .collect(days_back, self.batch_size, max_articles)
            .await;

        if articles.is_empty() {
            self.logger.error("No articles fetched, cannot create dataset");
            return Ok(None);
        }

        let dataset = Dataset::new(normalize_all(&articles));
        if dataset.len() < articles.len() {
            self.logger.warn(&format!(
                "Dropped {} malformed articles",
                articles.len() - dataset.len()
            ));
        }

        self.sink.save(&dataset, &self.output).await?;

        self.logger.info(&format!(
            "📊 Dataset sentiment distribution: {:?}",
            dataset.sentiment_distribution()
        ));

        Ok(Some(dataset))
    }
}
