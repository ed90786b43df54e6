use async_trait::async_trait;
use crate::types::Dataset;
use crate::Result;

#[async_trait]
pub trait DatasetSink: Send + Sync {
    /// Persist a dataset at the given location
    async fn save(&self, dataset: &Dataset, location: &str) -> Result<()>;
}
