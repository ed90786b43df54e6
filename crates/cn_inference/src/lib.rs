use cn_core::Result;

pub mod metrics;
pub mod models;
pub mod predictor;
pub mod tokenizer;

pub use metrics::{compute_metrics, Average, Metrics};
pub use models::{create_model, LoadedModel};
pub use predictor::{predict, BatchPredictor};

#[derive(Debug, Clone)]
pub struct Config {
    pub model_name: String,
    pub batch_size: usize,
    pub average: Average,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: "lexicon".to_string(),
            batch_size: 16,
            average: Average::Weighted,
        }
    }
}

impl Config {
    pub fn predictor(&self) -> Result<BatchPredictor> {
        let loaded = create_model(self)?;
        Ok(BatchPredictor::new(loaded.model, loaded.tokenizer, self.batch_size))
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::metrics::{compute_metrics, Average, Metrics};
    pub use super::models::create_model;
    pub use super::predictor::{predict, BatchPredictor};
    pub use cn_core::{Error, Result, SentimentLabel};
}
