use std::sync::Arc;

use cn_core::{Error, Result, SequenceClassifier, Tokenizer};

use crate::Config;

pub mod lexicon;

pub use lexicon::{Lexicon, LexiconClassifier};

/// A classifier together with the tokenizer whose ids it understands.
#[derive(Clone)]
pub struct LoadedModel {
    pub model: Arc<dyn SequenceClassifier>,
    pub tokenizer: Arc<dyn Tokenizer>,
}

pub fn create_model(config: &Config) -> Result<LoadedModel> {
    match config.model_name.as_str() {
        "lexicon" => {
            let lexicon = Lexicon::crypto();
            let tokenizer = lexicon.tokenizer();
            let model = LexiconClassifier::new(&lexicon, &tokenizer);
            Ok(LoadedModel {
                model: Arc::new(model),
                tokenizer: Arc::new(tokenizer),
            })
        }
        other => Err(Error::Inference(format!(
            "Unknown model: {}. Available models: lexicon",
            other
        ))),
    }
}
