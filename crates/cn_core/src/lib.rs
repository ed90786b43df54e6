pub mod error;
pub mod models;
pub mod normalize;
pub mod source;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::{EncodedBatch, SequenceClassifier, Tokenizer};
pub use normalize::{normalize, normalize_all};
pub use source::{ArticleSource, PageRequest};
pub use storage::DatasetSink;
pub use types::{Dataset, NormalizedArticle, RawArticle, SentimentLabel};
