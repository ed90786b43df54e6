use async_trait::async_trait;

use crate::Result;

/// A tokenized batch, padded to the longest sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedBatch {
    pub input_ids: Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u32>>,
}

impl EncodedBatch {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

pub trait Tokenizer: Send + Sync {
    /// Encode a batch of texts
    fn encode_batch(&self, texts: &[String]) -> Result<EncodedBatch>;
}

#[async_trait]
pub trait SequenceClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Number of classes in each logits row
    fn num_labels(&self) -> usize;

    /// Forward pass in inference mode: one logits row per input sequence.
    async fn logits(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>>;
}
