use std::sync::Arc;

use cn_core::{Error, Result, SentimentLabel, SequenceClassifier, Tokenizer};

/// Index of the largest finite-or-infinite logit; the first one wins ties and
/// NaNs are skipped. `None` only for an empty row.
pub fn argmax(row: &[f32]) -> Option<usize> {
    if row.is_empty() {
        return None;
    }
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in row.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((i, value)),
        }
    }
    Some(best.map_or(0, |(i, _)| i))
}

/// Runs `texts` through tokenizer and model in contiguous chunks of at most
/// `batch_size`, returning one class index per text in input order.
pub async fn predict(
    texts: &[String],
    model: &dyn SequenceClassifier,
    tokenizer: &dyn Tokenizer,
    batch_size: usize,
) -> Result<Vec<usize>> {
    if batch_size == 0 {
        return Err(Error::Inference("batch size must be positive".to_string()));
    }

    let mut predictions = Vec::with_capacity(texts.len());
    for (i, chunk) in texts.chunks(batch_size).enumerate() {
        let batch = tokenizer.encode_batch(chunk)?;
        let logits = model.logits(&batch).await?;
        if logits.len() != chunk.len() {
            return Err(Error::Inference(format!(
                "{} returned {} rows for a batch of {}",
                model.name(),
                logits.len(),
                chunk.len()
            )));
        }
        for row in &logits {
            let label = argmax(row).ok_or_else(|| {
                Error::Inference(format!("{} returned an empty logits row", model.name()))
            })?;
            predictions.push(label);
        }
        tracing::debug!("🧠 Predicted batch {} ({} texts)", i + 1, chunk.len());
    }
    Ok(predictions)
}

/// A model, its tokenizer and a batch size, bundled for repeated use.
pub struct BatchPredictor {
    model: Arc<dyn SequenceClassifier>,
    tokenizer: Arc<dyn Tokenizer>,
    batch_size: usize,
}

impl BatchPredictor {
    pub fn new(
        model: Arc<dyn SequenceClassifier>,
        tokenizer: Arc<dyn Tokenizer>,
        batch_size: usize,
    ) -> Self {
        Self {
            model,
            tokenizer,
            batch_size,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub async fn predict(&self, texts: &[String]) -> Result<Vec<usize>> {
        predict(texts, self.model.as_ref(), self.tokenizer.as_ref(), self.batch_size).await
    }

    /// Predictions mapped onto sentiment labels. Fails if the model has a
    /// class index with no matching label.
    pub async fn predict_labels(&self, texts: &[String]) -> Result<Vec<SentimentLabel>> {
        self.predict(texts)
            .await?
            .into_iter()
            .map(|index| {
                SentimentLabel::from_index(index).ok_or_else(|| {
                    Error::Inference(format!("class index {} has no sentiment label", index))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cn_core::EncodedBatch;
    use std::sync::Mutex;

    /// Encodes each text as its own number, so the model can echo it back.
    struct NumberTokenizer;

    impl Tokenizer for NumberTokenizer {
        fn encode_batch(&self, texts: &[String]) -> Result<EncodedBatch> {
            let input_ids: Vec<Vec<u32>> = texts
                .iter()
                .map(|t| -> Result<Vec<u32>> {
                    let id = t
                        .parse()
                        .map_err(|_| Error::Inference(format!("not a number: {}", t)))?;
                    Ok(vec![id])
                })
                .collect::<Result<_>>()?;
            let attention_mask = input_ids.iter().map(|ids| vec![1; ids.len()]).collect();
            Ok(EncodedBatch {
                input_ids,
                attention_mask,
            })
        }
    }

    /// Puts the largest logit at `id % classes` and records batch sizes.
    struct ModuloModel {
        classes: usize,
        batches: Mutex<Vec<usize>>,
    }

    impl ModuloModel {
        fn new(classes: usize) -> Self {
            Self {
                classes,
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SequenceClassifier for ModuloModel {
        fn name(&self) -> &str {
            "modulo"
        }

        fn num_labels(&self) -> usize {
            self.classes
        }

        async fn logits(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(batch.len());
            Ok(batch
                .input_ids
                .iter()
                .map(|ids| {
                    let mut row = vec![0.0; self.classes];
                    row[ids[0] as usize % self.classes] = 1.0;
                    row
                })
                .collect())
        }
    }

    struct ShortModel;

    #[async_trait]
    impl SequenceClassifier for ShortModel {
        fn name(&self) -> &str {
            "short"
        }

        fn num_labels(&self) -> usize {
            3
        }

        async fn logits(&self, _batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0, 0.0]])
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), Some(0));
        assert_eq!(argmax(&[f32::NAN, -1.0, -2.0]), Some(1));
        assert_eq!(argmax(&[f32::NAN]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[tokio::test]
    async fn test_order_is_independent_of_batch_size() {
        let inputs = texts(7);
        let expected: Vec<usize> = (0..7).map(|i| i % 3).collect();

        for batch_size in [1, 2, 3, 7, 100] {
            let model = ModuloModel::new(3);
            let predictions = predict(&inputs, &model, &NumberTokenizer, batch_size).await.unwrap();
            assert_eq!(predictions, expected, "batch size {}", batch_size);
        }
    }

    #[tokio::test]
    async fn test_chunks_are_contiguous_and_bounded() {
        let model = ModuloModel::new(3);
        predict(&texts(7), &model, &NumberTokenizer, 3).await.unwrap();
        assert_eq!(*model.batches.lock().unwrap(), vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let model = ModuloModel::new(3);
        let predictions = predict(&[], &model, &NumberTokenizer, 4).await.unwrap();
        assert!(predictions.is_empty());
        assert!(model.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_batches() {
        let model = ModuloModel::new(3);
        assert!(matches!(
            predict(&texts(2), &model, &NumberTokenizer, 0).await,
            Err(Error::Inference(_))
        ));
        assert!(matches!(
            predict(&texts(2), &ShortModel, &NumberTokenizer, 2).await,
            Err(Error::Inference(_))
        ));
        assert!(matches!(
            predict(&["x".to_string()], &model, &NumberTokenizer, 2).await,
            Err(Error::Inference(_))
        ));
    }

    #[tokio::test]
    async fn test_predict_labels() {
        let predictor =
            BatchPredictor::new(Arc::new(ModuloModel::new(3)), Arc::new(NumberTokenizer), 2);
        let labels = predictor.predict_labels(&texts(3)).await.unwrap();
        assert_eq!(
            labels,
            vec![SentimentLabel::Negative, SentimentLabel::Neutral, SentimentLabel::Positive]
        );

        let predictor =
            BatchPredictor::new(Arc::new(ModuloModel::new(5)), Arc::new(NumberTokenizer), 2);
        assert!(predictor.predict_labels(&texts(5)).await.is_err());
    }
}
