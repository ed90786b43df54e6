use std::collections::HashMap;

use cn_core::{EncodedBatch, Result, Tokenizer};

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

/// Lowercase word pieces of `text`; apostrophes stay inside words.
pub fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whole-word tokenizer over a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct WordTokenizer {
    vocab: HashMap<String, u32>,
    max_length: usize,
}

impl WordTokenizer {
    pub const DEFAULT_MAX_LENGTH: usize = 512;

    /// Ids are assigned in iteration order, starting after the reserved
    /// padding and unknown ids. Repeated words keep their first id.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = HashMap::new();
        for word in words {
            let next = vocab.len() as u32 + UNK_ID + 1;
            vocab.entry(word.as_ref().to_lowercase()).or_insert(next);
        }
        Self {
            vocab,
            max_length: Self::DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn token_id(&self, word: &str) -> u32 {
        self.vocab.get(word).copied().unwrap_or(UNK_ID)
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len() + 2
    }

    pub fn encode(&self, text: &str) -> Vec<u32> {
        split_words(text)
            .iter()
            .take(self.max_length)
            .map(|w| self.token_id(w))
            .collect()
    }
}

impl Tokenizer for WordTokenizer {
    fn encode_batch(&self, texts: &[String]) -> Result<EncodedBatch> {
        let encoded: Vec<Vec<u32>> = texts.iter().map(|t| self.encode(t)).collect();
        let longest = encoded.iter().map(Vec::len).max().unwrap_or(0);

        let mut batch = EncodedBatch::default();
        for mut ids in encoded {
            let mut mask = vec![1; ids.len()];
            mask.resize(longest, 0);
            ids.resize(longest, PAD_ID);
            batch.input_ids.push(ids);
            batch.attention_mask.push(mask);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words("Bitcoin's rally, isn't it? 'BTC' +5%"),
            vec!["bitcoin's", "rally", "isn't", "it", "btc", "5"]
        );
    }

    #[test]
    fn test_encode_batch_pads() {
        let tokenizer = WordTokenizer::new(["rally", "crash"]);
        let batch = tokenizer
            .encode_batch(&["Rally today".to_string(), "crash".to_string(), String::new()])
            .unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.input_ids[0], vec![2, UNK_ID]);
        assert_eq!(batch.input_ids[1], vec![3, PAD_ID]);
        assert_eq!(batch.input_ids[2], vec![PAD_ID, PAD_ID]);
        assert_eq!(batch.attention_mask, vec![vec![1, 1], vec![1, 0], vec![0, 0]]);
    }

    #[test]
    fn test_max_length_truncates() {
        let tokenizer = WordTokenizer::new(["a"]).with_max_length(2);
        assert_eq!(tokenizer.encode("a a a a").len(), 2);
        assert_eq!(tokenizer.vocab_size(), 3);
    }
}
