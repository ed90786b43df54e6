use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use cn_core::{EncodedBatch, Error, Result, SentimentLabel, SequenceClassifier};

use crate::tokenizer::WordTokenizer;

const POSITIVE_WORDS: &[(&str, f32)] = &[
    ("bullish", 0.8),
    ("surge", 0.7),
    ("surges", 0.7),
    ("rally", 0.7),
    ("rallies", 0.7),
    ("soar", 0.8),
    ("soars", 0.8),
    ("gain", 0.5),
    ("gains", 0.5),
    ("profit", 0.6),
    ("growth", 0.6),
    ("rise", 0.5),
    ("rises", 0.5),
    ("record", 0.6),
    ("high", 0.4),
    ("upgrade", 0.6),
    ("adoption", 0.5),
    ("approval", 0.6),
    ("approved", 0.6),
    ("breakout", 0.6),
    ("recovery", 0.5),
    ("rebound", 0.5),
    ("inflows", 0.5),
    ("partnership", 0.4),
    ("launch", 0.3),
    ("strong", 0.5),
    ("optimistic", 0.6),
];

const NEGATIVE_WORDS: &[(&str, f32)] = &[
    ("bearish", -0.8),
    ("crash", -0.9),
    ("crashes", -0.9),
    ("plunge", -0.8),
    ("plunges", -0.8),
    ("drop", -0.6),
    ("drops", -0.6),
    ("fall", -0.5),
    ("falls", -0.5),
    ("decline", -0.6),
    ("loss", -0.6),
    ("losses", -0.6),
    ("hack", -0.8),
    ("hacked", -0.8),
    ("exploit", -0.8),
    ("lawsuit", -0.6),
    ("ban", -0.7),
    ("fraud", -0.9),
    ("scam", -0.9),
    ("liquidation", -0.6),
    ("liquidations", -0.6),
    ("outflows", -0.5),
    ("selloff", -0.7),
    ("fear", -0.6),
    ("crisis", -0.8),
    ("weak", -0.5),
    ("bankruptcy", -0.9),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "cannot", "can't", "don't", "doesn't", "didn't", "won't", "isn't",
    "aren't", "wasn't", "hardly",
];

const INTENSIFIERS: &[(&str, f32)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("sharply", 1.5),
    ("massive", 1.7),
    ("significantly", 1.5),
    ("slightly", 0.5),
    ("modest", 0.7),
];

/// Word scores plus the negation and intensifier words that modify the
/// next scored word.
#[derive(Debug, Clone)]
pub struct Lexicon {
    scores: HashMap<String, f32>,
    negations: HashSet<String>,
    intensifiers: HashMap<String, f32>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::crypto()
    }
}

impl Lexicon {
    pub fn crypto() -> Self {
        Self {
            scores: POSITIVE_WORDS
                .iter()
                .chain(NEGATIVE_WORDS)
                .map(|(w, s)| (w.to_string(), *s))
                .collect(),
            negations: NEGATIONS.iter().map(|w| w.to_string()).collect(),
            intensifiers: INTENSIFIERS.iter().map(|(w, m)| (w.to_string(), *m)).collect(),
        }
    }

    /// Every word the lexicon reacts to, sorted.
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self
            .scores
            .keys()
            .chain(&self.negations)
            .chain(self.intensifiers.keys())
            .map(String::as_str)
            .collect();
        words.sort_unstable();
        words.dedup();
        words
    }

    pub fn tokenizer(&self) -> WordTokenizer {
        WordTokenizer::new(self.words())
    }
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Score(f32),
    Negation,
    Intensifier(f32),
}

/// Three-class classifier over token ids, scoring words from a `Lexicon`.
///
/// Logits are `[-s, margin - |s|, s]` for the summed score `s`, in
/// `SentimentLabel` index order.
pub struct LexiconClassifier {
    roles: HashMap<u32, Role>,
    neutral_margin: f32,
}

impl fmt::Debug for LexiconClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexiconClassifier")
            .field("words", &self.roles.len())
            .field("neutral_margin", &self.neutral_margin)
            .finish()
    }
}

impl LexiconClassifier {
    pub const DEFAULT_NEUTRAL_MARGIN: f32 = 0.5;

    pub fn new(lexicon: &Lexicon, tokenizer: &WordTokenizer) -> Self {
        let mut roles = HashMap::new();
        for (word, score) in &lexicon.scores {
            roles.insert(tokenizer.token_id(word), Role::Score(*score));
        }
        for word in &lexicon.negations {
            roles.insert(tokenizer.token_id(word), Role::Negation);
        }
        for (word, multiplier) in &lexicon.intensifiers {
            roles.insert(tokenizer.token_id(word), Role::Intensifier(*multiplier));
        }
        roles.remove(&crate::tokenizer::UNK_ID);
        Self {
            roles,
            neutral_margin: Self::DEFAULT_NEUTRAL_MARGIN,
        }
    }

    pub fn with_neutral_margin(mut self, margin: f32) -> Self {
        self.neutral_margin = margin;
        self
    }

    fn score(&self, ids: &[u32], mask: &[u32]) -> f32 {
        let mut total = 0.0;
        let mut negate = false;
        let mut multiplier = 1.0;

        for (id, _) in ids.iter().zip(mask).filter(|(_, m)| **m != 0) {
            match self.roles.get(id) {
                Some(Role::Negation) => negate = true,
                Some(Role::Intensifier(m)) => multiplier = *m,
                Some(Role::Score(s)) => {
                    let s = if negate { -s } else { *s };
                    total += s * multiplier;
                    negate = false;
                    multiplier = 1.0;
                }
                None => {}
            }
        }
        total
    }
}

#[async_trait]
impl SequenceClassifier for LexiconClassifier {
    fn name(&self) -> &str {
        "Lexicon"
    }

    fn num_labels(&self) -> usize {
        SentimentLabel::ALL.len()
    }

    async fn logits(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        if batch.input_ids.len() != batch.attention_mask.len() {
            return Err(Error::Inference("attention mask does not match input ids".to_string()));
        }
        Ok(batch
            .input_ids
            .iter()
            .zip(&batch.attention_mask)
            .map(|(ids, mask)| {
                let s = self.score(ids, mask);
                vec![-s, self.neutral_margin - s.abs(), s]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_core::Tokenizer;

    fn label(logits: &[f32]) -> SentimentLabel {
        let index = crate::predictor::argmax(logits).unwrap();
        SentimentLabel::from_index(index).unwrap()
    }

    async fn classify(text: &str) -> SentimentLabel {
        let lexicon = Lexicon::crypto();
        let tokenizer = lexicon.tokenizer();
        let model = LexiconClassifier::new(&lexicon, &tokenizer);
        let batch = tokenizer.encode_batch(&[text.to_string()]).unwrap();
        label(&model.logits(&batch).await.unwrap()[0])
    }

    #[tokio::test]
    async fn test_lexicon_classifier() {
        assert_eq!(classify("Bitcoin rallies to a record high").await, SentimentLabel::Positive);
        assert_eq!(classify("Exchange hacked, tokens plunge").await, SentimentLabel::Negative);
        assert_eq!(classify("The committee meets on Tuesday").await, SentimentLabel::Neutral);
        assert_eq!(classify("ETF approval is not bullish").await, SentimentLabel::Neutral);
        assert_eq!(classify("Analysts are not optimistic").await, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn test_padding_is_ignored() {
        let lexicon = Lexicon::crypto();
        let tokenizer = lexicon.tokenizer();
        let model = LexiconClassifier::new(&lexicon, &tokenizer);
        let rally = tokenizer.token_id("rally");

        let batch = EncodedBatch {
            input_ids: vec![vec![rally, rally]],
            attention_mask: vec![vec![1, 0]],
        };
        let logits = model.logits(&batch).await.unwrap();
        assert_eq!(logits[0][2], 0.7);
    }

    #[test]
    fn test_words_are_sorted_and_unique() {
        let lexicon = Lexicon::crypto();
        let words = lexicon.words();
        assert!(words.windows(2).all(|w| w[0] < w[1]));
        assert!(words.contains(&"not"));
    }
}
