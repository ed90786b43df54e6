use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Keys of the article objects returned by the CoinDesk data API.
pub mod fields {
    pub const ID: &str = "ID";
    pub const GUID: &str = "GUID";
    pub const TITLE: &str = "TITLE";
    pub const SUBTITLE: &str = "SUBTITLE";
    pub const BODY: &str = "BODY";
    pub const PUBLISHED_ON: &str = "PUBLISHED_ON";
    pub const URL: &str = "URL";
    pub const IMAGE_URL: &str = "IMAGE_URL";
    pub const AUTHORS: &str = "AUTHORS";
    pub const SOURCE_ID: &str = "SOURCE_ID";
    pub const KEYWORDS: &str = "KEYWORDS";
    pub const LANG: &str = "LANG";
    pub const UPVOTES: &str = "UPVOTES";
    pub const DOWNVOTES: &str = "DOWNVOTES";
    pub const SCORE: &str = "SCORE";
    pub const SENTIMENT: &str = "SENTIMENT";
    pub const STATUS: &str = "STATUS";
}

/// An article exactly as the source returned it.
///
/// Nothing about the shape is guaranteed, so every accessor treats a missing
/// key and an explicit `null` the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawArticle(Map<String, Value>);

impl RawArticle {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Identity used for deduplication. Numeric GUIDs are stringified.
    pub fn guid(&self) -> Option<String> {
        match self.get(fields::GUID)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn published_on(&self) -> Option<i64> {
        self.get(fields::PUBLISHED_ON).and_then(as_integer)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Integers, integral floats and numeric strings all count as integers.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

impl From<Map<String, Value>> for RawArticle {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Flat, typed view of one article. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub id: Option<i64>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: String,
    pub published_date: String,
    pub published_timestamp: Option<i64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub authors: String,
    pub source_id: Option<i64>,
    pub keywords: String,
    pub language: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub score: i64,
    pub sentiment: String,
    pub status: String,
}

impl NormalizedArticle {
    /// Title and body joined by a newline, as fed to the classifier.
    pub fn text(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("{}\n{}", title, self.content),
            _ => self.content.clone(),
        }
    }

    pub fn sentiment_label(&self) -> Option<SentimentLabel> {
        self.sentiment.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Class index used by the classifiers' logits.
    pub fn index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Neutral => 1,
            Self::Positive => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
            Self::Positive => "POSITIVE",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEGATIVE" => Ok(Self::Negative),
            "NEUTRAL" => Ok(Self::Neutral),
            "POSITIVE" => Ok(Self::Positive),
            other => Err(Error::MalformedArticle(format!("unknown sentiment label: {}", other))),
        }
    }
}

/// The tabular output of one collection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    articles: Vec<NormalizedArticle>,
}

impl Dataset {
    pub fn new(articles: Vec<NormalizedArticle>) -> Self {
        Self { articles }
    }

    pub fn articles(&self) -> &[NormalizedArticle] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Number of articles per raw sentiment label.
    pub fn sentiment_distribution(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for article in &self.articles {
            *counts.entry(article.sentiment.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Texts and labels of the articles carrying a recognised sentiment,
    /// in dataset order.
    pub fn labeled_texts(&self) -> (Vec<String>, Vec<SentimentLabel>) {
        self.articles
            .iter()
            .filter_map(|a| a.sentiment_label().map(|label| (a.text(), label)))
            .unzip()
    }

    pub fn into_articles(self) -> Vec<NormalizedArticle> {
        self.articles
    }
}

impl FromIterator<NormalizedArticle> for Dataset {
    fn from_iter<I: IntoIterator<Item = NormalizedArticle>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawArticle {
        serde_json::from_value(value).unwrap()
    }

    fn article(title: &str, sentiment: &str) -> NormalizedArticle {
        NormalizedArticle {
            id: None,
            guid: Some(title.to_string()),
            title: Some(title.to_string()),
            subtitle: None,
            content: "body".to_string(),
            published_date: "1970-01-01 00:00:00".to_string(),
            published_timestamp: None,
            url: None,
            image_url: None,
            authors: String::new(),
            source_id: None,
            keywords: String::new(),
            language: "EN".to_string(),
            upvotes: 0,
            downvotes: 0,
            score: 0,
            sentiment: sentiment.to_string(),
            status: "ACTIVE".to_string(),
        }
    }

    #[test]
    fn test_guid_accepts_strings_and_numbers() {
        assert_eq!(raw(json!({"GUID": "abc"})).guid().as_deref(), Some("abc"));
        assert_eq!(raw(json!({"GUID": 42})).guid().as_deref(), Some("42"));
        assert_eq!(raw(json!({"GUID": null})).guid(), None);
        assert_eq!(raw(json!({})).guid(), None);
    }

    #[test]
    fn test_published_on_ignores_non_integers() {
        assert_eq!(raw(json!({"PUBLISHED_ON": 1700000000})).published_on(), Some(1700000000));
        assert_eq!(raw(json!({"PUBLISHED_ON": "yesterday"})).published_on(), None);
        assert_eq!(raw(json!({"PUBLISHED_ON": 1.5})).published_on(), None);
    }

    #[test]
    fn test_published_on_matches_normalized_timestamp() {
        for value in [json!(1700000000), json!("1700000000"), json!(1.7e9), json!(" 1700000000 ")] {
            let article = raw(json!({"GUID": "g", "PUBLISHED_ON": value}));
            let normalized = crate::normalize(&article).unwrap();
            assert_eq!(article.published_on(), normalized.published_timestamp);
            assert_eq!(article.published_on(), Some(1700000000));
        }
    }

    #[test]
    fn test_sentiment_label_parsing() {
        assert_eq!("positive".parse::<SentimentLabel>().unwrap(), SentimentLabel::Positive);
        assert_eq!(" NEGATIVE ".parse::<SentimentLabel>().unwrap(), SentimentLabel::Negative);
        assert!("MIXED".parse::<SentimentLabel>().is_err());
        for label in SentimentLabel::ALL {
            assert_eq!(SentimentLabel::from_index(label.index()), Some(label));
        }
        assert_eq!(SentimentLabel::from_index(3), None);
    }

    #[test]
    fn test_dataset_distribution_and_labels() {
        let dataset: Dataset = vec![
            article("a", "POSITIVE"),
            article("b", "NEUTRAL"),
            article("c", "POSITIVE"),
            article("d", "UNKNOWN"),
        ]
        .into_iter()
        .collect();

        let distribution = dataset.sentiment_distribution();
        assert_eq!(distribution["POSITIVE"], 2);
        assert_eq!(distribution["NEUTRAL"], 1);
        assert_eq!(distribution["UNKNOWN"], 1);

        let (texts, labels) = dataset.labeled_texts();
        assert_eq!(texts, vec!["a\nbody", "b\nbody", "c\nbody"]);
        assert_eq!(
            labels,
            vec![SentimentLabel::Positive, SentimentLabel::Neutral, SentimentLabel::Positive]
        );
    }
}
