use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{as_integer, fields, NormalizedArticle, RawArticle};
use crate::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maps one raw article onto the flat record.
///
/// Missing fields always fall back to their defaults. Only a value that is
/// present but unusable (a timestamp that is not an integer or is out of
/// range, a non-numeric counter) produces `Error::MalformedArticle`.
pub fn normalize(article: &RawArticle) -> Result<NormalizedArticle> {
    let published_timestamp = integer(article, fields::PUBLISHED_ON)?;
    let published_date = format_timestamp(published_timestamp.unwrap_or(0))?;

    Ok(NormalizedArticle {
        id: integer(article, fields::ID)?,
        guid: article.guid(),
        title: text(article, fields::TITLE),
        subtitle: text(article, fields::SUBTITLE),
        content: text(article, fields::BODY).unwrap_or_default(),
        published_date,
        published_timestamp,
        url: text(article, fields::URL),
        image_url: text(article, fields::IMAGE_URL),
        authors: text(article, fields::AUTHORS).unwrap_or_default(),
        source_id: integer(article, fields::SOURCE_ID)?,
        keywords: text(article, fields::KEYWORDS).unwrap_or_default(),
        language: text(article, fields::LANG).unwrap_or_else(|| "EN".to_string()),
        upvotes: integer(article, fields::UPVOTES)?.unwrap_or(0),
        downvotes: integer(article, fields::DOWNVOTES)?.unwrap_or(0),
        score: integer(article, fields::SCORE)?.unwrap_or(0),
        sentiment: text(article, fields::SENTIMENT).unwrap_or_else(|| "NEUTRAL".to_string()),
        status: text(article, fields::STATUS).unwrap_or_else(|| "ACTIVE".to_string()),
    })
}

/// Normalizes a batch, dropping (and logging) the articles that fail.
pub fn normalize_all(articles: &[RawArticle]) -> Vec<NormalizedArticle> {
    articles
        .iter()
        .filter_map(|article| match normalize(article) {
            Ok(normalized) => Some(normalized),
            Err(e) => {
                tracing::error!(guid = ?article.guid(), "Error processing article: {}", e);
                None
            }
        })
        .collect()
}

/// UTC rendering of a UNIX timestamp; zero is the epoch date.
pub fn format_timestamp(timestamp: i64) -> Result<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .ok_or_else(|| Error::MalformedArticle(format!("timestamp out of range: {}", timestamp)))
}

fn integer(article: &RawArticle, key: &str) -> Result<Option<i64>> {
    let Some(value) = article.get(key) else {
        return Ok(None);
    };
    as_integer(value)
        .map(Some)
        .ok_or_else(|| Error::MalformedArticle(format!("{} is not an integer: {}", key, value)))
}

fn text(article: &RawArticle, key: &str) -> Option<String> {
    match article.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawArticle {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_article_gets_defaults() {
        let article = normalize(&RawArticle::default()).unwrap();
        assert_eq!(article.id, None);
        assert_eq!(article.guid, None);
        assert_eq!(article.title, None);
        assert_eq!(article.content, "");
        assert_eq!(article.published_date, "1970-01-01 00:00:00");
        assert_eq!(article.published_timestamp, None);
        assert_eq!(article.authors, "");
        assert_eq!(article.keywords, "");
        assert_eq!(article.language, "EN");
        assert_eq!((article.upvotes, article.downvotes, article.score), (0, 0, 0));
        assert_eq!(article.sentiment, "NEUTRAL");
        assert_eq!(article.status, "ACTIVE");
    }

    #[test]
    fn test_full_article() {
        let article = normalize(&raw(json!({
            "ID": 7,
            "GUID": "https://example.com/?p=7",
            "TITLE": "Bitcoin rallies",
            "SUBTITLE": null,
            "BODY": "Prices went up.",
            "PUBLISHED_ON": 1700000000,
            "URL": "https://example.com/7",
            "IMAGE_URL": "https://example.com/7.png",
            "AUTHORS": "Jane Doe",
            "SOURCE_ID": 5,
            "KEYWORDS": "BTC|Markets",
            "LANG": "EN",
            "UPVOTES": 3,
            "DOWNVOTES": 1,
            "SCORE": 2,
            "SENTIMENT": "POSITIVE",
            "STATUS": "ACTIVE"
        })))
        .unwrap();

        assert_eq!(article.id, Some(7));
        assert_eq!(article.guid.as_deref(), Some("https://example.com/?p=7"));
        assert_eq!(article.title.as_deref(), Some("Bitcoin rallies"));
        assert_eq!(article.subtitle, None);
        assert_eq!(article.published_date, "2023-11-14 22:13:20");
        assert_eq!(article.published_timestamp, Some(1700000000));
        assert_eq!(article.source_id, Some(5));
        assert_eq!(article.keywords, "BTC|Markets");
        assert_eq!((article.upvotes, article.downvotes, article.score), (3, 1, 2));
        assert_eq!(article.sentiment, "POSITIVE");
    }

    #[test]
    fn test_unusable_timestamp_is_malformed() {
        assert!(matches!(
            normalize(&raw(json!({"PUBLISHED_ON": "tomorrow"}))),
            Err(Error::MalformedArticle(_))
        ));
        assert!(matches!(
            normalize(&raw(json!({"PUBLISHED_ON": i64::MAX}))),
            Err(Error::MalformedArticle(_))
        ));
    }

    #[test]
    fn test_lenient_scalars() {
        let article = normalize(&raw(json!({
            "UPVOTES": "4",
            "SCORE": 2.0,
            "AUTHORS": ["A", "B"],
            "TITLE": 12
        })))
        .unwrap();
        assert_eq!(article.upvotes, 4);
        assert_eq!(article.score, 2);
        assert_eq!(article.authors, "A, B");
        assert_eq!(article.title.as_deref(), Some("12"));
    }

    #[test]
    fn test_normalize_all_drops_only_bad_articles() {
        let batch = vec![
            raw(json!({"GUID": "a", "PUBLISHED_ON": 100})),
            raw(json!({"GUID": "b", "PUBLISHED_ON": "bad"})),
            raw(json!({"GUID": "c", "UPVOTES": {"n": 1}})),
            raw(json!({"GUID": "d"})),
        ];
        let normalized = normalize_all(&batch);
        let guids: Vec<_> = normalized.iter().filter_map(|a| a.guid.as_deref()).collect();
        assert_eq!(guids, vec!["a", "d"]);
    }
}
