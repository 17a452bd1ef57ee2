//! Batch loading and cleanup of crawled forum posts.
//!
//! The crawler output is a JSON document with an `articles` array. Crawler
//! bookkeeping fields (ip, messages, message_count, board) are dropped at
//! deserialization; records missing an id or title, and records reusing an
//! id, are excluded before extraction.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use indexmap::IndexSet;
use serde::Deserialize;
use tracing::{info, warn};

use crate::extract::classify::ArticleType;

/// Crawler date format: "Mon Jul 12 10:23:45 2010".
const CRAWLER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// A raw crawled post. Unknown fields (the crawler's ip/message bookkeeping)
/// are ignored by serde.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    pub article_id: Option<String>,
    pub article_title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBatch {
    articles: Vec<RawArticle>,
}

/// A cleaned post, ready for classification and extraction.
#[derive(Debug, Clone)]
pub struct Article {
    pub article_id: String,
    pub article_title: String,
    pub author: String,
    pub content: String,
    pub url: String,
    pub date: NaiveDateTime,
    pub article_type: ArticleType,
}

/// Parse a crawler date, falling back to the epoch sentinel.
pub fn parse_article_date(raw: Option<&str>) -> NaiveDateTime {
    raw.and_then(|s| NaiveDateTime::parse_from_str(s, CRAWLER_DATE_FORMAT).ok())
        .unwrap_or(NaiveDateTime::UNIX_EPOCH)
}

/// Clean a raw batch: drop incomplete records and duplicate ids.
pub fn clean_articles(raw: Vec<RawArticle>) -> Vec<Article> {
    let total = raw.len();
    let mut seen_ids: IndexSet<String> = IndexSet::new();
    let mut incomplete = 0usize;
    let mut duplicates = 0usize;

    let mut articles: Vec<Article> = Vec::with_capacity(raw.len());
    for record in raw {
        let (Some(article_id), Some(article_title)) = (record.article_id, record.article_title)
        else {
            incomplete += 1;
            continue;
        };
        if !seen_ids.insert(article_id.clone()) {
            duplicates += 1;
            warn!(article_id, "duplicate article id, dropping record");
            continue;
        }
        articles.push(Article {
            article_id,
            article_title,
            author: record.author.unwrap_or_default(),
            content: record.content.unwrap_or_default(),
            url: record.url.unwrap_or_default(),
            date: parse_article_date(record.date.as_deref()),
            article_type: ArticleType::All,
        });
    }

    info!(
        total,
        kept = articles.len(),
        incomplete,
        duplicates,
        "cleaned article batch"
    );
    articles
}

/// Load and clean a post batch from disk.
pub fn load_articles(path: &Path) -> Result<Vec<Article>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read post batch {}", path.display()))?;
    let batch: RawBatch = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse post batch {}", path.display()))?;
    Ok(clean_articles(batch.articles))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, title: &str) -> RawArticle {
        RawArticle {
            article_id: Some(id.to_string()),
            article_title: Some(title.to_string()),
            author: Some("poster".to_string()),
            content: Some("body".to_string()),
            url: Some("https://example.test/1".to_string()),
            date: Some("Mon Jul 12 10:23:45 2010".to_string()),
        }
    }

    #[test]
    fn parses_crawler_dates() {
        let date = parse_article_date(Some("Mon Jul 12 10:23:45 2010"));
        assert_eq!(date.format("%Y-%m-%d %H:%M:%S").to_string(), "2010-07-12 10:23:45");
    }

    #[test]
    fn unparsable_dates_fall_back_to_epoch() {
        assert_eq!(parse_article_date(Some("next tuesday")), NaiveDateTime::UNIX_EPOCH);
        assert_eq!(parse_article_date(None), NaiveDateTime::UNIX_EPOCH);
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let articles = clean_articles(vec![
            raw("a1", "first"),
            raw("a1", "second with the same id"),
            raw("a2", "third"),
        ]);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].article_title, "first");
        assert_eq!(articles[1].article_id, "a2");
    }

    #[test]
    fn incomplete_records_are_dropped() {
        let mut missing_title = raw("a1", "x");
        missing_title.article_title = None;
        let mut missing_id = raw("a2", "y");
        missing_id.article_id = None;
        let articles = clean_articles(vec![missing_title, missing_id, raw("a3", "ok")]);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].article_id, "a3");
    }

    #[test]
    fn unknown_crawler_fields_are_ignored() {
        let json = r#"{"articles": [{
            "article_id": "a1",
            "article_title": "t",
            "ip": "140.112.1.2",
            "message_count": {"all": 3},
            "messages": [],
            "board": "studyabroad"
        }]}"#;
        let batch: RawBatch = serde_json::from_str(json).unwrap();
        let articles = clean_articles(batch.articles);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].date, NaiveDateTime::UNIX_EPOCH);
    }
}
