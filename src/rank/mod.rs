//! Relevance ranking of historical admission posts against a query profile.

pub mod profile;
pub mod scoring;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::extract::classify::ArticleType;
use crate::extract::tables::ProgramLevel;

/// One persisted (university, program) admission row for a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    pub university: String,
    /// Canonical program name, absent when no program was resolved.
    pub program: Option<String>,
    /// Resolved program type, `"N/A"` when no program was resolved.
    pub program_type: String,
    pub program_level: Option<ProgramLevel>,
}

/// A post joined with its aggregated admission rows — the unit the scoring
/// engine reads. One per post in the corpus snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub article_id: String,
    pub article_title: String,
    pub author: String,
    pub date: NaiveDateTime,
    pub url: String,
    pub article_type: ArticleType,

    pub uni_id: Option<String>,
    pub uni_cname: Option<String>,
    pub uni_cabbr: Option<String>,
    pub major_id: Option<String>,
    pub major_cname: Option<String>,
    pub major_cabbr: Option<String>,
    pub major_type: Option<String>,

    /// GPA aggregates; `-1.0` is the unknown sentinel throughout.
    pub max_gpa: f64,
    pub min_gpa: f64,
    pub mean_gpa: f64,
    pub gpa_scale: f64,

    /// Deduplicated universities the post reports an admission from.
    pub admission_universities: Vec<String>,
    /// Per-(university, program) admission rows.
    pub programs: Vec<ProgramRecord>,
}

/// A ranked result: the record plus its computed relevance.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub record: ArticleRecord,
    pub score: f64,
    /// Absolute distance between the record's mean GPA and the query GPA;
    /// the secondary sort key for similar-background ranking.
    pub gpa_diff: f64,
}
