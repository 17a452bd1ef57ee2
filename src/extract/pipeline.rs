//! Batch extraction: classify every post, then run the background and
//! admission resolvers over the relevant ones in parallel.
//!
//! Posts are independent units of work; the only shared state is the
//! read-only reference tables, so extraction fans out over blocking worker
//! tasks bounded by the core count and reassembles results in input order.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::info;

use crate::extract::admission::{AdmissionInfo, AdmissionSectionParser};
use crate::extract::background::{BackgroundResolver, GpaStats, UniversityMatch};
use crate::extract::classify::{ArticleType, classify_title};
use crate::extract::programs::normalize_program_name;
use crate::extract::tables::ReferenceTables;
use crate::ingest::Article;
use crate::rank::{ArticleRecord, ProgramRecord};
use indexmap::IndexSet;

/// A post with everything the resolvers could extract from it.
#[derive(Debug)]
pub struct ExtractedArticle {
    pub article: Article,
    pub university: Option<UniversityMatch>,
    pub major: Option<&'static str>,
    pub gpa: GpaStats,
    pub admission: Option<AdmissionInfo>,
}

/// Classify and extract a whole batch.
pub async fn extract_batch(
    tables: Arc<ReferenceTables>,
    mut articles: Vec<Article>,
) -> Result<Vec<ExtractedArticle>> {
    for article in &mut articles {
        article.article_type = classify_title(&article.article_title);
    }
    let cs = articles.iter().filter(|a| a.article_type.is_cs_related()).count();
    let admissions = articles
        .iter()
        .filter(|a| a.article_type == ArticleType::Admission)
        .count();
    let asks = articles
        .iter()
        .filter(|a| a.article_type == ArticleType::Ask)
        .count();
    info!(
        total = articles.len(),
        cs, admissions, asks, "classified article batch"
    );

    let background = Arc::new(BackgroundResolver::new(tables.clone()));
    let admission = Arc::new(AdmissionSectionParser::new(tables.clone()));
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);

    let extracted: Vec<ExtractedArticle> = futures::stream::iter(articles.into_iter().map(
        move |article| {
            let background = background.clone();
            let admission = admission.clone();
            tokio::task::spawn_blocking(move || extract_one(&background, &admission, article))
        },
    ))
    .buffered(workers)
    .map(|joined| joined.context("extraction worker panicked"))
    .collect::<Vec<_>>()
    .await
    .into_iter()
    .collect::<Result<Vec<_>>>()?;

    let with_university = extracted.iter().filter(|e| e.university.is_some()).count();
    let with_major = extracted.iter().filter(|e| e.major.is_some()).count();
    let with_gpa = extracted.iter().filter(|e| !e.gpa.is_unknown()).count();
    let with_admissions = extracted
        .iter()
        .filter(|e| e.admission.as_ref().is_some_and(|a| !a.universities.is_empty()))
        .count();
    info!(
        with_university,
        with_major, with_gpa, with_admissions, "extracted article batch"
    );

    Ok(extracted)
}

/// Run every resolver relevant to one post.
fn extract_one(
    background: &BackgroundResolver,
    admission: &AdmissionSectionParser,
    article: Article,
) -> ExtractedArticle {
    if !article.article_type.is_cs_related() {
        return ExtractedArticle {
            article,
            university: None,
            major: None,
            gpa: GpaStats::UNKNOWN,
            admission: None,
        };
    }

    let university = background.find_university(&article.content);
    let major = background.find_major(&article.content, university.as_ref());
    let gpa = background.find_gpa(&article.content, university.as_ref());

    let admission_info = (article.article_type == ArticleType::Admission).then(|| {
        let raw = admission.parse_admission_section(&article.article_title, &article.content);
        admission.resolve(&raw)
    });

    ExtractedArticle {
        article,
        university,
        major,
        gpa,
        admission: admission_info,
    }
}

/// Flatten extracted posts into the per-post records the storage collaborator
/// persists and the scoring engine reads.
pub fn build_records(
    tables: &ReferenceTables,
    extracted: &[ExtractedArticle],
) -> Vec<ArticleRecord> {
    extracted
        .iter()
        .map(|e| {
            let uni = e
                .university
                .as_ref()
                .and_then(|m| tables.tw_university(m.uni_id));
            let major = e.major.and_then(|mid| tables.major(mid));

            let (admission_universities, programs) = match &e.admission {
                Some(info) => (info.universities.clone(), build_program_rows(tables, info)),
                None => (Vec::new(), Vec::new()),
            };

            ArticleRecord {
                article_id: e.article.article_id.clone(),
                article_title: e.article.article_title.clone(),
                author: e.article.author.clone(),
                date: e.article.date,
                url: e.article.url.clone(),
                article_type: e.article.article_type,
                uni_id: uni.map(|u| u.uid.to_string()),
                uni_cname: uni.map(|u| u.cname.to_string()),
                uni_cabbr: uni.map(|u| u.cabbr.to_string()),
                major_id: major.map(|m| m.mid.to_string()),
                major_cname: major.map(|m| m.cname.to_string()),
                major_cabbr: major.map(|m| m.cabbr.to_string()),
                major_type: major.map(|m| m.mtype.to_string()),
                max_gpa: e.gpa.max,
                min_gpa: e.gpa.min,
                mean_gpa: e.gpa.mean,
                gpa_scale: e.gpa.scale,
                admission_universities,
                programs,
            }
        })
        .collect()
}

/// Normalize and deduplicate a post's program pairs into admission rows.
///
/// Uniqueness is by (university, normalized program name); the program type
/// comes from the raw name's classification, `"N/A"` when no program was
/// resolved.
fn build_program_rows(tables: &ReferenceTables, info: &AdmissionInfo) -> Vec<ProgramRecord> {
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut rows: Vec<ProgramRecord> = Vec::new();
    for pair in &info.pairs {
        let normalized = pair
            .name
            .map(|name| normalize_program_name(tables, pair.level, name));
        let key = format!(
            "{}@{}",
            pair.university,
            normalized.as_deref().unwrap_or("")
        );
        if !seen.insert(key) {
            continue;
        }
        let program_type = pair
            .name
            .and_then(|name| tables.program_type(name))
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "N/A".to_string());
        rows.push(ProgramRecord {
            university: pair.university.clone(),
            program: normalized,
            program_type,
            program_level: pair.level,
        });
    }
    rows
}
