//! Postgres persistence for the three record streams: per-post enriched
//! articles, per-post admission universities, and per-post admission
//! program rows.
//!
//! The engine itself never touches the database; it hands records here
//! after extraction and reads a corpus snapshot back at serve time. With no
//! database configured the snapshot simply stays in memory.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;

use crate::extract::classify::ArticleType;
use crate::extract::tables::ProgramLevel;
use crate::rank::{ArticleRecord, ProgramRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    article_id    TEXT PRIMARY KEY,
    article_title TEXT NOT NULL,
    author        TEXT NOT NULL,
    date          TIMESTAMP NOT NULL,
    url           TEXT NOT NULL,
    article_type  TEXT NOT NULL,
    uni_id        TEXT,
    uni_cname     TEXT,
    uni_cabbr     TEXT,
    major_id      TEXT,
    major_cname   TEXT,
    major_cabbr   TEXT,
    major_type    TEXT,
    max_gpa       DOUBLE PRECISION NOT NULL,
    min_gpa       DOUBLE PRECISION NOT NULL,
    mean_gpa      DOUBLE PRECISION NOT NULL,
    gpa_scale     DOUBLE PRECISION NOT NULL
);
CREATE TABLE IF NOT EXISTS admission_universities (
    id         SERIAL PRIMARY KEY,
    article_id TEXT NOT NULL REFERENCES articles(article_id) ON DELETE CASCADE,
    university TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS admission_programs (
    id            SERIAL PRIMARY KEY,
    article_id    TEXT NOT NULL REFERENCES articles(article_id) ON DELETE CASCADE,
    university    TEXT NOT NULL,
    program_level TEXT,
    program       TEXT,
    program_type  TEXT NOT NULL
);
"#;

/// Create the tables when missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("failed to create storage schema")?;
    Ok(())
}

/// Replace the persisted corpus with a freshly extracted one.
///
/// Runs in one transaction: a crash mid-dump leaves the previous corpus
/// intact.
pub async fn replace_corpus(pool: &PgPool, records: &[ArticleRecord]) -> Result<()> {
    ensure_schema(pool).await?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query("TRUNCATE articles, admission_universities, admission_programs")
        .execute(&mut *tx)
        .await
        .context("failed to truncate corpus tables")?;

    if !records.is_empty() {
        let ids: Vec<&str> = records.iter().map(|r| r.article_id.as_str()).collect();
        let titles: Vec<&str> = records.iter().map(|r| r.article_title.as_str()).collect();
        let authors: Vec<&str> = records.iter().map(|r| r.author.as_str()).collect();
        let dates: Vec<chrono::NaiveDateTime> = records.iter().map(|r| r.date).collect();
        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        let types: Vec<&str> = records.iter().map(|r| r.article_type.as_str()).collect();
        let uni_ids: Vec<Option<&str>> = records.iter().map(|r| r.uni_id.as_deref()).collect();
        let uni_cnames: Vec<Option<&str>> =
            records.iter().map(|r| r.uni_cname.as_deref()).collect();
        let uni_cabbrs: Vec<Option<&str>> =
            records.iter().map(|r| r.uni_cabbr.as_deref()).collect();
        let major_ids: Vec<Option<&str>> = records.iter().map(|r| r.major_id.as_deref()).collect();
        let major_cnames: Vec<Option<&str>> =
            records.iter().map(|r| r.major_cname.as_deref()).collect();
        let major_cabbrs: Vec<Option<&str>> =
            records.iter().map(|r| r.major_cabbr.as_deref()).collect();
        let major_types: Vec<Option<&str>> =
            records.iter().map(|r| r.major_type.as_deref()).collect();
        let max_gpas: Vec<f64> = records.iter().map(|r| r.max_gpa).collect();
        let min_gpas: Vec<f64> = records.iter().map(|r| r.min_gpa).collect();
        let mean_gpas: Vec<f64> = records.iter().map(|r| r.mean_gpa).collect();
        let gpa_scales: Vec<f64> = records.iter().map(|r| r.gpa_scale).collect();

        sqlx::query(
            r#"
            INSERT INTO articles (
                article_id, article_title, author, date, url, article_type,
                uni_id, uni_cname, uni_cabbr, major_id, major_cname, major_cabbr,
                major_type, max_gpa, min_gpa, mean_gpa, gpa_scale
            )
            SELECT * FROM UNNEST(
                $1::text[], $2::text[], $3::text[], $4::timestamp[], $5::text[], $6::text[],
                $7::text[], $8::text[], $9::text[], $10::text[], $11::text[], $12::text[],
                $13::text[], $14::float8[], $15::float8[], $16::float8[], $17::float8[]
            )
            "#,
        )
        .bind(&ids)
        .bind(&titles)
        .bind(&authors)
        .bind(&dates)
        .bind(&urls)
        .bind(&types)
        .bind(&uni_ids)
        .bind(&uni_cnames)
        .bind(&uni_cabbrs)
        .bind(&major_ids)
        .bind(&major_cnames)
        .bind(&major_cabbrs)
        .bind(&major_types)
        .bind(&max_gpas)
        .bind(&min_gpas)
        .bind(&mean_gpas)
        .bind(&gpa_scales)
        .execute(&mut *tx)
        .await
        .context("failed to insert articles")?;
    }

    let mut au_article_ids: Vec<&str> = Vec::new();
    let mut au_universities: Vec<&str> = Vec::new();
    let mut ap_article_ids: Vec<&str> = Vec::new();
    let mut ap_universities: Vec<&str> = Vec::new();
    let mut ap_levels: Vec<Option<&str>> = Vec::new();
    let mut ap_programs: Vec<Option<&str>> = Vec::new();
    let mut ap_types: Vec<&str> = Vec::new();

    for record in records {
        for university in &record.admission_universities {
            au_article_ids.push(record.article_id.as_str());
            au_universities.push(university.as_str());
        }
        for row in &record.programs {
            ap_article_ids.push(record.article_id.as_str());
            ap_universities.push(row.university.as_str());
            ap_levels.push(row.program_level.map(|l| l.as_str()));
            ap_programs.push(row.program.as_deref());
            ap_types.push(row.program_type.as_str());
        }
    }

    if !au_article_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO admission_universities (article_id, university)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            "#,
        )
        .bind(&au_article_ids)
        .bind(&au_universities)
        .execute(&mut *tx)
        .await
        .context("failed to insert admission universities")?;
    }

    if !ap_article_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO admission_programs (article_id, university, program_level, program, program_type)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::text[])
            "#,
        )
        .bind(&ap_article_ids)
        .bind(&ap_universities)
        .bind(&ap_levels)
        .bind(&ap_programs)
        .bind(&ap_types)
        .execute(&mut *tx)
        .await
        .context("failed to insert admission programs")?;
    }

    tx.commit().await.context("failed to commit corpus dump")?;

    info!(
        articles = records.len(),
        admission_universities = au_article_ids.len(),
        admission_programs = ap_article_ids.len(),
        "persisted corpus"
    );
    Ok(())
}

#[derive(sqlx::FromRow)]
struct ArticleRow {
    article_id: String,
    article_title: String,
    author: String,
    date: chrono::NaiveDateTime,
    url: String,
    article_type: String,
    uni_id: Option<String>,
    uni_cname: Option<String>,
    uni_cabbr: Option<String>,
    major_id: Option<String>,
    major_cname: Option<String>,
    major_cabbr: Option<String>,
    major_type: Option<String>,
    max_gpa: f64,
    min_gpa: f64,
    mean_gpa: f64,
    gpa_scale: f64,
}

/// Load the persisted corpus back into the in-memory snapshot shape.
pub async fn load_corpus(pool: &PgPool) -> Result<Vec<ArticleRecord>> {
    let article_rows: Vec<ArticleRow> = sqlx::query_as(
        "SELECT article_id, article_title, author, date, url, article_type, \
         uni_id, uni_cname, uni_cabbr, major_id, major_cname, major_cabbr, major_type, \
         max_gpa, min_gpa, mean_gpa, gpa_scale \
         FROM articles ORDER BY article_id",
    )
    .fetch_all(pool)
    .await
    .context("failed to load articles")?;

    let uni_rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT article_id, university FROM admission_universities ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("failed to load admission universities")?;

    let program_rows: Vec<(String, String, Option<String>, Option<String>, String)> =
        sqlx::query_as(
            "SELECT article_id, university, program_level, program, program_type \
             FROM admission_programs ORDER BY id",
        )
        .fetch_all(pool)
        .await
        .context("failed to load admission programs")?;

    let mut universities_by_article: HashMap<String, Vec<String>> = HashMap::new();
    for (article_id, university) in uni_rows {
        universities_by_article
            .entry(article_id)
            .or_default()
            .push(university);
    }

    let mut programs_by_article: HashMap<String, Vec<ProgramRecord>> = HashMap::new();
    for (article_id, university, level, program, program_type) in program_rows {
        programs_by_article
            .entry(article_id)
            .or_default()
            .push(ProgramRecord {
                university,
                program,
                program_type,
                program_level: level.as_deref().and_then(ProgramLevel::parse),
            });
    }

    let records: Vec<ArticleRecord> = article_rows
        .into_iter()
        .map(|row| ArticleRecord {
            admission_universities: universities_by_article
                .remove(&row.article_id)
                .unwrap_or_default(),
            programs: programs_by_article
                .remove(&row.article_id)
                .unwrap_or_default(),
            article_type: ArticleType::parse(&row.article_type).unwrap_or(ArticleType::All),
            article_id: row.article_id,
            article_title: row.article_title,
            author: row.author,
            date: row.date,
            url: row.url,
            uni_id: row.uni_id,
            uni_cname: row.uni_cname,
            uni_cabbr: row.uni_cabbr,
            major_id: row.major_id,
            major_cname: row.major_cname,
            major_cabbr: row.major_cabbr,
            major_type: row.major_type,
            max_gpa: row.max_gpa,
            min_gpa: row.min_gpa,
            mean_gpa: row.mean_gpa,
            gpa_scale: row.gpa_scale,
        })
        .collect();

    info!(articles = records.len(), "loaded corpus snapshot");
    Ok(records)
}
