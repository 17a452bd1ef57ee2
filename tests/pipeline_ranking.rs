//! End-to-end test: raw crawled posts through classification, extraction,
//! record building, and ranking.

use std::sync::Arc;

use admitboard::extract::admission::AdmissionSectionParser;
use admitboard::extract::background::BackgroundResolver;
use admitboard::extract::classify::ArticleType;
use admitboard::extract::pipeline::{build_records, extract_batch};
use admitboard::extract::tables::ReferenceTables;
use admitboard::ingest::{clean_articles, RawArticle};
use admitboard::rank::profile::CandidateQuery;
use admitboard::rank::scoring::{rank_similar, rank_target_schools};

fn raw_article(id: &str, title: &str, content: &str, date: &str) -> RawArticle {
    RawArticle {
        article_id: Some(id.to_string()),
        article_title: Some(title.to_string()),
        author: Some(format!("author_{id}")),
        content: Some(content.to_string()),
        url: Some(format!("https://example.test/{id}")),
        date: Some(date.to_string()),
    }
}

/// A small but realistic batch: two admission posts with different home
/// backgrounds and offers, a school-choice question, and an off-topic post.
fn batch() -> Vec<RawArticle> {
    vec![
        raw_article(
            "cmu",
            "[錄取] CMU MSCS / Gatech",
            "Background:\n\
             NCTU CSIE\n\
             GPA 3.82/4.0\n\
             GRE V:155 Q:168 AW 3.5\n\
             \n\
             Admission:\n\
             CMU MSCS 2/14\n\
             Gatech MSCS 3/1 w/ funding\n\
             Rejection: Stanford",
            "Mon Mar 02 10:23:45 2020",
        ),
        raw_article(
            "mhci",
            "[錄取] MHCI",
            "學歷: 台大資管\n\
             GPA: 3.4\n\
             \n\
             Admission: CMU MHCI\n\
             Pending: UW HCDE",
            "Tue Mar 10 08:00:00 2020",
        ),
        raw_article(
            "ask",
            "[選校] CMU MSCS vs Gatech MSCS",
            "NTHU EE, GPA 3.9\nwhich one should I pick?",
            "Wed Mar 11 09:30:00 2020",
        ),
        raw_article(
            "offtopic",
            "housing near campus",
            "looking for a room in Pittsburgh",
            "Thu Mar 12 11:00:00 2020",
        ),
    ]
}

#[tokio::test]
async fn batch_extraction_produces_expected_records() {
    let tables = Arc::new(ReferenceTables::load().unwrap());
    let articles = clean_articles(batch());
    assert_eq!(articles.len(), 4);

    let extracted = extract_batch(tables.clone(), articles).await.unwrap();
    let records = build_records(&tables, &extracted);

    let cmu = records.iter().find(|r| r.article_id == "cmu").unwrap();
    assert_eq!(cmu.article_type, ArticleType::Admission);
    assert_eq!(cmu.uni_id.as_deref(), Some("NCTU"));
    assert_eq!(cmu.major_id.as_deref(), Some("CSIE"));
    assert_eq!(cmu.major_type.as_deref(), Some("CS"));
    assert_eq!(cmu.mean_gpa, 3.82);
    assert_eq!(cmu.gpa_scale, 4.0);
    assert!(
        cmu.admission_universities
            .iter()
            .any(|u| u == "Carnegie Mellon University")
    );
    assert!(
        cmu.admission_universities
            .iter()
            .any(|u| u == "Georgia Institute of Technology")
    );
    assert!(cmu.programs.iter().all(|p| p.program.as_deref() == Some("MSCS")));

    let mhci = records.iter().find(|r| r.article_id == "mhci").unwrap();
    assert_eq!(mhci.uni_id.as_deref(), Some("NTU"));
    assert_eq!(mhci.major_id.as_deref(), Some("IM"));
    assert_eq!(mhci.mean_gpa, 3.4);
    let mhci_row = mhci
        .programs
        .iter()
        .find(|p| p.university == "Carnegie Mellon University")
        .unwrap();
    assert_eq!(mhci_row.program.as_deref(), Some("MHCI"));
    assert_eq!(mhci_row.program_type, "HCI");

    let ask = records.iter().find(|r| r.article_id == "ask").unwrap();
    assert_eq!(ask.article_type, ArticleType::Ask);
    assert_eq!(ask.uni_id.as_deref(), Some("NTHU"));
    assert!(ask.programs.is_empty());

    let offtopic = records.iter().find(|r| r.article_id == "offtopic").unwrap();
    assert_eq!(offtopic.article_type, ArticleType::All);
    assert!(offtopic.uni_id.is_none());
    assert_eq!(offtopic.mean_gpa, -1.0);
}

#[tokio::test]
async fn similar_background_ranking_prefers_matching_profile() {
    let tables = Arc::new(ReferenceTables::load().unwrap());
    let background = BackgroundResolver::new(tables.clone());
    let admission = AdmissionSectionParser::new(tables.clone());

    let articles = clean_articles(batch());
    let extracted = extract_batch(tables.clone(), articles).await.unwrap();
    let records = build_records(&tables, &extracted);

    // No target program, so no program-type gate: both admission posts
    // participate and the ask/offtopic posts never do.
    let query = CandidateQuery {
        university: Some("交大".to_string()),
        major: Some("資工".to_string()),
        gpa: 3.8,
        target_schools: vec!["CMU".to_string()],
        target_programs: vec![],
        program_types: vec![],
        program_level: "MS".to_string(),
    };
    let profile = query.resolve(&tables, &background, &admission).unwrap();
    let ranked = rank_similar(&profile, &records);

    // The NCTU/CSIE/3.82 poster matches the query on every axis and must
    // come first.
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].record.article_id, "cmu");
    assert_eq!(ranked[1].record.article_id, "mhci");
    assert!(ranked[0].score > ranked[1].score);
}

#[tokio::test]
async fn program_type_filter_and_target_ranking() {
    let tables = Arc::new(ReferenceTables::load().unwrap());
    let background = BackgroundResolver::new(tables.clone());
    let admission = AdmissionSectionParser::new(tables.clone());

    let articles = clean_articles(batch());
    let extracted = extract_batch(tables.clone(), articles).await.unwrap();
    let records = build_records(&tables, &extracted);

    let query = CandidateQuery {
        university: None,
        major: None,
        gpa: 3.0,
        target_schools: vec![],
        target_programs: vec!["MHCI".to_string()],
        program_types: vec![],
        program_level: "MS".to_string(),
    };
    let profile = query.resolve(&tables, &background, &admission).unwrap();

    // Resolving the MHCI target added the HCI program type, which gates out
    // the pure-CS post entirely.
    let ranked = rank_target_schools(&profile, &records);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].record.article_id, "mhci");
}
