//! Ranking endpoints: similar-background and target-school queries.

use axum::Json;
use axum::extract::State;

use crate::rank::profile::CandidateQuery;
use crate::rank::scoring::{rank_similar, rank_target_schools};
use crate::rank::ScoredArticle;
use crate::state::AppState;
use crate::web::error::ApiError;

/// Results past this count are cut off once scores fall below half the best
/// score; below it the full list is returned.
const TRUNCATION_FLOOR: usize = 100;

/// Drop the long tail of barely-relevant results from a large ranking.
fn truncate_low_scores(ranked: Vec<ScoredArticle>) -> Vec<ScoredArticle> {
    if ranked.len() <= TRUNCATION_FLOOR {
        return ranked;
    }
    let threshold = (ranked[0].score / 2.0).floor();
    ranked
        .into_iter()
        .take_while(|article| article.score >= threshold)
        .collect()
}

/// `POST /admission/similar` — rank posts by background similarity.
pub async fn similar_background(
    State(state): State<AppState>,
    Json(query): Json<CandidateQuery>,
) -> Result<Json<Vec<ScoredArticle>>, ApiError> {
    let profile = query.resolve(&state.tables, &state.background, &state.admission)?;
    let corpus = state.corpus.read().await;
    let ranked = rank_similar(&profile, &corpus);
    Ok(Json(truncate_low_scores(ranked)))
}

/// `POST /admission/target` — rank posts by target-school overlap.
pub async fn target_schools(
    State(state): State<AppState>,
    Json(query): Json<CandidateQuery>,
) -> Result<Json<Vec<ScoredArticle>>, ApiError> {
    let profile = query.resolve(&state.tables, &state.background, &state.admission)?;
    let corpus = state.corpus.read().await;
    let ranked = rank_target_schools(&profile, &corpus);
    Ok(Json(truncate_low_scores(ranked)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::classify::ArticleType;
    use crate::rank::{ArticleRecord, ProgramRecord};
    use chrono::NaiveDateTime;

    fn scored(id: &str, score: f64) -> ScoredArticle {
        ScoredArticle {
            record: ArticleRecord {
                article_id: id.to_string(),
                article_title: String::new(),
                author: String::new(),
                date: NaiveDateTime::UNIX_EPOCH,
                url: String::new(),
                article_type: ArticleType::Admission,
                uni_id: None,
                uni_cname: None,
                uni_cabbr: None,
                major_id: None,
                major_cname: None,
                major_cabbr: None,
                major_type: None,
                max_gpa: -1.0,
                min_gpa: -1.0,
                mean_gpa: -1.0,
                gpa_scale: -1.0,
                admission_universities: vec![],
                programs: vec![ProgramRecord {
                    university: "X".to_string(),
                    program: None,
                    program_type: "N/A".to_string(),
                    program_level: None,
                }],
            },
            score,
            gpa_diff: 0.0,
        }
    }

    #[test]
    fn small_result_sets_are_untouched() {
        let ranked: Vec<ScoredArticle> = (0..50).map(|i| scored(&i.to_string(), 10.0)).collect();
        assert_eq!(truncate_low_scores(ranked).len(), 50);
    }

    #[test]
    fn long_tails_are_cut_at_half_the_best_score() {
        let mut ranked: Vec<ScoredArticle> =
            (0..120).map(|i| scored(&i.to_string(), 40.0)).collect();
        ranked.extend((0..30).map(|i| scored(&format!("tail{i}"), 5.0)));
        let truncated = truncate_low_scores(ranked);
        assert_eq!(truncated.len(), 120);
        assert!(truncated.iter().all(|a| a.score >= 20.0));
    }
}
