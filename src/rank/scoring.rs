//! Weighted relevance scoring over the corpus snapshot.
//!
//! Each admission row of a post gets a weighted sum of indicator terms and
//! the post keeps its best row. The weights are empirically tuned design
//! constants; changing them without a regression baseline shifts every
//! ranking, so they live here as named constants rather than inline
//! numbers.

use crate::extract::classify::ArticleType;
use crate::extract::tables::ProgramLevel;
use crate::rank::profile::QueryProfile;
use crate::rank::{ArticleRecord, ProgramRecord, ScoredArticle};

// Similar-background query weights.
const W_GPA_BAND_TIGHT: f64 = 6.0;
const W_GPA_BAND_NEAR: f64 = 5.0;
const W_GPA_BAND_WIDE: f64 = 2.0;
const W_MIN_GPA_NEAR: f64 = 4.0;
const W_MIN_GPA_BOTH_LOW: f64 = 4.0;
/// Offsets an unknown-GPA record accidentally landing in a band that
/// happens to include the `-1` sentinel.
const W_UNKNOWN_GPA_PENALTY: f64 = -0.2;
const W_HOME_UNI: f64 = 4.0;
const W_HOME_UNI_OUTSIDE_TOP: f64 = 10.0;
const W_HOME_UNI_OUTSIDE_MID: f64 = 6.0;
const W_MAJOR: f64 = 3.0;
const W_MAJOR_RARE: f64 = 1.0;
const W_UNI_AND_MAJOR: f64 = 2.0;
const W_PROGRAM: f64 = 6.0;
const W_PROGRAM_RARE: f64 = 4.0;
const W_PROGRAM_TYPE: f64 = 5.0;
const W_PHD_LEVEL: f64 = 10.0;
const W_TARGET_UNIVERSITY: f64 = 15.0;

// Target-school query weights.
const W_TS_PROGRAM: f64 = 50.0;
const W_TS_PROGRAM_TYPE: f64 = 1.0;
const W_TS_PHD_LEVEL: f64 = 1.0;
const W_TS_TARGET_UNIVERSITY: f64 = 48.0;

// GPA band half-widths.
const GPA_BAND_TIGHT: f64 = 0.2;
const GPA_BAND_NEAR_LO: f64 = 0.21;
const GPA_BAND_NEAR_HI: f64 = 0.3;
const GPA_BAND_WIDE_LO: f64 = 0.31;
const GPA_BAND_WIDE_HI: f64 = 0.5;
const MIN_GPA_BAND: f64 = 0.25;
/// "Low GPA" ceiling for the minimum-GPA solidarity terms.
const LOW_GPA_CEILING: f64 = 3.01;

/// Home uids so common that an exact match carries little signal; matches
/// outside this cluster get extra weight.
const TOP_TW_CLUSTER: &[&str] = &["NTU", "NCTU", "NTHU"];
const MID_TW_CLUSTER: &[&str] = &["NCCU", "NCKU"];
/// Same idea for programs and majors.
const COMMON_PROGRAM_CLUSTER: &[&str] = &["CS", "MSCS", "EE", "MSEE"];
const COMMON_MAJOR_CLUSTER: &[&str] = &["CS", "EE"];

fn between(value: f64, lo: f64, hi: f64) -> bool {
    value >= lo && value <= hi
}

fn contains_any(value: &str, cluster: &[&str]) -> bool {
    cluster.iter().any(|needle| value.contains(needle))
}

/// Any query entry appearing inside `value` counts as containment, the way
/// an alternation pattern would match.
fn matches_any(value: &str, queries: &[String]) -> bool {
    queries.iter().any(|q| value.contains(q.as_str()))
}

/// Score one admission row against a similar-background query.
fn score_similar_row(profile: &QueryProfile, record: &ArticleRecord, row: &ProgramRecord) -> f64 {
    let mut score = 0.0;
    let gpa = profile.gpa;

    // GPA proximity at three tolerance tiers.
    let mean = record.mean_gpa;
    if between(mean, gpa - GPA_BAND_TIGHT, gpa + GPA_BAND_TIGHT) {
        score += W_GPA_BAND_TIGHT;
    }
    if between(mean, gpa - GPA_BAND_NEAR_HI, gpa - GPA_BAND_NEAR_LO)
        || between(mean, gpa + GPA_BAND_NEAR_LO, gpa + GPA_BAND_NEAR_HI)
    {
        score += W_GPA_BAND_NEAR;
    }
    if between(mean, gpa - GPA_BAND_WIDE_HI, gpa - GPA_BAND_WIDE_LO)
        || between(mean, gpa + GPA_BAND_WIDE_LO, gpa + GPA_BAND_WIDE_HI)
    {
        score += W_GPA_BAND_WIDE;
    }
    if record.min_gpa <= LOW_GPA_CEILING
        && between(record.min_gpa, gpa - MIN_GPA_BAND, gpa + MIN_GPA_BAND)
    {
        score += W_MIN_GPA_NEAR;
    }
    if record.min_gpa <= LOW_GPA_CEILING
        && gpa <= LOW_GPA_CEILING
        && between(record.min_gpa, 0.0, LOW_GPA_CEILING)
    {
        score += W_MIN_GPA_BOTH_LOW;
    }
    if mean == -1.0 {
        score += W_UNKNOWN_GPA_PENALTY;
    }

    // Home university.
    if let (Some(q_uni), Some(r_uni)) = (profile.uni_id, record.uni_id.as_deref())
        && r_uni == q_uni
    {
        score += W_HOME_UNI;
        if !contains_any(r_uni, TOP_TW_CLUSTER) {
            score += W_HOME_UNI_OUTSIDE_TOP;
        }
        if !contains_any(r_uni, MID_TW_CLUSTER) {
            score += W_HOME_UNI_OUTSIDE_MID;
        }
    }

    // Home major.
    if let (Some(q_mid), Some(q_mtype)) = (profile.major_id, profile.major_type) {
        let id_match = record.major_id.as_deref() == Some(q_mid);
        let type_match = record.major_type.as_deref() == Some(q_mtype);
        if id_match || type_match {
            score += W_MAJOR;
        }
        if id_match
            && !record
                .major_type
                .as_deref()
                .is_some_and(|t| contains_any(t, COMMON_MAJOR_CLUSTER))
        {
            score += W_MAJOR_RARE;
        }
        if id_match && profile.uni_id.is_some() && record.uni_id.as_deref() == profile.uni_id {
            score += W_UNI_AND_MAJOR;
        }
    }

    // Program name / type / level.
    let program_match = row
        .program
        .as_deref()
        .is_some_and(|p| matches_any(p, &profile.target_programs));
    if program_match {
        score += W_PROGRAM;
        if !contains_any(row.program.as_deref().unwrap_or(""), COMMON_PROGRAM_CLUSTER) {
            score += W_PROGRAM_RARE;
        }
    }
    let type_queries: Vec<String> = profile
        .program_types
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
    if !type_queries.is_empty() && matches_any(&row.program_type, &type_queries) {
        score += W_PROGRAM_TYPE;
    }
    if profile.program_level == ProgramLevel::Phd && row.program_level == Some(ProgramLevel::Phd) {
        score += W_PHD_LEVEL;
    }
    if matches_any(&row.university, &profile.target_universities) {
        score += W_TARGET_UNIVERSITY;
    }

    score
}

/// Score one admission row against a target-school query.
fn score_target_row(profile: &QueryProfile, row: &ProgramRecord) -> f64 {
    let mut score = 0.0;
    if row
        .program
        .as_deref()
        .is_some_and(|p| matches_any(p, &profile.target_programs))
    {
        score += W_TS_PROGRAM;
    }
    let type_queries: Vec<String> = profile
        .program_types
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
    if !type_queries.is_empty() && matches_any(&row.program_type, &type_queries) {
        score += W_TS_PROGRAM_TYPE;
    }
    if profile.program_level == ProgramLevel::Phd && row.program_level == Some(ProgramLevel::Phd) {
        score += W_TS_PHD_LEVEL;
    }
    if matches_any(&row.university, &profile.target_universities) {
        score += W_TS_TARGET_UNIVERSITY;
    }
    score
}

/// A post participates only when it is an admission post with at least one
/// admission row whose program type intersects the requested types (or no
/// type filter was supplied).
fn qualifies(profile: &QueryProfile, record: &ArticleRecord) -> bool {
    if record.article_type != ArticleType::Admission || record.programs.is_empty() {
        return false;
    }
    if profile.program_types.is_empty() {
        return true;
    }
    record.programs.iter().any(|row| {
        profile
            .program_types
            .iter()
            .any(|qt| row.program_type == qt.as_str())
    })
}

/// Rank the corpus for a "similar background" query:
/// `(score DESC, gpa_diff ASC, date DESC)`.
pub fn rank_similar(profile: &QueryProfile, corpus: &[ArticleRecord]) -> Vec<ScoredArticle> {
    let mut scored: Vec<ScoredArticle> = corpus
        .iter()
        .filter(|record| qualifies(profile, record))
        .map(|record| {
            let score = record
                .programs
                .iter()
                .map(|row| score_similar_row(profile, record, row))
                .fold(f64::MIN, f64::max);
            ScoredArticle {
                gpa_diff: (record.mean_gpa - profile.gpa).abs(),
                score,
                record: record.clone(),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.gpa_diff.total_cmp(&b.gpa_diff))
            .then_with(|| b.record.date.cmp(&a.record.date))
    });
    scored
}

/// Rank the corpus for a "target school" query: `(score DESC, date DESC)`.
pub fn rank_target_schools(profile: &QueryProfile, corpus: &[ArticleRecord]) -> Vec<ScoredArticle> {
    let mut scored: Vec<ScoredArticle> = corpus
        .iter()
        .filter(|record| qualifies(profile, record))
        .map(|record| {
            let score = record
                .programs
                .iter()
                .map(|row| score_target_row(profile, row))
                .fold(f64::MIN, f64::max);
            ScoredArticle {
                gpa_diff: (record.mean_gpa - profile.gpa).abs(),
                score,
                record: record.clone(),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.record.date.cmp(&a.record.date))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile() -> QueryProfile {
        QueryProfile {
            uni_id: Some("NCTU"),
            major_id: Some("CSIE"),
            major_type: Some("CS"),
            gpa: 3.7,
            target_universities: vec!["Carnegie Mellon University".to_string()],
            target_programs: vec!["MSCS".to_string()],
            program_types: vec![],
            program_level: ProgramLevel::Ms,
        }
    }

    fn record(article_id: &str, mean_gpa: f64) -> ArticleRecord {
        ArticleRecord {
            article_id: article_id.to_string(),
            article_title: format!("[錄取] {article_id}"),
            author: "poster".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 3, 14)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            url: String::new(),
            article_type: ArticleType::Admission,
            uni_id: Some("NCTU".to_string()),
            uni_cname: None,
            uni_cabbr: None,
            major_id: Some("CSIE".to_string()),
            major_cname: None,
            major_cabbr: None,
            major_type: Some("CS".to_string()),
            max_gpa: mean_gpa,
            min_gpa: mean_gpa,
            mean_gpa,
            gpa_scale: 4.0,
            admission_universities: vec!["Carnegie Mellon University".to_string()],
            programs: vec![ProgramRecord {
                university: "Carnegie Mellon University".to_string(),
                program: Some("MSCS".to_string()),
                program_type: "CS".to_string(),
                program_level: Some(ProgramLevel::Ms),
            }],
        }
    }

    #[test]
    fn closer_gpa_never_scores_lower_on_the_band_terms() {
        let rec = record("a1", 3.7);
        let mut distances: Vec<(f64, f64)> = Vec::new();
        for offset in [0.0, 0.1, 0.25, 0.4, 0.6] {
            let mut p = profile();
            p.gpa = 3.7 - offset;
            let score = score_similar_row(&p, &rec, &rec.programs[0]);
            distances.push((offset, score));
        }
        for pair in distances.windows(2) {
            let (near, far) = (pair[0], pair[1]);
            assert!(
                near.1 >= far.1,
                "query gpa at distance {} scored {} but {} scored {}",
                near.0,
                near.1,
                far.0,
                far.1
            );
        }
    }

    #[test]
    fn unknown_gpa_is_penalized_not_rewarded() {
        let known = record("a1", 3.7);
        let unknown = {
            let mut r = record("a2", -1.0);
            r.min_gpa = -1.0;
            r.max_gpa = -1.0;
            r.gpa_scale = -1.0;
            r
        };
        let p = profile();
        let known_score = score_similar_row(&p, &known, &known.programs[0]);
        let unknown_score = score_similar_row(&p, &unknown, &unknown.programs[0]);
        assert!(known_score > unknown_score);
        // The sentinel must not pick up any GPA-band credit: relative to an
        // otherwise identical record its only GPA contribution is negative.
        let mut no_gpa_terms = record("a3", 9.9);
        no_gpa_terms.min_gpa = 9.9;
        let baseline = score_similar_row(&p, &no_gpa_terms, &no_gpa_terms.programs[0]);
        assert!((unknown_score - (baseline + W_UNKNOWN_GPA_PENALTY)).abs() < 1e-9);
    }

    #[test]
    fn phd_bonus_requires_phd_query() {
        let mut rec = record("a1", 3.7);
        rec.programs[0].program_level = Some(ProgramLevel::Phd);
        let ms_profile = profile();
        let mut phd_profile = profile();
        phd_profile.program_level = ProgramLevel::Phd;
        let ms_score = score_similar_row(&ms_profile, &rec, &rec.programs[0]);
        let phd_score = score_similar_row(&phd_profile, &rec, &rec.programs[0]);
        assert_eq!(phd_score, ms_score + W_PHD_LEVEL);
    }

    #[test]
    fn uncommon_home_university_outscores_common_one() {
        let mut p = profile();
        p.uni_id = Some("YZU");
        p.major_id = None;
        p.major_type = None;
        let mut common = record("a1", 3.7);
        common.uni_id = Some("NCTU".to_string());
        let mut uncommon = record("a2", 3.7);
        uncommon.uni_id = Some("YZU".to_string());
        let common_score = {
            let mut pc = p.clone();
            pc.uni_id = Some("NCTU");
            score_similar_row(&pc, &common, &common.programs[0])
        };
        let uncommon_score = score_similar_row(&p, &uncommon, &uncommon.programs[0]);
        assert!(
            uncommon_score > common_score,
            "YZU match ({uncommon_score}) should outscore NCTU match ({common_score})"
        );
    }

    #[test]
    fn rare_program_match_gets_extra_weight() {
        let p = {
            let mut p = profile();
            p.target_programs = vec!["MHCI".to_string()];
            p
        };
        let mut rare = record("a1", 3.7);
        rare.programs[0].program = Some("MHCI".to_string());
        rare.programs[0].program_type = "HCI".to_string();
        let common = record("a2", 3.7);
        let common_p = profile();
        let rare_score = score_similar_row(&p, &rare, &rare.programs[0]);
        let common_score = score_similar_row(&common_p, &common, &common.programs[0]);
        assert_eq!(rare_score, common_score + W_PROGRAM_RARE);
    }

    #[test]
    fn program_type_filter_gates_participation() {
        let mut p = profile();
        p.program_types = vec![crate::extract::tables::ProgramType::Hci];
        let rec = record("a1", 3.7);
        assert!(!qualifies(&p, &rec));
        p.program_types = vec![crate::extract::tables::ProgramType::Cs];
        assert!(qualifies(&p, &rec));
        p.program_types = vec![];
        assert!(qualifies(&p, &rec));
    }

    #[test]
    fn non_admission_posts_never_rank() {
        let mut rec = record("a1", 3.7);
        rec.article_type = ArticleType::GeneralCs;
        assert!(!qualifies(&profile(), &rec));
        let mut no_rows = record("a2", 3.7);
        no_rows.programs.clear();
        assert!(!qualifies(&profile(), &no_rows));
    }

    #[test]
    fn similar_ranking_orders_by_score_then_gpa_diff_then_date() {
        let p = profile();
        let strong = record("strong", 3.7);
        let mut weaker = record("weaker", 3.7);
        weaker.uni_id = Some("NTHU".to_string());
        let mut close_gpa = record("close", 3.75);
        close_gpa.min_gpa = 3.75;
        let mut far_gpa = record("far", 3.55);
        far_gpa.min_gpa = 3.55;
        let corpus = vec![far_gpa, weaker, close_gpa, strong];
        let ranked = rank_similar(&p, &corpus);
        assert_eq!(ranked[0].record.article_id, "strong");
        // close and far tie on every indicator term, so gpa_diff decides.
        let close_pos = ranked.iter().position(|r| r.record.article_id == "close").unwrap();
        let far_pos = ranked.iter().position(|r| r.record.article_id == "far").unwrap();
        assert!(close_pos < far_pos);
        assert_eq!(ranked.last().unwrap().record.article_id, "weaker");
    }

    #[test]
    fn target_ranking_weighs_program_over_type() {
        let mut p = profile();
        p.program_types = vec![];
        let mut program_hit = record("program", 3.7);
        program_hit.programs[0].university = "Nowhere University".to_string();
        let mut university_hit = record("university", 3.7);
        university_hit.programs[0].program = Some("MSIS".to_string());
        let corpus = vec![university_hit, program_hit];
        let ranked = rank_target_schools(&p, &corpus);
        assert_eq!(ranked[0].record.article_id, "program");
        assert_eq!(ranked[0].score, W_TS_PROGRAM);
        assert_eq!(ranked[1].score, W_TS_TARGET_UNIVERSITY);
    }

    #[test]
    fn ranking_is_deterministic() {
        let p = profile();
        let corpus: Vec<ArticleRecord> = (0..8).map(|i| record(&format!("a{i}"), 3.7)).collect();
        let first = rank_similar(&p, &corpus);
        let second = rank_similar(&p, &corpus);
        let ids1: Vec<_> = first.iter().map(|r| r.record.article_id.clone()).collect();
        let ids2: Vec<_> = second.iter().map(|r| r.record.article_id.clone()).collect();
        assert_eq!(ids1, ids2);
    }
}
