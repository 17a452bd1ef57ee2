//! Title-keyword article classification with false-positive suppression.

use serde::{Deserialize, Serialize};

/// The admission tag posters put in titles.
pub const ADMISSION_TAG: &str = "[錄取]";

/// The school-choice-question tag.
pub const ASK_TAG: &str = "選校";

/// CS-related keywords (CS/DS/ML/HCI/CV/NLP/Robotics/Stats), matched as
/// lowercase substrings.
const CS_KEYWORDS: &[&str] = &[
    "eecs", "ece", "cs", "ee", "ds", "ml", "stat", "mscv", " ce ", " se ", "cmusv", "cmu-sv",
    " sv", "hci", "nlp", "robotics", "computer science",
];

/// Substrings that co-occur with the CS keywords in non-CS titles.
const FP_KEYWORDS: &[&str] = &[
    "cheers", "physics", "ucs.", "csu", "facebook", "indeed", "fee", "cec", "economics", "mlb",
    "mli", "emle", "emlyon", "need", "career", "sva", "milwaukee", "leeds", "records", "sdsu",
    "ds2019", "ds2016", "kids", "state",
];

/// Engineering disciplines that still count as CS-adjacent.
const CS_ENGINEER_DISCIPLINES: &[&str] =
    &["electrical engineer", "computer engineer", "software engineer"];

/// At least this many CS-keyword occurrences rescue a title that also hits
/// the false-positive denylist.
const FP_RESCUE_OCCURRENCES: usize = 2;

/// Coarse category of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleType {
    /// Admission-outcome post (tagged, not a reply).
    Admission,
    /// School-choice question.
    Ask,
    /// CS-related but neither of the above.
    GeneralCs,
    /// Everything else.
    All,
}

impl ArticleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::Admission => "ADMISSION",
            ArticleType::Ask => "ASK",
            ArticleType::GeneralCs => "GENERAL_CS",
            ArticleType::All => "ALL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMISSION" => Some(ArticleType::Admission),
            "ASK" => Some(ArticleType::Ask),
            "GENERAL_CS" => Some(ArticleType::GeneralCs),
            "ALL" => Some(ArticleType::All),
            _ => None,
        }
    }

    /// True for any CS-related category.
    pub fn is_cs_related(&self) -> bool {
        !matches!(self, ArticleType::All)
    }
}

/// Classify a post title. Pure, so reclassification is idempotent.
pub fn classify_title(title: &str) -> ArticleType {
    let lower = title.to_lowercase();

    if !CS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return ArticleType::All;
    }

    // False-positive suppression: a denylist hit without enough CS-keyword
    // mass, a civil/environmental-engineering title, or a generic
    // "engineer" title outside the CS-adjacent disciplines.
    let denylisted = FP_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let weak_cs_signal = cs_keyword_occurrences(&lower) < FP_RESCUE_OCCURRENCES;
    let civil_engineering = lower.contains(" cee")
        || lower.contains("ceeb")
        || lower.contains("civil and environmental engineering");
    let non_cs_engineer = lower.contains("engineer")
        && !CS_ENGINEER_DISCIPLINES.iter().any(|d| lower.contains(d));

    if (denylisted && weak_cs_signal) || civil_engineering || non_cs_engineer {
        return ArticleType::All;
    }

    if title.contains(ADMISSION_TAG) && !title.contains("Re: ") {
        ArticleType::Admission
    } else if title.contains(ASK_TAG) {
        ArticleType::Ask
    } else {
        ArticleType::GeneralCs
    }
}

/// Total occurrence count of all CS keywords in a lowercased title.
fn cs_keyword_occurrences(lower: &str) -> usize {
    CS_KEYWORDS.iter().map(|kw| lower.matches(kw).count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_tagged_title() {
        assert_eq!(classify_title("[錄取] CMU MSCS"), ArticleType::Admission);
    }

    #[test]
    fn replies_are_not_admission_posts() {
        assert_eq!(
            classify_title("Re: [錄取] CMU MSCS"),
            ArticleType::GeneralCs
        );
    }

    #[test]
    fn ask_tagged_title() {
        assert_eq!(classify_title("[選校] CMU vs Gatech CS"), ArticleType::Ask);
    }

    #[test]
    fn plain_cs_title() {
        assert_eq!(classify_title("EECS application timeline"), ArticleType::GeneralCs);
    }

    #[test]
    fn unrelated_title() {
        assert_eq!(classify_title("housing in Boston"), ArticleType::All);
    }

    #[test]
    fn denylist_with_weak_signal_is_suppressed() {
        // "economics" carries the only embedded "cs" occurrence.
        assert_eq!(classify_title("Economics master advice"), ArticleType::All);
    }

    #[test]
    fn denylist_with_strong_signal_survives() {
        // Standalone "CS" plus the one inside "economics" makes two.
        assert_eq!(
            classify_title("CS or economics master"),
            ArticleType::GeneralCs
        );
    }

    #[test]
    fn civil_environmental_engineering_is_excluded() {
        assert_eq!(
            classify_title("[錄取] Stanford CEE PhD"),
            ArticleType::All
        );
        assert_eq!(
            classify_title("civil and environmental engineering offers"),
            ArticleType::All
        );
    }

    #[test]
    fn engineer_outside_cs_disciplines_is_excluded() {
        assert_eq!(
            classify_title("mechanical engineer looking for MS advice"),
            ArticleType::All
        );
        assert_eq!(
            classify_title("software engineer applying to MSCS"),
            ArticleType::GeneralCs
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let titles = [
            "[錄取] CMU MSCS",
            "Re: [錄取] CMU MSCS",
            "[選校] CMU vs Gatech CS",
            "Economics master advice",
            "housing in Boston",
        ];
        for title in titles {
            assert_eq!(classify_title(title), classify_title(title));
        }
    }
}
