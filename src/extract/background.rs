//! Home-background resolution: the poster's own university, major, and GPA.
//!
//! All three sub-resolvers share the same window strategy: find the line
//! where a "background" section keyword first appears and search from there,
//! wrapping around, so self-introduction lines are preferred over quoted
//! text or admission listings further down.

use std::sync::Arc;

use regex::Regex;

use crate::extract::tables::ReferenceTables;

/// Tokens that contain `NTU` but belong to a different school.
const NTU_SIBLINGS: &[&str] = &["NTUT", "NTUST"];

/// GPA candidates more than this many lines past the background anchor are
/// assumed to belong to quoted or unrelated text.
const GPA_WINDOW_LINES: usize = 20;

/// Token-level match rules for the home-university resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniversityTokenRule {
    /// Token equals a Chinese full name.
    ChineseName,
    /// Token equals a Chinese abbreviation.
    ChineseAbbr,
    /// Token contains `NTU` (minus the NTUT/NTUST siblings) or a localized
    /// spelling of "Taiwan University".
    NtuSpecialCase,
    /// Uppercased token equals a known uid.
    ExactUid,
    /// Token equals a campus IP prefix.
    CampusIp,
    /// A uid appears as an anchored suffix of the token ("NTU" in "NTUEE"),
    /// excluding the literal "Hsinchu" which would false-positive NCHU.
    UidSuffix,
    /// A Chinese abbreviation appears inside the token ("台大" in "台大電機").
    ChineseAbbrInToken,
}

/// Fixed precedence order for university token matching; first hit wins.
const UNIVERSITY_TOKEN_RULES: &[UniversityTokenRule] = &[
    UniversityTokenRule::ChineseName,
    UniversityTokenRule::ChineseAbbr,
    UniversityTokenRule::NtuSpecialCase,
    UniversityTokenRule::ExactUid,
    UniversityTokenRule::CampusIp,
    UniversityTokenRule::UidSuffix,
    UniversityTokenRule::ChineseAbbrInToken,
];

/// Token-level match rules for the major resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorTokenRule {
    /// Token equals a Chinese full name.
    ChineseName,
    /// Token equals a Chinese abbreviation.
    ChineseAbbr,
    /// Uppercased token equals a known major id, excluding "BA" so that
    /// "Bachelor of Arts" does not read as the business major.
    ExactId,
    /// An id appears as an anchored suffix of the token ("EE" in "NTUEE"),
    /// with the "BA" exclusion and a word-boundary re-check for "ENT".
    IdSuffix,
    /// A Chinese abbreviation appears inside the token ("電機" in "台大電機系").
    ChineseAbbrInToken,
}

/// Fixed precedence order for major token matching; first hit wins.
const MAJOR_TOKEN_RULES: &[MajorTokenRule] = &[
    MajorTokenRule::ChineseName,
    MajorTokenRule::ChineseAbbr,
    MajorTokenRule::ExactId,
    MajorTokenRule::IdSuffix,
    MajorTokenRule::ChineseAbbrInToken,
];

/// Aggregated GPA evidence for one post. All fields are `-1.0` when no
/// acceptable number was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpaStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub scale: f64,
}

impl GpaStats {
    pub const UNKNOWN: GpaStats = GpaStats {
        max: -1.0,
        min: -1.0,
        mean: -1.0,
        scale: -1.0,
    };

    pub fn is_unknown(&self) -> bool {
        self.mean < 0.0
    }
}

/// A resolved home university with the positional context the major
/// resolver anchors on.
#[derive(Debug, Clone)]
pub struct UniversityMatch {
    pub uni_id: &'static str,
    /// The exact token (or English name) that matched.
    pub matched_word: String,
    /// Line the match was found on.
    pub line_idx: usize,
    /// Line the background-section keyword was found on, if any.
    pub background_idx: Option<usize>,
}

/// Resolver for the poster's own academic background.
pub struct BackgroundResolver {
    tables: Arc<ReferenceTables>,
    background_re: Regex,
    gpa_keyword_re: Regex,
    gre_re: Regex,
    year_re: Regex,
    float_re: Regex,
    major_noise_re: Regex,
    major_punct_re: Regex,
}

impl BackgroundResolver {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        BackgroundResolver {
            tables,
            background_re: Regex::new(r"(?i)(background|education|經歷|學歷|academic record)")
                .expect("background keyword regex"),
            gpa_keyword_re: Regex::new(r"(?i)(GPA|Rank| Education|Background)")
                .expect("gpa keyword regex"),
            gre_re: Regex::new(r"(?i)(GRE|G:|G |AW|V1|Q1|V 1|Q 1|V:|Q:)").expect("gre regex"),
            year_re: Regex::new(r"2[0-9]{3}").expect("year regex"),
            float_re: Regex::new(r"\d+\.\d+").expect("float regex"),
            major_noise_re: Regex::new(r"(?i)(student|TOEFL|GRE)").expect("major noise regex"),
            major_punct_re: Regex::new(r"[.,:;/()]").expect("major punct regex"),
        }
    }

    /// Line indices in anchor-first wraparound order.
    fn rotated_indices(len: usize, anchor: Option<usize>) -> impl Iterator<Item = usize> {
        let start = anchor.unwrap_or(0);
        (0..len).map(move |i| (start + i) % len.max(1))
    }

    /// Line index of the first background-section keyword, if any.
    pub fn background_anchor(&self, lines: &[&str]) -> Option<usize> {
        lines.iter().position(|line| self.background_re.is_match(line))
    }

    /// Locate the poster's home university in the post body.
    pub fn find_university(&self, content: &str) -> Option<UniversityMatch> {
        let lines: Vec<&str> = content.split('\n').collect();
        let background_idx = self.background_anchor(&lines);

        for line_idx in Self::rotated_indices(lines.len(), background_idx) {
            if let Some((uni_id, matched_word)) = self.sentence2university(lines[line_idx]) {
                return Some(UniversityMatch {
                    uni_id,
                    matched_word,
                    line_idx,
                    background_idx,
                });
            }
        }
        None
    }

    /// Resolve a single sentence to a university id.
    ///
    /// [`UNIVERSITY_TOKEN_RULES`] run per token in fixed priority order,
    /// first hit wins; an English full-name containment scan is the
    /// line-level fallback.
    pub fn sentence2university(&self, sentence: &str) -> Option<(&'static str, String)> {
        for word in sentence.split_whitespace() {
            for rule in UNIVERSITY_TOKEN_RULES {
                if let Some(uid) = self.apply_university_rule(*rule, word) {
                    return Some((uid, word.to_string()));
                }
            }
        }
        // English full name anywhere in the line.
        for (name, uid) in self.tables.name2uid.iter().copied() {
            if sentence.contains(name) {
                return Some((uid, name.to_string()));
            }
        }
        None
    }

    /// Apply one university token rule. Exposed so precedence can be tested
    /// rule by rule.
    pub fn apply_university_rule(
        &self,
        rule: UniversityTokenRule,
        word: &str,
    ) -> Option<&'static str> {
        let t = &self.tables;
        match rule {
            UniversityTokenRule::ChineseName => t.cname2uid.get(word).copied(),
            UniversityTokenRule::ChineseAbbr => t
                .cabbr2uid
                .iter()
                .copied()
                .find(|(cabbr, _)| *cabbr == word)
                .map(|(_, uid)| uid),
            UniversityTokenRule::NtuSpecialCase => {
                let ntu = (word.contains("NTU")
                    && !NTU_SIBLINGS.iter().any(|s| word.contains(s)))
                    || word.contains("台灣大學")
                    || word.contains("臺灣大學");
                ntu.then_some("NTU")
            }
            UniversityTokenRule::ExactUid => {
                let upper = word.to_uppercase();
                t.uids.iter().copied().find(|uid| *uid == upper)
            }
            UniversityTokenRule::CampusIp => t.ip2uid.get(word).copied(),
            UniversityTokenRule::UidSuffix => {
                if word == "Hsinchu" {
                    return None;
                }
                let upper = word.to_uppercase();
                t.uids.iter().copied().find(|uid| upper.ends_with(uid))
            }
            UniversityTokenRule::ChineseAbbrInToken => leftmost_table_match(word, &t.cabbr2uid),
        }
    }

    /// Locate the poster's major, anchored on the university match.
    pub fn find_major(
        &self,
        content: &str,
        university: Option<&UniversityMatch>,
    ) -> Option<&'static str> {
        let lines: Vec<&str> = content.split('\n').collect();

        let start = university
            .and_then(|u| u.background_idx)
            .unwrap_or(0);
        let end = university
            .map(|u| lines.len().min(u.line_idx + 4))
            .unwrap_or(lines.len());

        // The university line itself is the most likely place ("NTU EE"),
        // so it is searched first.
        let search_order = university
            .map(|u| u.line_idx)
            .into_iter()
            .chain(start..end);

        for line_idx in search_order {
            if let Some(mid) = self.sentence2major(lines[line_idx], university) {
                return Some(mid);
            }
        }
        None
    }

    /// Resolve a single sentence to a major id.
    pub fn sentence2major(
        &self,
        sentence: &str,
        university: Option<&UniversityMatch>,
    ) -> Option<&'static str> {
        let t = &self.tables;
        let cleaned = self.major_noise_re.replace_all(sentence, " ").to_string();

        // English major name anywhere in the line wins outright.
        for (name, mid) in t.major_name2mid.iter().copied() {
            if cleaned.contains(name) {
                return Some(mid);
            }
        }

        // The major usually sits right next to the university token or just
        // after the background keyword; start from whichever comes first.
        let mut start_idx = 0;
        if let Some(u) = university
            && let Some(pos) = cleaned.find(&u.matched_word)
        {
            start_idx = floor_char_boundary(&cleaned, pos.saturating_sub(10));
        }
        if let Some(m) = self.background_re.find(&cleaned) {
            start_idx = start_idx.min(m.end());
        }

        let rest = self
            .major_punct_re
            .replace_all(&cleaned[start_idx..], " ")
            .to_string();

        for word in rest.split_whitespace() {
            for rule in MAJOR_TOKEN_RULES {
                if let Some(mid) = self.apply_major_rule(*rule, word) {
                    return Some(mid);
                }
            }
        }
        None
    }

    /// Apply one major token rule. Exposed so precedence can be tested rule
    /// by rule.
    pub fn apply_major_rule(&self, rule: MajorTokenRule, word: &str) -> Option<&'static str> {
        let t = &self.tables;
        match rule {
            MajorTokenRule::ChineseName => t.major_cname2mid.get(word).copied(),
            MajorTokenRule::ChineseAbbr => t
                .major_cabbr2mid
                .iter()
                .copied()
                .find(|(cabbr, _)| *cabbr == word)
                .map(|(_, mid)| mid),
            MajorTokenRule::ExactId => {
                let upper = word.to_uppercase();
                if upper == "BA" {
                    return None;
                }
                t.mids.iter().copied().find(|mid| *mid == upper)
            }
            MajorTokenRule::IdSuffix => {
                let upper = word.to_uppercase();
                let mid = t.mids.iter().copied().find(|mid| upper.ends_with(mid))?;
                let ok = match mid {
                    "BA" => false,
                    // Without the boundary re-check every word ending in
                    // -ent would read as entomology.
                    "ENT" => upper == "ENT" || !suffix_preceded_by_alphanumeric(&upper, mid),
                    _ => true,
                };
                ok.then_some(mid)
            }
            MajorTokenRule::ChineseAbbrInToken => leftmost_table_match(word, &t.major_cabbr2mid),
        }
    }

    /// Extract GPA statistics from the post body.
    ///
    /// GRE fragments sharing a line with a GPA keyword are trimmed away so
    /// verbal/quant sub-scores never read as a GPA; four-digit years are
    /// scrubbed for the same reason.
    pub fn find_gpa(&self, content: &str, university: Option<&UniversityMatch>) -> GpaStats {
        let lines: Vec<&str> = content.split('\n').collect();
        let background_idx = university.and_then(|u| u.background_idx);

        let mut candidates: Vec<f64> = Vec::new();
        let mut scale = -1.0_f64;
        let mut last_keyword_idx: Option<usize> = None;

        for (idx, raw_line) in lines.iter().enumerate() {
            let mut line = (*raw_line).to_string();

            let gpa_kw = self.gpa_keyword_re.find(&line).map(|m| (m.start(), m.end()));
            if gpa_kw.is_some() {
                last_keyword_idx = Some(idx);
            }
            let gre = self.gre_re.find(&line).map(|m| (m.start(), m.end()));

            // GPA and GRE on one line: keep only the side of the line that
            // holds the GPA keyword.
            if let (Some((kw_start, kw_end)), Some((gre_start, gre_end))) = (gpa_kw, gre) {
                if gre_start > kw_end {
                    line.truncate(gre_start);
                } else if gre_end < kw_start {
                    line = line[kw_start..].to_string();
                }
            }

            // A year like "2019" would otherwise parse as part of "2019.9".
            let line = self.year_re.replace_all(&line, " ").to_string();

            let near_keyword = gpa_kw.is_some()
                || last_keyword_idx.is_some_and(|kw_idx| idx - kw_idx <= 1);

            if near_keyword {
                for m in self.float_re.find_iter(&line) {
                    let Ok(num) = m.as_str().parse::<f64>() else {
                        continue;
                    };
                    // Half-step values next to a GRE marker are AW/sub-scores.
                    if gre.is_some() && is_half_step(num) {
                        continue;
                    }
                    if !(0.001..=4.31).contains(&num) {
                        continue;
                    }
                    if approx(num, 4.0) && (line.contains("/4.0") || line.contains("/ 4.0")) {
                        scale = 4.0;
                    } else if approx(num, 4.3) && (line.contains("/4.3") || line.contains("/ 4.3"))
                    {
                        scale = 4.3;
                    } else {
                        candidates.push(num);
                    }
                }
                // A leading "4.3/..." is a perfect score, not a scale marker.
                if line.contains("4.3/") || line.contains("4.3 /") {
                    candidates.push(4.3);
                } else if line.contains("4.0/") || line.contains("4.0 /") {
                    candidates.push(4.0);
                }
            }

            if let Some(bg_idx) = background_idx
                && idx > bg_idx + GPA_WINDOW_LINES
            {
                break;
            }
        }

        if candidates.is_empty() {
            return GpaStats::UNKNOWN;
        }
        let max = candidates.iter().cloned().fold(f64::MIN, f64::max);
        let min = candidates.iter().cloned().fold(f64::MAX, f64::min);
        let mean = candidates.iter().sum::<f64>() / candidates.len() as f64;
        GpaStats {
            max,
            min,
            mean: (mean * 100.0).round() / 100.0,
            scale,
        }
    }
}

/// Leftmost occurrence of any table key inside `word`; ties at the same
/// position resolve in table order.
fn leftmost_table_match(
    word: &str,
    table: &[(&'static str, &'static str)],
) -> Option<&'static str> {
    for (pos, _) in word.char_indices() {
        for (key, value) in table.iter().copied() {
            if word[pos..].starts_with(key) {
                return Some(value);
            }
        }
    }
    None
}

/// True when the char right before the suffix match is alphanumeric,
/// i.e. the suffix is embedded in a longer word.
fn suffix_preceded_by_alphanumeric(word: &str, suffix: &str) -> bool {
    let boundary = word.len() - suffix.len();
    word[..boundary]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric())
}

/// Largest char boundary at or below `idx`.
fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-4
}

/// Membership in {1.0, 1.5, ..., 6.0}.
fn is_half_step(num: f64) -> bool {
    if !(1.0..=6.0).contains(&num) {
        return false;
    }
    let doubled = num * 2.0;
    (doubled - doubled.round()).abs() < 1e-9
}
