//! Admission-outcome parsing: isolate the accepted-school block of a post,
//! tokenize it into candidate fragments, and resolve each fragment to a US
//! university and program pair, merging signal from the title.

use std::sync::Arc;

use indexmap::IndexSet;
use regex::Regex;

use crate::extract::programs::search_program;
use crate::extract::tables::{ProgramLevel, ReferenceTables};

/// A reject/pending marker more than this many lines after the admission
/// marker is unrelated text, not the end of the outcome block.
const OUTCOME_BLOCK_SPAN: usize = 4;

/// Minimum normalized LCS similarity for a fuzzy full-name match.
const LCS_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Fuzzy matching only kicks in for fragments at least this long; anything
/// shorter matches half the name list by accident.
const LCS_MIN_FRAGMENT_LEN: usize = 10;

/// Candidate fragments extracted from one post, before resolution.
#[derive(Debug, Clone, Default)]
pub struct RawAdmission {
    pub title_fragments: Vec<String>,
    pub body_fragments: Vec<String>,
}

/// One (university, program) admission record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramPair {
    pub level: Option<ProgramLevel>,
    pub name: Option<&'static str>,
    pub university: String,
}

/// Resolved admission outcomes for one post.
#[derive(Debug, Clone, Default)]
pub struct AdmissionInfo {
    pub universities: Vec<String>,
    pub program_levels: Vec<ProgramLevel>,
    pub program_names: Vec<&'static str>,
    pub pairs: Vec<ProgramPair>,
}

/// Parser for the admission-outcome section of a post.
pub struct AdmissionSectionParser {
    tables: Arc<ReferenceTables>,
    ad_re: Regex,
    rej_re: Regex,
    pending_re: Regex,
    useless_re: Regex,
    ascii_re: Regex,
    date_re: Regex,
    title_split_re: Regex,
    body_split_re: Regex,
    state_u_re: Regex,
    univ_dot_re: Regex,
    two_letter_noise_re: Regex,
}

impl AdmissionSectionParser {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        AdmissionSectionParser {
            tables,
            ad_re: Regex::new(r"(?i)(admit|admission|admision|accept|appected|ad |ad:|offer|錄取)")
                .expect("admission marker regex"),
            rej_re: Regex::new(r"(?i)(reject|rejection|rejection:|rej|rej:|拒絕|打槍)")
                .expect("reject marker regex"),
            pending_re: Regex::new(r"(?i)(pending|waitlist|wl |wl:|無聲|無消息)")
                .expect("pending marker regex"),
            useless_re: Regex::new(
                r"(?i)w/|w/o|funding|without|with|stipend|tuition|waived|waive|waiver|fellowship| RA|email|e-mail|year|month|date|interviewed|decision|semester|first|for | per| technical|nomination| by | out|\(|\)",
            )
            .expect("noise denylist regex"),
            ascii_re: Regex::new(r"[^\x00-\x7F]+").expect("non-ascii regex"),
            date_re: Regex::new(r"\d+/\d+").expect("date regex"),
            title_split_re: Regex::new(r"[:;/(),\[\]]").expect("title split regex"),
            body_split_re: Regex::new(r"[:;,/\[\]]").expect("body split regex"),
            state_u_re: Regex::new(r"\w*State U\b").expect("state u regex"),
            univ_dot_re: Regex::new(r"(?i)\w*Univ.\b").expect("univ abbrev regex"),
            two_letter_noise_re: Regex::new(r"(?i)no|yr|ta|ra|ms").expect("two letter noise regex"),
        }
    }

    /// Split a post into candidate admission fragments.
    ///
    /// The outcome block runs from the first admission marker to the nearest
    /// following reject/pending marker (reject wins ties); a reject/pending
    /// marker only counts within [`OUTCOME_BLOCK_SPAN`] lines of the
    /// admission marker, and without an end marker no block is extracted.
    pub fn parse_admission_section(&self, title: &str, content: &str) -> RawAdmission {
        // Title: drop the tag, non-ASCII runs and the noise denylist, then
        // split into fragments.
        let cleaned_title = title.replace("[錄取]", "");
        let cleaned_title = self.ascii_re.replace_all(&cleaned_title, " ");
        let cleaned_title = self.useless_re.replace_all(&cleaned_title, " ");
        let title_fragments: Vec<String> = self
            .title_split_re
            .split(&cleaned_title)
            .map(str::trim)
            .filter(|frag| frag.len() > 1)
            .map(str::to_string)
            .collect();

        let lines: Vec<&str> = content.split('\n').collect();

        let mut ad_idx: Option<usize> = None;
        let mut rej_idx: Option<usize> = None;
        let mut pending_idx: Option<usize> = None;

        for (ridx, line) in lines.iter().enumerate() {
            if self.ad_re.is_match(line)
                && rej_idx.is_none_or(|r| ridx <= r)
                && pending_idx.is_none_or(|p| ridx <= p)
            {
                ad_idx = Some(ridx);
            }
            // An end marker may only (re)place one at or before the
            // admission marker, and must fall within the block span after it.
            let end_marker_ok = |current: Option<usize>| match ad_idx {
                None => current.is_none(),
                Some(a) => {
                    current.is_none_or(|c| c <= a) && ridx <= a + OUTCOME_BLOCK_SPAN
                }
            };
            if self.rej_re.is_match(line) && end_marker_ok(rej_idx) {
                rej_idx = Some(ridx);
            }
            if self.pending_re.is_match(line) && end_marker_ok(pending_idx) {
                pending_idx = Some(ridx);
            }
        }

        // Reject wins ties over pending.
        let end = match (rej_idx, pending_idx) {
            (None, None) => None,
            (Some(r), None) => Some((r, &self.rej_re)),
            (None, Some(p)) => Some((p, &self.pending_re)),
            (Some(r), Some(p)) => {
                if r <= p {
                    Some((r, &self.rej_re))
                } else {
                    Some((p, &self.pending_re))
                }
            }
        };

        let mut body_fragments: Vec<String> = Vec::new();
        if let (Some(ad), Some((end_idx, end_re))) = (ad_idx, end) {
            for idx in ad..=end_idx {
                // Non-ASCII runs become spaces only once the block is known,
                // since the markers themselves can be Chinese.
                let mut line = self.ascii_re.replace_all(lines[idx], " ").to_string();

                if let Some(m) = self.ad_re.find(&line) {
                    line = format!("{}{}", &line[..m.start()], &line[m.end()..]);
                }

                let mut stop = false;
                if let Some(m) = end_re.find(&line) {
                    line.truncate(m.start());
                    stop = true;
                }

                let line = self.date_re.replace_all(&line, " ");
                let mut line = self.useless_re.replace_all(&line, " ").to_string();

                // One or two commas decorate a single entry ("MIT, EECS");
                // more of them means the line enumerates schools.
                if line.matches(',').count() <= 2 {
                    line = line.replace(',', " ");
                }

                body_fragments.extend(
                    self.body_split_re
                        .split(&line)
                        .map(str::trim)
                        .filter(|frag| frag.len() > 1)
                        .map(str::to_string),
                );

                if stop {
                    break;
                }
            }
        }

        RawAdmission {
            title_fragments,
            body_fragments,
        }
    }

    /// Expand spelled-out university abbreviations and drop decoration so
    /// the name lists have something to match against.
    pub fn normalize_university_name(&self, words: &str) -> String {
        let mut words = words.to_string();
        if words.starts_with("U ") {
            words = words.replace("U ", "University of ");
        }
        if words.contains("of") {
            words = words.replace("U. ", "University ");
        } else {
            words = words.replace("U. ", "University of ");
        }
        words = words.replace("U of ", "University of ");
        words = words.replace("Univ ", "University ");
        words = words.replace("UC-", "UC ");
        words = words.replace("University of California,", "University of California ");
        if let Some(m) = self.state_u_re.find(&words) {
            words = format!("{}State University{}", &words[..m.start()], &words[m.end()..]);
        }
        if let Some(m) = self.univ_dot_re.find(&words) {
            words = format!("{}University{}", &words[..m.start()], &words[m.end()..]);
        }
        // Leftover two-letter tokens are noise ("no", "yr", "ta", "ra", "ms").
        if words.len() == 2 && self.two_letter_noise_re.is_match(&words) {
            words.clear();
        }
        words
    }

    /// Resolve one body fragment to a single university name.
    pub fn search_single_university_name(&self, fragment: &str) -> Option<String> {
        let t = &self.tables;
        for name in t.us_top_names {
            if contains_ci(fragment, name) {
                return Some((*name).to_string());
            }
        }
        let padded = format!(" {fragment} ");
        for (uid, name) in t.us_top_uids {
            if padded.contains(&format!(" {uid} ")) {
                return Some((*name).to_string());
            }
        }
        for name in t.us_other_names {
            if contains_ci(fragment, name) {
                return Some((*name).to_string());
            }
        }

        // Fuzzy pass: misspelled full names ("Carnegie Melon") still match
        // via longest-common-subsequence similarity.
        if fragment.len() >= LCS_MIN_FRAGMENT_LEN {
            let mut best: Option<(f64, &str)> = None;
            for name in t.us_top_names.iter().copied() {
                let sim = lcs_similarity(name, fragment);
                if sim > LCS_SIMILARITY_THRESHOLD {
                    let better = match best {
                        None => true,
                        Some((bs, bn)) => sim > bs || (sim == bs && name > bn),
                    };
                    if better {
                        best = Some((sim, name));
                    }
                }
            }
            if let Some((_, name)) = best {
                return Some(name.to_string());
            }
        }

        for (uid, name) in t.us_other_uids {
            if padded.contains(&format!(" {uid} ")) {
                return Some((*name).to_string());
            }
        }
        None
    }

    /// Collect every university named in a title fragment — a single title
    /// often lists several schools.
    pub fn search_all_university_names(&self, text: &str) -> Vec<String> {
        let t = &self.tables;
        let mut result: Vec<String> = Vec::new();
        for name in t.us_top_names {
            if contains_ci(text, name) {
                result.push((*name).to_string());
            }
        }
        let padded = format!(" {text} ");
        for (uid, name) in t.us_top_uids {
            if padded.contains(&format!(" {uid} ")) {
                result.push((*name).to_string());
            }
        }
        for name in t.us_other_names {
            if contains_ci(text, name) {
                result.push((*name).to_string());
            }
        }
        for (uid, name) in t.us_other_uids {
            if padded.contains(&format!(" {uid} ")) {
                result.push((*name).to_string());
            }
        }
        remove_cornell_double_count(&mut result);
        result
    }

    /// Resolve the raw fragments into universities and program pairs.
    pub fn resolve(&self, raw: &RawAdmission) -> AdmissionInfo {
        let t = &self.tables;

        let mut pairs: Vec<ProgramPair> = Vec::new();
        let mut body_unis: Vec<String> = Vec::new();
        let mut levels: Vec<ProgramLevel> = Vec::new();
        let mut names: Vec<&'static str> = Vec::new();
        let mut paired_unis: IndexSet<String> = IndexSet::new();

        for row in &raw.body_fragments {
            let row = self.normalize_university_name(row);
            if row.is_empty() {
                continue;
            }
            let (level, name, remainder) = search_program(t, &row);
            if let Some(level) = level {
                levels.push(level);
            }
            if let Some(name) = name {
                names.push(name);
            }
            if remainder.is_empty() {
                continue;
            }
            if let Some(uni) = self.search_single_university_name(&remainder) {
                body_unis.push(uni.clone());
                if name.is_some() || level.is_some() {
                    pairs.push(ProgramPair {
                        level,
                        name,
                        university: uni.clone(),
                    });
                    paired_unis.insert(uni);
                }
            }
        }

        let mut title_unis: Vec<String> = Vec::new();
        let mut title_levels: Vec<ProgramLevel> = Vec::new();
        let mut title_names: Vec<&'static str> = Vec::new();

        for fragment in &raw.title_fragments {
            let (level, name, remainder) = search_program(t, fragment);
            if let Some(level) = level {
                title_levels.push(level);
            }
            if let Some(name) = name {
                title_names.push(name);
            }
            let remainder = self.normalize_university_name(&remainder);
            if remainder.is_empty() {
                continue;
            }
            title_unis.extend(self.search_all_university_names(&remainder));
        }

        // Union of body- and title-derived universities, insertion-ordered.
        let mut universities: IndexSet<String> = IndexSet::new();
        universities.extend(body_unis.iter().cloned());
        universities.extend(title_unis.iter().cloned());
        let mut universities: Vec<String> = universities.into_iter().collect();
        remove_cornell_double_count(&mut universities);

        // Back-fill missing level/name on existing pairs, title signal first.
        if let Some(level) = title_levels.first().or(levels.first()).copied() {
            for pair in &mut pairs {
                if pair.level.is_none() {
                    pair.level = Some(level);
                }
            }
        }
        if let Some(name) = title_names.first().or(names.first()).copied() {
            for pair in &mut pairs {
                if pair.name.is_none() {
                    pair.name = Some(name);
                }
            }
        }

        // A university with no program association still gets a record,
        // filled from whatever level/name was found anywhere.
        let mut seen: IndexSet<String> = pairs.iter().map(pair_key).collect();
        for uni in &universities {
            if paired_unis.contains(uni) {
                continue;
            }
            let pair = ProgramPair {
                level: title_levels.first().copied().or(levels.first().copied()),
                name: title_names.first().copied().or(names.first().copied()),
                university: uni.clone(),
            };
            if seen.insert(pair_key(&pair)) {
                pairs.push(pair);
            }
        }

        levels.extend(title_levels);
        names.extend(title_names);
        let program_levels: Vec<ProgramLevel> =
            levels.into_iter().collect::<IndexSet<_>>().into_iter().collect();
        let program_names: Vec<&'static str> =
            names.into_iter().collect::<IndexSet<_>>().into_iter().collect();

        AdmissionInfo {
            universities,
            program_levels,
            program_names,
            pairs,
        }
    }
}

/// Composite dedup key for a program/university pair.
fn pair_key(pair: &ProgramPair) -> String {
    format!(
        "{}@{}@{}",
        pair.level.map(|l| l.as_str()).unwrap_or(""),
        pair.name.unwrap_or(""),
        pair.university
    )
}

/// "Cornell Tech" titles usually also spell out "Cornell", which the uid
/// search reads as Cornell University; one outcome must not count as two
/// schools.
fn remove_cornell_double_count(result: &mut Vec<String>) {
    let has_tech = result.iter().any(|u| u == "Cornell Tech");
    if has_tech && let Some(pos) = result.iter().position(|u| u == "Cornell University") {
        result.remove(pos);
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Longest-common-subsequence length, normalized by the shorter string.
fn lcs_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()] as f64 / a.len().min(b.len()) as f64
}
