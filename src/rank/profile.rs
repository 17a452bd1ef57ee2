//! Query-boundary validation and free-text profile resolution.
//!
//! Incoming requests carry free text ("交大", "UC-Berkeley", "MHCI"); this
//! module validates the bounded fields and resolves the text through the
//! same tables and resolvers the extraction pipeline uses, so queries and
//! records meet in one vocabulary.

use serde::Deserialize;

use crate::extract::admission::AdmissionSectionParser;
use crate::extract::background::BackgroundResolver;
use crate::extract::programs::{normalize_program_name, search_program};
use crate::extract::tables::{ProgramLevel, ProgramType, ReferenceTables};
use indexmap::IndexSet;

/// GPA bounds accepted at the query boundary.
const GPA_RANGE: std::ops::RangeInclusive<f64> = 0.0..=4.3;

/// A raw ranking request, exactly as the serving layer receives it.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub gpa: f64,
    #[serde(default)]
    pub target_schools: Vec<String>,
    #[serde(default)]
    pub target_programs: Vec<String>,
    #[serde(default)]
    pub program_types: Vec<String>,
    #[serde(default = "default_program_level")]
    pub program_level: String,
}

fn default_program_level() -> String {
    "MS".to_string()
}

/// Boundary violations, rejected before anything reaches the engine.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid GPA {0}, must be in range [0, 4.3]")]
    InvalidGpa(f64),
    #[error("invalid program level '{0}', must be MS or PhD")]
    InvalidProgramLevel(String),
    #[error("invalid program type '{0}', expected one of CS, EE, SE, IS, HCI, MEng")]
    InvalidProgramType(String),
}

/// A fully resolved query profile, ready for scoring.
#[derive(Debug, Clone)]
pub struct QueryProfile {
    pub uni_id: Option<&'static str>,
    pub major_id: Option<&'static str>,
    pub major_type: Option<&'static str>,
    pub gpa: f64,
    /// Resolved target-school full names.
    pub target_universities: Vec<String>,
    /// Canonical target program names.
    pub target_programs: Vec<String>,
    pub program_types: Vec<ProgramType>,
    pub program_level: ProgramLevel,
}

impl CandidateQuery {
    /// Validate the bounded fields and resolve the free-text ones.
    pub fn resolve(
        &self,
        tables: &ReferenceTables,
        background: &BackgroundResolver,
        admission: &AdmissionSectionParser,
    ) -> Result<QueryProfile, ValidationError> {
        if !GPA_RANGE.contains(&self.gpa) {
            return Err(ValidationError::InvalidGpa(self.gpa));
        }
        let program_level = ProgramLevel::parse(&self.program_level)
            .ok_or_else(|| ValidationError::InvalidProgramLevel(self.program_level.clone()))?;

        let mut program_types: IndexSet<ProgramType> = IndexSet::new();
        for raw in &self.program_types {
            let ptype = ProgramType::parse(raw)
                .ok_or_else(|| ValidationError::InvalidProgramType(raw.clone()))?;
            program_types.insert(ptype);
        }

        let uni_id = self
            .university
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| background.sentence2university(s))
            .map(|(uid, _)| uid);

        let major_id = self
            .major
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| background.sentence2major(s, None));
        let major_type = major_id.and_then(|mid| tables.mid2mtype.get(mid).copied());

        let target_universities: Vec<String> = self
            .target_schools
            .iter()
            .filter_map(|school| {
                let normalized = admission.normalize_university_name(school);
                admission.search_single_university_name(&normalized)
            })
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();

        // Target programs resolve to canonical names and contribute their
        // types alongside the explicitly requested ones.
        let mut target_programs: IndexSet<String> = IndexSet::new();
        for program in &self.target_programs {
            let (level, name, _) = search_program(tables, program);
            if let Some(name) = name {
                let canonical = normalize_program_name(tables, level, name);
                if let Some(ptype) = tables.program_type(&canonical) {
                    program_types.insert(ptype);
                }
                target_programs.insert(canonical);
            }
        }

        Ok(QueryProfile {
            uni_id,
            major_id,
            major_type,
            gpa: self.gpa,
            target_universities,
            target_programs: target_programs.into_iter().collect(),
            program_types: program_types.into_iter().collect(),
            program_level,
        })
    }
}
