//! Program resolution: find a level/name pair in a text fragment and
//! canonicalize raw program names into their short forms.

use crate::extract::tables::{ProgramLevel, ProgramType, ReferenceTables};

/// Scan a fragment for a program level and program name.
///
/// Both scans are whitespace-delimited, case-sensitive vocabulary matches;
/// the program-name vocabulary is ordered so the first hit is the intended
/// one. Matched tokens are removed from the fragment and the stripped
/// remainder returned, so a university search downstream is not confused by
/// program tokens.
///
/// One business rule: when `MS` and `PhD` both appear, the level is read as
/// MS — the poster applied to a PhD program and was admitted to the
/// master's. The inverse case is not handled.
pub fn search_program(
    tables: &ReferenceTables,
    fragment: &str,
) -> (Option<ProgramLevel>, Option<&'static str>, String) {
    let mut padded = format!(" {fragment} ");

    let raw_level: Option<&'static str> = if padded.contains(" MS ") && padded.contains(" PhD ") {
        Some("MS")
    } else {
        tables
            .program_levels
            .iter()
            .find(|level| padded.contains(&format!(" {level} ")))
            .copied()
    };

    let name: Option<&'static str> = tables
        .programs
        .iter()
        .find(|program| padded.contains(&format!(" {program} ")))
        .copied();

    if let Some(level) = raw_level {
        padded = padded.replace(&format!(" {level} "), " ");
    }
    if let Some(name) = name {
        padded = padded.replace(&format!(" {name} "), " ");
    }

    let mut level = raw_level.map(|raw| {
        if raw.starts_with('P') || raw.starts_with('p') {
            ProgramLevel::Phd
        } else {
            ProgramLevel::Ms
        }
    });

    // A master's-only program implies the level even when none was written.
    if level.is_none()
        && let Some(name) = name
        && tables.masters_only.contains(name)
    {
        level = Some(ProgramLevel::Ms);
    }

    (level, name, padded.trim().to_string())
}

/// Canonicalize a raw program name given its resolved level.
///
/// Table-driven by the program's coarse type; pure and deterministic, and
/// idempotent over its own outputs (every canonical form is classified and
/// rewrites to itself).
pub fn normalize_program_name(
    tables: &ReferenceTables,
    level: Option<ProgramLevel>,
    name: &str,
) -> String {
    let Some(ptype) = tables.program_type(name) else {
        return name.to_string();
    };

    match ptype {
        ProgramType::Meng => "MEng".to_string(),
        ProgramType::Se => {
            let stripped = name.replace(' ', "");
            match stripped.as_str() {
                "MSE" | "SiliconValley" | "SV-SE" | "SE" | "SoftwareEngineering" => {
                    "MSSE".to_string()
                }
                _ => stripped,
            }
        }
        ProgramType::Is => {
            let stripped = name.replace(' ', "");
            match stripped.as_str() {
                "InformationManagement" => "MSIM".to_string(),
                "MasterofScienceinInformation" | "InformationSystem" => "MSIS".to_string(),
                _ => stripped,
            }
        }
        ProgramType::Hci => match name {
            "Human-Centered Design and Engineering" | "MCDE" => "MCDE".to_string(),
            _ => "MHCI".to_string(),
        },
        ProgramType::Ee => {
            if level == Some(ProgramLevel::Ms) {
                match name {
                    "MSECE" | "MS ECE" => "MS ECE".to_string(),
                    _ => "MSEE".to_string(),
                }
            } else {
                "EE".to_string()
            }
        }
        ProgramType::Cs => {
            let name = name.strip_prefix("CMU ").unwrap_or(name);
            let ms = level == Some(ProgramLevel::Ms);
            match name {
                "MSCS" | "MS CS" | "Master of Science in Computer Science" | "MS in CS" => {
                    "MSCS".to_string()
                }
                "Computer Science" | "CS" | "CSE" => {
                    if ms { "MSCS" } else { "CS" }.to_string()
                }
                "Professional CS" | "MCS" | "Master of Computer Science" => "MCS".to_string(),
                "EE CS" | "EECS" => if ms { "MS EECS" } else { "EECS" }.to_string(),
                "CV" | "Computer Vision" => if ms { "MSCV" } else { "CV" }.to_string(),
                "MSIT-Mob" => "MSIT-MOB".to_string(),
                "MS in Machine Learning" => "MSML".to_string(),
                _ => name.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ReferenceTables {
        ReferenceTables::load().unwrap()
    }

    #[test]
    fn ms_and_phd_together_resolve_to_ms() {
        let t = tables();
        let (level, _, _) = search_program(&t, "CMU MS PhD");
        assert_eq!(level, Some(ProgramLevel::Ms));
        let (level, _, _) = search_program(&t, "applied PhD got MS offer");
        assert_eq!(level, Some(ProgramLevel::Ms));
    }

    #[test]
    fn level_token_canonicalization() {
        let t = tables();
        for (input, expected) in [
            ("Stanford PhD", ProgramLevel::Phd),
            ("Stanford Phd", ProgramLevel::Phd),
            ("Stanford phd", ProgramLevel::Phd),
            ("Stanford MS", ProgramLevel::Ms),
            ("Stanford Master", ProgramLevel::Ms),
            ("Stanford MSc", ProgramLevel::Ms),
        ] {
            let (level, _, _) = search_program(&t, input);
            assert_eq!(level, Some(expected), "input: {input}");
        }
    }

    #[test]
    fn masters_only_program_defaults_level_to_ms() {
        let t = tables();
        let (level, name, _) = search_program(&t, "CMU MHCI");
        assert_eq!(name, Some("MHCI"));
        assert_eq!(level, Some(ProgramLevel::Ms));
    }

    #[test]
    fn non_masters_program_leaves_level_unset() {
        let t = tables();
        let (level, name, _) = search_program(&t, "MIT EECS");
        assert_eq!(name, Some("EECS"));
        assert_eq!(level, None);
    }

    #[test]
    fn matched_tokens_are_stripped_from_remainder() {
        let t = tables();
        let (level, name, remainder) = search_program(&t, "Stanford MS Computer Science");
        assert_eq!(level, Some(ProgramLevel::Ms));
        assert_eq!(name, Some("Computer Science"));
        assert_eq!(remainder, "Stanford");

        let (_, name, remainder) = search_program(&t, "MIT MSCS");
        assert_eq!(name, Some("MSCS"));
        assert_eq!(remainder, "MIT");
    }

    #[test]
    fn descriptive_names_win_over_embedded_short_forms() {
        let t = tables();
        let (_, name, _) = search_program(&t, "UIUC Master of Computer Science");
        assert_eq!(name, Some("Master of Computer Science"));
    }

    #[test]
    fn no_match_returns_fragment_unchanged() {
        let t = tables();
        let (level, name, remainder) = search_program(&t, "Cornell Tech");
        assert_eq!(level, None);
        assert_eq!(name, None);
        assert_eq!(remainder, "Cornell Tech");
    }

    #[test]
    fn normalize_collapses_cs_synonyms() {
        let t = tables();
        let ms = Some(ProgramLevel::Ms);
        let phd = Some(ProgramLevel::Phd);
        assert_eq!(normalize_program_name(&t, ms, "Computer Science"), "MSCS");
        assert_eq!(normalize_program_name(&t, phd, "Computer Science"), "CS");
        assert_eq!(normalize_program_name(&t, ms, "MS in CS"), "MSCS");
        assert_eq!(normalize_program_name(&t, ms, "EECS"), "MS EECS");
        assert_eq!(normalize_program_name(&t, phd, "EE CS"), "EECS");
        assert_eq!(normalize_program_name(&t, ms, "Computer Vision"), "MSCV");
        assert_eq!(normalize_program_name(&t, ms, "Professional CS"), "MCS");
        assert_eq!(normalize_program_name(&t, ms, "MSIT-Mob"), "MSIT-MOB");
        assert_eq!(
            normalize_program_name(&t, ms, "MS in Machine Learning"),
            "MSML"
        );
    }

    #[test]
    fn normalize_ee_depends_on_level() {
        let t = tables();
        assert_eq!(
            normalize_program_name(&t, Some(ProgramLevel::Ms), "EE"),
            "MSEE"
        );
        assert_eq!(
            normalize_program_name(&t, Some(ProgramLevel::Ms), "MSECE"),
            "MS ECE"
        );
        assert_eq!(
            normalize_program_name(&t, Some(ProgramLevel::Phd), "ECE"),
            "EE"
        );
        assert_eq!(normalize_program_name(&t, None, "EE"), "EE");
    }

    #[test]
    fn normalize_other_types() {
        let t = tables();
        let ms = Some(ProgramLevel::Ms);
        assert_eq!(normalize_program_name(&t, ms, "Software Engineering"), "MSSE");
        assert_eq!(normalize_program_name(&t, ms, "Silicon Valley"), "MSSE");
        assert_eq!(normalize_program_name(&t, ms, "Information Management"), "MSIM");
        assert_eq!(normalize_program_name(&t, ms, "Information System"), "MSIS");
        assert_eq!(
            normalize_program_name(&t, ms, "Human-Computer Interaction"),
            "MHCI"
        );
        assert_eq!(
            normalize_program_name(&t, ms, "Human-Centered Design and Engineering"),
            "MCDE"
        );
        assert_eq!(normalize_program_name(&t, ms, "MEng"), "MEng");
    }

    #[test]
    fn normalize_unknown_name_passes_through() {
        let t = tables();
        assert_eq!(
            normalize_program_name(&t, Some(ProgramLevel::Ms), "Astrophysics"),
            "Astrophysics"
        );
    }

    #[test]
    fn normalize_is_idempotent_over_canonical_outputs() {
        let t = tables();
        let ms = Some(ProgramLevel::Ms);
        let phd = Some(ProgramLevel::Phd);
        let cases = [
            ("MSCS", ms),
            ("MCS", ms),
            ("MS EECS", ms),
            ("EECS", phd),
            ("MSCV", ms),
            ("CV", phd),
            ("CS", phd),
            ("MSEE", ms),
            ("MS ECE", ms),
            ("EE", phd),
            ("MSSE", ms),
            ("MSIS", ms),
            ("MSIM", ms),
            ("MHCI", ms),
            ("MCDE", ms),
            ("MEng", ms),
            ("MSIT-MOB", ms),
            ("MSML", ms),
        ];
        for (name, level) in cases {
            let once = normalize_program_name(&t, level, name);
            assert_eq!(once, name, "'{name}' should already be canonical");
            let twice = normalize_program_name(&t, level, &once);
            assert_eq!(twice, once, "'{name}' should be a fixed point");
        }
    }
}
