//! Static reference tables: university aliases, major aliases, and the
//! graduate-program vocabulary.
//!
//! All lookup data is compiled into the binary and materialized once at
//! startup into an immutable [`ReferenceTables`] that every resolver borrows
//! through an `Arc`. Nothing here mutates after load.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Taiwan universities: `(uid, chinese name, chinese abbr, english name, campus ip prefix)`.
///
/// Order matters for the suffix/substring match rules: longer uids that share
/// a suffix with a shorter one must come first.
const TW_UNIVERSITIES: &[(&str, &str, &str, &str, Option<&str>)] = &[
    ("NTUST", "國立臺灣科技大學", "台科大", "National Taiwan University of Science and Technology", Some("140.118")),
    ("NTUT", "國立臺北科技大學", "北科大", "National Taipei University of Technology", Some("140.124")),
    ("NTNU", "國立臺灣師範大學", "師大", "National Taiwan Normal University", Some("140.122")),
    ("NTPU", "國立臺北大學", "北大", "National Taipei University", None),
    ("NTHU", "國立清華大學", "清大", "National Tsing Hua University", Some("140.114")),
    ("NTU", "國立臺灣大學", "台大", "National Taiwan University", Some("140.112")),
    ("NCTU", "國立交通大學", "交大", "National Chiao Tung University", Some("140.113")),
    ("NCKU", "國立成功大學", "成大", "National Cheng Kung University", Some("140.116")),
    ("NCCU", "國立政治大學", "政大", "National Chengchi University", Some("140.119")),
    ("NCNU", "國立暨南國際大學", "暨大", "National Chi Nan University", None),
    ("NCHU", "國立中興大學", "中興", "National Chung Hsing University", Some("140.120")),
    ("NCU", "國立中央大學", "中央", "National Central University", Some("140.115")),
    ("NSYSU", "國立中山大學", "中山", "National Sun Yat-sen University", Some("140.117")),
    ("NDHU", "國立東華大學", "東華", "National Dong Hwa University", None),
    ("CCU", "國立中正大學", "中正", "National Chung Cheng University", Some("140.123")),
    ("CYCU", "中原大學", "中原", "Chung Yuan Christian University", None),
    ("YZU", "元智大學", "元智", "Yuan Ze University", None),
    ("FJU", "輔仁大學", "輔大", "Fu Jen Catholic University", None),
    ("FCU", "逢甲大學", "逢甲", "Feng Chia University", None),
    ("TKU", "淡江大學", "淡江", "Tamkang University", None),
];

/// Majors: `(major_id, chinese name, chinese abbr, english name, major type)`.
///
/// Same ordering rule as the universities: `CSIE` must precede `CS` and `IE`
/// so the suffix match resolves `NTUCSIE` to the right id.
const MAJORS: &[(&str, &str, &str, &str, &str)] = &[
    ("CSIE", "資訊工程學系", "資工", "Computer Science and Information Engineering", "CS"),
    ("GINM", "資訊網路與多媒體研究所", "網媒", "Networking and Multimedia", "CS"),
    ("COMM", "電信工程學研究所", "電信", "Communication Engineering", "EE"),
    ("CHEM", "化學系", "化學", "Chemistry", "SCI"),
    ("ACCT", "會計學系", "會計", "Accounting", "BUS"),
    ("ECON", "經濟學系", "經濟", "Economics", "SOC"),
    ("MATH", "數學系", "數學", "Mathematics", "MATH"),
    ("PHYS", "物理學系", "物理", "Physics", "SCI"),
    ("STAT", "統計學系", "統計", "Statistics", "STAT"),
    ("CHE", "化學工程學系", "化工", "Chemical Engineering", "CHE"),
    ("FIN", "財務金融學系", "財金", "Finance", "BUS"),
    ("BIO", "生命科學系", "生科", "Life Science", "SCI"),
    ("PSY", "心理學系", "心理", "Psychology", "SOC"),
    ("ENT", "昆蟲學系", "昆蟲", "Entomology", "SCI"),
    ("ATM", "大氣科學系", "大氣", "Atmospheric Sciences", "SCI"),
    ("CS", "資訊科學系", "資科", "Computer Science", "CS"),
    ("IM", "資訊管理學系", "資管", "Information Management", "IS"),
    ("EE", "電機工程學系", "電機", "Electrical Engineering", "EE"),
    ("CE", "土木工程學系", "土木", "Civil Engineering", "CE"),
    ("ME", "機械工程學系", "機械", "Mechanical Engineering", "ME"),
    ("IE", "工業工程學研究所", "工工", "Industrial Engineering", "IE"),
    ("BA", "工商管理學系", "企管", "Business Administration", "BUS"),
];

/// Top-tier US universities by full name (the list LCS similarity runs against).
const US_TOP_NAMES: &[&str] = &[
    "Massachusetts Institute of Technology",
    "Stanford University",
    "Carnegie Mellon University",
    "University of California Berkeley",
    "University of Illinois Urbana-Champaign",
    "Cornell Tech",
    "Cornell University",
    "University of Washington",
    "Georgia Institute of Technology",
    "Princeton University",
    "University of Texas at Austin",
    "University of Michigan",
    "California Institute of Technology",
    "Columbia University",
    "University of California Los Angeles",
    "University of California San Diego",
    "University of Wisconsin-Madison",
    "University of Maryland College Park",
    "Harvard University",
    "University of Pennsylvania",
    "Purdue University",
    "Rice University",
    "University of Southern California",
    "Yale University",
    "Duke University",
    "Brown University",
    "Johns Hopkins University",
    "New York University",
    "Northwestern University",
    "Ohio State University",
    "Pennsylvania State University",
    "Rutgers University",
    "Stony Brook University",
    "Texas A&M University",
    "University of California Davis",
    "University of California Irvine",
    "University of California Santa Barbara",
    "University of Chicago",
    "University of Colorado Boulder",
    "University of Massachusetts Amherst",
    "University of Minnesota Twin Cities",
    "University of North Carolina at Chapel Hill",
    "University of Virginia",
    "Virginia Tech",
    "Arizona State University",
    "North Carolina State University",
    "Northeastern University",
    "Boston University",
    "University of Florida",
    "University of Pittsburgh",
];

/// Top-tier uid -> full name. Matched as a space-delimited token, case-sensitive.
const US_TOP_UIDS: &[(&str, &str)] = &[
    ("MIT", "Massachusetts Institute of Technology"),
    ("CMU", "Carnegie Mellon University"),
    ("UCB", "University of California Berkeley"),
    ("Berkeley", "University of California Berkeley"),
    ("UCLA", "University of California Los Angeles"),
    ("UCSD", "University of California San Diego"),
    ("UCSB", "University of California Santa Barbara"),
    ("UCI", "University of California Irvine"),
    ("UIUC", "University of Illinois Urbana-Champaign"),
    ("UW", "University of Washington"),
    ("UDub", "University of Washington"),
    ("GaTech", "Georgia Institute of Technology"),
    ("Gatech", "Georgia Institute of Technology"),
    ("Caltech", "California Institute of Technology"),
    ("USC", "University of Southern California"),
    ("NYU", "New York University"),
    ("JHU", "Johns Hopkins University"),
    ("UMich", "University of Michigan"),
    ("Umich", "University of Michigan"),
    ("UPenn", "University of Pennsylvania"),
    ("UT", "University of Texas at Austin"),
    ("UTAustin", "University of Texas at Austin"),
    ("UMD", "University of Maryland College Park"),
    ("OSU", "Ohio State University"),
    ("Ohio State", "Ohio State University"),
    ("PSU", "Pennsylvania State University"),
    ("Penn State", "Pennsylvania State University"),
    ("TAMU", "Texas A&M University"),
    ("NCSU", "North Carolina State University"),
    ("ASU", "Arizona State University"),
    ("UMass", "University of Massachusetts Amherst"),
    ("UMN", "University of Minnesota Twin Cities"),
    ("UNC", "University of North Carolina at Chapel Hill"),
    ("UW-Madison", "University of Wisconsin-Madison"),
    ("Wisconsin", "University of Wisconsin-Madison"),
    ("Purdue", "Purdue University"),
    ("Cornell", "Cornell University"),
    ("Stanford", "Stanford University"),
    ("Columbia", "Columbia University"),
    ("Princeton", "Princeton University"),
    ("Harvard", "Harvard University"),
    ("Yale", "Yale University"),
    ("Duke", "Duke University"),
    ("Brown", "Brown University"),
    ("Rice", "Rice University"),
    ("Northwestern", "Northwestern University"),
    ("Northeastern", "Northeastern University"),
    ("NEU", "Northeastern University"),
    ("Rutgers", "Rutgers University"),
    ("VT", "Virginia Tech"),
    ("UVA", "University of Virginia"),
    ("BU", "Boston University"),
    ("UF", "University of Florida"),
    ("Pitt", "University of Pittsburgh"),
    ("SBU", "Stony Brook University"),
    ("UChicago", "University of Chicago"),
];

/// Long-tail US universities by full name.
const US_OTHER_NAMES: &[&str] = &[
    "Rochester Institute of Technology",
    "Worcester Polytechnic Institute",
    "University of California Santa Cruz",
    "University of California Riverside",
    "Rensselaer Polytechnic Institute",
    "Santa Clara University",
    "Stevens Institute of Technology",
    "Illinois Institute of Technology",
    "Syracuse University",
    "George Mason University",
    "George Washington University",
    "Indiana University Bloomington",
    "Iowa State University",
    "Michigan State University",
    "Oregon State University",
    "Texas Tech University",
    "Tufts University",
    "University of Arizona",
    "University of Central Florida",
    "University of Connecticut",
    "University of Delaware",
    "University of Houston",
    "University of Iowa",
    "University of Oregon",
    "University of Rochester",
    "University of Utah",
    "University at Buffalo",
    "Vanderbilt University",
    "Washington University in St. Louis",
    "Dartmouth College",
    "Emory University",
    "Case Western Reserve University",
    "Clemson University",
    "Colorado School of Mines",
    "Drexel University",
];

/// Long-tail uid -> full name.
const US_OTHER_UIDS: &[(&str, &str)] = &[
    ("RIT", "Rochester Institute of Technology"),
    ("WPI", "Worcester Polytechnic Institute"),
    ("UCSC", "University of California Santa Cruz"),
    ("UCR", "University of California Riverside"),
    ("RPI", "Rensselaer Polytechnic Institute"),
    ("SCU", "Santa Clara University"),
    ("IIT", "Illinois Institute of Technology"),
    ("GMU", "George Mason University"),
    ("GWU", "George Washington University"),
    ("MSU", "Michigan State University"),
    ("UCF", "University of Central Florida"),
    ("UConn", "University of Connecticut"),
    ("UB", "University at Buffalo"),
    ("UH", "University of Houston"),
    ("WUSTL", "Washington University in St. Louis"),
    ("WashU", "Washington University in St. Louis"),
    ("CWRU", "Case Western Reserve University"),
];

/// Program level tokens, matched whitespace-delimited and case-sensitive.
pub const PROGRAM_LEVELS: &[&str] = &["PhD", "Phd", "PHD", "phd", "MS", "M.S.", "Master", "MSc"];

/// Program name vocabulary, matched whitespace-delimited and case-sensitive.
///
/// First match wins, so the ordering is curated: long descriptive names
/// first, then the 4-5 letter short forms, then the ambiguous 2-letter codes
/// that would otherwise shadow everything.
pub const PROGRAMS: &[&str] = &[
    "Master of Science in Computer Science",
    "Master of Computer Science",
    "Master of Science in Information",
    "Human-Centered Design and Engineering",
    "Human-Computer Interaction",
    "MS in Machine Learning",
    "Machine Learning",
    "Computer Science",
    "Computer Vision",
    "Software Engineering",
    "Information Management",
    "Information System",
    "Silicon Valley",
    "Professional CS",
    "MS in HCI",
    "MS in CS",
    "MSIT-Mob",
    "MS EECS",
    "MS ECE",
    "MSECE",
    "MSCS",
    "MSCV",
    "MSEE",
    "MSSE",
    "MSIS",
    "MSIM",
    "MSML",
    "MCDE",
    "MHCI",
    "MEng",
    "EECS",
    "EE CS",
    "MCS",
    "CSE",
    "ECE",
    "LTI",
    "MSE",
    "SV-SE",
    "HCI",
    "Robotics",
    "CS",
    "EE",
    "SE",
    "CV",
];

/// Program names that only exist at the master's level; a hit with no level
/// token defaults the level to MS.
const MASTERS_ONLY: &[&str] = &[
    "Master of Science in Computer Science",
    "Master of Computer Science",
    "Master of Science in Information",
    "MS in Machine Learning",
    "MS in HCI",
    "MS in CS",
    "MSIT-Mob",
    "MS EECS",
    "MS ECE",
    "MSECE",
    "MSCS",
    "MSCV",
    "MSEE",
    "MSSE",
    "MSIS",
    "MSIM",
    "MSML",
    "MCDE",
    "MHCI",
    "MEng",
    "MCS",
    "MSE",
];

/// Program -> coarse type classification. Includes both the raw vocabulary
/// and every canonical output of program-name normalization, so a normalized
/// name can be re-classified (and re-normalized to itself).
const PROGRAM_TYPE_TABLE: &[(ProgramType, &[&str])] = &[
    (
        ProgramType::Cs,
        &[
            "Master of Science in Computer Science",
            "Master of Computer Science",
            "MS in Machine Learning",
            "Machine Learning",
            "Computer Science",
            "Computer Vision",
            "Professional CS",
            "MS in CS",
            "MSIT-Mob",
            "MSIT-MOB",
            "MS EECS",
            "MSCS",
            "MSCV",
            "MSML",
            "EECS",
            "EE CS",
            "MCS",
            "CSE",
            "LTI",
            "Robotics",
            "CS",
            "CV",
        ],
    ),
    (ProgramType::Ee, &["MS ECE", "MSECE", "MSEE", "ECE", "EE"]),
    (
        ProgramType::Se,
        &["Software Engineering", "Silicon Valley", "SV-SE", "MSE", "MSSE", "SE"],
    ),
    (
        ProgramType::Is,
        &[
            "Master of Science in Information",
            "Information Management",
            "Information System",
            "MSIS",
            "MSIM",
        ],
    ),
    (
        ProgramType::Hci,
        &[
            "Human-Centered Design and Engineering",
            "Human-Computer Interaction",
            "MS in HCI",
            "MCDE",
            "MHCI",
            "HCI",
        ],
    ),
    (ProgramType::Meng, &["MEng"]),
];

/// Coarse category of a graduate program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramType {
    #[serde(rename = "CS")]
    Cs,
    #[serde(rename = "EE")]
    Ee,
    #[serde(rename = "SE")]
    Se,
    #[serde(rename = "IS")]
    Is,
    #[serde(rename = "HCI")]
    Hci,
    #[serde(rename = "MEng")]
    Meng,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::Cs => "CS",
            ProgramType::Ee => "EE",
            ProgramType::Se => "SE",
            ProgramType::Is => "IS",
            ProgramType::Hci => "HCI",
            ProgramType::Meng => "MEng",
        }
    }

    /// Parse the exact external spelling. The six strings here are the whole
    /// program-type vocabulary accepted at the query boundary.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CS" => Some(ProgramType::Cs),
            "EE" => Some(ProgramType::Ee),
            "SE" => Some(ProgramType::Se),
            "IS" => Some(ProgramType::Is),
            "HCI" => Some(ProgramType::Hci),
            "MEng" => Some(ProgramType::Meng),
            _ => None,
        }
    }
}

/// MS or PhD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramLevel {
    #[serde(rename = "MS")]
    Ms,
    #[serde(rename = "PhD")]
    Phd,
}

impl ProgramLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramLevel::Ms => "MS",
            ProgramLevel::Phd => "PhD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MS" => Some(ProgramLevel::Ms),
            "PHD" => Some(ProgramLevel::Phd),
            _ => None,
        }
    }
}

/// Table-load failures. These are build-data bugs, not runtime conditions,
/// so the process refuses to start on any of them.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("program '{0}' has no type classification")]
    UnclassifiedProgram(&'static str),
    #[error("master's-only program '{0}' is not in the vocabulary")]
    UnknownMastersProgram(&'static str),
    #[error("program '{0}' is classified under more than one type")]
    DuplicateClassification(&'static str),
}

/// Immutable lookup structure shared by every resolver.
pub struct ReferenceTables {
    // Taiwan universities
    pub uid2cname: HashMap<&'static str, &'static str>,
    pub cname2uid: HashMap<&'static str, &'static str>,
    pub cabbr2uid: Vec<(&'static str, &'static str)>,
    /// English full name -> uid, in table order (scanned for containment).
    pub name2uid: Vec<(&'static str, &'static str)>,
    pub ip2uid: HashMap<&'static str, &'static str>,
    /// uids in table order, for the anchored suffix match.
    pub uids: Vec<&'static str>,

    // Majors
    pub mid2cname: HashMap<&'static str, &'static str>,
    pub major_cname2mid: HashMap<&'static str, &'static str>,
    pub major_cabbr2mid: Vec<(&'static str, &'static str)>,
    /// English major name -> major id, in table order (scanned for containment).
    pub major_name2mid: Vec<(&'static str, &'static str)>,
    pub mid2mtype: HashMap<&'static str, &'static str>,
    pub mids: Vec<&'static str>,

    // US universities
    pub us_top_names: &'static [&'static str],
    pub us_top_uids: &'static [(&'static str, &'static str)],
    pub us_other_names: &'static [&'static str],
    pub us_other_uids: &'static [(&'static str, &'static str)],

    // Programs
    pub program_levels: &'static [&'static str],
    pub programs: &'static [&'static str],
    pub masters_only: HashSet<&'static str>,
    pub program2type: HashMap<&'static str, ProgramType>,
}

impl ReferenceTables {
    /// Build all index maps from the compiled-in tables, validating the
    /// program classification invariant.
    pub fn load() -> Result<Self, TableError> {
        let mut program2type: HashMap<&'static str, ProgramType> = HashMap::new();
        for (ptype, names) in PROGRAM_TYPE_TABLE.iter() {
            for name in names.iter().copied() {
                if program2type.insert(name, *ptype).is_some() {
                    return Err(TableError::DuplicateClassification(name));
                }
            }
        }
        // Every vocabulary entry must classify to exactly one type.
        for program in PROGRAMS.iter().copied() {
            if !program2type.contains_key(program) {
                return Err(TableError::UnclassifiedProgram(program));
            }
        }
        let masters_only: HashSet<&'static str> = MASTERS_ONLY.iter().copied().collect();
        for name in masters_only.iter().copied() {
            if !PROGRAMS.contains(&name) {
                return Err(TableError::UnknownMastersProgram(name));
            }
        }

        let mut tables = ReferenceTables {
            uid2cname: HashMap::new(),
            cname2uid: HashMap::new(),
            cabbr2uid: Vec::new(),
            name2uid: Vec::new(),
            ip2uid: HashMap::new(),
            uids: Vec::new(),
            mid2cname: HashMap::new(),
            major_cname2mid: HashMap::new(),
            major_cabbr2mid: Vec::new(),
            major_name2mid: Vec::new(),
            mid2mtype: HashMap::new(),
            mids: Vec::new(),
            us_top_names: US_TOP_NAMES,
            us_top_uids: US_TOP_UIDS,
            us_other_names: US_OTHER_NAMES,
            us_other_uids: US_OTHER_UIDS,
            program_levels: PROGRAM_LEVELS,
            programs: PROGRAMS,
            masters_only,
            program2type,
        };

        for (uid, cname, cabbr, name, ip) in TW_UNIVERSITIES.iter().copied() {
            tables.uid2cname.insert(uid, cname);
            tables.cname2uid.insert(cname, uid);
            tables.cabbr2uid.push((cabbr, uid));
            tables.name2uid.push((name, uid));
            if let Some(ip) = ip {
                tables.ip2uid.insert(ip, uid);
            }
            tables.uids.push(uid);
        }

        for (mid, cname, cabbr, name, mtype) in MAJORS.iter().copied() {
            tables.mid2cname.insert(mid, cname);
            tables.major_cname2mid.insert(cname, mid);
            tables.major_cabbr2mid.push((cabbr, mid));
            tables.major_name2mid.push((name, mid));
            tables.mid2mtype.insert(mid, mtype);
            tables.mids.push(mid);
        }

        Ok(tables)
    }

    /// Coarse type for a program name, `None` when the name is unknown.
    pub fn program_type(&self, program: &str) -> Option<ProgramType> {
        self.program2type.get(program).copied()
    }

    /// Full Taiwan-university row for a resolved uid.
    pub fn tw_university(&self, uid: &str) -> Option<TwUniversityInfo> {
        TW_UNIVERSITIES
            .iter()
            .copied()
            .find(|(u, ..)| *u == uid)
            .map(|(uid, cname, cabbr, name, _)| TwUniversityInfo {
                uid,
                cname,
                cabbr,
                name,
            })
    }

    /// Full major row for a resolved major id.
    pub fn major(&self, mid: &str) -> Option<MajorInfo> {
        MAJORS
            .iter()
            .copied()
            .find(|(m, ..)| *m == mid)
            .map(|(mid, cname, cabbr, name, mtype)| MajorInfo {
                mid,
                cname,
                cabbr,
                name,
                mtype,
            })
    }
}

/// Denormalized Taiwan-university row, used to enrich persisted records.
#[derive(Debug, Clone, Copy)]
pub struct TwUniversityInfo {
    pub uid: &'static str,
    pub cname: &'static str,
    pub cabbr: &'static str,
    pub name: &'static str,
}

/// Denormalized major row.
#[derive(Debug, Clone, Copy)]
pub struct MajorInfo {
    pub mid: &'static str,
    pub cname: &'static str,
    pub cabbr: &'static str,
    pub name: &'static str,
    pub mtype: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_load() {
        let tables = ReferenceTables::load().expect("reference tables should load");
        assert_eq!(tables.cname2uid["國立臺灣大學"], "NTU");
        assert_eq!(tables.uid2cname["NCTU"], "國立交通大學");
        assert_eq!(tables.ip2uid["140.112"], "NTU");
        assert_eq!(tables.major_cname2mid["資訊工程學系"], "CSIE");
        assert_eq!(tables.mid2mtype["EE"], "EE");
    }

    #[test]
    fn every_program_is_classified() {
        let tables = ReferenceTables::load().unwrap();
        for program in PROGRAMS {
            assert!(
                tables.program_type(program).is_some(),
                "program '{program}' missing a type"
            );
        }
    }

    #[test]
    fn masters_only_within_vocabulary() {
        let tables = ReferenceTables::load().unwrap();
        for name in &tables.masters_only {
            assert!(PROGRAMS.contains(name), "'{name}' not in vocabulary");
        }
    }

    #[test]
    fn longer_uids_precede_their_suffix_collisions() {
        let tables = ReferenceTables::load().unwrap();
        let pos = |uid: &str| tables.uids.iter().position(|u| *u == uid).unwrap();
        assert!(pos("NTUST") < pos("NTU"));
        assert!(pos("NTUT") < pos("NTU"));
        let mpos = |mid: &str| tables.mids.iter().position(|m| *m == mid).unwrap();
        assert!(mpos("CSIE") < mpos("CS"));
        assert!(mpos("CSIE") < mpos("IE"));
    }

    #[test]
    fn program_type_vocabulary_round_trip() {
        for s in ["CS", "EE", "SE", "IS", "HCI", "MEng"] {
            assert_eq!(ProgramType::parse(s).unwrap().as_str(), s);
        }
        assert!(ProgramType::parse("meng").is_none());
        assert!(ProgramType::parse("ML").is_none());
    }

    #[test]
    fn program_level_parse_is_case_insensitive() {
        assert_eq!(ProgramLevel::parse("ms"), Some(ProgramLevel::Ms));
        assert_eq!(ProgramLevel::parse("PHD"), Some(ProgramLevel::Phd));
        assert_eq!(ProgramLevel::parse("Phd"), Some(ProgramLevel::Phd));
        assert_eq!(ProgramLevel::parse("bachelor"), None);
    }
}
