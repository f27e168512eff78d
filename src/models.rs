use serde::{Deserialize, Serialize};

use crate::scores::SubjectScores;

/// Column order of both the raw and the canonical dataset files.
pub const COLUMNS: [&str; 7] = [
    "admission_number",
    "name",
    "gender",
    "stream",
    "school",
    "total_score",
    "subject_scores",
];

/// One row as it appears in a results file. Field text is kept verbatim so
/// deduplication writes back exactly what it read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub admission_number: String,
    pub name: String,
    pub gender: String,
    pub stream: String,
    pub school: String,
    pub total_score: String,
    pub subject_scores: String,
}

/// A canonical row ready for analytics. `subject_scores` stays unparsed so a
/// corrupt literal only affects the queries that need it.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub admission_number: String,
    pub name: String,
    pub gender: String,
    pub stream: String,
    pub school: String,
    pub total_score: f64,
    pub subject_scores: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentResult {
    pub admission_number: String,
    pub name: String,
    pub gender: String,
    pub stream: String,
    pub school: String,
    pub total_score: f64,
    pub subject_scores: SubjectScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStudent {
    pub admission_number: String,
    pub name: String,
    pub total_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRanking {
    pub stream: String,
    pub students: Vec<RankedStudent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectScorer {
    pub admission_number: String,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectRanking {
    pub stream: String,
    pub subject: String,
    pub scorers: Vec<SubjectScorer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStats {
    pub stream: String,
    pub subject: String,
    pub student_count: usize,
    pub average: f64,
    pub pass_rate: f64,
}
