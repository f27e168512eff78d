use serde::Serialize;
use tracing::{debug, warn};

use crate::curriculum::Curriculum;
use crate::dataset::Dataset;
use crate::error::LookupError;
use crate::models::{
    RankedStudent, StreamRanking, StudentRecord, StudentResult, SubjectRanking, SubjectScorer,
    SubjectStats,
};
use crate::scores::{parse_subject_scores, SubjectScores};

pub const DEFAULT_STREAM_TOP_N: usize = 10;
pub const DEFAULT_SUBJECT_TOP_N: usize = 5;
pub const DEFAULT_PASS_THRESHOLD: u32 = 50;

/// Looks up one student by admission number, compared as exact text.
///
/// Returns `Ok(None)` when no record matches. A record whose stored subject
/// scores cannot be parsed is reported as [`LookupError::CorruptScores`].
pub fn find(dataset: &Dataset, identifier: &str) -> Result<Option<StudentResult>, LookupError> {
    if identifier.is_empty() {
        return Err(LookupError::EmptyIdentifier);
    }

    let Some(record) = dataset
        .records()
        .iter()
        .find(|r| r.admission_number == identifier)
    else {
        debug!(admission_number = identifier, "No student found");
        return Ok(None);
    };

    let subject_scores =
        parse_subject_scores(&record.subject_scores).map_err(|source| {
            LookupError::CorruptScores {
                admission_number: record.admission_number.clone(),
                source,
            }
        })?;

    Ok(Some(StudentResult {
        admission_number: record.admission_number.clone(),
        name: record.name.clone(),
        gender: record.gender.clone(),
        stream: record.stream.clone(),
        school: record.school.clone(),
        total_score: record.total_score,
        subject_scores,
    }))
}

/// Top `n` students by total score for every stream present in the dataset,
/// streams in order of first appearance.
pub fn top_by_stream(dataset: &Dataset, n: usize) -> Vec<StreamRanking> {
    dataset
        .streams()
        .into_iter()
        .map(|stream| {
            let mut members: Vec<&StudentRecord> = dataset.stream_members(stream).collect();
            members.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
            StreamRanking {
                stream: stream.to_string(),
                students: members
                    .into_iter()
                    .take(n)
                    .map(|r| RankedStudent {
                        admission_number: r.admission_number.clone(),
                        name: r.name.clone(),
                        total_score: r.total_score,
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Top `n` scorers of each subject within each curriculum stream. A subject
/// missing from a student's scores counts as zero.
pub fn top_by_subject(dataset: &Dataset, curriculum: &Curriculum, n: usize) -> Vec<SubjectRanking> {
    let mut rankings = Vec::new();

    for stream in curriculum.streams() {
        let members = scored_members(dataset, &stream.name);
        for subject in &stream.subjects {
            let mut scorers: Vec<SubjectScorer> = members
                .iter()
                .map(|(record, scores)| SubjectScorer {
                    admission_number: record.admission_number.clone(),
                    name: record.name.clone(),
                    score: scores.score_or_zero(subject),
                })
                .collect();
            scorers.sort_by(|a, b| b.score.cmp(&a.score));
            scorers.truncate(n);

            rankings.push(SubjectRanking {
                stream: stream.name.clone(),
                subject: subject.clone(),
                scorers,
            });
        }
    }

    rankings
}

/// Average score and pass rate of each subject within each curriculum
/// stream. A score passes when it is at least `threshold`.
pub fn subject_stats(dataset: &Dataset, curriculum: &Curriculum, threshold: u32) -> Vec<SubjectStats> {
    let mut stats = Vec::new();

    for stream in curriculum.streams() {
        let members = scored_members(dataset, &stream.name);
        for subject in &stream.subjects {
            let scores: Vec<u32> = members
                .iter()
                .map(|(_, scores)| scores.score_or_zero(subject))
                .collect();
            let (average, pass_rate) = average_and_pass_rate(&scores, threshold);

            stats.push(SubjectStats {
                stream: stream.name.clone(),
                subject: subject.clone(),
                student_count: scores.len(),
                average,
                pass_rate,
            });
        }
    }

    stats
}

/// Mean of `scores` and the percentage at or above `threshold`. Both are
/// zero for an empty slice.
pub fn average_and_pass_rate(scores: &[u32], threshold: u32) -> (f64, f64) {
    if scores.is_empty() {
        return (0.0, 0.0);
    }

    let count = scores.len() as f64;
    let total: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    let passed = scores.iter().filter(|&&s| s >= threshold).count();

    (total as f64 / count, passed as f64 / count * 100.0)
}

// Members of `stream` with parsed scores. Rows with a corrupt literal cannot
// contribute subject scores and are left out.
fn scored_members<'a>(dataset: &'a Dataset, stream: &'a str) -> Vec<(&'a StudentRecord, SubjectScores)> {
    let mut members = Vec::new();
    let mut corrupt = 0usize;

    for record in dataset.stream_members(stream) {
        match parse_subject_scores(&record.subject_scores) {
            Ok(scores) => members.push((record, scores)),
            Err(err) => {
                warn!(
                    admission_number = %record.admission_number,
                    error = %err,
                    "Excluding student with corrupt subject scores"
                );
                corrupt += 1;
            }
        }
    }

    if corrupt > 0 {
        warn!(stream, corrupt, "Subject statistics exclude corrupt rows");
    }
    members
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsSettings {
    pub stream_top_n: usize,
    pub subject_top_n: usize,
    pub pass_threshold: u32,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            stream_top_n: DEFAULT_STREAM_TOP_N,
            subject_top_n: DEFAULT_SUBJECT_TOP_N,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

/// Everything the analytics section of the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub pass_threshold: u32,
    pub stream_rankings: Vec<StreamRanking>,
    pub subject_rankings: Vec<SubjectRanking>,
    pub subject_stats: Vec<SubjectStats>,
}

impl AnalyticsSnapshot {
    pub fn compute(dataset: &Dataset, curriculum: &Curriculum, settings: AnalyticsSettings) -> Self {
        Self {
            pass_threshold: settings.pass_threshold,
            stream_rankings: top_by_stream(dataset, settings.stream_top_n),
            subject_rankings: top_by_subject(dataset, curriculum, settings.subject_top_n),
            subject_stats: subject_stats(dataset, curriculum, settings.pass_threshold),
        }
    }
}
