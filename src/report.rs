use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::AnalyticsSnapshot;
use crate::models::{StreamRanking, StudentResult, SubjectRanking, SubjectStats};

const BAR_WIDTH: usize = 25;

pub fn render_student(result: &StudentResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Student Results");
    let _ = writeln!(output, "**Name:** {}", result.name);
    let _ = writeln!(output, "**Gender:** {}", result.gender);
    let _ = writeln!(output, "**Stream:** {}", result.stream);
    let _ = writeln!(output, "**School:** {}", result.school);
    let _ = writeln!(output, "**Total Score:** {}", format_total(result.total_score));
    let _ = writeln!(output, "**Subject Scores:**");

    if result.subject_scores.is_empty() {
        let _ = writeln!(output, "No subject scores recorded.");
    } else {
        for (subject, score) in result.subject_scores.iter() {
            let _ = writeln!(output, "- {subject}: {score}");
        }
    }

    output
}

pub fn render_stream_rankings(rankings: &[StreamRanking]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Top Scores by Stream");

    if rankings.is_empty() {
        let _ = writeln!(output, "No students in the dataset.");
        return output;
    }

    for ranking in rankings {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {}", ranking.stream);
        let _ = writeln!(output, "| Rank | Admission Number | Name | Total Score |");
        let _ = writeln!(output, "|---:|---|---|---:|");
        for (i, student) in ranking.students.iter().enumerate() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                i + 1,
                cell(&student.admission_number),
                cell(&student.name),
                format_total(student.total_score)
            );
        }
    }

    output
}

pub fn render_subject_rankings(rankings: &[SubjectRanking]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Top Scores by Subject");

    for ranking in rankings {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {} ({})", ranking.subject, ranking.stream);
        if ranking.scorers.is_empty() {
            let _ = writeln!(output, "No students in this stream.");
            continue;
        }
        let _ = writeln!(output, "| Rank | Admission Number | Name | Score |");
        let _ = writeln!(output, "|---:|---|---|---:|");
        for (i, scorer) in ranking.scorers.iter().enumerate() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                i + 1,
                cell(&scorer.admission_number),
                cell(&scorer.name),
                scorer.score
            );
        }
    }

    output
}

/// Average score and pass-rate tables, each with a text bar per subject.
pub fn render_subject_stats(stats: &[SubjectStats], pass_threshold: u32) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Average Scores per Subject");
    let _ = writeln!(output, "| Stream | Subject | Average Score | |");
    let _ = writeln!(output, "|---|---|---:|---|");
    for stat in stats {
        let _ = writeln!(
            output,
            "| {} | {} | {:.1} | `{}` |",
            cell(&stat.stream),
            cell(&stat.subject),
            stat.average,
            bar(stat.average)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Percentage of Students Scoring >= {pass_threshold} per Subject"
    );
    let _ = writeln!(output, "| Stream | Subject | Pass Rate | |");
    let _ = writeln!(output, "|---|---|---:|---|");
    for stat in stats {
        let _ = writeln!(
            output,
            "| {} | {} | {:.1}% | `{}` |",
            cell(&stat.stream),
            cell(&stat.subject),
            stat.pass_rate,
            bar(stat.pass_rate)
        );
    }

    output
}

pub fn build_report(title: &str, generated_on: NaiveDate, snapshot: &AnalyticsSnapshot) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {title}");
    let _ = writeln!(output, "Generated on {generated_on}");
    let _ = writeln!(output);
    output.push_str(&render_stream_rankings(&snapshot.stream_rankings));
    let _ = writeln!(output);
    output.push_str(&render_subject_rankings(&snapshot.subject_rankings));
    let _ = writeln!(output);
    output.push_str(&render_subject_stats(
        &snapshot.subject_stats,
        snapshot.pass_threshold,
    ));

    output
}

pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

// Scale is out of 100.
fn bar(value: f64) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

// Table cells cannot contain a bare pipe.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn format_total(total: f64) -> String {
    if total.fract() == 0.0 {
        format!("{total:.0}")
    } else {
        format!("{total}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RankedStudent, SubjectScorer};
    use crate::scores::parse_subject_scores;

    fn snapshot() -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            pass_threshold: 50,
            stream_rankings: vec![StreamRanking {
                stream: "Natural Sc.".to_string(),
                students: vec![
                    RankedStudent {
                        admission_number: "n2".to_string(),
                        name: "Meron Girma".to_string(),
                        total_score: 90.0,
                    },
                    RankedStudent {
                        admission_number: "n3".to_string(),
                        name: "Dawit Bekele".to_string(),
                        total_score: 70.5,
                    },
                ],
            }],
            subject_rankings: vec![
                SubjectRanking {
                    stream: "Natural Sc.".to_string(),
                    subject: "Physics".to_string(),
                    scorers: vec![SubjectScorer {
                        admission_number: "n2".to_string(),
                        name: "Meron Girma".to_string(),
                        score: 95,
                    }],
                },
                SubjectRanking {
                    stream: "Social Sc.".to_string(),
                    subject: "History".to_string(),
                    scorers: vec![],
                },
            ],
            subject_stats: vec![SubjectStats {
                stream: "Natural Sc.".to_string(),
                subject: "Physics".to_string(),
                student_count: 3,
                average: 76.66666,
                pass_rate: 200.0 / 3.0,
            }],
        }
    }

    #[test]
    fn student_rendering_lists_scores_in_stored_order() {
        let result = StudentResult {
            admission_number: "0042".to_string(),
            name: "Liya Alemu".to_string(),
            gender: "F".to_string(),
            stream: "Social Sc.".to_string(),
            school: "Gedebano".to_string(),
            total_score: 398.0,
            subject_scores: parse_subject_scores("{'History': 66, 'English': 70}").unwrap(),
        };
        let text = render_student(&result);
        assert!(text.contains("**Name:** Liya Alemu"));
        assert!(text.contains("**Total Score:** 398\n"));
        let history = text.find("- History: 66").unwrap();
        let english = text.find("- English: 70").unwrap();
        assert!(history < english);
    }

    #[test]
    fn report_contains_all_sections() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let report = build_report("Entrance Exam Results", date, &snapshot());

        assert!(report.starts_with("# Entrance Exam Results\nGenerated on 2026-10-16\n"));
        assert!(report.contains("### Natural Sc.\n"));
        assert!(report.contains("| 1 | n2 | Meron Girma | 90 |"));
        assert!(report.contains("| 2 | n3 | Dawit Bekele | 70.5 |"));
        assert!(report.contains("### Physics (Natural Sc.)"));
        assert!(report.contains("### History (Social Sc.)\nNo students in this stream."));
        assert!(report.contains("| Natural Sc. | Physics | 76.7 |"));
        assert!(report.contains("## Percentage of Students Scoring >= 50 per Subject"));
        assert!(report.contains("| Natural Sc. | Physics | 66.7% |"));
    }

    #[test]
    fn pipes_in_names_are_escaped_in_tables() {
        let rankings = [StreamRanking {
            stream: "Social Sc.".to_string(),
            students: vec![RankedStudent {
                admission_number: "7|8".to_string(),
                name: "Abebe | Kebede".to_string(),
                total_score: 301.0,
            }],
        }];
        let text = render_stream_rankings(&rankings);
        assert!(text.contains(r"| 1 | 7\|8 | Abebe \| Kebede | 301 |"));

        let subjects = [SubjectRanking {
            stream: "Social Sc.".to_string(),
            subject: "History".to_string(),
            scorers: vec![SubjectScorer {
                admission_number: "9".to_string(),
                name: "Hana|Tesfaye".to_string(),
                score: 88,
            }],
        }];
        let text = render_subject_rankings(&subjects);
        assert!(text.contains(r"| 1 | 9 | Hana\|Tesfaye | 88 |"));
    }

    #[test]
    fn empty_rankings_are_reported() {
        let text = render_stream_rankings(&[]);
        assert!(text.contains("No students in the dataset."));
    }

    #[test]
    fn bars_scale_to_width() {
        assert_eq!(bar(0.0), ".".repeat(BAR_WIDTH));
        assert_eq!(bar(100.0), "#".repeat(BAR_WIDTH));
        assert_eq!(bar(150.0), "#".repeat(BAR_WIDTH));
        assert_eq!(bar(50.0).matches('#').count(), 13);
    }

    #[test]
    fn json_output_keeps_structure() {
        let json = to_json(&snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["pass_threshold"], 50);
        assert_eq!(value["stream_rankings"][0]["students"][1]["admission_number"], "n3");
        assert_eq!(value["subject_rankings"][0]["subject"], "Physics");
    }
}
