use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::dataset;
use crate::models::RawRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeOutcome {
    pub records: Vec<RawRecord>,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupeSummary {
    pub read: usize,
    pub kept: usize,
    pub duplicates_dropped: usize,
    pub malformed_skipped: usize,
}

/// Keeps the first record seen for each admission number, in input order.
/// Later records with the same admission number are dropped without merging.
pub fn deduplicate(raw: Vec<RawRecord>) -> DedupeOutcome {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut records = Vec::with_capacity(raw.len());
    let mut duplicates_dropped = 0usize;

    for record in raw {
        if seen.insert(record.admission_number.clone()) {
            records.push(record);
        } else {
            debug!(admission_number = %record.admission_number, "Dropping duplicate submission");
            duplicates_dropped += 1;
        }
    }

    DedupeOutcome {
        records,
        duplicates_dropped,
    }
}

pub fn dedupe_file(input: &Path, output: &Path) -> anyhow::Result<DedupeSummary> {
    let load = dataset::read_raw_file(input)
        .with_context(|| format!("failed to read raw results from {}", input.display()))?;
    let read = load.records.len() + load.malformed;
    let outcome = deduplicate(load.records);

    dataset::write_file(output, &outcome.records)
        .with_context(|| format!("failed to write canonical results to {}", output.display()))?;

    let summary = DedupeSummary {
        read,
        kept: outcome.records.len(),
        duplicates_dropped: outcome.duplicates_dropped,
        malformed_skipped: load.malformed,
    };
    info!(
        input = %input.display(),
        output = %output.display(),
        read = summary.read,
        kept = summary.kept,
        duplicates = summary.duplicates_dropped,
        malformed = summary.malformed_skipped,
        "Deduplication complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, total: &str) -> RawRecord {
        RawRecord {
            admission_number: id.to_string(),
            name: format!("Student {id}"),
            gender: "F".to_string(),
            stream: "Natural Sc.".to_string(),
            school: "Gedebano".to_string(),
            total_score: total.to_string(),
            subject_scores: "{'Physics': 50}".to_string(),
        }
    }

    #[test]
    fn first_submission_wins() {
        let outcome = deduplicate(vec![record("A", "10"), record("A", "99")]);
        assert_eq!(outcome.records, vec![record("A", "10")]);
        assert_eq!(outcome.duplicates_dropped, 1);
    }

    #[test]
    fn keeps_first_seen_order_and_unique_ids() {
        let outcome = deduplicate(vec![
            record("3", "1"),
            record("1", "2"),
            record("3", "3"),
            record("2", "4"),
            record("1", "5"),
        ]);
        let ids: Vec<_> = outcome
            .records
            .iter()
            .map(|r| r.admission_number.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(outcome.records[1].total_score, "2");
        assert_eq!(outcome.duplicates_dropped, 2);
    }

    #[test]
    fn identifiers_compare_as_text() {
        let outcome = deduplicate(vec![record("007", "1"), record("7", "2")]);
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn running_twice_drops_nothing_more() {
        let first = deduplicate(vec![record("A", "1"), record("B", "2"), record("A", "3")]);
        let second = deduplicate(first.records.clone());
        assert_eq!(second.records, first.records);
        assert_eq!(second.duplicates_dropped, 0);
    }

    #[test]
    fn dedupe_file_writes_canonical_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("results.csv");
        let output = dir.path().join("results_unique.csv");
        std::fs::write(
            &input,
            "admission_number,name,gender,stream,school,total_score,subject_scores\n\
             100,Abebe,M,Natural Sc.,Gedebano,410,\"{'Physics': 81, 'Biology': 77}\"\n\
             101,Hana,F,Social Sc.,Gedebano,388,\"{'History': 70}\"\n\
             100,Abebe,M,Natural Sc.,Gedebano,999,\"{'Physics': 99}\"\n\
             102,Broken\n",
        )
        .unwrap();

        let summary = dedupe_file(&input, &output).unwrap();
        assert_eq!(
            summary,
            DedupeSummary {
                read: 4,
                kept: 2,
                duplicates_dropped: 1,
                malformed_skipped: 1,
            }
        );

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            written,
            "admission_number,name,gender,stream,school,total_score,subject_scores\n\
             100,Abebe,M,Natural Sc.,Gedebano,410,\"{'Physics': 81, 'Biology': 77}\"\n\
             101,Hana,F,Social Sc.,Gedebano,388,{'History': 70}\n"
        );

        let again = dir.path().join("again.csv");
        let rerun = dedupe_file(&output, &again).unwrap();
        assert_eq!(rerun.duplicates_dropped, 0);
        assert_eq!(std::fs::read_to_string(&again).unwrap(), written);
    }

    #[test]
    fn dedupe_file_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = dedupe_file(&dir.path().join("absent.csv"), &dir.path().join("out.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to read raw results"));
    }
}
