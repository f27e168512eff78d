use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, info, warn};

use crate::error::DatasetError;
use crate::models::{RawRecord, StudentRecord, COLUMNS};

/// Rows read from a file together with the number of rows that were skipped.
#[derive(Debug, Default)]
pub struct RawLoad {
    pub records: Vec<RawRecord>,
    pub malformed: usize,
}

pub fn read_raw_records<R: Read>(source: R) -> Result<RawLoad, DatasetError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);

    let headers = reader.headers()?.clone();
    for column in COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DatasetError::MissingColumn(column));
        }
    }

    let mut load = RawLoad::default();
    for result in reader.deserialize::<RawRecord>() {
        match result {
            Ok(record) if record.admission_number.trim().is_empty() => {
                warn!(name = %record.name, "Skipping row with empty admission_number");
                load.malformed += 1;
            }
            Ok(record) => load.records.push(record),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                let line = err.position().map(|p| p.line());
                warn!(?line, error = %err, "Skipping malformed row");
                load.malformed += 1;
            }
        }
    }

    debug!(
        rows = load.records.len(),
        malformed = load.malformed,
        "Read results rows"
    );
    Ok(load)
}

pub fn read_raw_file(path: &Path) -> Result<RawLoad, DatasetError> {
    let file = File::open(path)?;
    read_raw_records(file)
}

/// Writes rows in the canonical column order, field text untouched.
pub fn write_records<W: Write>(sink: W, records: &[RawRecord]) -> Result<(), DatasetError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    for record in records {
        writer.serialize(record)?;
    }
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_file(path: &Path, records: &[RawRecord]) -> Result<(), DatasetError> {
    let file = File::create(path)?;
    write_records(file, records)
}

/// Immutable snapshot of the canonical dataset, loaded once and handed to
/// every analytics query by reference.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<StudentRecord>,
}

impl Dataset {
    pub fn new(records: Vec<StudentRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self, DatasetError> {
        let load = read_raw_records(source)?;
        let mut skipped = load.malformed;
        let mut records = Vec::with_capacity(load.records.len());

        for raw in load.records {
            match raw.total_score.trim().parse::<f64>() {
                Ok(total_score) if total_score.is_finite() => records.push(StudentRecord {
                    admission_number: raw.admission_number,
                    name: raw.name,
                    gender: raw.gender,
                    stream: raw.stream,
                    school: raw.school,
                    total_score,
                    subject_scores: raw.subject_scores,
                }),
                _ => {
                    warn!(
                        admission_number = %raw.admission_number,
                        total_score = %raw.total_score,
                        "Skipping row with non-numeric or non-finite total_score"
                    );
                    skipped += 1;
                }
            }
        }

        let dataset = Self::new(records);
        info!(students = dataset.len(), skipped, "Dataset loaded");
        Ok(dataset)
    }

    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Students of one stream, in dataset order.
    pub fn stream_members<'a>(
        &'a self,
        stream: &'a str,
    ) -> impl Iterator<Item = &'a StudentRecord> + 'a {
        self.records.iter().filter(move |r| r.stream == stream)
    }

    /// Distinct stream labels in order of first appearance.
    pub fn streams(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.stream.as_str()) {
                seen.push(&record.stream);
            }
        }
        seen
    }
}
