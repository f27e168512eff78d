use thiserror::Error;

/// Failure while parsing a stored subject-score literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreParseError {
    #[error("expected {expected} at offset {offset}, found {found:?}")]
    Unexpected {
        offset: usize,
        expected: &'static str,
        found: char,
    },
    #[error("unexpected end of input at offset {offset}, expected {expected}")]
    UnexpectedEnd {
        offset: usize,
        expected: &'static str,
    },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("score at offset {offset} does not fit in 32 bits")]
    Overflow { offset: usize },
    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

/// Outcome of a failed student lookup. "Not found" is not an error.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("admission number must not be empty")]
    EmptyIdentifier,
    #[error("subject scores for admission number {admission_number} are corrupt: {source}")]
    CorruptScores {
        admission_number: String,
        #[source]
        source: ScoreParseError,
    },
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset header is missing required column `{0}`")]
    MissingColumn(&'static str),
}
