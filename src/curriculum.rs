use std::collections::HashSet;

use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};

/// The ordered subject list of one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSubjects {
    pub name: String,
    pub subjects: Vec<String>,
}

impl StreamSubjects {
    pub fn new(name: &str, subjects: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Streams in reporting order. A subject may appear under several streams;
/// every query keys its output by the (stream, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StreamSubjects>", into = "Vec<StreamSubjects>")]
pub struct Curriculum {
    streams: Vec<StreamSubjects>,
}

impl Curriculum {
    pub fn new(streams: Vec<StreamSubjects>) -> anyhow::Result<Self> {
        let curriculum = Self { streams };
        curriculum.validate()?;
        Ok(curriculum)
    }

    pub fn streams(&self) -> &[StreamSubjects] {
        &self.streams
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = HashSet::new();
        for stream in &self.streams {
            ensure!(!stream.name.trim().is_empty(), "stream name must not be empty");
            if !names.insert(stream.name.as_str()) {
                bail!("stream `{}` is listed more than once", stream.name);
            }

            let mut subjects = HashSet::new();
            for subject in &stream.subjects {
                ensure!(
                    !subject.trim().is_empty(),
                    "stream `{}` has an empty subject name",
                    stream.name
                );
                if !subjects.insert(subject.as_str()) {
                    bail!(
                        "subject `{}` is listed more than once for stream `{}`",
                        subject,
                        stream.name
                    );
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<StreamSubjects>> for Curriculum {
    type Error = anyhow::Error;

    fn try_from(streams: Vec<StreamSubjects>) -> anyhow::Result<Self> {
        Self::new(streams)
    }
}

impl From<Curriculum> for Vec<StreamSubjects> {
    fn from(curriculum: Curriculum) -> Self {
        curriculum.streams
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self {
            streams: vec![
                StreamSubjects::new(
                    "Social Sc.",
                    &[
                        "English",
                        "Mathematics",
                        "Geography",
                        "Scholastic Aptitude Test",
                        "Economics",
                        "History",
                    ],
                ),
                StreamSubjects::new(
                    "Natural Sc.",
                    &[
                        "Chemistry",
                        "English",
                        "Mathematics",
                        "Physics",
                        "Biology",
                        "Scholastic Aptitude Test",
                    ],
                ),
            ],
        }
    }
}
