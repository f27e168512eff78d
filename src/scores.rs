//! Parser for the `{'Subject': score}` literal stored in `subject_scores`.

use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ScoreParseError;

/// Subject name to score, in the order the subjects were stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectScores {
    entries: Vec<(String, u32)>,
}

impl SubjectScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a score. A subject that is already present keeps its position.
    pub fn insert(&mut self, subject: impl Into<String>, score: u32) {
        let subject = subject.into();
        match self.entries.iter_mut().find(|(name, _)| *name == subject) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((subject, score)),
        }
    }

    pub fn get(&self, subject: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(name, _)| name == subject)
            .map(|(_, score)| *score)
    }

    /// Missing subjects count as zero in every aggregate.
    pub fn score_or_zero(&self, subject: &str) -> u32 {
        self.get(subject).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for SubjectScores {
    type Err = ScoreParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_subject_scores(s)
    }
}

impl fmt::Display for SubjectScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (subject, score)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str("'")?;
            for c in subject.chars() {
                if c == '\'' || c == '\\' {
                    f.write_str("\\")?;
                }
                write!(f, "{c}")?;
            }
            write!(f, "': {score}")?;
        }
        f.write_str("}")
    }
}

impl Serialize for SubjectScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (subject, score) in &self.entries {
            map.serialize_entry(subject, score)?;
        }
        map.end()
    }
}

pub fn parse_subject_scores(input: &str) -> Result<SubjectScores, ScoreParseError> {
    let mut parser = Parser { input, pos: 0 };
    parser.skip_ws();
    let scores = parser.map()?;
    parser.skip_ws();
    if parser.pos < input.len() {
        return Err(ScoreParseError::TrailingInput { offset: parser.pos });
    }
    Ok(scores)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> Result<(), ScoreParseError> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(ScoreParseError::Unexpected {
                offset: self.pos,
                expected,
                found,
            }),
            None => Err(ScoreParseError::UnexpectedEnd {
                offset: self.pos,
                expected,
            }),
        }
    }

    fn map(&mut self) -> Result<SubjectScores, ScoreParseError> {
        self.expect('{', "'{'")?;
        let mut scores = SubjectScores::new();
        self.skip_ws();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(scores);
        }

        loop {
            self.skip_ws();
            let subject = self.string()?;
            self.skip_ws();
            self.expect(':', "':'")?;
            self.skip_ws();
            let score = self.integer()?;
            scores.insert(subject, score);
            self.skip_ws();

            match self.bump() {
                Some(',') => {
                    self.skip_ws();
                    if self.peek() == Some('}') {
                        self.bump();
                        return Ok(scores);
                    }
                }
                Some('}') => return Ok(scores),
                Some(found) => {
                    return Err(ScoreParseError::Unexpected {
                        offset: self.pos - found.len_utf8(),
                        expected: "',' or '}'",
                        found,
                    })
                }
                None => {
                    return Err(ScoreParseError::UnexpectedEnd {
                        offset: self.pos,
                        expected: "',' or '}'",
                    })
                }
            }
        }
    }

    fn string(&mut self) -> Result<String, ScoreParseError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(c @ ('\'' | '"')) => c,
            Some(found) => {
                return Err(ScoreParseError::Unexpected {
                    offset: start,
                    expected: "quoted subject name",
                    found,
                })
            }
            None => {
                return Err(ScoreParseError::UnexpectedEnd {
                    offset: start,
                    expected: "quoted subject name",
                })
            }
        };
        self.bump();

        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c @ ('\\' | '\'' | '"')) => value.push(c),
                    Some(found) => {
                        return Err(ScoreParseError::Unexpected {
                            offset: self.pos - found.len_utf8(),
                            expected: "escape sequence",
                            found,
                        })
                    }
                    None => return Err(ScoreParseError::UnterminatedString { offset: start }),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(ScoreParseError::UnterminatedString { offset: start }),
            }
        }
    }

    fn integer(&mut self) -> Result<u32, ScoreParseError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.pos == start {
            return match self.peek() {
                Some(found) => Err(ScoreParseError::Unexpected {
                    offset: start,
                    expected: "integer score",
                    found,
                }),
                None => Err(ScoreParseError::UnexpectedEnd {
                    offset: start,
                    expected: "integer score",
                }),
            };
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| ScoreParseError::Overflow { offset: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_quoted_literal_in_order() {
        let scores: SubjectScores = "{'English': 78, 'Mathematics': 64, 'Physics': 90}"
            .parse()
            .unwrap();
        let subjects: Vec<_> = scores.iter().collect();
        assert_eq!(
            subjects,
            vec![("English", 78), ("Mathematics", 64), ("Physics", 90)]
        );
    }

    #[test]
    fn accepts_double_quotes_whitespace_and_trailing_comma() {
        let scores = parse_subject_scores("  {\n \"Biology\" :55 ,\n 'History':0, }  ").unwrap();
        assert_eq!(scores.get("Biology"), Some(55));
        assert_eq!(scores.get("History"), Some(0));
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn empty_map_is_valid() {
        let scores = parse_subject_scores("{}").unwrap();
        assert!(scores.is_empty());
        assert_eq!(scores.score_or_zero("English"), 0);
    }

    #[test]
    fn repeated_subject_keeps_position_and_last_value() {
        let scores = parse_subject_scores("{'English': 10, 'Physics': 20, 'English': 30}").unwrap();
        let subjects: Vec<_> = scores.iter().collect();
        assert_eq!(subjects, vec![("English", 30), ("Physics", 20)]);
    }

    #[test]
    fn escaped_quotes_in_subject_names() {
        let scores = parse_subject_scores(r"{'Writer\'s Craft': 71}").unwrap();
        assert_eq!(scores.get("Writer's Craft"), Some(71));
        assert_eq!(scores.to_string(), r"{'Writer\'s Craft': 71}");
    }

    #[test]
    fn literal_rendering_reparses_to_same_map() {
        let original = parse_subject_scores("{\"Chemistry\": 88, 'English': 67}").unwrap();
        let rendered = original.to_string();
        assert_eq!(rendered, "{'Chemistry': 88, 'English': 67}");
        assert_eq!(parse_subject_scores(&rendered).unwrap(), original);
    }

    #[test]
    fn rejects_expressions() {
        let err = parse_subject_scores("__import__('os').system('ls')").unwrap_err();
        assert!(matches!(err, ScoreParseError::Unexpected { offset: 0, .. }));

        let err = parse_subject_scores("{'English': 40 + 40}").unwrap_err();
        assert!(matches!(err, ScoreParseError::Unexpected { found: '+', .. }));
    }

    #[test]
    fn rejects_non_integer_scores() {
        assert!(parse_subject_scores("{'English': -5}").is_err());
        assert!(parse_subject_scores("{'English': 'high'}").is_err());
        assert!(parse_subject_scores("{'English': 7.5}").is_err());
    }

    #[test]
    fn reports_truncated_input() {
        assert_eq!(
            parse_subject_scores("{'English': 78").unwrap_err(),
            ScoreParseError::UnexpectedEnd {
                offset: 14,
                expected: "',' or '}'"
            }
        );
        assert_eq!(
            parse_subject_scores("{'Engl").unwrap_err(),
            ScoreParseError::UnterminatedString { offset: 1 }
        );
        assert!(matches!(
            parse_subject_scores("").unwrap_err(),
            ScoreParseError::UnexpectedEnd { offset: 0, .. }
        ));
    }

    #[test]
    fn rejects_trailing_input_and_overflow() {
        assert_eq!(
            parse_subject_scores("{} {}").unwrap_err(),
            ScoreParseError::TrailingInput { offset: 3 }
        );
        assert_eq!(
            parse_subject_scores("{'English': 99999999999}").unwrap_err(),
            ScoreParseError::Overflow { offset: 12 }
        );
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let scores = parse_subject_scores("{'Physics': 90, 'English': 78}").unwrap();
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"Physics":90,"English":78}"#);
    }
}
