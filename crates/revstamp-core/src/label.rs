//! Revision label grammar, ordering and increments

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::patterns::REVISION_LABEL;

/// A revision label: a capital letter with an optional two-digit minor
/// counter ("A", "B.01").
///
/// The derived ordering is the one the revision block relies on: the letter
/// dominates, and at equal letters a label with a minor counter outranks one
/// without (`None < Some(_)`), minors comparing numerically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RevisionLabel {
    letter: char,
    minor: Option<u8>,
}

impl RevisionLabel {
    pub fn new(letter: char, minor: Option<u8>) -> Result<Self, EngineError> {
        if !letter.is_ascii_uppercase() {
            return Err(EngineError::InvalidLabel(format!(
                "letter must be A-Z, got {letter:?}"
            )));
        }
        if let Some(minor) = minor {
            if minor > 99 {
                return Err(EngineError::InvalidLabel(format!(
                    "minor counter must fit two digits, got {minor}"
                )));
            }
        }
        Ok(Self { letter, minor })
    }

    pub fn parse(text: &str) -> Result<Self, EngineError> {
        let caps = REVISION_LABEL
            .captures(text)
            .ok_or_else(|| EngineError::InvalidLabel(text.to_string()))?;
        let letter = caps[1]
            .chars()
            .next()
            .ok_or_else(|| EngineError::InvalidLabel(text.to_string()))?;
        let minor = caps
            .get(2)
            .map(|m| m.as_str().parse::<u8>())
            .transpose()
            .map_err(|_| EngineError::InvalidLabel(text.to_string()))?;
        Ok(Self { letter, minor })
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn minor(&self) -> Option<u8> {
        self.minor
    }

    /// Next minor revision: "A" becomes "A.01", "A.09" becomes "A.10".
    /// The counter has no defined rollover past 99.
    pub fn next_minor(self) -> Self {
        Self {
            letter: self.letter,
            minor: Some(self.minor.map_or(1, |n| n + 1)),
        }
    }

    /// Next major revision letter, dropping the minor counter.
    /// Behavior past 'Z' is undefined; the increment is not guarded.
    pub fn bump_letter(self) -> Self {
        Self {
            letter: (self.letter as u8 + 1) as char,
            minor: None,
        }
    }

    pub fn is_newer_than(&self, other: &RevisionLabel) -> bool {
        self > other
    }
}

impl fmt::Display for RevisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{:02}", self.letter, minor),
            None => write!(f, "{}", self.letter),
        }
    }
}

impl FromStr for RevisionLabel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RevisionLabel::parse(s)
    }
}
