//! Probe identity and anatomical annotations
//!
//! Probe labels arrive as free-form strings ("ProbeA", "probea",
//! "626791_2022-08-16_ProbeC-LFP"). They are canonicalized into [`ProbeId`]
//! exactly once at ingestion; everything downstream works with the typed id.

use crate::error::{LfpError, LfpResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel structure labels marking electrodes outside neural tissue
const NON_NEURAL_STRUCTURES: [&str; 2] = ["out of brain", "root"];

/// Canonical identifier for one physical probe within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeId(char);

/// Why a free-form label could not be canonicalized into a [`ProbeId`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeLabelError {
    /// Label contains no `probe<letter>` token
    Unrecognized {
        /// The offending label
        label: String,
    },
    /// Label names more than one distinct probe letter
    Ambiguous {
        /// The offending label
        label: String,
    },
}

impl ProbeId {
    /// Canonicalize a free-form label into a probe id.
    ///
    /// Matching is case-insensitive on the `probe` token; the letter
    /// immediately following it identifies the probe. A label naming two
    /// different letters is ambiguous and rejected.
    pub fn parse(label: &str) -> Result<Self, ProbeLabelError> {
        let lower = label.to_ascii_lowercase();
        let bytes = lower.as_bytes();
        let mut letters = Vec::new();

        let mut search_from = 0;
        while let Some(pos) = lower[search_from..].find("probe") {
            let token_end = search_from + pos + "probe".len();
            if let Some(&next) = bytes.get(token_end) {
                if next.is_ascii_alphabetic() {
                    let letter = next.to_ascii_uppercase() as char;
                    if !letters.contains(&letter) {
                        letters.push(letter);
                    }
                }
            }
            search_from = token_end;
        }

        match letters.len() {
            0 => Err(ProbeLabelError::Unrecognized { label: label.to_string() }),
            1 => Ok(ProbeId(letters[0])),
            _ => Err(ProbeLabelError::Ambiguous { label: label.to_string() }),
        }
    }

    /// Construct directly from a probe letter ('a'..='z' or 'A'..='Z')
    pub fn from_letter(letter: char) -> LfpResult<Self> {
        if letter.is_ascii_alphabetic() {
            Ok(ProbeId(letter.to_ascii_uppercase()))
        } else {
            Err(LfpError::InvalidConfig {
                reason: format!("'{}' is not a valid probe letter", letter),
            })
        }
    }

    /// The probe letter, always uppercase
    pub fn letter(&self) -> char {
        self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Probe{}", self.0)
    }
}

impl fmt::Display for ProbeLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeLabelError::Unrecognized { label } => {
                write!(f, "label '{}' does not name a probe", label)
            }
            ProbeLabelError::Ambiguous { label } => {
                write!(f, "label '{}' names more than one probe", label)
            }
        }
    }
}

/// Per-channel anatomical metadata for one probe.
///
/// Produced entirely by an external anatomical-registration step; the core
/// only reads it. Absence of annotations for a probe is a normal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnnotation {
    /// Channel index on the probe (0-based, tip first)
    pub channel_index: usize,
    /// Free-text structure label from registration ("CA1", "out of brain", ...)
    pub structure: String,
    /// Probe/group label as recorded by the registration pipeline
    pub group: String,
}

impl ChannelAnnotation {
    pub fn new(channel_index: usize, structure: &str, group: &str) -> Self {
        Self {
            channel_index,
            structure: structure.to_string(),
            group: group.to_string(),
        }
    }

    /// True when the structure label marks non-neural tissue
    pub fn is_outside_brain(&self) -> bool {
        let structure = self.structure.trim();
        NON_NEURAL_STRUCTURES
            .iter()
            .any(|sentinel| structure.eq_ignore_ascii_case(sentinel))
    }

    /// True when this annotation's group label resolves to `probe`
    pub fn belongs_to(&self, probe: ProbeId) -> Result<bool, ProbeLabelError> {
        match ProbeId::parse(&self.group) {
            Ok(id) => Ok(id == probe),
            Err(err @ ProbeLabelError::Ambiguous { .. }) => Err(err),
            Err(ProbeLabelError::Unrecognized { .. }) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_label() {
        assert_eq!(ProbeId::parse("ProbeA").unwrap().letter(), 'A');
        assert_eq!(ProbeId::parse("probea").unwrap().letter(), 'A');
        assert_eq!(ProbeId::parse("PROBEF").unwrap().letter(), 'F');
    }

    #[test]
    fn test_parse_session_style_label() {
        let id = ProbeId::parse("626791_2022-08-16_ProbeC-LFP").unwrap();
        assert_eq!(id.letter(), 'C');
        assert_eq!(id.to_string(), "ProbeC");
    }

    #[test]
    fn test_parse_repeated_same_letter_is_fine() {
        let id = ProbeId::parse("ProbeB/probeB-LFP").unwrap();
        assert_eq!(id.letter(), 'B');
    }

    #[test]
    fn test_parse_rejects_unrecognized() {
        assert!(matches!(
            ProbeId::parse("638291_lfp_channels"),
            Err(ProbeLabelError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_ambiguous() {
        assert!(matches!(
            ProbeId::parse("ProbeA_vs_ProbeB"),
            Err(ProbeLabelError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_outside_brain_sentinels() {
        assert!(ChannelAnnotation::new(380, "out of brain", "ProbeA").is_outside_brain());
        assert!(ChannelAnnotation::new(381, "Out Of Brain", "ProbeA").is_outside_brain());
        assert!(ChannelAnnotation::new(382, "root", "ProbeA").is_outside_brain());
        assert!(!ChannelAnnotation::new(10, "CA1", "ProbeA").is_outside_brain());
    }

    #[test]
    fn test_belongs_to_matches_case_insensitively() {
        let probe = ProbeId::from_letter('c').unwrap();
        let ann = ChannelAnnotation::new(0, "DG", "probeC");
        assert!(ann.belongs_to(probe).unwrap());

        let other = ChannelAnnotation::new(0, "DG", "ProbeD");
        assert!(!other.belongs_to(probe).unwrap());
    }

    #[test]
    fn test_belongs_to_surfaces_ambiguity() {
        let probe = ProbeId::from_letter('a').unwrap();
        let ann = ChannelAnnotation::new(0, "DG", "ProbeA and ProbeB");
        assert!(ann.belongs_to(probe).is_err());
    }
}
