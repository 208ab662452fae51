//! Sample lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle state of a quality-control sample.
///
/// The backend has accumulated synonyms and mixed casing over time
/// ("Tested", "rejected", "InTesting"); parsing folds every legacy form
/// into one of these three states, and serialization always emits the
/// canonical wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleStatus {
    /// Initial state. Every sample is registered pending, with all
    /// measurement fields null.
    #[default]
    Pending,
    Completed,
    Rejected,
}

impl SampleStatus {
    /// Canonical wire form understood by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Pending => "pending",
            SampleStatus::Completed => "completed",
            SampleStatus::Rejected => "reject",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SampleStatus::Pending)
    }

    /// Whether a sample in this state may be moved to `next`.
    ///
    /// Pending samples may move anywhere. Terminal samples accept only a
    /// re-submission of the same state (amending measurements); they never
    /// revert to pending or flip to the other terminal state.
    pub fn can_transition_to(&self, next: SampleStatus) -> bool {
        match self {
            SampleStatus::Pending => true,
            _ => *self == next,
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a status string no known synonym matches.
#[derive(Debug, Clone)]
pub struct ParseStatusError(String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sample status: {:?}", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SampleStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "intesting" | "in test" => Ok(SampleStatus::Pending),
            "completed" | "tested" => Ok(SampleStatus::Completed),
            "reject" | "rejected" => Ok(SampleStatus::Rejected),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl Serialize for SampleStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SampleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_synonyms_normalize() {
        for raw in ["pending", "Pending", "InTesting", "in test"] {
            assert_eq!(raw.parse::<SampleStatus>().unwrap(), SampleStatus::Pending);
        }
        for raw in ["completed", "COMPLETED", "tested", "Tested"] {
            assert_eq!(
                raw.parse::<SampleStatus>().unwrap(),
                SampleStatus::Completed
            );
        }
        for raw in ["reject", "rejected", "Rejected"] {
            assert_eq!(raw.parse::<SampleStatus>().unwrap(), SampleStatus::Rejected);
        }
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        assert!("approved".parse::<SampleStatus>().is_err());
        assert!("".parse::<SampleStatus>().is_err());
    }

    #[test]
    fn test_serializes_canonical_form() {
        assert_eq!(
            serde_json::to_string(&SampleStatus::Rejected).unwrap(),
            "\"reject\""
        );
        assert_eq!(
            serde_json::to_string(&SampleStatus::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn test_deserializes_legacy_forms() {
        let status: SampleStatus = serde_json::from_str("\"Tested\"").unwrap();
        assert_eq!(status, SampleStatus::Completed);
    }

    #[test]
    fn test_pending_may_move_anywhere() {
        assert!(SampleStatus::Pending.can_transition_to(SampleStatus::Completed));
        assert!(SampleStatus::Pending.can_transition_to(SampleStatus::Rejected));
        assert!(SampleStatus::Pending.can_transition_to(SampleStatus::Pending));
    }

    #[test]
    fn test_terminal_states_stay_terminal() {
        assert!(!SampleStatus::Completed.can_transition_to(SampleStatus::Pending));
        assert!(!SampleStatus::Completed.can_transition_to(SampleStatus::Rejected));
        assert!(!SampleStatus::Rejected.can_transition_to(SampleStatus::Pending));
        assert!(!SampleStatus::Rejected.can_transition_to(SampleStatus::Completed));
        // Amending measurements under the same terminal status is allowed.
        assert!(SampleStatus::Completed.can_transition_to(SampleStatus::Completed));
        assert!(SampleStatus::Rejected.can_transition_to(SampleStatus::Rejected));
    }
}
