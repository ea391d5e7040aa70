//! Sequential workflow identifiers (`W001`, `W002`, ...)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Identifier assigned to workflows in extraction order
///
/// ```
/// use domain::WorkflowId;
///
/// assert_eq!(WorkflowId::from_position(0).to_string(), "W001");
/// assert_eq!("W042".parse::<WorkflowId>().unwrap().number(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(u32);

impl WorkflowId {
    /// Identifier for the workflow at a zero-based position in a list
    pub fn from_position(position: usize) -> Self {
        Self(u32::try_from(position).map_or(u32::MAX, |p| p.saturating_add(1)))
    }

    pub const fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{:03}", self.0)
    }
}

impl FromStr for WorkflowId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('W')
            .filter(|d| d.len() >= 3 && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| DomainError::InvalidWorkflowId(s.to_string()))?;
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(Self(n)),
            _ => Err(DomainError::InvalidWorkflowId(s.to_string())),
        }
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based_and_padded() {
        assert_eq!(WorkflowId::from_position(0).to_string(), "W001");
        assert_eq!(WorkflowId::from_position(9).to_string(), "W010");
        assert_eq!(WorkflowId::from_position(999).to_string(), "W1000");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "W", "W1", "W01", "X001", "W000", "W00a"] {
            assert!(bad.parse::<WorkflowId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn ordering_follows_number() {
        let a: WorkflowId = "W002".parse().unwrap();
        let b: WorkflowId = "W010".parse().unwrap();
        assert!(a < b);
    }
}
