//! Version lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Lifecycle state of a version (and the Next/Current documents it cascades into).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    Created,
    Submitted,
    Completed,
    EditionConfirmed,
    Associated,
    Published,
    Detached,
    Failed,
}

impl State {
    /// All states, in workflow order.
    pub const ALL: [State; 8] = [
        State::Created,
        State::Submitted,
        State::Completed,
        State::EditionConfirmed,
        State::Associated,
        State::Published,
        State::Detached,
        State::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Created => "created",
            State::Submitted => "submitted",
            State::Completed => "completed",
            State::EditionConfirmed => "edition-confirmed",
            State::Associated => "associated",
            State::Published => "published",
            State::Detached => "detached",
            State::Failed => "failed",
        }
    }

    /// States in which a version must carry its release metadata.
    pub fn requires_release_metadata(&self) -> bool {
        matches!(
            self,
            State::EditionConfirmed | State::Associated | State::Published
        )
    }

    /// Work-in-progress states that may still be abandoned.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            State::Created
                | State::Submitted
                | State::Completed
                | State::EditionConfirmed
                | State::Associated
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| CatalogError::InvalidState(s.to_string()))
    }
}
