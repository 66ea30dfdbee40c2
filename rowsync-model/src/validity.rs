use serde::{Deserialize, Serialize};
use std::fmt;

/// Validity of a view: either valid, or invalid with a human readable reason.
///
/// Equality is observational, so a notifier can compare the old and new
/// state and stay quiet when nothing visible changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidState {
    valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl ValidState {
    pub const fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The reason for invalidity; always `None` when valid.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Combines two states: valid only if both are. Reasons are joined with
    /// newlines in order.
    #[must_use]
    pub fn and(self, other: ValidState) -> ValidState {
        match (self.valid, other.valid) {
            (true, true) => ValidState::valid(),
            (true, false) => other,
            (false, true) => self,
            (false, false) => {
                let reason = match (self.reason, other.reason) {
                    (Some(a), Some(b)) => Some(format!("{a}\n{b}")),
                    (a, b) => a.or(b),
                };
                ValidState {
                    valid: false,
                    reason,
                }
            }
        }
    }
}

impl Default for ValidState {
    fn default() -> Self {
        Self::valid()
    }
}

impl FromIterator<ValidState> for ValidState {
    fn from_iter<I: IntoIterator<Item = ValidState>>(iter: I) -> Self {
        iter.into_iter().fold(ValidState::valid(), ValidState::and)
    }
}

impl fmt::Display for ValidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.valid, &self.reason) {
            (true, _) => f.write_str("valid"),
            (false, Some(r)) => write!(f, "invalid: {r}"),
            (false, None) => f.write_str("invalid"),
        }
    }
}
