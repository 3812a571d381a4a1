//! Cookie-consent decision and its transition table.
//!
//! ```text
//!   undecided ──accept──▶ accepted ◀──┐
//!       │                    │        │ accept
//!       └──decline──▶ declined ◀──────┘ decline
//! ```
//!
//! Once decided, a decision only changes when the user explicitly picks the
//! other option. Nothing returns to `undecided`. Entering `declined` requires
//! a full reset of client-side persistence.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The user's cookie-consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDecision {
    /// No choice made yet; nothing may be persisted.
    #[default]
    Undecided,
    /// Cookies may be written.
    Accepted,
    /// Cookies may not be written and existing ones must be cleared.
    Declined,
}

/// Side effect required by a consent transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentEffect {
    /// Nothing to do beyond recording the decision.
    None,
    /// Clear every cookie and every local-storage key, not just the cart id.
    ClearAll,
}

/// Errors from [`ConsentDecision::transition`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsentError {
    /// A decided user cannot go back to undecided.
    #[error("consent cannot be reset to undecided")]
    CannotRevert,
    /// Unrecognised decision string.
    #[error("unknown consent decision: {0:?}")]
    Unknown(String),
}

impl ConsentDecision {
    /// Whether a choice has been made. Cheap and synchronous, checked before
    /// every cookie write.
    #[must_use]
    pub const fn has_decided(self) -> bool {
        !matches!(self, Self::Undecided)
    }

    /// Whether cookies may be written.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Move to `next`, returning the effect the caller must apply.
    ///
    /// Re-asserting the current decision is allowed and has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::CannotRevert`] when `next` is `Undecided`
    /// and a decision has already been made.
    pub fn transition(self, next: Self) -> Result<ConsentEffect, ConsentError> {
        match (self, next) {
            (current, Self::Undecided) if current.has_decided() => Err(ConsentError::CannotRevert),
            (Self::Declined, Self::Declined) => Ok(ConsentEffect::None),
            (_, Self::Declined) => Ok(ConsentEffect::ClearAll),
            _ => Ok(ConsentEffect::None),
        }
    }

    /// The stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undecided => "undecided",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for ConsentDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentDecision {
    type Err = ConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "undecided" | "" => Ok(Self::Undecided),
            "accepted" | "true" => Ok(Self::Accepted),
            "declined" | "false" => Ok(Self::Declined),
            other => Err(ConsentError::Unknown(other.to_owned())),
        }
    }
}
