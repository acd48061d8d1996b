use std::str::FromStr;

use common::OrderStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which status changes `OrderStore::update_status` accepts.
///
/// Both policies refuse `Cancelled` as a target and as a source: cancelling
/// has to go through the cancellation flow so stock is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any move among pending, preparing and delivered.
    #[default]
    Unrestricted,

    /// Only moves that keep or advance the status.
    ForwardOnly,
}

impl TransitionPolicy {
    /// Returns true if an order in `from` may be set to `to`.
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        if from == OrderStatus::Cancelled || to == OrderStatus::Cancelled {
            return false;
        }
        match self {
            Self::Unrestricted => true,
            Self::ForwardOnly => from.is_forward_move(to),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unrestricted => "unrestricted",
            Self::ForwardOnly => "forward_only",
        }
    }
}

impl std::fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a transition policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transition policy: {0} (expected unrestricted or forward_only)")]
pub struct ParsePolicyError(pub String);

impl FromStr for TransitionPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "forward_only" | "forward" => Ok(Self::ForwardOnly),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}
