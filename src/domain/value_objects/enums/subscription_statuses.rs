use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Lifecycle of a purchased subscription. `Pending` is the only non-terminal
/// state; once a row reaches `Active` or `Cancelled` it never changes again.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Active,
    Cancelled,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SubscriptionStatus::Pending => "Pending",
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Cancelled => "Cancelled",
        };
        write!(f, "{}", status)
    }
}

impl SubscriptionStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "Pending" => SubscriptionStatus::Pending,
            "Active" => SubscriptionStatus::Active,
            "Cancelled" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubscriptionStatus::Pending)
    }
}
