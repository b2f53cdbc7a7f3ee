use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_MAX_ORDERS: u32 = 100;
pub const DEFAULT_POLL_AGE_HOURS: u32 = 24;
pub const MAX_POLL_AGE_HOURS: u32 = 8_760;
/// Keeps a full batch comfortably under the provider's API rate limit.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(670);

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// At most this many orders are checked per run
    pub max_orders: u32,
    /// Orders created longer ago than this are left alone
    pub max_age: chrono::Duration,
    /// Pause between successive provider queries
    pub delay: Duration,
    /// Report what would be polled without calling the provider or changing anything
    pub dry_run: bool,
}

/// The poll window for `hours`, clamped to `1..=MAX_POLL_AGE_HOURS`.
pub fn max_age_from_hours(hours: u32) -> chrono::Duration {
    chrono::Duration::hours(i64::from(hours.clamp(1, MAX_POLL_AGE_HOURS)))
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_orders: DEFAULT_POLL_MAX_ORDERS,
            max_age: max_age_from_hours(DEFAULT_POLL_AGE_HOURS),
            delay: DEFAULT_POLL_DELAY,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PollAction {
    /// Dry run only
    WouldPoll,
    /// The session was paid and this run marked the order paid
    MarkedPaid,
    /// The session was paid, but the order had already been settled by someone else
    AlreadySettled,
    /// The session was paid, but the order had been closed. Needs a human
    NotPayable { status: String },
    /// The session expired and the order was marked failed
    MarkedFailed,
    /// Nothing to do yet
    Unchanged { state: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOutcome {
    pub order_id: i64,
    pub session_id: String,
    #[serde(flatten)]
    pub action: PollAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollSummary {
    pub checked: usize,
    pub updated: usize,
    pub errors: usize,
    pub elapsed: Duration,
    pub outcomes: Vec<PollOutcome>,
}

impl PollSummary {
    pub fn record(&mut self, result: PollOutcome) {
        self.checked += 1;
        match result.action {
            PollAction::MarkedPaid | PollAction::MarkedFailed => self.updated += 1,
            PollAction::Error { .. } => self.errors += 1,
            _ => {},
        }
        self.outcomes.push(result);
    }
}
