use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::election::ElectionCore;

/// Where an election sits relative to its voting window.
///
/// This is always derived from the clock; nothing stored on the election
/// (in particular the legacy `is_active` flag) is consulted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionStatus {
    /// The voting window has not opened yet.
    Upcoming,
    /// Ballots are being accepted.
    Active,
    /// The voting window has closed.
    Ended,
}

/// Derive the status of `election` at time `now`.
///
/// Both ends of the window are inclusive: an election is `Active` at exactly
/// its start time and at exactly its end time.
pub fn status(election: &ElectionCore, now: DateTime<Utc>) -> ElectionStatus {
    if now < election.start_time {
        ElectionStatus::Upcoming
    } else if now <= election.end_time {
        ElectionStatus::Active
    } else {
        ElectionStatus::Ended
    }
}
