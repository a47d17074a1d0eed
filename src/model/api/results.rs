use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, common::election::ElectionStatus};

/// One row of the ranked results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub candidate_id: ApiId,
    pub candidate_name: String,
    pub party: String,
    pub votes: u64,
    /// Share of `total_votes`, in percent, rounded to two decimal places.
    pub percentage: f64,
}

/// Votes recorded against a candidate that can no longer be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingCandidate {
    pub candidate_id: ApiId,
    pub votes: u64,
}

/// The tally of an election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    pub election_id: ApiId,
    pub election_title: String,
    /// Status at the moment the tally was taken.
    pub status: ElectionStatus,
    /// Sum of the votes of every ranked candidate.
    pub total_votes: u64,
    /// Ranked by votes descending, then candidate ID ascending.
    pub results: Vec<CandidateResult>,
    /// Integrity faults: these votes are excluded from `results` and `total_votes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dangling: Vec<DanglingCandidate>,
}
