use chrono::{DateTime, Utc};
use rocket::serde::json::Value;
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{candidate::Candidate, election::Election, vote::Vote, voter::Voter},
};

/// A ballot someone wishes to cast, exactly as received.
///
/// The identifiers are kept as raw JSON values so that missing, mistyped, or
/// malformed values are all reported by the ballot validator rather than
/// rejected by the JSON layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    #[serde(default)]
    pub election_id: Option<Value>,
    #[serde(default)]
    pub candidate_id: Option<Value>,
    #[serde(default)]
    pub voter_id: Option<Value>,
}

impl CastVoteRequest {
    pub fn new(
        election_id: impl Into<String>,
        candidate_id: impl Into<String>,
        voter_id: impl Into<String>,
    ) -> Self {
        Self {
            election_id: Some(Value::String(election_id.into())),
            candidate_id: Some(Value::String(candidate_id.into())),
            voter_id: Some(Value::String(voter_id.into())),
        }
    }
}

/// The candidate fields shown alongside a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: ApiId,
    pub name: String,
    pub party: String,
}

impl From<&Candidate> for CandidateSummary {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.into(),
            name: candidate.name.clone(),
            party: candidate.party.clone(),
        }
    }
}

/// A freshly recorded vote, joined with what the voter chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub id: ApiId,
    pub voter_id: ApiId,
    pub candidate: CandidateSummary,
    pub election_id: ApiId,
    pub election_title: String,
    pub cast_at: DateTime<Utc>,
}

impl VoteReceipt {
    pub fn new(vote: &Vote, candidate: &Candidate, election: &Election) -> Self {
        Self {
            id: vote.id.into(),
            voter_id: vote.voter_id.into(),
            candidate: candidate.into(),
            election_id: election.id.into(),
            election_title: election.title.clone(),
            cast_at: vote.cast_at,
        }
    }
}

/// Response body for a successful cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVoteResponse {
    pub message: String,
    pub vote: VoteReceipt,
}

impl From<VoteReceipt> for CastVoteResponse {
    fn from(vote: VoteReceipt) -> Self {
        Self {
            message: "Vote recorded successfully".to_string(),
            vote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSummary {
    pub id: ApiId,
    pub name: String,
    pub email: String,
}

impl From<&Voter> for VoterSummary {
    fn from(voter: &Voter) -> Self {
        Self {
            id: voter.id.into(),
            name: voter.name.clone(),
            email: voter.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    pub id: ApiId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&Election> for ElectionSummary {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id.into(),
            title: election.title.clone(),
            start_time: election.start_time,
            end_time: election.end_time,
        }
    }
}

/// A stored vote with its references resolved.
/// A reference that no longer resolves is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub id: ApiId,
    pub voter: Option<VoterSummary>,
    pub candidate: Option<CandidateSummary>,
    pub election: Option<ElectionSummary>,
    pub cast_at: DateTime<Utc>,
}
