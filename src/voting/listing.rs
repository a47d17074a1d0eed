use std::cmp::Reverse;
use std::collections::HashMap;

use crate::error::Result;
use crate::model::{
    api::vote::{CandidateSummary, ElectionSummary, VoteSummary, VoterSummary},
    mongodb::Id,
};
use crate::store::EntityStore;

/// Every stored vote with its voter, candidate, and election resolved,
/// most recent first.
pub async fn list_votes(store: &dyn EntityStore) -> Result<Vec<VoteSummary>> {
    let mut votes = store.votes().await?;
    votes.sort_unstable_by_key(|vote| Reverse((vote.cast_at, vote.id)));

    // Each referenced entity is looked up once.
    let mut voters = HashMap::<Id, Option<VoterSummary>>::new();
    let mut candidates = HashMap::<Id, Option<CandidateSummary>>::new();
    let mut elections = HashMap::<Id, Option<ElectionSummary>>::new();

    let mut summaries = Vec::with_capacity(votes.len());
    for vote in votes {
        if !voters.contains_key(&vote.voter_id) {
            let voter = store.voter(vote.voter_id).await?;
            voters.insert(vote.voter_id, voter.as_ref().map(Into::into));
        }
        if !candidates.contains_key(&vote.candidate_id) {
            let candidate = store.candidate(vote.candidate_id).await?;
            candidates.insert(vote.candidate_id, candidate.as_ref().map(Into::into));
        }
        if !elections.contains_key(&vote.election_id) {
            let election = store.election(vote.election_id).await?;
            elections.insert(vote.election_id, election.as_ref().map(Into::into));
        }

        summaries.push(VoteSummary {
            id: vote.id.into(),
            voter: voters[&vote.voter_id].clone(),
            candidate: candidates[&vote.candidate_id].clone(),
            election: elections[&vote.election_id].clone(),
            cast_at: vote.cast_at,
        });
    }
    Ok(summaries)
}
