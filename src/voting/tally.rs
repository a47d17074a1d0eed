use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    api::results::{CandidateResult, DanglingCandidate, ElectionResults},
    common::election::status,
    mongodb::Id,
};
use crate::store::EntityStore;

/// Share of `total` that `votes` makes up, as a percentage rounded to two
/// decimal places. Zero when nothing has been cast.
pub fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (votes as f64 * 10_000.0 / total as f64).round() / 100.0
}

/// Count, rank, and annotate the ballots of an election.
///
/// Results are available whatever the election's status. Votes for
/// candidates that can no longer be found are left out of the ranking and
/// the total, and reported in [`ElectionResults::dangling`].
pub async fn results(
    store: &dyn EntityStore,
    election_id: &str,
    now: DateTime<Utc>,
) -> Result<ElectionResults> {
    let election_id: Id = election_id
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("`electionId` is not a valid ID: {election_id}")))?;
    let election = store
        .election(election_id)
        .await?
        .ok_or_else(|| Error::ElectionNotFound(election_id.to_string()))?;

    let mut counts = store.count_votes_by_candidate(election.id).await?;
    // Resolve in a fixed order so output never depends on the store's.
    counts.sort_unstable_by_key(|&(candidate_id, _)| candidate_id);

    let mut ranked = Vec::with_capacity(counts.len());
    let mut dangling = Vec::new();
    for (candidate_id, votes) in counts {
        match store.candidate(candidate_id).await? {
            Some(candidate) => ranked.push((candidate, votes)),
            None => {
                warn!(
                    "{votes} vote(s) in election {} reference missing candidate {candidate_id}",
                    election.id
                );
                dangling.push(DanglingCandidate {
                    candidate_id: candidate_id.into(),
                    votes,
                });
            }
        }
    }

    let total_votes: u64 = ranked.iter().map(|(_, votes)| votes).sum();
    // Stable sort keeps the id ordering among ties.
    ranked.sort_by(|(_, a), (_, b)| b.cmp(a));

    let results = ranked
        .into_iter()
        .map(|(candidate, votes)| CandidateResult {
            candidate_id: candidate.id.into(),
            candidate_name: candidate.name.clone(),
            party: candidate.party.clone(),
            votes,
            percentage: percentage(votes, total_votes),
        })
        .collect();

    Ok(ElectionResults {
        election_id: election.id.into(),
        election_title: election.title.clone(),
        status: status(&election, now),
        total_votes,
        results,
        dangling,
    })
}
