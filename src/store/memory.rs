use std::collections::{HashMap, HashSet};

use rocket::tokio::sync::RwLock;

use crate::model::{
    db::{
        candidate::{Candidate, NewCandidate},
        election::{Election, NewElection},
        vote::{NewVote, Vote},
        voter::{NewVoter, Voter},
    },
    mongodb::Id,
};

use super::{Constraint, EntityStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    voters: HashMap<Id, Voter>,
    voter_ids: HashSet<String>,
    voter_emails: HashSet<String>,
    candidates: HashMap<Id, Candidate>,
    elections: HashMap<Id, Election>,
    votes: HashMap<Id, Vote>,
    /// `(voter_id, election_id)` to the vote cast.
    ballots: HashMap<(Id, Id), Id>,
}

/// An entity store held entirely in process memory.
///
/// Every insert checks its constraints and writes while holding the same
/// write lock, so a constraint check can never be separated from its write.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl EntityStore for MemoryStore {
    async fn voter(&self, id: Id) -> StoreResult<Option<Voter>> {
        Ok(self.tables.read().await.voters.get(&id).cloned())
    }

    async fn candidate(&self, id: Id) -> StoreResult<Option<Candidate>> {
        Ok(self.tables.read().await.candidates.get(&id).cloned())
    }

    async fn election(&self, id: Id) -> StoreResult<Option<Election>> {
        Ok(self.tables.read().await.elections.get(&id).cloned())
    }

    async fn vote_by_voter(&self, voter_id: Id, election_id: Id) -> StoreResult<Option<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .ballots
            .get(&(voter_id, election_id))
            .and_then(|vote_id| tables.votes.get(vote_id))
            .cloned())
    }

    async fn votes(&self) -> StoreResult<Vec<Vote>> {
        Ok(self.tables.read().await.votes.values().cloned().collect())
    }

    async fn count_votes_by_candidate(&self, election_id: Id) -> StoreResult<Vec<(Id, u64)>> {
        let tables = self.tables.read().await;
        let mut counts: HashMap<Id, u64> = HashMap::new();
        for vote in tables
            .votes
            .values()
            .filter(|vote| vote.election_id == election_id)
        {
            *counts.entry(vote.candidate_id).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn insert_voter(&self, voter: NewVoter) -> StoreResult<Voter> {
        let mut tables = self.tables.write().await;
        if tables.voter_ids.contains(&voter.voter_id) {
            return Err(StoreError::Conflict(Constraint::VoterId));
        }
        if tables.voter_emails.contains(&voter.email) {
            return Err(StoreError::Conflict(Constraint::VoterEmail));
        }
        tables.voter_ids.insert(voter.voter_id.clone());
        tables.voter_emails.insert(voter.email.clone());
        let voter = Voter {
            id: Id::new(),
            voter,
        };
        tables.voters.insert(voter.id, voter.clone());
        Ok(voter)
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> StoreResult<Candidate> {
        let candidate = Candidate {
            id: Id::new(),
            candidate,
        };
        self.tables
            .write()
            .await
            .candidates
            .insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn insert_election(&self, election: NewElection) -> StoreResult<Election> {
        let election = Election {
            id: Id::new(),
            election,
        };
        self.tables
            .write()
            .await
            .elections
            .insert(election.id, election.clone());
        Ok(election)
    }

    async fn insert_vote(&self, vote: NewVote) -> StoreResult<Vote> {
        let mut tables = self.tables.write().await;
        let key = (vote.voter_id, vote.election_id);
        if tables.ballots.contains_key(&key) {
            return Err(StoreError::Conflict(Constraint::OneVotePerElection));
        }
        let vote = Vote {
            id: Id::new(),
            vote,
        };
        tables.ballots.insert(key, vote.id);
        tables.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rocket::{futures::future::join_all, tokio};

    use crate::model::db::{
        candidate::CandidateCore, election::ElectionCore, vote::VoteCore, voter::VoterCore,
    };

    use super::*;

    fn vote(voter_id: Id, candidate_id: Id, election_id: Id) -> NewVote {
        VoteCore {
            voter_id,
            candidate_id,
            election_id,
            cast_at: Utc::now(),
        }
    }

    #[rocket::async_test]
    async fn lookups_find_what_was_inserted() {
        let store = MemoryStore::new();
        let election = store
            .insert_election(ElectionCore::current_example())
            .await
            .unwrap();
        let candidate = store
            .insert_candidate(CandidateCore::example_for(election.id, "Ann", "Red"))
            .await
            .unwrap();
        let voter = store.insert_voter(VoterCore::example()).await.unwrap();

        assert_eq!(store.election(election.id).await.unwrap(), Some(election));
        assert_eq!(store.candidate(candidate.id).await.unwrap(), Some(candidate));
        assert_eq!(store.voter(voter.id).await.unwrap(), Some(voter));
        assert_eq!(store.voter(Id::new()).await.unwrap(), None);
    }

    #[rocket::async_test]
    async fn voter_uniqueness() {
        let store = MemoryStore::new();
        store.insert_voter(VoterCore::example_numbered(1)).await.unwrap();

        let mut same_id = VoterCore::example_numbered(2);
        same_id.voter_id = "V1".to_string();
        assert!(matches!(
            store.insert_voter(same_id).await,
            Err(StoreError::Conflict(Constraint::VoterId))
        ));

        let mut same_email = VoterCore::example_numbered(3);
        same_email.email = "voter1@example.com".to_string();
        assert!(matches!(
            store.insert_voter(same_email).await,
            Err(StoreError::Conflict(Constraint::VoterEmail))
        ));

        // Failed inserts must not leave anything behind.
        store.insert_voter(VoterCore::example_numbered(2)).await.unwrap();
        store.insert_voter(VoterCore::example_numbered(3)).await.unwrap();
    }

    #[rocket::async_test]
    async fn one_vote_per_voter_per_election() {
        let store = MemoryStore::new();
        let (voter, election, other_election) = (Id::new(), Id::new(), Id::new());

        let first = store
            .insert_vote(vote(voter, Id::new(), election))
            .await
            .unwrap();
        assert!(matches!(
            store.insert_vote(vote(voter, Id::new(), election)).await,
            Err(StoreError::Conflict(Constraint::OneVotePerElection))
        ));
        store
            .insert_vote(vote(voter, Id::new(), other_election))
            .await
            .unwrap();

        assert_eq!(
            store.vote_by_voter(voter, election).await.unwrap(),
            Some(first)
        );
        assert_eq!(store.votes().await.unwrap().len(), 2);
    }

    #[test]
    fn concurrent_inserts_admit_exactly_one() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let (voter, candidate, election) = (Id::new(), Id::new(), Id::new());

        let results = runtime.block_on(async {
            let attempts = (0..16).map(|_| {
                let store = store.clone();
                tokio::spawn(
                    async move { store.insert_vote(vote(voter, candidate, election)).await },
                )
            });
            join_all(attempts).await
        });

        let successes = results
            .iter()
            .filter(|result| matches!(result, Ok(Ok(_))))
            .count();
        let conflicts = results
            .iter()
            .filter(|result| {
                matches!(
                    result,
                    Ok(Err(StoreError::Conflict(Constraint::OneVotePerElection)))
                )
            })
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 15);
        let stored = runtime.block_on(store.votes()).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[rocket::async_test]
    async fn counts_group_by_candidate_within_election() {
        let store = MemoryStore::new();
        let (election, other_election) = (Id::new(), Id::new());
        let (ann, bob) = (Id::new(), Id::new());
        for _ in 0..3 {
            store.insert_vote(vote(Id::new(), ann, election)).await.unwrap();
        }
        store.insert_vote(vote(Id::new(), bob, election)).await.unwrap();
        store
            .insert_vote(vote(Id::new(), bob, other_election))
            .await
            .unwrap();

        let mut counts = store.count_votes_by_candidate(election).await.unwrap();
        counts.sort();
        let mut expected = vec![(ann, 3), (bob, 1)];
        expected.sort();
        assert_eq!(counts, expected);
        assert!(store
            .count_votes_by_candidate(Id::new())
            .await
            .unwrap()
            .is_empty());
    }
}
