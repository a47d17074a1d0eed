use chrono::{DateTime, Utc};
use rocket::serde::json::Value;

use crate::error::{Error, Result};
use crate::model::{
    api::vote::{CastVoteRequest, VoteReceipt},
    common::election::{status, ElectionStatus},
    db::vote::VoteCore,
    mongodb::Id,
};
use crate::store::EntityStore;

/// The three typed references a ballot is made of.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub election_id: Id,
    pub candidate_id: Id,
    pub voter_id: Id,
}

impl Ballot {
    /// Check that every identifier is present and well-formed.
    pub fn parse(request: &CastVoteRequest) -> Result<Self> {
        fn field(value: &Option<Value>, name: &str) -> Result<Id> {
            let value = match value {
                Some(Value::String(value)) => value.trim(),
                None | Some(Value::Null) => "",
                Some(other) => {
                    return Err(Error::InvalidInput(format!(
                        "`{name}` must be a string ID, not {other}"
                    )))
                }
            };
            if value.is_empty() {
                return Err(Error::InvalidInput(format!("`{name}` is required")));
            }
            value
                .parse()
                .map_err(|_| Error::InvalidInput(format!("`{name}` is not a valid ID: {value}")))
        }

        Ok(Self {
            election_id: field(&request.election_id, "electionId")?,
            candidate_id: field(&request.candidate_id, "candidateId")?,
            voter_id: field(&request.voter_id, "voterId")?,
        })
    }
}

/// Validate and record a ballot from its raw request.
pub async fn cast_vote(
    store: &dyn EntityStore,
    request: &CastVoteRequest,
    now: DateTime<Utc>,
) -> Result<VoteReceipt> {
    let ballot = Ballot::parse(request)?;
    cast_ballot(store, ballot, now).await
}

/// Validate and record an already-parsed ballot.
///
/// Checks run in a fixed order, so a ballot with several problems always
/// reports the same one. Nothing is written unless every check passes.
pub async fn cast_ballot(
    store: &dyn EntityStore,
    ballot: Ballot,
    now: DateTime<Utc>,
) -> Result<VoteReceipt> {
    let election = store
        .election(ballot.election_id)
        .await?
        .ok_or_else(|| Error::ElectionNotFound(ballot.election_id.to_string()))?;

    match status(&election, now) {
        ElectionStatus::Upcoming => return Err(Error::ElectionNotStarted),
        ElectionStatus::Ended => return Err(Error::ElectionEnded),
        ElectionStatus::Active => {}
    }

    // A candidate standing in some other election is as good as missing.
    let candidate = store
        .candidate(ballot.candidate_id)
        .await?
        .filter(|candidate| candidate.election_id == election.id)
        .ok_or_else(|| {
            Error::CandidateNotFound(format!(
                "{} in election {}",
                ballot.candidate_id, election.id
            ))
        })?;

    let voter = store
        .voter(ballot.voter_id)
        .await?
        .ok_or_else(|| Error::VoterNotFound(ballot.voter_id.to_string()))?;

    // Fast path only; the insert below is what actually enforces uniqueness.
    if store.vote_by_voter(voter.id, election.id).await?.is_some() {
        debug!("Voter {} already voted in election {}", voter.id, election.id);
        return Err(Error::DuplicateVote);
    }

    let vote = store
        .insert_vote(VoteCore {
            voter_id: voter.id,
            candidate_id: candidate.id,
            election_id: election.id,
            cast_at: now,
        })
        .await
        .map_err(|err| {
            let err = Error::from(err);
            if matches!(err, Error::DuplicateVote) {
                debug!(
                    "Concurrent duplicate vote by {} in election {}",
                    voter.id, election.id
                );
            }
            err
        })?;

    info!("Recorded vote {} in election {}", vote.id, election.id);
    Ok(VoteReceipt::new(&vote, &candidate, &election))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use rocket::{futures::future::join_all, serde::json::json, tokio};

    use crate::model::db::{
        candidate::{Candidate, CandidateCore, NewCandidate},
        election::{Election, ElectionCore, NewElection},
        vote::{NewVote, Vote},
        voter::{NewVoter, Voter, VoterCore},
    };
    use crate::store::{MemoryStore, StoreResult};

    use super::*;

    /// Election E1 spanning January 2024, with two candidates and two voters.
    struct Fixture {
        store: MemoryStore,
        election: Election,
        c1: Candidate,
        c2: Candidate,
        v1: Voter,
        v2: Voter,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            let election = store
                .insert_election(ElectionCore::example_between(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap(),
                ))
                .await
                .unwrap();
            let c1 = store
                .insert_candidate(CandidateCore::example_for(election.id, "Ann", "Red"))
                .await
                .unwrap();
            let c2 = store
                .insert_candidate(CandidateCore::example_for(election.id, "Bob", "Blue"))
                .await
                .unwrap();
            let v1 = store.insert_voter(VoterCore::example_numbered(1)).await.unwrap();
            let v2 = store.insert_voter(VoterCore::example_numbered(2)).await.unwrap();
            Self {
                store,
                election,
                c1,
                c2,
                v1,
                v2,
            }
        }

        fn request(&self, voter: &Voter, candidate: &Candidate) -> CastVoteRequest {
            CastVoteRequest::new(
                self.election.id.to_string(),
                candidate.id.to_string(),
                voter.id.to_string(),
            )
        }
    }

    fn mid_january() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    #[rocket::async_test]
    async fn january_example() {
        let f = Fixture::new().await;

        let receipt = cast_vote(&f.store, &f.request(&f.v1, &f.c1), mid_january())
            .await
            .unwrap();
        assert_eq!(*receipt.voter_id, f.v1.id);
        assert_eq!(*receipt.candidate.id, f.c1.id);
        assert_eq!(receipt.candidate.name, "Ann");
        assert_eq!(receipt.candidate.party, "Red");
        assert_eq!(receipt.election_title, f.election.title);
        assert_eq!(receipt.cast_at, mid_january());

        let second = cast_vote(&f.store, &f.request(&f.v1, &f.c2), mid_january()).await;
        assert!(matches!(second, Err(Error::DuplicateVote)));

        let february = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let late = cast_vote(&f.store, &f.request(&f.v2, &f.c1), february).await;
        assert!(matches!(late, Err(Error::ElectionEnded)));

        assert_eq!(f.store.votes().await.unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn resubmission_always_fails_the_same_way() {
        let f = Fixture::new().await;
        let request = f.request(&f.v1, &f.c1);
        cast_vote(&f.store, &request, mid_january()).await.unwrap();
        for _ in 0..3 {
            let retry = cast_vote(&f.store, &request, mid_january()).await;
            assert!(matches!(retry, Err(Error::DuplicateVote)));
        }
    }

    #[rocket::async_test]
    async fn missing_and_malformed_ids_are_invalid_input() {
        let f = Fixture::new().await;
        let valid = f.request(&f.v1, &f.c1);

        let mut missing = valid.clone();
        missing.voter_id = None;
        let mut blank = valid.clone();
        blank.candidate_id = Some("   ".to_string().into());
        let mut malformed = valid.clone();
        malformed.election_id = Some("not-an-id".to_string().into());

        for request in [missing, blank, malformed, CastVoteRequest::default()] {
            let result = cast_vote(&f.store, &request, mid_january()).await;
            assert!(matches!(result, Err(Error::InvalidInput(_))), "{request:?}");
        }
        assert!(f.store.votes().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn non_string_ids_are_invalid_input() {
        let f = Fixture::new().await;
        let valid = f.request(&f.v1, &f.c1);

        let mut numeric = valid.clone();
        numeric.election_id = Some(json!(123));
        let mut boolean = valid.clone();
        boolean.candidate_id = Some(json!(true));
        let mut object = valid.clone();
        object.voter_id = Some(json!({ "$oid": f.v1.id.to_string() }));
        let mut null = valid.clone();
        null.voter_id = Some(Value::Null);

        for request in [numeric, boolean, object, null] {
            let result = cast_vote(&f.store, &request, mid_january()).await;
            assert!(matches!(result, Err(Error::InvalidInput(_))), "{request:?}");
        }
        assert!(f.store.votes().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn timing_is_checked_before_references() {
        let f = Fixture::new().await;
        // Unknown candidate and voter, but the election is the first problem.
        let request = CastVoteRequest {
            election_id: Some(f.election.id.to_string().into()),
            candidate_id: Some(Id::new().to_string().into()),
            voter_id: Some(Id::new().to_string().into()),
        };
        let december = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert!(matches!(
            cast_vote(&f.store, &request, december).await,
            Err(Error::ElectionNotStarted)
        ));
        let march = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            cast_vote(&f.store, &request, march).await,
            Err(Error::ElectionEnded)
        ));
    }

    #[rocket::async_test]
    async fn ended_elections_reject_every_ballot() {
        let f = Fixture::new().await;
        let after = f.election.end_time + Duration::seconds(1);
        for voter in [&f.v1, &f.v2] {
            for candidate in [&f.c1, &f.c2] {
                let result = cast_vote(&f.store, &f.request(voter, candidate), after).await;
                assert!(matches!(result, Err(Error::ElectionEnded)));
            }
        }
        assert!(f.store.votes().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn window_boundaries_accept_ballots() {
        let f = Fixture::new().await;
        cast_vote(&f.store, &f.request(&f.v1, &f.c1), f.election.start_time)
            .await
            .unwrap();
        cast_vote(&f.store, &f.request(&f.v2, &f.c2), f.election.end_time)
            .await
            .unwrap();
    }

    #[rocket::async_test]
    async fn reference_errors_in_order() {
        let f = Fixture::new().await;

        let mut request = f.request(&f.v1, &f.c1);
        request.election_id = Some(Id::new().to_string().into());
        assert!(matches!(
            cast_vote(&f.store, &request, mid_january()).await,
            Err(Error::ElectionNotFound(_))
        ));

        // Unknown candidate and unknown voter: the candidate is reported.
        let mut request = f.request(&f.v1, &f.c1);
        request.candidate_id = Some(Id::new().to_string().into());
        request.voter_id = Some(Id::new().to_string().into());
        assert!(matches!(
            cast_vote(&f.store, &request, mid_january()).await,
            Err(Error::CandidateNotFound(_))
        ));

        let mut request = f.request(&f.v1, &f.c1);
        request.voter_id = Some(Id::new().to_string().into());
        assert!(matches!(
            cast_vote(&f.store, &request, mid_january()).await,
            Err(Error::VoterNotFound(_))
        ));
        assert!(f.store.votes().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn candidates_from_other_elections_are_not_found() {
        let f = Fixture::new().await;
        let elsewhere = f
            .store
            .insert_election(ElectionCore::example_between(
                f.election.start_time,
                f.election.end_time,
            ))
            .await
            .unwrap();
        let stranger = f
            .store
            .insert_candidate(CandidateCore::example_for(elsewhere.id, "Eve", "Grey"))
            .await
            .unwrap();
        let result = cast_vote(&f.store, &f.request(&f.v1, &stranger), mid_january()).await;
        assert!(matches!(result, Err(Error::CandidateNotFound(_))));
    }

    #[rocket::async_test]
    async fn voters_may_vote_once_in_each_election() {
        let f = Fixture::new().await;
        let second_election = f
            .store
            .insert_election(ElectionCore::example_between(
                f.election.start_time,
                f.election.end_time,
            ))
            .await
            .unwrap();
        let c3 = f
            .store
            .insert_candidate(CandidateCore::example_for(second_election.id, "Cat", "Green"))
            .await
            .unwrap();

        cast_vote(&f.store, &f.request(&f.v1, &f.c1), mid_january())
            .await
            .unwrap();
        let request = CastVoteRequest {
            election_id: Some(second_election.id.to_string().into()),
            candidate_id: Some(c3.id.to_string().into()),
            voter_id: Some(f.v1.id.to_string().into()),
        };
        cast_vote(&f.store, &request, mid_january()).await.unwrap();
        assert_eq!(f.store.votes().await.unwrap().len(), 2);
    }

    /// A store whose duplicate-vote lookup never finds anything, so every
    /// request reaches the insert, as it would when racing another request.
    struct RacingStore(MemoryStore);

    #[rocket::async_trait]
    impl EntityStore for RacingStore {
        async fn voter(&self, id: Id) -> StoreResult<Option<Voter>> {
            self.0.voter(id).await
        }
        async fn candidate(&self, id: Id) -> StoreResult<Option<Candidate>> {
            self.0.candidate(id).await
        }
        async fn election(&self, id: Id) -> StoreResult<Option<Election>> {
            self.0.election(id).await
        }
        async fn vote_by_voter(&self, _voter_id: Id, _election_id: Id) -> StoreResult<Option<Vote>> {
            Ok(None)
        }
        async fn votes(&self) -> StoreResult<Vec<Vote>> {
            self.0.votes().await
        }
        async fn count_votes_by_candidate(&self, election_id: Id) -> StoreResult<Vec<(Id, u64)>> {
            self.0.count_votes_by_candidate(election_id).await
        }
        async fn insert_voter(&self, voter: NewVoter) -> StoreResult<Voter> {
            self.0.insert_voter(voter).await
        }
        async fn insert_candidate(&self, candidate: NewCandidate) -> StoreResult<Candidate> {
            self.0.insert_candidate(candidate).await
        }
        async fn insert_election(&self, election: NewElection) -> StoreResult<Election> {
            self.0.insert_election(election).await
        }
        async fn insert_vote(&self, vote: NewVote) -> StoreResult<Vote> {
            self.0.insert_vote(vote).await
        }
        async fn ping(&self) -> StoreResult<()> {
            self.0.ping().await
        }
    }

    #[rocket::async_test]
    async fn lost_races_are_duplicate_votes() {
        let f = Fixture::new().await;
        let request = f.request(&f.v1, &f.c1);
        let other = f.request(&f.v1, &f.c2);
        let store = RacingStore(f.store);

        cast_vote(&store, &request, mid_january()).await.unwrap();
        let result = cast_vote(&store, &other, mid_january()).await;
        assert!(matches!(result, Err(Error::DuplicateVote)));
        assert_eq!(store.votes().await.unwrap().len(), 1);
    }

    #[test]
    fn concurrent_identical_ballots_admit_exactly_one() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let f = Fixture::new().await;
            let request = f.request(&f.v1, &f.c1);
            let store = Arc::new(RacingStore(f.store));

            let attempts = (0..8).map(|_| {
                let store = store.clone();
                let request = request.clone();
                tokio::spawn(async move { cast_vote(&*store, &request, mid_january()).await })
            });
            let results = join_all(attempts).await;

            let successes = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
            let duplicates = results
                .iter()
                .filter(|r| matches!(r, Ok(Err(Error::DuplicateVote))))
                .count();
            assert_eq!(successes, 1);
            assert_eq!(duplicates, 7);
            assert_eq!(store.votes().await.unwrap().len(), 1);
        });
    }
}
