//! The entity store: the single owner of every Voter, Candidate, Election,
//! and Vote, and the sole arbiter of their uniqueness constraints.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use mongodb::error::Error as DbError;
use thiserror::Error;

use crate::model::{
    db::{
        candidate::{Candidate, NewCandidate},
        election::{Election, NewElection},
        vote::{NewVote, Vote},
        voter::{NewVoter, Voter},
    },
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// The store as held in Rocket's managed state.
pub type Store = Arc<dyn EntityStore>;

/// A uniqueness constraint declared by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// No two voters share an external voter ID.
    VoterId,
    /// No two voters share an email address.
    VoterEmail,
    /// A voter votes at most once per election.
    OneVotePerElection,
}

impl Constraint {
    /// Name of the MongoDB index that enforces this constraint.
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::VoterId => "voter_id_unique",
            Self::VoterEmail => "voter_email_unique",
            Self::OneVotePerElection => "voter_election_unique",
        }
    }

    /// All constraints, for mapping index names back.
    pub const ALL: [Constraint; 3] = [
        Constraint::VoterId,
        Constraint::VoterEmail,
        Constraint::OneVotePerElection,
    ];
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Self::VoterId => "voter ID already registered",
            Self::VoterEmail => "email already registered",
            Self::OneVotePerElection => "voter has already voted in this election",
        };
        write!(f, "{description}")
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert would have violated a uniqueness constraint. Nothing was written.
    #[error("Uniqueness constraint violated: {0}")]
    Conflict(Constraint),
    /// The backing store failed.
    #[error(transparent)]
    Db(#[from] DbError),
    /// The backing store returned something we could not make sense of.
    #[error("Store returned unexpected data: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable keyed storage for the four entity kinds.
///
/// Lookups return `Ok(None)` when no record has the given ID. Inserts assign
/// a fresh ID and are atomic with respect to every uniqueness constraint:
/// of two concurrent inserts that would collide, exactly one succeeds and
/// the other fails with [`StoreError::Conflict`].
#[rocket::async_trait]
pub trait EntityStore: Send + Sync {
    async fn voter(&self, id: Id) -> StoreResult<Option<Voter>>;

    async fn candidate(&self, id: Id) -> StoreResult<Option<Candidate>>;

    async fn election(&self, id: Id) -> StoreResult<Option<Election>>;

    /// The vote cast by `voter_id` in `election_id`, if any.
    async fn vote_by_voter(&self, voter_id: Id, election_id: Id) -> StoreResult<Option<Vote>>;

    /// Every stored vote, in no particular order.
    async fn votes(&self) -> StoreResult<Vec<Vote>>;

    /// Number of votes per candidate in the given election, in no particular
    /// order. Candidates with no votes do not appear.
    async fn count_votes_by_candidate(&self, election_id: Id) -> StoreResult<Vec<(Id, u64)>>;

    async fn insert_voter(&self, voter: NewVoter) -> StoreResult<Voter>;

    async fn insert_candidate(&self, candidate: NewCandidate) -> StoreResult<Candidate>;

    async fn insert_election(&self, election: NewElection) -> StoreResult<Election>;

    async fn insert_vote(&self, vote: NewVote) -> StoreResult<Vote>;

    /// Check that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
