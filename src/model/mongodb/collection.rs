use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{
    candidate::{Candidate, NewCandidate},
    election::{Election, NewElection},
    vote::{NewVote, Vote},
    voter::{NewVoter, Voter},
};
use crate::store::Constraint;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Voter collections
const VOTERS: &str = "voters";
impl MongoCollection for Voter {
    const NAME: &'static str = VOTERS;
}
impl MongoCollection for NewVoter {
    const NAME: &'static str = VOTERS;
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Election collections
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}
impl MongoCollection for NewElection {
    const NAME: &'static str = ELECTIONS;
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for NewVote {
    const NAME: &'static str = VOTES;
}

/// Build a unique index named after the constraint it enforces, so that
/// duplicate key errors can be traced back to that constraint.
fn unique_index(keys: mongodb::bson::Document, constraint: Constraint) -> IndexModel {
    let options = IndexOptions::builder()
        .unique(true)
        .name(constraint.index_name().to_string())
        .build();
    IndexModel::builder().keys(keys).options(options).build()
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Voter collection.
    let voters = Coll::<Voter>::from_db(db);
    voters
        .create_index(unique_index(doc! {"voter_id": 1}, Constraint::VoterId), None)
        .await?;
    voters
        .create_index(unique_index(doc! {"email": 1}, Constraint::VoterEmail), None)
        .await?;

    // Candidate collection, looked up by election when tallying.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "name": 1})
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // Vote collection. The compound index is what actually guarantees one
    // vote per voter per election.
    let votes = Coll::<Vote>::from_db(db);
    votes
        .create_index(
            unique_index(
                doc! {"voter_id": 1, "election_id": 1},
                Constraint::OneVotePerElection,
            ),
            None,
        )
        .await?;
    let cast_at_index = IndexModel::builder().keys(doc! {"cast_at": -1}).build();
    votes.create_index(cast_at_index, None).await?;

    Ok(())
}
