use mongodb::{
    bson::{doc, from_document, Document},
    error::Error as DbError,
    Database,
};
use rocket::futures::TryStreamExt;

use crate::model::{
    db::{
        candidate::{Candidate, NewCandidate},
        election::{Election, NewElection},
        vote::{NewVote, Vote},
        voter::{NewVoter, Voter},
    },
    mongodb::{duplicate_key_message, Coll, Id},
};

use super::{Constraint, EntityStore, StoreError, StoreResult};

/// An entity store backed by MongoDB.
///
/// Uniqueness is enforced by the unique indexes created in
/// [`crate::model::mongodb::ensure_indexes_exist`], which must already exist.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new document and return the ID the database assigned.
    async fn insert<T>(&self, new: &T) -> StoreResult<Id>
    where
        T: crate::model::mongodb::MongoCollection + serde::Serialize,
    {
        let result = Coll::<T>::from_db(&self.db)
            .insert_one(new, None)
            .await
            .map_err(translate_write_error)?;
        result
            .inserted_id
            .as_object_id()
            .map(Id::from)
            .ok_or_else(|| StoreError::Corrupt("inserted ID is not an ObjectId".to_string()))
    }
}

/// Translate duplicate key errors into the constraint they violated.
fn translate_write_error(err: DbError) -> StoreError {
    if let Some(message) = duplicate_key_message(&err) {
        if let Some(constraint) = constraint_for_message(message) {
            return StoreError::Conflict(constraint);
        }
        warn!("Duplicate key error on an unrecognised index: {message}");
    }
    StoreError::Db(err)
}

/// Duplicate key messages name the offending index, e.g.
/// `E11000 duplicate key error collection: elections.votes index: voter_election_unique dup key: ...`.
fn constraint_for_message(message: &str) -> Option<Constraint> {
    Constraint::ALL
        .into_iter()
        .find(|constraint| message.contains(constraint.index_name()))
}

/// Aggregation pipeline counting the votes for each candidate in an election.
fn count_by_candidate_pipeline(election_id: Id) -> Vec<Document> {
    vec![
        doc! { "$match": { "election_id": election_id } },
        doc! { "$group": { "_id": "$candidate_id", "votes": { "$sum": 1_i64 } } },
    ]
}

/// Output rows of [`count_by_candidate_pipeline`].
#[derive(serde::Deserialize)]
struct CandidateCount {
    #[serde(rename = "_id")]
    candidate_id: Id,
    votes: i64,
}

#[rocket::async_trait]
impl EntityStore for MongoStore {
    async fn voter(&self, id: Id) -> StoreResult<Option<Voter>> {
        Ok(Coll::<Voter>::from_db(&self.db)
            .find_one(id.as_doc(), None)
            .await?)
    }

    async fn candidate(&self, id: Id) -> StoreResult<Option<Candidate>> {
        Ok(Coll::<Candidate>::from_db(&self.db)
            .find_one(id.as_doc(), None)
            .await?)
    }

    async fn election(&self, id: Id) -> StoreResult<Option<Election>> {
        Ok(Coll::<Election>::from_db(&self.db)
            .find_one(id.as_doc(), None)
            .await?)
    }

    async fn vote_by_voter(&self, voter_id: Id, election_id: Id) -> StoreResult<Option<Vote>> {
        let filter = doc! {
            "voter_id": voter_id,
            "election_id": election_id,
        };
        Ok(Coll::<Vote>::from_db(&self.db)
            .find_one(filter, None)
            .await?)
    }

    async fn votes(&self) -> StoreResult<Vec<Vote>> {
        Ok(Coll::<Vote>::from_db(&self.db)
            .find(None, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn count_votes_by_candidate(&self, election_id: Id) -> StoreResult<Vec<(Id, u64)>> {
        let rows: Vec<Document> = Coll::<Vote>::from_db(&self.db)
            .aggregate(count_by_candidate_pipeline(election_id), None)
            .await?
            .try_collect()
            .await?;
        rows.into_iter()
            .map(|row| {
                let count: CandidateCount = from_document(row)
                    .map_err(|e| StoreError::Corrupt(format!("bad tally row: {e}")))?;
                let votes = u64::try_from(count.votes)
                    .map_err(|_| StoreError::Corrupt("negative vote count".to_string()))?;
                Ok((count.candidate_id, votes))
            })
            .collect()
    }

    async fn insert_voter(&self, voter: NewVoter) -> StoreResult<Voter> {
        let id = self.insert(&voter).await?;
        Ok(Voter { id, voter })
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> StoreResult<Candidate> {
        let id = self.insert(&candidate).await?;
        Ok(Candidate { id, candidate })
    }

    async fn insert_election(&self, election: NewElection) -> StoreResult<Election> {
        let id = self.insert(&election).await?;
        Ok(Election { id, election })
    }

    async fn insert_vote(&self, vote: NewVote) -> StoreResult<Vote> {
        let id = self.insert(&vote).await?;
        Ok(Vote { id, vote })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
