use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Id;

pub const MIN_CANDIDATE_AGE: u8 = 18;
pub const MAX_CANDIDATE_AGE: u8 = 120;
pub const MAX_BIO_LENGTH: usize = 500;

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub party: String,
    /// Foreign Key election ID.
    pub election_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl CandidateCore {
    /// Create a new candidate standing in the given election.
    pub fn new(
        name: &str,
        party: &str,
        election_id: Id,
        age: Option<u8>,
        bio: Option<&str>,
    ) -> Result<Self> {
        let name = name.trim();
        let party = party.trim();
        if name.is_empty() || party.is_empty() {
            return Err(Error::InvalidInput(
                "Candidate name and party are required".to_string(),
            ));
        }
        if let Some(age) = age {
            if !(MIN_CANDIDATE_AGE..=MAX_CANDIDATE_AGE).contains(&age) {
                return Err(Error::InvalidInput(format!(
                    "Candidate age must be between {MIN_CANDIDATE_AGE} and {MAX_CANDIDATE_AGE}"
                )));
            }
        }
        let bio = bio.map(str::trim).filter(|bio| !bio.is_empty());
        if bio.map_or(false, |bio| bio.chars().count() > MAX_BIO_LENGTH) {
            return Err(Error::InvalidInput(format!(
                "Candidate bio must be at most {MAX_BIO_LENGTH} characters"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            party: party.to_string(),
            election_id,
            age,
            bio: bio.map(ToString::to_string),
        })
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
