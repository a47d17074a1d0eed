use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{Constraint, StoreError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed identifiers, or an entity that breaks its own invariants.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Election not found: {0}")]
    ElectionNotFound(String),
    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),
    #[error("Voter not found: {0}")]
    VoterNotFound(String),
    #[error("Election has not started yet")]
    ElectionNotStarted,
    #[error("Election has ended")]
    ElectionEnded,
    #[error("Voter has already voted in this election")]
    DuplicateVote,
    /// A uniqueness violation other than a duplicate vote.
    #[error("Conflict: {0}")]
    Conflict(Constraint),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The entity store failed. Safe to retry.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(StoreError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}

impl Error {
    /// Stable machine-readable code for this kind of error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ElectionNotFound(_) => "ELECTION_NOT_FOUND",
            Self::CandidateNotFound(_) => "CANDIDATE_NOT_FOUND",
            Self::VoterNotFound(_) => "VOTER_NOT_FOUND",
            Self::ElectionNotStarted => "ELECTION_NOT_STARTED",
            Self::ElectionEnded => "ELECTION_ENDED",
            Self::DuplicateVote => "DUPLICATE_VOTE",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) | Self::Jwt(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Argon2(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidInput(_)
            | Self::ElectionNotStarted
            | Self::ElectionEnded
            | Self::DuplicateVote => Status::BadRequest,
            Self::ElectionNotFound(_) | Self::CandidateNotFound(_) | Self::VoterNotFound(_) => {
                Status::NotFound
            }
            Self::Conflict(_) => Status::Conflict,
            Self::Unauthorized(_) | Self::Jwt(_) => Status::Unauthorized,
            Self::Forbidden(_) => Status::Forbidden,
            Self::StoreUnavailable(_) | Self::Argon2(_) => Status::InternalServerError,
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(Constraint::OneVotePerElection) => Self::DuplicateVote,
            StoreError::Conflict(constraint) => Self::Conflict(constraint),
            err => Self::StoreUnavailable(err),
        }
    }
}

/// The JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        // Don't leak internals in the message.
        let message = match self {
            Self::StoreUnavailable(_) | Self::Argon2(_) => "Internal server error".to_string(),
            Self::Jwt(_) => "Invalid token".to_string(),
            ref err => err.to_string(),
        };
        (status, Json(ErrorBody::new(self.code(), message))).respond_to(req)
    }
}
