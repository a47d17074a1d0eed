use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Id;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Voting opens at this instant.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Voting closes after this instant. Always strictly after `start_time`.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Legacy flag kept so old documents still deserialize.
    /// Never used to decide anything; see [`crate::model::common::election::status`].
    #[serde(default)]
    pub is_active: bool,
}

impl ElectionCore {
    /// Create a new election, checking that the window is well-formed.
    pub fn new(
        title: &str,
        description: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self> {
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Election title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::InvalidInput(format!(
                "Election title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::InvalidInput(format!(
                "Election description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
        if end_time <= start_time {
            return Err(Error::InvalidInput(
                "End date must be after start date".to_string(),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            start_time,
            end_time,
            is_active: false,
        })
    }
}

/// An election without an ID.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::Duration;

    use super::*;

    impl ElectionCore {
        pub fn example_between(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
            Self {
                title: "Student Council".to_string(),
                description: "Annual student council election".to_string(),
                start_time,
                end_time,
                is_active: false,
            }
        }

        /// An election that is open right now.
        pub fn current_example() -> Self {
            let now = Utc::now();
            Self::example_between(now - Duration::days(1), now + Duration::days(1))
        }

        /// An election that opens tomorrow.
        pub fn future_example() -> Self {
            let now = Utc::now();
            Self::example_between(now + Duration::days(1), now + Duration::days(2))
        }

        /// An election that closed yesterday.
        pub fn past_example() -> Self {
            let now = Utc::now();
            Self::example_between(now - Duration::days(2), now - Duration::days(1))
        }
    }
}
