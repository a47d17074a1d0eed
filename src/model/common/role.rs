use serde::{Deserialize, Serialize};

/// The role a user acts with, as vouched for by the authentication token.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An ordinary voter, who may only cast their own ballot.
    #[default]
    Voter,
    /// An election administrator.
    Admin,
}
