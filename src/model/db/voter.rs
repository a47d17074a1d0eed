use std::ops::{Deref, DerefMut};

use argon2::Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{common::role::Role, mongodb::Id};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Externally issued voter number. Unique.
    pub voter_id: String,
    /// Display name.
    pub name: String,
    /// Contact email, trimmed and lower-cased. Unique.
    pub email: String,
    /// Argon2 encoded hash of the voter's password.
    pub credential_hash: String,
    #[serde(default)]
    pub role: Role,
}

impl VoterCore {
    /// Register a new voter, hashing their password.
    ///
    /// All fields must be non-empty after trimming and the password must
    /// meet the minimum length.
    pub fn register(
        voter_id: &str,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Self> {
        let voter_id = voter_id.trim();
        let name = name.trim();
        let email = email.trim().to_lowercase();
        if voter_id.is_empty() || name.is_empty() || email.is_empty() {
            return Err(Error::InvalidInput(
                "Voter ID, name, and email are required".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let credential_hash = argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())?;

        Ok(Self {
            voter_id: voter_id.to_string(),
            name: name.to_string(),
            email,
            credential_hash,
            role,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.credential_hash, password.as_ref()).unwrap_or(false)
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterCore {
        /// A voter with a pre-computed hash, so examples stay cheap to build.
        pub fn example_numbered(n: u32) -> Self {
            Self {
                voter_id: format!("V{n}"),
                name: format!("Voter {n}"),
                email: format!("voter{n}@example.com"),
                credential_hash: "$argon2i$v=19$m=4096,t=2,p=1$VzJlNzBsa0ZUeGFCNVVucA$01vYAqN0vTeqhZEzW7q9PWmrZlXtzQ/Ns7NkCNE2mA0".to_string(),
                role: Role::Voter,
            }
        }

        pub fn example() -> Self {
            Self::example_numbered(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_normalises_and_hashes() {
        let voter = VoterCore::register(
            " V100 ",
            "  Ada Lovelace ",
            "  Ada@Example.COM ",
            "analytical",
            Role::Voter,
        )
        .unwrap();
        assert_eq!(voter.voter_id, "V100");
        assert_eq!(voter.name, "Ada Lovelace");
        assert_eq!(voter.email, "ada@example.com");
        assert_ne!(voter.credential_hash, "analytical");
        assert!(voter.verify_password("analytical"));
        assert!(!voter.verify_password("engine"));
    }

    #[test]
    fn register_rejects_short_passwords() {
        let result = VoterCore::register("V1", "Ada", "ada@example.com", "short", Role::Voter);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn register_rejects_blank_fields() {
        let result = VoterCore::register("  ", "Ada", "ada@example.com", "password1", Role::Voter);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        let result = VoterCore::register("V1", "Ada", "   ", "password1", Role::Admin);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let mut voter = VoterCore::example();
        voter.credential_hash = "garbage".to_string();
        assert!(!voter.verify_password("anything"));
    }
}
