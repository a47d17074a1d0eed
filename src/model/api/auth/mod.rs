//! The boundary with the external authentication collaborator.
//!
//! Tokens are issued elsewhere; this module only checks that a bearer token
//! was signed with our secret and extracts the identity it vouches for.

mod token;

pub use token::{AdminRole, AnyRole, AuthToken, Claims, RoleRequirement, TokenUser};
