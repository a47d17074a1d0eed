//! Casting and counting ballots.

mod cast;
mod listing;
mod tally;

pub use cast::{cast_ballot, cast_vote, Ballot};
pub use listing::list_votes;
pub use tally::{percentage, results};
