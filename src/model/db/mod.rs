//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//!
//! Each entity comes in two flavours: `NewX`, which has not been stored yet,
//! and `X`, which carries the unique ID assigned by the store.
//!
//! `VoterCore::register`, `CandidateCore::new` and `ElectionCore::new` are the
//! creation paths for the separate administration service that manages these
//! entities; this server only reads them.

pub mod candidate;
pub mod election;
pub mod vote;
pub mod voter;
