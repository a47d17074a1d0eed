//! Data types, split by where they live.
//!
//! - `db`: entities as persisted by the entity store.
//! - `api`: request and response bodies.
//! - `common`: types shared by both.
//! - `mongodb`: MongoDB plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
