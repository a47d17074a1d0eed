mod status;

pub use status::{status, ElectionStatus};
