pub mod error;
pub mod visit;

pub use error::{ErrorBody, ErrorCode};
pub use visit::{PARTITION_KEY, Visit, VisitEntity, VisitRequest};
