pub mod system;
pub mod visits;
