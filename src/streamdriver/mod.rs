pub mod error;
pub mod kafka;
pub mod serialization;
