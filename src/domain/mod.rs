pub mod error;
pub mod profile;
pub mod table;
pub mod upload;
