pub mod chunks;
pub mod cleanup;
pub mod db;
pub mod images;
pub mod models;
pub mod schema;
pub mod sessions;
pub mod tokens;
pub mod usage;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
