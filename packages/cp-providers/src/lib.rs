pub mod object;
pub mod realtime;

mod error;

pub use error::{Error, Result};
