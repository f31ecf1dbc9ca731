//! HTTP client for desktop and mobile callers of the sync service.

pub mod api;
pub mod poller;

mod error;

pub use api::{ApiClient, Credentials, RetryPolicy};
pub use error::{Error, Result};
pub use poller::{ChunkPage, ChunkPoller, RemoteChunk};
