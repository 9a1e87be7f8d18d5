mod cache;
mod session;
mod user;

pub use cache::DiscoveryCache;
pub use session::SessionStore;
pub use user::UserMemory;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors shared by the file-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write store at {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store at {path:?} contains invalid data: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode payload for {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
