mod caller;
mod stats;
mod timeout;

pub use caller::{CallOptions, CallerError, ResilientCaller};
pub use stats::CallStats;
pub use timeout::{GLOBAL_DEFAULT_TIMEOUT_SECS, NO_RETRY_TIMEOUT_SECS, TimeoutPolicy};
