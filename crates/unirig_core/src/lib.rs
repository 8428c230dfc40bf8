//! UniRig API Core Types
//!
//! Pure types shared by every crate in the workspace. Nothing here
//! performs I/O; all types serialize to the engine's JSON wire format.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod time;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use id::{NodeId, RequestId};
pub use time::Timestamp;
