//! xrepl-editor — the replication membership editor.
//!
//! An [`EditorSession`] is opened against one replication group. It loads
//! the group (through the [`GroupCache`]) and the source cluster's table
//! catalog, lets the operator search and select eligible tables, and
//! submits the union of existing and selected tables as one membership
//! update. The resulting server task is watched by `xrepl-task`; when it
//! ends, the cached group is invalidated and failures are reported.
//!
//! # Architecture
//!
//! ```text
//! EditorSession
//!   ├── catalog snapshot + SelectionTracker + search text
//!   ├── submit() → ChangeSubmitter → ReplicationApi::update_membership
//!   │            → TaskPoller::spawn(task_id, completion)
//!   └── completion: CacheInvalidator::invalidate + ErrorReporter
//! ```

pub mod api;
pub mod cache;
pub mod error;
pub mod reporter;
pub mod session;
pub mod submitter;

#[cfg(test)]
mod mock;

pub use api::{ApiFuture, ReplicationApi};
pub use cache::{CacheInvalidator, CacheKey, EntityKind, GroupCache};
pub use error::{EditorError, EditorResult};
pub use reporter::{ChannelReporter, ErrorReporter, Notification, TracingReporter};
pub use session::EditorSession;
pub use submitter::{final_membership, ChangeSubmitter};
