//! Keybridge Effects: handlers for the bridge's effect interfaces
//!
//! - [`dispatcher`]: off-thread command execution with exactly-once
//!   callback delivery and optional per-identity serialization
//! - [`preferences`]: in-memory and file-backed preference stores
//! - [`ui`]: dedicated UI-affinity executor
//! - [`codec`]: in-process implementation of the stateless codec functions

pub mod callback;
pub mod codec;
pub mod dispatcher;
pub mod keyed_lock;
pub mod preferences;
pub mod response;
pub mod ui;

pub use callback::{CallbackSlot, CommandOutcome};
pub use codec::LocalCodecEngine;
pub use dispatcher::{CommandDispatcher, KeystoreCommand, LockPolicy};
pub use keyed_lock::{KeyedLockGuard, KeyedLocks};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore};
pub use response::interpret_engine_response;
pub use ui::UiThreadExecutor;
