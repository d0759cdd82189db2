//! Sessions: the entry point for host applications.
//!
//! ## Key Types
//!
//! - `GameSession`: one game with its own players, pools and turn state
//! - `SessionState`: a serializable snapshot of a session
//! - `History` / `SessionEvent`: what happened, in order
//! - `SharedSession` / `SessionRegistry`: sessions shared across threads

pub mod game;
pub mod history;
pub mod snapshot;
pub mod shared;

pub use game::GameSession;
pub use history::{EventRecord, History, SessionEvent};
pub use snapshot::SessionState;
pub use shared::{SessionRegistry, SharedSession};
