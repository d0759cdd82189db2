//! Player hands.
//!
//! - `Player`: hand, played cards, and won prompts for one participant
//! - `HandStore`: all players of a session, dealing from the response pool
//! - `Standing`: a leaderboard row

pub mod store;

pub use store::{HandStore, Player, Standing, Submitted};
