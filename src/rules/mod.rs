//! Game rules: turn state, the round controller, and win conditions.
//!
//! ## Key Types
//!
//! - `Phase` / `RoundState`: where a session is in its turn cycle
//! - `Table`: the hands, pools and RNG the rules operate on
//! - `RoundController`: validated phase transitions
//! - `GameResult`: how a session ended

pub mod round;
pub mod table;
pub mod win;
pub mod controller;

pub use round::{Phase, RoundState, Submission};
pub use table::Table;
pub use win::{evaluate, GameResult};
pub use controller::RoundController;
