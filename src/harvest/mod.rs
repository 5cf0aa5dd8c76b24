//! The incremental feed-harvesting loop and the state it accumulates.
//!
//! ```text
//! scroll → rendered items → signature → seen? ─yes→ duplicate
//!                                          └no→ extract → complete? → in window? → accepted
//! ```
//!
//! - [`HarvestState`]: accepted records, seen signatures and counters
//! - [`Harvester`]: the loop and its stop conditions
//! - [`Interrupt`]: stop requests from signal handlers
//! - [`dates`]: relative date phrases to instants

mod config;
mod controller;
pub mod dates;
pub mod interrupt;
mod state;

pub use config::HarvestConfig;
pub use controller::{Harvester, StopReason};
pub use interrupt::{listen_for_signals, Interrupt};
pub use state::{lock_state, HarvestState, HarvestSummary, Outcome, SharedState};
