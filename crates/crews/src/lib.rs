//! Self-organizing voice crews.
//!
//! Joining a category's creator channel turns that channel into a named crew and
//! provisions a fresh creator in its place; crews are reclaimed once empty. Crew
//! members can broadcast an invite to an allowed text channel, replacing their
//! previous invite instead of stacking a new one.

pub mod api;
mod command;
pub mod config;
pub mod dispatch;
mod engine;
pub mod error;
pub mod invite_ledger;
pub mod name_pool;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ChannelEdit, ChatApi};
pub use command::InviteCommand;
pub use config::{CategoryOverrides, CategorySettings, CrewsConfig};
pub use dispatch::{Dispatcher, TaskFailure};
pub use engine::{CrewEngine, CrewState};
pub use error::{AllowNotFound, CrewError};
pub use invite_ledger::{InviteLedger, RecordOutcome};
pub use name_pool::NamePool;
pub use registry::{CategoryPhase, ChannelRegistry};
