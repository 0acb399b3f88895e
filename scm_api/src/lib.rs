//! Shared SCM bridge data models exchanged between the plugin and host sides.

pub mod command;
pub mod features;
pub mod handle;
pub mod messages;
pub mod provider;

pub use command::*;
pub use features::*;
pub use handle::*;
pub use messages::*;
pub use provider::*;
