//! Local implementations of the letterpress gateways.
//!
//! - [`Database`]: newsletters, subscribers and the send log in one redb file.
//! - [`LocalMediaStore`]: uploaded media written under a directory.
//! - [`OutboxMailer`]: outgoing mail written as JSON files for a relay to pick up.

pub mod database;
pub mod media;
pub mod outbox;

pub use database::Database;
pub use media::LocalMediaStore;
pub use outbox::{OutboxMailer, OutboxMessage};
