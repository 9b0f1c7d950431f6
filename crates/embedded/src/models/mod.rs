//! Domain models for embedded messaging

mod identity;
mod message;
mod session;

pub use identity::{Identity, is_email};
pub use message::{EmbeddedMessage, EmbeddedMessageBuilder, EmbeddedMetadata, MessageId};
pub use session::{EmbeddedImpression, EmbeddedSession};
