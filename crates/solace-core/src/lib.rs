//! Messaging core for counseling sessions.
//!
//! A send goes through [`resolver::Resolver`], which validates the request and
//! then tries an ordered chain of [`strategy::WriteStrategy`] implementations
//! until one stores the message. Reads go through
//! [`read_model::ConversationReader`] and [`receipts::ReadReceipts`]. All
//! storage access is behind the traits in [`ports`], with Postgres, HTTP and
//! in-memory adapters in [`backend`].

pub mod backend;
pub mod cancel;
pub mod error;
pub mod message;
pub mod ports;
pub mod read_model;
pub mod receipts;
pub mod resolver;
pub mod strategy;
pub mod validate;

#[cfg(test)]
mod testing;

pub use cancel::{cancellation, CancelGuard, CancelSignal};
pub use error::{BackendError, ReadError, SendError, ValidationFailure, WriteFailure};
pub use message::{EnrichedMessage, Message, SendMessage, SortOrder, ValidatedMessage};
pub use read_model::ConversationReader;
pub use receipts::ReadReceipts;
pub use resolver::{AttemptLog, AttemptStep, Resolver, SendOutcome, WriteResult};
pub use validate::SelfAddressPolicy;
