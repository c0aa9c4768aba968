//! Concrete implementations of the [`ports`](crate::ports) traits.
//!
//! | Adapter | Structured | Procedural | Raw | Message log | Directory |
//! |---|---|---|---|---|---|
//! | [`PgBackend`] | yes | yes | yes | yes | yes |
//! | [`RestBackend`] | yes | yes | no | no | no |
//! | [`MemoryBackend`] | yes | yes | fails | yes | yes |

mod memory;
mod postgres;
mod rest;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;
pub use rest::RestBackend;
