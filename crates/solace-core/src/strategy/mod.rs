//! The write strategy chain.
//!
//! Each strategy is one way of appending a [`Message`] to storage. They share
//! a single contract so the [`Resolver`](crate::resolver::Resolver) can try
//! them in order without knowing how any of them reaches the backend.

mod procedural;
mod raw;
mod structured;

pub use procedural::ProceduralInsert;
pub use raw::RawStatementInsert;
pub(crate) use raw::INSERT_MESSAGE_SQL;
pub use structured::StructuredInsert;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BackendError, WriteFailure};
use crate::message::{Message, ValidatedMessage};
use crate::ports::{decode_row, ProceduralApi, RawStatementApi, Row, StructuredDataApi};

/// One interchangeable method of performing the message write.
#[async_trait]
pub trait WriteStrategy: Send + Sync + 'static {
    /// Stable name used in attempt logs.
    fn name(&self) -> &'static str;

    /// Performs the write and returns the persisted row.
    async fn attempt(&self, message: &ValidatedMessage) -> Result<Message, WriteFailure>;
}

/// The standard chain: structured insert, then procedural, then raw statement.
pub fn standard_chain(
    structured: Arc<dyn StructuredDataApi>,
    procedural: Arc<dyn ProceduralApi>,
    raw: Arc<dyn RawStatementApi>,
) -> Vec<Arc<dyn WriteStrategy>> {
    vec![
        Arc::new(StructuredInsert::new(structured)),
        Arc::new(ProceduralInsert::new(procedural)),
        Arc::new(RawStatementInsert::new(raw)),
    ]
}

fn backend_failure(strategy: &'static str) -> impl Fn(BackendError) -> WriteFailure {
    move |e| WriteFailure::new(strategy, e.to_string())
}

/// Decodes the first returned row, failing if there is none.
fn first_message(strategy: &'static str, rows: Vec<Row>) -> Result<Message, WriteFailure> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| WriteFailure::new(strategy, "no row returned"))?;
    decode_row(row).map_err(backend_failure(strategy))
}
