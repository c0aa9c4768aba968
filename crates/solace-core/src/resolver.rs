//! Drives the write strategy chain for a single send.
//!
//! The resolver validates input, then awaits strategies one at a time in a
//! fixed order until one succeeds. Strategy failures are logged and recorded
//! in the [`WriteResult`], never propagated; nothing escapes this boundary
//! except the returned value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn, Instrument};

use crate::cancel::CancelSignal;
use crate::error::{SendError, ValidationFailure};
use crate::message::{Message, SendMessage};
use crate::strategy::WriteStrategy;
use crate::validate::{validate_message, SelfAddressPolicy};

/// Which step an attempt log entry describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum AttemptStep {
    Validation,
    Strategy(&'static str),
}

/// Diagnostic record of one step of a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptLog {
    pub step: AttemptStep,
    /// `None` when the step succeeded.
    pub failure: Option<String>,
    #[serde(with = "millis")]
    pub elapsed: Duration,
}

impl AttemptLog {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered(Message),
    Rejected(ValidationFailure),
    Exhausted,
    Cancelled,
}

/// Uniform result of [`Resolver::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub outcome: SendOutcome,
    pub attempts: Vec<AttemptLog>,
}

impl WriteResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, SendOutcome::Delivered(_))
    }

    pub fn message(&self) -> Option<&Message> {
        match &self.outcome {
            SendOutcome::Delivered(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Message, SendError> {
        match self.outcome {
            SendOutcome::Delivered(m) => Ok(m),
            SendOutcome::Rejected(v) => Err(SendError::Validation(v)),
            SendOutcome::Exhausted => Err(SendError::AllStrategiesExhausted {
                attempts: self.attempts,
            }),
            SendOutcome::Cancelled => Err(SendError::Cancelled {
                attempts: self.attempts,
            }),
        }
    }
}

/// Resilient message writer over an injected strategy chain.
pub struct Resolver {
    chain: Vec<Arc<dyn WriteStrategy>>,
    policy: SelfAddressPolicy,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.chain.iter().map(|s| s.name()).collect();
        f.debug_struct("Resolver")
            .field("chain", &names)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Resolver {
    pub fn new(chain: Vec<Arc<dyn WriteStrategy>>) -> Self {
        Self {
            chain,
            policy: SelfAddressPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelfAddressPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of strategies, and therefore the maximum number of write attempts.
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub async fn send(&self, input: SendMessage) -> WriteResult {
        self.send_with_cancel(input, CancelSignal::never()).await
    }

    pub async fn send_with_cancel(&self, input: SendMessage, cancel: CancelSignal) -> WriteResult {
        let span = tracing::info_span!("send_message", session_id = %input.session_id);
        self.run(input, cancel).instrument(span).await
    }

    async fn run(&self, input: SendMessage, cancel: CancelSignal) -> WriteResult {
        let started = Instant::now();
        let message = match validate_message(&input, self.policy) {
            Ok(m) => m,
            Err(failure) => {
                info!(reason = %failure, "send rejected by validation");
                return WriteResult {
                    attempts: vec![AttemptLog {
                        step: AttemptStep::Validation,
                        failure: Some(failure.to_string()),
                        elapsed: started.elapsed(),
                    }],
                    outcome: SendOutcome::Rejected(failure),
                };
            }
        };

        let mut attempts = Vec::with_capacity(self.chain.len());
        for strategy in &self.chain {
            if cancel.is_cancelled() {
                warn!(attempted = attempts.len(), "send cancelled before next strategy");
                return WriteResult {
                    outcome: SendOutcome::Cancelled,
                    attempts,
                };
            }

            let name = strategy.name();
            let started = Instant::now();
            let result = strategy.attempt(&message).await;
            let elapsed = started.elapsed();

            match result {
                Ok(stored) => {
                    debug!(
                        strategy = name,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "write strategy succeeded"
                    );
                    attempts.push(AttemptLog {
                        step: AttemptStep::Strategy(name),
                        failure: None,
                        elapsed,
                    });
                    info!(
                        message_id = %stored.id,
                        strategy = name,
                        attempts = attempts.len(),
                        "message delivered"
                    );
                    return WriteResult {
                        outcome: SendOutcome::Delivered(stored),
                        attempts,
                    };
                }
                Err(failure) => {
                    warn!(
                        strategy = name,
                        elapsed_ms = elapsed.as_millis() as u64,
                        reason = %failure.reason,
                        "write strategy failed"
                    );
                    attempts.push(AttemptLog {
                        step: AttemptStep::Strategy(name),
                        failure: Some(failure.reason),
                        elapsed,
                    });
                }
            }
        }

        error!(
            attempts = attempts.len(),
            reasons = ?attempts.iter().filter_map(|a| a.failure.as_deref()).collect::<Vec<_>>(),
            "all write strategies exhausted"
        );
        WriteResult {
            outcome: SendOutcome::Exhausted,
            attempts,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
