//! Error taxonomy shared by the chat engine and the outbound clients.
//!
//! Every failure the session can observe maps onto one of these variants,
//! and each variant has a fixed user-facing presentation:
//!   - Transport  -> generic bot-visible failure message, never retried
//!   - Provider   -> the provider's message passed through verbatim
//!   - Validation -> specific, actionable bot message; no state change
//!   - MalformedPayload -> degrade to rendering the raw payload
//!   - Exhausted  -> bounded-retry helper ran out of attempts

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
  /// Network/timeout/non-JSON envelope reaching the oracle or a collaborator.
  #[error("transport failure: {0}")]
  Transport(String),

  /// The oracle or a collaborator reported an explicit error message.
  #[error("{0}")]
  Provider(String),

  /// A local precondition failed (empty input, missing selection, ...).
  #[error("{0}")]
  Validation(String),

  /// JSON parsed but lacks the expected shape for its discriminant.
  #[error("malformed automation payload: {0}")]
  MalformedPayload(String),

  /// A bounded retry loop hit its cap without succeeding.
  #[error("retries exhausted: {0}")]
  Exhausted(String),
}
