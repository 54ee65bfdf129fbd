//! Mode handlers: one polymorphic unit per conversational persona.
//!
//! Each handler owns only its own draft state and speaks to the session
//! through `Effect`s; it never touches another mode's log or the socket.
//! Optional hooks (activation, quiz generation) are declared through
//! `capabilities()` instead of duck-typed method probing.

use crate::classify::Classified;
use crate::domain::CourseDraft;

pub mod assistant;
pub mod qb;
pub mod quiz;

pub use assistant::AssistantHandler;
pub use qb::QuestionBankHandler;
pub use quiz::QuizHandler;

/// Mode-specific extra actions a handler may support beyond the required set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
  /// Wants `on_activated` when its mode becomes current.
  Activate,
  /// Supports the quiz generate/upload workflow.
  Generate,
}

/// Instructions a handler hands back to the session, which applies them to
/// the shared log and the single confirmation slot.
#[derive(Clone, Debug)]
pub enum Effect {
  /// Append a bot message to the active mode's log.
  Bot(String),
  /// Arm the confirmation slot (replaces any pending action).
  SetConfirm(ConfirmAction),
  /// Clear the confirmation slot.
  ClearConfirm,
}

/// The deferred action behind the Confirm button.
#[derive(Clone, Debug)]
pub enum ConfirmAction {
  CreateCourse(CourseDraft),
}

#[derive(Debug)]
pub enum HandlerOutcome {
  /// The handler consumed the response; the shell takes no further action.
  Handled(Vec<Effect>),
  /// Let the shell apply its fallback rendering.
  NotHandled,
}

pub trait ModeHandler {
  /// Transform the outgoing prompt (e.g. the assistant's edit wrapper).
  fn before_send(&mut self, text: &str) -> String;

  /// First chance to process a classified oracle reply.
  fn handle_response(&mut self, classified: &Classified) -> HandlerOutcome;

  /// Drop all mode-local draft state. Called on mode switch.
  fn reset(&mut self);

  fn capabilities(&self) -> &'static [Capability] {
    &[]
  }

  /// Activation hook; only called when `Capability::Activate` is declared.
  fn on_activated(&mut self) -> Vec<Effect> {
    Vec::new()
  }
}
