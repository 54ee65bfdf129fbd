//! Question-bank mode: stateless passthrough.
//!
//! The qb persona has no draft workflow yet; prompts go out unchanged and
//! every reply falls through to the shell's plain-text rendering.

use crate::classify::Classified;
use crate::handlers::{HandlerOutcome, ModeHandler};

#[derive(Default)]
pub struct QuestionBankHandler;

impl QuestionBankHandler {
  pub fn new() -> Self {
    Self
  }
}

impl ModeHandler for QuestionBankHandler {
  fn before_send(&mut self, text: &str) -> String {
    text.to_string()
  }

  fn handle_response(&mut self, _classified: &Classified) -> HandlerOutcome {
    HandlerOutcome::NotHandled
  }

  fn reset(&mut self) {}
}
