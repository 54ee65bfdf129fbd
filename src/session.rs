//! Conversation orchestrator: one `ChatSession` per connection.
//!
//! The session owns the active mode, the per-mode message logs, the single
//! confirmation slot, and the three mode handlers. Every user event arrives
//! as one dispatch and returns the server messages to push; state transitions
//! only happen on these discrete, non-overlapping events.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::classify::{classify, Classified};
use crate::domain::{ChatMessage, DraftQuestion, Mode, QuizConfig, Sender};
use crate::error::ChatError;
use crate::handlers::{
  AssistantHandler, Capability, ConfirmAction, Effect, HandlerOutcome, ModeHandler,
  QuestionBankHandler, QuizHandler,
};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

pub struct ChatSession {
  state: Arc<AppState>,
  current_mode: Mode,
  logs: HashMap<Mode, Vec<ChatMessage>>,
  pending_confirm: Option<ConfirmAction>,
  assistant: AssistantHandler,
  qb: QuestionBankHandler,
  quiz: QuizHandler,
}

impl ChatSession {
  pub fn new(state: Arc<AppState>) -> Self {
    Self::with_mode(state, Mode::Assistant)
  }

  pub fn with_mode(state: Arc<AppState>, initial_mode: Mode) -> Self {
    let assistant = AssistantHandler::new(state.prompts.edit_wrapper_template.clone());
    Self {
      state,
      current_mode: initial_mode,
      logs: Mode::ALL.iter().map(|m| (*m, Vec::new())).collect(),
      pending_confirm: None,
      assistant,
      qb: QuestionBankHandler::new(),
      quiz: QuizHandler::new(),
    }
  }

  pub fn current_mode(&self) -> Mode {
    self.current_mode
  }

  /// Single dispatch point for everything the client can ask for.
  pub async fn handle(&mut self, msg: ClientWsMessage) -> Vec<ServerWsMessage> {
    match msg {
      ClientWsMessage::Ping => vec![ServerWsMessage::Pong],
      ClientWsMessage::Send { text } => self.send(&text).await,
      ClientWsMessage::SwitchMode { mode } => self.switch_mode(mode),
      ClientWsMessage::Confirm => self.confirm().await,
      ClientWsMessage::History => vec![self.history()],
      ClientWsMessage::ClearHistory => self.clear_history(),
      ClientWsMessage::QuizSelectCourse { courseid } => {
        self.quiz.select_course(courseid);
        Vec::new()
      }
      ClientWsMessage::QuizSelectSection { sectionid } => {
        self.quiz.select_section(sectionid);
        Vec::new()
      }
      ClientWsMessage::QuizSetFiles { fileids } => {
        self.quiz.set_files(fileids);
        Vec::new()
      }
      ClientWsMessage::QuizSetConfig { config } => self.quiz_set_config(config),
      ClientWsMessage::QuizGenerate { instructions } => self.quiz_generate(&instructions).await,
      ClientWsMessage::QuizUpload { questions } => self.quiz_upload(questions).await,
    }
  }

  /// Send one chat turn: record the user message, route the (possibly
  /// handler-transformed) prompt to the oracle, classify the reply, give the
  /// active handler first chance, then fall back to plain rendering.
  #[instrument(level = "info", skip(self, user_text), fields(mode = %self.current_mode, text_len = user_text.len()))]
  pub async fn send(&mut self, user_text: &str) -> Vec<ServerWsMessage> {
    let text = user_text.trim();
    if text.is_empty() {
      // Whitespace-only input: no message recorded, no call made.
      return Vec::new();
    }

    let mut out = Vec::new();
    out.push(self.record(Sender::User, text.to_string()));

    let prompt = self.active_handler().before_send(text);
    let reply = self.state.router.send(&prompt, self.current_mode).await;

    let raw = match reply {
      Ok(raw) => raw,
      Err(err) => {
        out.push(self.record(Sender::Bot, user_message(&err)));
        return out;
      }
    };
    debug!(target: "chat", preview = %crate::util::trunc_for_log(&raw, 120), "oracle reply");

    let classified = classify(&raw);
    match self.active_handler().handle_response(&classified) {
      HandlerOutcome::Handled(effects) => self.apply_effects(effects, &mut out),
      HandlerOutcome::NotHandled => {
        // Fallback rendering: plain text as-is; an unconsumed automation
        // payload (unknown type) is shown verbatim rather than dropped.
        let text = match classified {
          Classified::PlainText(t) => t,
          Classified::Automation { raw, .. } => raw,
        };
        out.push(self.record(Sender::Bot, text));
      }
    }
    out
  }

  /// No-op when the mode is unchanged; otherwise reset the outgoing handler,
  /// clear the confirmation slot, and replay the new mode's log.
  #[instrument(level = "info", skip(self), fields(from = %self.current_mode, to = %new_mode))]
  pub fn switch_mode(&mut self, new_mode: Mode) -> Vec<ServerWsMessage> {
    if new_mode == self.current_mode {
      return Vec::new();
    }

    let mut out = Vec::new();
    self.active_handler().reset();
    if self.pending_confirm.take().is_some() {
      out.push(ServerWsMessage::ConfirmCleared);
    }
    self.current_mode = new_mode;
    info!(target: "chat", mode = %new_mode, "mode switched");

    if self.active_handler().capabilities().contains(&Capability::Activate) {
      let effects = self.active_handler().on_activated();
      self.apply_effects(effects, &mut out);
    }

    out.push(self.history());
    out
  }

  /// Execute the pending confirmation action. The draft survives a failed
  /// submission so the teacher can keep editing it.
  #[instrument(level = "info", skip(self), fields(mode = %self.current_mode))]
  pub async fn confirm(&mut self) -> Vec<ServerWsMessage> {
    let mut out = Vec::new();
    let Some(action) = self.pending_confirm.clone() else {
      out.push(self.record(Sender::Bot, "No course data to confirm.".to_string()));
      return out;
    };

    match action {
      ConfirmAction::CreateCourse(draft) => {
        match self.state.platform.create_course(&draft).await {
          Ok(courseid) => {
            out.push(self.record(Sender::Bot, format!("Course created (id {courseid}).")));
            self.assistant.on_submit_settled(true);
            self.pending_confirm = None;
            out.push(ServerWsMessage::ConfirmCleared);
          }
          Err(err) => {
            out.push(self.record(Sender::Bot, user_message(&err)));
            self.assistant.on_submit_settled(false);
          }
        }
      }
    }
    out
  }

  pub fn history(&self) -> ServerWsMessage {
    ServerWsMessage::History {
      mode: self.current_mode,
      messages: self.logs.get(&self.current_mode).cloned().unwrap_or_default(),
    }
  }

  pub fn clear_history(&mut self) -> Vec<ServerWsMessage> {
    if let Some(log) = self.logs.get_mut(&self.current_mode) {
      log.clear();
    }
    vec![self.history()]
  }

  fn quiz_set_config(&mut self, config: QuizConfig) -> Vec<ServerWsMessage> {
    self.quiz.set_config(config);
    Vec::new()
  }

  async fn quiz_generate(&mut self, instructions: &str) -> Vec<ServerWsMessage> {
    let mut out = Vec::new();
    if let Err(err) = self.require_quiz_mode() {
      out.push(self.record(Sender::Bot, user_message(&err)));
      return out;
    }

    match self.quiz.generate(self.state.platform.as_ref(), instructions).await {
      Ok(count) => {
        out.push(ServerWsMessage::QuizDraft { questions: self.quiz.draft().to_vec() });
        out.push(self.record(
          Sender::Bot,
          format!("Generated {count} draft questions. Review and edit them, then upload."),
        ));
      }
      Err(err) => out.push(self.record(Sender::Bot, user_message(&err))),
    }
    out
  }

  async fn quiz_upload(&mut self, questions: Vec<DraftQuestion>) -> Vec<ServerWsMessage> {
    let mut out = Vec::new();
    if let Err(err) = self.require_quiz_mode() {
      out.push(self.record(Sender::Bot, user_message(&err)));
      return out;
    }

    match self.quiz.upload(self.state.platform.as_ref(), questions).await {
      Ok(result) => {
        out.push(self.record(Sender::Bot, result.message.clone()));
        out.push(ServerWsMessage::QuizUploaded {
          message: result.message,
          settingsurl: result.settingsurl,
          editurl: result.editurl,
        });
      }
      Err(err) => out.push(self.record(Sender::Bot, user_message(&err))),
    }
    out
  }

  fn require_quiz_mode(&self) -> Result<(), ChatError> {
    if self.current_mode == Mode::Quiz {
      Ok(())
    } else {
      Err(ChatError::Validation("Switch to quiz mode first.".into()))
    }
  }

  fn active_handler(&mut self) -> &mut dyn ModeHandler {
    match self.current_mode {
      Mode::Assistant => &mut self.assistant,
      Mode::Qb => &mut self.qb,
      Mode::Quiz => &mut self.quiz,
    }
  }

  /// Append to the active mode's log and build the echo message.
  fn record(&mut self, sender: Sender, text: String) -> ServerWsMessage {
    let msg = ChatMessage { text: text.clone(), sender, mode: self.current_mode };
    self.logs.entry(self.current_mode).or_default().push(msg);
    ServerWsMessage::Message { text, sender, mode: self.current_mode }
  }

  fn apply_effects(&mut self, effects: Vec<Effect>, out: &mut Vec<ServerWsMessage>) {
    for effect in effects {
      match effect {
        Effect::Bot(text) => out.push(self.record(Sender::Bot, text)),
        Effect::SetConfirm(action) => {
          // Exactly one pending action: a new one replaces any previous.
          self.pending_confirm = Some(action);
          out.push(ServerWsMessage::ConfirmPrompt { note: "Type for any edits...".into() });
        }
        Effect::ClearConfirm => {
          if self.pending_confirm.take().is_some() {
            out.push(ServerWsMessage::ConfirmCleared);
          }
        }
      }
    }
  }
}

/// Fixed per-variant presentation of failures (see `error.rs`).
fn user_message(err: &ChatError) -> String {
  match err {
    ChatError::Transport(_) => "Failed to connect to the server. Please try again.".to_string(),
    ChatError::Provider(m) | ChatError::Validation(m) => m.clone(),
    ChatError::MalformedPayload(m) => m.clone(),
    ChatError::Exhausted(_) => err.to_string(),
  }
}
