//! Assistant mode: the course-draft state machine.
//!
//! Idle -> (course payload) -> AwaitingConfirmation -> (confirm) ->
//! Submitting -> Idle on success, back to AwaitingConfirmation on failure.
//! While awaiting, every user message is an edit instruction: `before_send`
//! wraps it with the serialized draft plus strict edit rules and expects
//! another course_creation payload back.

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::classify::{
  Classified, TYPE_COURSE_CREATION, TYPE_COURSE_MISSING_PARAMS, TYPE_COURSE_UPDATE,
};
use crate::domain::CourseDraft;
use crate::draft::reconcile;
use crate::handlers::{Capability, ConfirmAction, Effect, HandlerOutcome, ModeHandler};
use crate::util::fill_template;

pub struct AssistantHandler {
  pending: Option<CourseDraft>,
  awaiting_confirmation: bool,
  edit_wrapper: String,
}

impl AssistantHandler {
  pub fn new(edit_wrapper: String) -> Self {
    Self { pending: None, awaiting_confirmation: false, edit_wrapper }
  }

  pub fn pending_draft(&self) -> Option<&CourseDraft> {
    self.pending.as_ref()
  }

  pub fn awaiting_confirmation(&self) -> bool {
    self.awaiting_confirmation
  }

  /// Called by the session after the confirmed submission settles.
  /// Success clears the draft; failure retains it for further edits.
  pub fn on_submit_settled(&mut self, success: bool) {
    if success {
      self.reset();
    }
  }

  fn preview(draft: &CourseDraft) -> String {
    format!(
      "Course preview\nFull name: {}\nShort name: {}\nCategory: {}\nSections: {}\n\nType for any edits, or confirm to create.",
      draft.fullname,
      draft.shortname,
      draft.category,
      draft.sections.join(", ")
    )
  }
}

impl ModeHandler for AssistantHandler {
  /// Turns a user edit into a constrained follow-up prompt while a draft is
  /// awaiting confirmation; otherwise passes the text through unchanged.
  fn before_send(&mut self, text: &str) -> String {
    match (&self.pending, self.awaiting_confirmation) {
      (Some(draft), true) => {
        let previous = serde_json::to_string(draft).unwrap_or_else(|_| "{}".into());
        fill_template(
          &self.edit_wrapper,
          &[("previous_params", previous.as_str()), ("user_edit", text)],
        )
      }
      _ => text.to_string(),
    }
  }

  #[instrument(level = "debug", skip(self, classified))]
  fn handle_response(&mut self, classified: &Classified) -> HandlerOutcome {
    let Classified::Automation { payload, .. } = classified else {
      return HandlerOutcome::NotHandled;
    };

    match payload.kind.as_str() {
      TYPE_COURSE_MISSING_PARAMS => {
        let missing: Vec<String> = payload
          .body
          .get("missing")
          .and_then(Value::as_array)
          .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
          .unwrap_or_default();

        info!(target: "chat", missing = ?missing, "course payload missing parameters");
        self.pending = None;
        self.awaiting_confirmation = false;
        HandlerOutcome::Handled(vec![
          Effect::Bot(format!("Missing parameters: {}", missing.join(", "))),
          Effect::ClearConfirm,
        ])
      }

      TYPE_COURSE_CREATION | TYPE_COURSE_UPDATE => {
        // A payload of this type without a params object is malformed;
        // degrade to the shell's raw rendering rather than invent a draft.
        let Some(params) = payload.body.get("params").filter(|p| p.is_object()) else {
          warn!(target: "chat", kind = %payload.kind, "course payload without params object");
          return HandlerOutcome::NotHandled;
        };

        let draft = reconcile(params);
        info!(
          target: "chat",
          fullname = %draft.fullname,
          shortname = %draft.shortname,
          sections = draft.numsections,
          "course draft awaiting confirmation"
        );

        let preview = Self::preview(&draft);
        let action = ConfirmAction::CreateCourse(draft.clone());
        self.pending = Some(draft);
        self.awaiting_confirmation = true;
        HandlerOutcome::Handled(vec![Effect::Bot(preview), Effect::SetConfirm(action)])
      }

      // Unknown automation type: the shell renders the raw payload.
      _ => HandlerOutcome::NotHandled,
    }
  }

  fn reset(&mut self) {
    self.pending = None;
    self.awaiting_confirmation = false;
  }

  fn capabilities(&self) -> &'static [Capability] {
    &[]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::classify::classify;
  use crate::config::Prompts;

  fn handler() -> AssistantHandler {
    AssistantHandler::new(Prompts::default().edit_wrapper_template)
  }

  fn automation(raw: &str) -> Classified {
    let c = classify(raw);
    assert!(matches!(c, Classified::Automation { .. }), "fixture must classify as automation");
    c
  }

  #[test]
  fn course_creation_arms_confirmation() {
    let mut h = handler();
    let c = automation(
      r#"{"type":"course_creation","params":{"fullname":"Data Structures","numsections":3,"sections":["Arrays","Graphs"]}}"#,
    );
    let HandlerOutcome::Handled(effects) = h.handle_response(&c) else {
      panic!("expected handled");
    };

    assert!(h.awaiting_confirmation());
    let draft = h.pending_draft().expect("draft stored");
    assert_eq!(draft.sections, vec!["Arrays", "Graphs", "Section 3"]);
    assert!(matches!(effects[1], Effect::SetConfirm(ConfirmAction::CreateCourse(_))));
    match &effects[0] {
      Effect::Bot(text) => assert!(text.contains("Data Structures")),
      other => panic!("expected preview message, got {other:?}"),
    }
  }

  #[test]
  fn missing_params_clears_draft_and_lists_names() {
    let mut h = handler();
    let c = automation(
      r#"{"type":"course_creation","params":{"fullname":"X","numsections":1,"sections":["A"]}}"#,
    );
    h.handle_response(&c);
    assert!(h.awaiting_confirmation());

    let m = automation(r#"{"type":"course_creation_missing_params","missing":["fullname"]}"#);
    let HandlerOutcome::Handled(effects) = h.handle_response(&m) else {
      panic!("expected handled");
    };
    assert!(h.pending_draft().is_none());
    assert!(!h.awaiting_confirmation());
    match &effects[0] {
      Effect::Bot(text) => assert_eq!(text, "Missing parameters: fullname"),
      other => panic!("expected missing-params message, got {other:?}"),
    }
    assert!(matches!(effects[1], Effect::ClearConfirm));
  }

  #[test]
  fn edit_wraps_prompt_with_serialized_draft() {
    let mut h = handler();
    let c = automation(
      r#"{"type":"course_creation","params":{"fullname":"X","shortname":"X1","numsections":2,"sections":["One","Two"]}}"#,
    );
    h.handle_response(&c);

    let wrapped = h.before_send("rename the second section to Hash Maps");
    assert!(wrapped.contains("PREVIOUS_PARAMS:"));
    assert!(wrapped.contains(r#""sections":["One","Two"]"#));
    assert!(wrapped.contains("USER_EDIT:\nrename the second section to Hash Maps"));
  }

  #[test]
  fn before_send_passes_through_when_idle() {
    let mut h = handler();
    assert_eq!(h.before_send("create a course"), "create a course");
  }

  #[test]
  fn unknown_type_is_not_handled() {
    let mut h = handler();
    let c = automation(r#"{"type":"enrol_students","params":{}}"#);
    assert!(matches!(h.handle_response(&c), HandlerOutcome::NotHandled));
  }

  #[test]
  fn course_payload_without_params_is_not_handled() {
    let mut h = handler();
    let c = automation(r#"{"type":"course_creation"}"#);
    assert!(matches!(h.handle_response(&c), HandlerOutcome::NotHandled));
    assert!(h.pending_draft().is_none());
  }

  #[test]
  fn failed_submit_retains_draft_for_further_edits() {
    let mut h = handler();
    let c = automation(
      r#"{"type":"course_creation","params":{"fullname":"X","numsections":1,"sections":["A"]}}"#,
    );
    h.handle_response(&c);

    h.on_submit_settled(false);
    assert!(h.pending_draft().is_some());
    assert!(h.awaiting_confirmation());

    h.on_submit_settled(true);
    assert!(h.pending_draft().is_none());
    assert!(!h.awaiting_confirmation());
  }
}
