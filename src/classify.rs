//! Response classification: structured automation payload vs plain text.
//!
//! The oracle answers with free text. It is an automation payload iff the
//! whole reply parses as a JSON object carrying a non-null "type" key.
//! No partial-JSON recovery: a reply with embedded JSON is still plain text.

use serde_json::Value;

/// Discriminants the assistant handler acts on. Anything else is "unknown"
/// and rendered verbatim by the shell.
pub const TYPE_COURSE_CREATION: &str = "course_creation";
pub const TYPE_COURSE_UPDATE: &str = "course_update";
pub const TYPE_COURSE_MISSING_PARAMS: &str = "course_creation_missing_params";

/// Structured instruction extracted from an oracle reply.
#[derive(Clone, Debug)]
pub struct AutomationPayload {
  /// The "type" discriminant. Non-string discriminants are kept as their
  /// JSON rendering so unknown payloads can still be shown verbatim.
  pub kind: String,
  /// The full parsed object, for type-specific field extraction.
  pub body: Value,
}

#[derive(Clone, Debug)]
pub enum Classified {
  Automation { raw: String, payload: AutomationPayload },
  PlainText(String),
}

/// Total over all string inputs: exactly one of the two variants.
pub fn classify(raw: &str) -> Classified {
  if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
    if let Some(t) = map.get("type").filter(|v| !v.is_null()) {
      let kind = t.as_str().map(str::to_string).unwrap_or_else(|| t.to_string());
      return Classified::Automation {
        raw: raw.to_string(),
        payload: AutomationPayload { kind, body: Value::Object(map) },
      };
    }
  }
  Classified::PlainText(raw.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kind_of(raw: &str) -> Option<String> {
    match classify(raw) {
      Classified::Automation { payload, .. } => Some(payload.kind),
      Classified::PlainText(_) => None,
    }
  }

  #[test]
  fn object_with_type_is_automation() {
    assert_eq!(kind_of(r#"{"type":"course_creation","params":{}}"#).as_deref(), Some("course_creation"));
  }

  #[test]
  fn plain_text_stays_plain() {
    assert!(kind_of("Sure! Here is what I can do for you.").is_none());
  }

  #[test]
  fn embedded_json_is_not_recovered() {
    assert!(kind_of(r#"Here you go: {"type":"course_creation"}"#).is_none());
  }

  #[test]
  fn object_without_type_is_plain() {
    assert!(kind_of(r#"{"reply":"hello"}"#).is_none());
  }

  #[test]
  fn null_type_is_plain() {
    assert!(kind_of(r#"{"type":null}"#).is_none());
  }

  #[test]
  fn non_object_json_is_plain() {
    assert!(kind_of(r#"["type","course_creation"]"#).is_none());
    assert!(kind_of("42").is_none());
  }

  #[test]
  fn non_string_type_keeps_json_rendering() {
    assert_eq!(kind_of(r#"{"type":7}"#).as_deref(), Some("7"));
  }

  #[test]
  fn plain_text_preserves_original_string() {
    let raw = "line one\nline two";
    match classify(raw) {
      Classified::PlainText(t) => assert_eq!(t, raw),
      _ => panic!("expected plain text"),
    }
  }
}
