//! Course-draft reconciliation: turns loosely-shaped oracle params into a
//! `CourseDraft` whose `sections.len() == numsections` always holds.
//!
//! The oracle is told to return plain-string sections, but replies sometimes
//! carry objects ({"name": ...} / {"title": ...}) or a string numsections.
//! Everything here is deterministic: the same params reconcile to the same
//! draft, which is what makes the edit flow idempotent.

use serde_json::Value;

use crate::domain::CourseDraft;

const DEFAULT_CATEGORY: i64 = 1;
const SHORTNAME_MAX_CHARS: usize = 15;

/// Build a reconciled draft from the `params` object of a course payload.
pub fn reconcile(params: &Value) -> CourseDraft {
  let fullname = params
    .get("fullname")
    .and_then(Value::as_str)
    .unwrap_or_default()
    .trim()
    .to_string();

  let category = coerce_int(params.get("category")).unwrap_or(DEFAULT_CATEGORY);

  let raw_sections: Vec<String> = params
    .get("sections")
    .and_then(Value::as_array)
    .map(|arr| arr.iter().enumerate().map(|(i, v)| section_name(v, i)).collect())
    .unwrap_or_default();

  // Parse as integer; unparseable or <= 0 falls back to the section count.
  let numsections = coerce_int(params.get("numsections"))
    .filter(|n| *n > 0)
    .map(|n| n as usize)
    .unwrap_or(raw_sections.len());

  let mut sections = raw_sections;
  while sections.len() < numsections {
    sections.push(format!("Section {}", sections.len() + 1));
  }
  sections.truncate(numsections);

  let shortname = match params.get("shortname").and_then(Value::as_str).map(str::trim) {
    Some(s) if !s.is_empty() => s.to_string(),
    _ => derive_shortname(&fullname),
  };

  CourseDraft { fullname, shortname, category, numsections, sections }
}

/// Auto-generate a shortname: strip whitespace, uppercase, cap the length.
pub fn derive_shortname(fullname: &str) -> String {
  fullname
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect::<String>()
    .to_uppercase()
    .chars()
    .take(SHORTNAME_MAX_CHARS)
    .collect()
}

/// Accept integers and numeric strings ("4", "4 "); anything else is None.
fn coerce_int(v: Option<&Value>) -> Option<i64> {
  match v? {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse::<i64>().ok(),
    _ => None,
  }
}

/// Sections may be plain strings or objects carrying "name"/"title".
fn section_name(v: &Value, idx: usize) -> String {
  match v {
    Value::String(s) => s.clone(),
    Value::Object(map) => map
      .get("name")
      .or_else(|| map.get("title"))
      .and_then(Value::as_str)
      .map(str::to_string)
      .unwrap_or_else(|| format!("Section {}", idx + 1)),
    _ => format!("Section {}", idx + 1),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn pads_sections_with_placeholders() {
    let d = reconcile(&json!({
      "fullname": "Data Structures",
      "numsections": 3,
      "sections": ["Arrays", "Graphs"]
    }));
    assert_eq!(d.numsections, 3);
    assert_eq!(d.sections, vec!["Arrays", "Graphs", "Section 3"]);
  }

  #[test]
  fn truncates_extra_sections() {
    let d = reconcile(&json!({
      "fullname": "Algorithms",
      "numsections": 2,
      "sections": ["A", "B", "C", "D"]
    }));
    assert_eq!(d.sections, vec!["A", "B"]);
    assert_eq!(d.numsections, d.sections.len());
  }

  #[test]
  fn numsections_falls_back_to_section_count() {
    let d = reconcile(&json!({
      "fullname": "X",
      "numsections": "not a number",
      "sections": ["One", "Two"]
    }));
    assert_eq!(d.numsections, 2);

    let d = reconcile(&json!({ "fullname": "X", "numsections": 0 }));
    assert_eq!(d.numsections, 0);
    assert!(d.sections.is_empty());
  }

  #[test]
  fn numeric_string_numsections_is_accepted() {
    let d = reconcile(&json!({ "fullname": "X", "numsections": "4", "sections": [] }));
    assert_eq!(d.numsections, 4);
    assert_eq!(d.sections, vec!["Section 1", "Section 2", "Section 3", "Section 4"]);
  }

  #[test]
  fn object_sections_use_name_or_title() {
    let d = reconcile(&json!({
      "fullname": "X",
      "numsections": 3,
      "sections": [{"name": "Intro"}, {"title": "Advanced"}, {"weight": 3}]
    }));
    assert_eq!(d.sections, vec!["Intro", "Advanced", "Section 3"]);
  }

  #[test]
  fn shortname_derived_from_fullname() {
    let d = reconcile(&json!({ "fullname": "Data Structures and Algorithms", "numsections": 1 }));
    assert_eq!(d.shortname, "DATASTRUCTURESA");
    assert_eq!(d.shortname.chars().count(), 15);
  }

  #[test]
  fn explicit_shortname_wins() {
    let d = reconcile(&json!({ "fullname": "Data Structures", "shortname": "DS101", "numsections": 1 }));
    assert_eq!(d.shortname, "DS101");
  }

  #[test]
  fn category_coercion_defaults_to_one() {
    assert_eq!(reconcile(&json!({ "category": "7" })).category, 7);
    assert_eq!(reconcile(&json!({ "category": 3 })).category, 3);
    assert_eq!(reconcile(&json!({})).category, 1);
  }

  #[test]
  fn reconciliation_is_idempotent() {
    let params = json!({
      "fullname": "Data Structures",
      "numsections": 3,
      "sections": ["Arrays", "Graphs"]
    });
    let once = reconcile(&params);
    let again = reconcile(&params);
    assert_eq!(once, again);
    assert_eq!(once.sections.len(), once.numsections);
  }
}
