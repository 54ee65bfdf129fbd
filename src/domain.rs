//! Domain models used by the backend: chat modes, messages, and quiz drafts.

use serde::{Deserialize, Serialize};

/// One of the three conversational personas. Exactly one is active per
/// session; each owns its own message log and handler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  Assistant,
  Qb,
  Quiz,
}

impl Mode {
  pub const ALL: [Mode; 3] = [Mode::Assistant, Mode::Qb, Mode::Quiz];

  pub fn as_str(&self) -> &'static str {
    match self {
      Mode::Assistant => "assistant",
      Mode::Qb => "qb",
      Mode::Quiz => "quiz",
    }
  }

  /// Lenient parse for query parameters; unrecognized values fall back to
  /// the assistant persona.
  pub fn parse_or_assistant(s: &str) -> Mode {
    match s {
      "qb" => Mode::Qb,
      "quiz" => Mode::Quiz,
      _ => Mode::Assistant,
    }
  }
}

impl std::fmt::Display for Mode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
  User,
  Bot,
}

/// Immutable chat transcript entry. Appended on every send/receive, never
/// mutated; deleted only by a full-log clear.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
  pub text: String,
  pub sender: Sender,
  pub mode: Mode,
}

/// Pending course proposal awaiting confirmation or edit.
/// Invariant: `sections.len() == numsections`, enforced at construction
/// by `draft::reconcile`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CourseDraft {
  pub fullname: String,
  pub shortname: String,
  pub category: i64,
  pub numsections: usize,
  pub sections: Vec<String>,
}

/// Quiz metadata entered by the teacher before generation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
  pub quizname: String,
  pub numquestions: u32,
  pub marksperquestion: u32,
  pub timelimitminutes: u32,
}

/// One generated (or teacher-edited) multiple-choice question.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DraftQuestion {
  pub questiontext: String,
  pub options: Vec<String>,
  pub correct_index: usize,
  #[serde(default)]
  pub feedback: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseSummary {
  pub id: i64,
  #[serde(default)]
  pub fullname: String,
  #[serde(default)]
  pub shortname: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileEntry {
  pub fileid: i64,
  pub name: String,
  #[serde(default)]
  pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionListing {
  pub id: i64,
  pub name: String,
  pub courseid: i64,
  #[serde(default)]
  pub files: Vec<FileEntry>,
}

/// Result of a successful quiz upload, with the LMS follow-up links.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResult {
  pub message: String,
  #[serde(default)]
  pub settingsurl: String,
  #[serde(default)]
  pub editurl: String,
}
