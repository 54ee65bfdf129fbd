//! Quiz mode: the draft workflow around MCQ generation and upload.
//!
//! Selection state (course, section, files, config) is mutated by UI events;
//! generation is gated locally in a fixed priority order and, like upload,
//! guarded by a scoped in-flight lock so a second trigger is refused while
//! the first request is outstanding.

use tracing::{info, instrument};

use crate::classify::Classified;
use crate::domain::{DraftQuestion, QuizConfig, UploadResult};
use crate::error::ChatError;
use crate::handlers::{Capability, HandlerOutcome, ModeHandler};
use crate::platform::{CoursePlatform, QuizGenerateRequest, QuizUploadRequest};
use crate::util::UiLock;

#[derive(Default)]
pub struct QuizHandler {
  selected_course: Option<i64>,
  selected_section: Option<i64>,
  selected_files: Vec<i64>,
  config: QuizConfig,
  draft: Vec<DraftQuestion>,
  generate_lock: UiLock,
  upload_lock: UiLock,
}

impl QuizHandler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn draft(&self) -> &[DraftQuestion] {
    &self.draft
  }

  /// Course change invalidates the dependent section and file selection.
  pub fn select_course(&mut self, courseid: i64) {
    if self.selected_course != Some(courseid) {
      self.selected_section = None;
      self.selected_files.clear();
    }
    self.selected_course = Some(courseid);
  }

  /// Section change invalidates the file selection.
  pub fn select_section(&mut self, sectionid: i64) {
    if self.selected_section != Some(sectionid) {
      self.selected_files.clear();
    }
    self.selected_section = Some(sectionid);
  }

  /// Replace the selected file set (deduplicated, order preserved).
  pub fn set_files(&mut self, fileids: Vec<i64>) {
    let mut seen = Vec::new();
    for id in fileids {
      if !seen.contains(&id) {
        seen.push(id);
      }
    }
    self.selected_files = seen;
  }

  pub fn set_config(&mut self, config: QuizConfig) {
    self.config = config;
  }

  /// Local preconditions for generation, checked in priority order:
  /// course -> section -> files -> name -> count. Each check fires
  /// independently of the later ones.
  fn gate(&self) -> Result<(), ChatError> {
    if self.selected_course.is_none() {
      return Err(ChatError::Validation("Select a course first.".into()));
    }
    if self.selected_section.is_none() {
      return Err(ChatError::Validation("Choose a section for the quiz.".into()));
    }
    if self.selected_files.is_empty() {
      return Err(ChatError::Validation("Select at least one file.".into()));
    }
    if self.config.quizname.trim().is_empty() {
      return Err(ChatError::Validation("Enter a quiz name.".into()));
    }
    if self.config.numquestions == 0 {
      return Err(ChatError::Validation("Number of questions must be greater than zero.".into()));
    }
    Ok(())
  }

  /// Request MCQ generation. A successful response replaces the entire
  /// draft list; there is no merging with prior drafts.
  #[instrument(level = "info", skip(self, platform, instructions), fields(instr_len = instructions.len()))]
  pub async fn generate(
    &mut self,
    platform: &dyn CoursePlatform,
    instructions: &str,
  ) -> Result<usize, ChatError> {
    self.gate()?;
    let _guard = self
      .generate_lock
      .try_acquire()
      .ok_or_else(|| ChatError::Validation("A generation request is already in progress.".into()))?;

    let req = QuizGenerateRequest {
      courseid: self.selected_course.unwrap_or_default(),
      sectionid: self.selected_section.unwrap_or_default(),
      fileids: self.selected_files.clone(),
      quizname: self.config.quizname.clone(),
      numquestions: self.config.numquestions,
      marksperquestion: self.config.marksperquestion,
      timelimitminutes: self.config.timelimitminutes,
      instructions: instructions.to_string(),
    };

    let questions = platform.quiz_generate(&req).await?;
    info!(target: "quiz", generated = questions.len(), "draft questions replaced");
    self.draft = questions;
    Ok(self.draft.len())
  }

  /// Submit the teacher-edited question list. The edited values are taken
  /// as given (not the original generation response); invalid questions are
  /// discarded, and an all-invalid list is refused locally.
  #[instrument(level = "info", skip(self, platform, edited), fields(edited = edited.len()))]
  pub async fn upload(
    &mut self,
    platform: &dyn CoursePlatform,
    edited: Vec<DraftQuestion>,
  ) -> Result<UploadResult, ChatError> {
    self.gate()?;
    let questions = clean_questions(&edited);
    if questions.is_empty() {
      return Err(ChatError::Validation(
        "No valid questions to upload. Each question needs text and at least two options.".into(),
      ));
    }

    let _guard = self
      .upload_lock
      .try_acquire()
      .ok_or_else(|| ChatError::Validation("An upload is already in progress.".into()))?;

    let req = QuizUploadRequest {
      courseid: self.selected_course.unwrap_or_default(),
      sectionid: self.selected_section.unwrap_or_default(),
      quizname: self.config.quizname.clone(),
      marksperquestion: self.config.marksperquestion,
      timelimitminutes: self.config.timelimitminutes,
      questions,
    };

    let result = platform.quiz_upload(&req).await?;
    info!(target: "quiz", "quiz uploaded");
    self.draft.clear();
    Ok(result)
  }
}

/// Keep only questions with non-empty text and at least two non-empty
/// options; empty options are dropped and the correct marker is remapped to
/// the surviving list (falling back to the first option if it was dropped).
fn clean_questions(edited: &[DraftQuestion]) -> Vec<DraftQuestion> {
  edited
    .iter()
    .filter_map(|q| {
      let text = q.questiontext.trim();
      if text.is_empty() {
        return None;
      }

      let mut options = Vec::new();
      let mut correct = None;
      for (i, opt) in q.options.iter().enumerate() {
        let o = opt.trim();
        if o.is_empty() {
          continue;
        }
        if i == q.correct_index {
          correct = Some(options.len());
        }
        options.push(o.to_string());
      }
      if options.len() < 2 {
        return None;
      }

      Some(DraftQuestion {
        questiontext: text.to_string(),
        options,
        correct_index: correct.unwrap_or(0),
        feedback: q.feedback.trim().to_string(),
      })
    })
    .collect()
}

impl ModeHandler for QuizHandler {
  fn before_send(&mut self, text: &str) -> String {
    text.to_string()
  }

  /// Chat replies in quiz mode are plain text; the draft workflow runs over
  /// dedicated UI events, not the chat channel.
  fn handle_response(&mut self, _classified: &Classified) -> HandlerOutcome {
    HandlerOutcome::NotHandled
  }

  fn reset(&mut self) {
    self.selected_course = None;
    self.selected_section = None;
    self.selected_files.clear();
    self.config = QuizConfig::default();
    self.draft.clear();
  }

  fn capabilities(&self) -> &'static [Capability] {
    &[Capability::Generate]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{CourseDraft, CourseSummary, SectionListing};
  use async_trait::async_trait;

  struct StubPlatform {
    questions: Vec<DraftQuestion>,
  }

  #[async_trait]
  impl CoursePlatform for StubPlatform {
    async fn create_course(&self, _draft: &CourseDraft) -> Result<i64, ChatError> {
      Ok(1)
    }
    async fn fetch_courses(&self) -> Result<Vec<CourseSummary>, ChatError> {
      Ok(Vec::new())
    }
    async fn fetch_files(&self, _courseid: i64) -> Result<Vec<SectionListing>, ChatError> {
      Ok(Vec::new())
    }
    async fn quiz_generate(&self, _req: &QuizGenerateRequest) -> Result<Vec<DraftQuestion>, ChatError> {
      Ok(self.questions.clone())
    }
    async fn quiz_upload(&self, req: &QuizUploadRequest) -> Result<UploadResult, ChatError> {
      Ok(UploadResult {
        message: format!("uploaded {} questions", req.questions.len()),
        settingsurl: String::new(),
        editurl: String::new(),
      })
    }
  }

  fn question(text: &str, options: &[&str], correct: usize) -> DraftQuestion {
    DraftQuestion {
      questiontext: text.into(),
      options: options.iter().map(|s| s.to_string()).collect(),
      correct_index: correct,
      feedback: String::new(),
    }
  }

  fn ready_handler() -> QuizHandler {
    let mut h = QuizHandler::new();
    h.select_course(7);
    h.select_section(2);
    h.set_files(vec![10, 11]);
    h.set_config(QuizConfig {
      quizname: "Week 1 quiz".into(),
      numquestions: 5,
      marksperquestion: 1,
      timelimitminutes: 20,
    });
    h
  }

  fn validation_msg(err: ChatError) -> String {
    match err {
      ChatError::Validation(m) => m,
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn gate_checks_fire_in_priority_order() {
    let platform = StubPlatform { questions: Vec::new() };

    let mut h = QuizHandler::new();
    let msg = validation_msg(h.generate(&platform, "").await.unwrap_err());
    assert!(msg.contains("course"), "{msg}");

    h.select_course(7);
    let msg = validation_msg(h.generate(&platform, "").await.unwrap_err());
    assert!(msg.contains("section"), "{msg}");

    h.select_section(2);
    let msg = validation_msg(h.generate(&platform, "").await.unwrap_err());
    assert!(msg.contains("file"), "{msg}");

    h.set_files(vec![10]);
    let msg = validation_msg(h.generate(&platform, "").await.unwrap_err());
    assert!(msg.contains("quiz name"), "{msg}");

    h.set_config(QuizConfig { quizname: "Quiz".into(), numquestions: 0, ..QuizConfig::default() });
    let msg = validation_msg(h.generate(&platform, "").await.unwrap_err());
    assert!(msg.contains("greater than zero"), "{msg}");
  }

  #[tokio::test]
  async fn generation_replaces_the_whole_draft() {
    let mut h = ready_handler();

    let first = StubPlatform { questions: vec![question("Q1", &["a", "b"], 0)] };
    h.generate(&first, "").await.unwrap();
    assert_eq!(h.draft().len(), 1);

    let second = StubPlatform {
      questions: vec![question("Q2", &["c", "d"], 1), question("Q3", &["e", "f"], 0)],
    };
    h.generate(&second, "").await.unwrap();
    assert_eq!(h.draft().len(), 2);
    assert_eq!(h.draft()[0].questiontext, "Q2");
  }

  #[tokio::test]
  async fn upload_discards_invalid_questions() {
    let mut h = ready_handler();
    let platform = StubPlatform { questions: Vec::new() };

    let edited = vec![
      question("Valid", &["yes", "no"], 1),
      question("One option only", &["solo", "", "  "], 0),
      question("", &["a", "b"], 0),
    ];
    let result = h.upload(&platform, edited).await.unwrap();
    assert_eq!(result.message, "uploaded 1 questions");
  }

  #[tokio::test]
  async fn upload_refused_when_no_valid_questions_remain() {
    let mut h = ready_handler();
    let platform = StubPlatform { questions: Vec::new() };

    let edited = vec![question("Only one option", &["solo"], 0)];
    let msg = validation_msg(h.upload(&platform, edited).await.unwrap_err());
    assert!(msg.contains("No valid questions"), "{msg}");
  }

  #[test]
  fn cleaning_remaps_the_correct_marker() {
    let cleaned = clean_questions(&[question("Q", &["", "right", "wrong"], 1)]);
    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned[0].options, vec!["right", "wrong"]);
    assert_eq!(cleaned[0].correct_index, 0);

    // Marked-correct option dropped: fall back to the first survivor.
    let cleaned = clean_questions(&[question("Q", &["", "a", "b"], 0)]);
    assert_eq!(cleaned[0].correct_index, 0);
  }

  #[test]
  fn reset_clears_selection_config_and_draft() {
    let mut h = ready_handler();
    h.draft = vec![question("Q", &["a", "b"], 0)];
    h.reset();
    assert!(h.selected_course.is_none());
    assert!(h.selected_files.is_empty());
    assert!(h.config.quizname.is_empty());
    assert!(h.draft().is_empty());
  }

  #[test]
  fn changing_course_clears_dependent_selection() {
    let mut h = ready_handler();
    h.select_course(8);
    assert!(h.selected_section.is_none());
    assert!(h.selected_files.is_empty());
  }
}
