//! LMS platform collaborator: course creation, course/file listing, and quiz
//! generate/upload, all behind one declared request/response contract.
//!
//! The platform is all-or-nothing at this boundary: a call either succeeds or
//! carries an error message. Partial server-side steps (section renames,
//! enrolment) are the platform's own business and never surface here.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::domain::{CourseDraft, CourseSummary, DraftQuestion, SectionListing, UploadResult};
use crate::error::ChatError;

/// Upper bound for the unique-shortname suffix search.
const SHORTNAME_RETRY_CAP: u32 = 50;

/// Error code the platform uses to signal a shortname collision.
const CODE_SHORTNAME_TAKEN: &str = "shortname_taken";

#[derive(Clone, Debug, Serialize)]
pub struct QuizGenerateRequest {
  pub courseid: i64,
  pub sectionid: i64,
  pub fileids: Vec<i64>,
  pub quizname: String,
  pub numquestions: u32,
  pub marksperquestion: u32,
  pub timelimitminutes: u32,
  pub instructions: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuizUploadRequest {
  pub courseid: i64,
  pub sectionid: i64,
  pub quizname: String,
  pub marksperquestion: u32,
  pub timelimitminutes: u32,
  pub questions: Vec<DraftQuestion>,
}

/// Declared contract toward the LMS. One HTTP implementation in production;
/// tests stub it.
#[async_trait]
pub trait CoursePlatform: Send + Sync {
  /// Create a course from a confirmed draft; returns the new course id.
  async fn create_course(&self, draft: &CourseDraft) -> Result<i64, ChatError>;
  async fn fetch_courses(&self) -> Result<Vec<CourseSummary>, ChatError>;
  async fn fetch_files(&self, courseid: i64) -> Result<Vec<SectionListing>, ChatError>;
  async fn quiz_generate(&self, req: &QuizGenerateRequest) -> Result<Vec<DraftQuestion>, ChatError>;
  async fn quiz_upload(&self, req: &QuizUploadRequest) -> Result<UploadResult, ChatError>;
}

#[derive(Clone)]
pub struct PlatformClient {
  client: reqwest::Client,
  base_url: String,
  token: String,
}

impl PlatformClient {
  /// Construct the client if we find PLATFORM_BASE_URL; otherwise None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("PLATFORM_BASE_URL").ok()?;
    let token = std::env::var("PLATFORM_TOKEN").unwrap_or_default();
    let client = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(30))
      .build()
      .ok()?;
    Some(Self { client, base_url, token })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  async fn post<B: Serialize, R: for<'a> Deserialize<'a>>(&self, path: &str, body: &B) -> Result<R, ChatError> {
    let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
    let res = self.client.post(&url)
      .header(USER_AGENT, "coursepilot-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .bearer_auth(&self.token)
      .json(body).send().await
      .map_err(|e| ChatError::Transport(format!("platform unreachable: {e}")))?;

    if !res.status().is_success() {
      return Err(ChatError::Transport(format!("platform HTTP {}", res.status())));
    }
    res.json::<R>().await
      .map_err(|e| ChatError::Transport(format!("invalid platform envelope: {e}")))
  }
}

/// Suffix strategy for the bounded unique-shortname search.
/// Attempt 0 is the base name itself; later attempts append "_N".
fn shortname_for_attempt(base: &str, attempt: u32) -> String {
  if attempt == 0 {
    base.to_string()
  } else {
    format!("{base}_{attempt}")
  }
}

#[async_trait]
impl CoursePlatform for PlatformClient {
  /// The platform rejects duplicate shortnames with `shortname_taken`; we
  /// probe suffixed variants up to SHORTNAME_RETRY_CAP, then give up with a
  /// named Exhausted error instead of looping forever.
  #[instrument(level = "info", skip(self, draft), fields(fullname = %draft.fullname, sections = draft.numsections))]
  async fn create_course(&self, draft: &CourseDraft) -> Result<i64, ChatError> {
    #[derive(Serialize)]
    struct Req<'a> {
      fullname: &'a str,
      shortname: String,
      category: i64,
      sections: &'a [String],
    }
    #[derive(Deserialize)]
    struct Resp {
      success: bool,
      #[serde(default)] courseid: Option<i64>,
      #[serde(default)] error: Option<String>,
      #[serde(default)] error_code: Option<String>,
    }

    for attempt in 0..=SHORTNAME_RETRY_CAP {
      let shortname = shortname_for_attempt(&draft.shortname, attempt);
      let resp: Resp = self
        .post("course/create", &Req {
          fullname: &draft.fullname,
          shortname: shortname.clone(),
          category: draft.category,
          sections: &draft.sections,
        })
        .await?;

      if resp.success {
        let courseid = resp.courseid.ok_or_else(|| {
          ChatError::MalformedPayload("platform reported success without a course id".into())
        })?;
        info!(target: "coursepilot_backend", courseid, %shortname, "course created");
        return Ok(courseid);
      }

      if resp.error_code.as_deref() == Some(CODE_SHORTNAME_TAKEN) {
        warn!(target: "coursepilot_backend", %shortname, attempt, "shortname taken, trying suffixed variant");
        continue;
      }

      return Err(ChatError::Provider(resp.error.unwrap_or_else(|| "Unknown error".into())));
    }

    Err(ChatError::Exhausted(format!(
      "no free shortname for '{}' after {} attempts",
      draft.shortname, SHORTNAME_RETRY_CAP
    )))
  }

  #[instrument(level = "info", skip(self))]
  async fn fetch_courses(&self) -> Result<Vec<CourseSummary>, ChatError> {
    #[derive(Serialize)]
    struct Req {}
    #[derive(Deserialize)]
    struct Resp {
      success: bool,
      #[serde(default)] courses: Vec<CourseSummary>,
      #[serde(default)] error: Option<String>,
    }
    let resp: Resp = self.post("course/list", &Req {}).await?;
    if resp.success {
      Ok(resp.courses)
    } else {
      Err(ChatError::Provider(resp.error.unwrap_or_else(|| "Unknown error".into())))
    }
  }

  #[instrument(level = "info", skip(self), fields(%courseid))]
  async fn fetch_files(&self, courseid: i64) -> Result<Vec<SectionListing>, ChatError> {
    #[derive(Serialize)]
    struct Req { courseid: i64 }
    #[derive(Deserialize)]
    struct Resp {
      success: bool,
      #[serde(default)] sections: Vec<SectionListing>,
      #[serde(default)] error: Option<String>,
    }
    let resp: Resp = self.post("course/files", &Req { courseid }).await?;
    if resp.success {
      Ok(resp.sections)
    } else {
      Err(ChatError::Provider(resp.error.unwrap_or_else(|| "Unknown error".into())))
    }
  }

  #[instrument(level = "info", skip(self, req), fields(courseid = req.courseid, numquestions = req.numquestions))]
  async fn quiz_generate(&self, req: &QuizGenerateRequest) -> Result<Vec<DraftQuestion>, ChatError> {
    #[derive(Deserialize)]
    struct Resp {
      success: bool,
      #[serde(default)] questions: Vec<DraftQuestion>,
      #[serde(default)] error: Option<String>,
    }
    let resp: Resp = self.post("quiz/generate", req).await?;
    if resp.success {
      Ok(resp.questions)
    } else {
      Err(ChatError::Provider(resp.error.unwrap_or_else(|| "Unknown error".into())))
    }
  }

  #[instrument(level = "info", skip(self, req), fields(courseid = req.courseid, questions = req.questions.len()))]
  async fn quiz_upload(&self, req: &QuizUploadRequest) -> Result<UploadResult, ChatError> {
    #[derive(Deserialize)]
    struct Resp {
      success: bool,
      #[serde(default)] message: Option<String>,
      #[serde(default)] settingsurl: Option<String>,
      #[serde(default)] editurl: Option<String>,
      #[serde(default)] error: Option<String>,
    }
    let resp: Resp = self.post("quiz/upload", req).await?;
    if resp.success {
      Ok(UploadResult {
        message: resp.message.unwrap_or_else(|| "Quiz uploaded.".into()),
        settingsurl: resp.settingsurl.unwrap_or_default(),
        editurl: resp.editurl.unwrap_or_default(),
      })
    } else {
      Err(ChatError::Provider(resp.error.unwrap_or_else(|| "Unknown error".into())))
    }
  }
}

/// Null implementation used when PLATFORM_BASE_URL is absent: every call
/// fails with the same actionable message instead of panicking.
pub struct UnconfiguredPlatform;

impl UnconfiguredPlatform {
  fn err<T>() -> Result<T, ChatError> {
    Err(ChatError::Validation("LMS platform endpoint not configured on the server.".into()))
  }
}

#[async_trait]
impl CoursePlatform for UnconfiguredPlatform {
  async fn create_course(&self, _draft: &CourseDraft) -> Result<i64, ChatError> {
    Self::err()
  }
  async fn fetch_courses(&self) -> Result<Vec<CourseSummary>, ChatError> {
    Self::err()
  }
  async fn fetch_files(&self, _courseid: i64) -> Result<Vec<SectionListing>, ChatError> {
    Self::err()
  }
  async fn quiz_generate(&self, _req: &QuizGenerateRequest) -> Result<Vec<DraftQuestion>, ChatError> {
    Self::err()
  }
  async fn quiz_upload(&self, _req: &QuizUploadRequest) -> Result<UploadResult, ChatError> {
    Self::err()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn attempt_zero_uses_base_shortname() {
    assert_eq!(shortname_for_attempt("DS101", 0), "DS101");
    assert_eq!(shortname_for_attempt("DS101", 1), "DS101_1");
    assert_eq!(shortname_for_attempt("DS101", 42), "DS101_42");
  }
}
