//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! platform collaborator; the chat machinery itself lives on the WebSocket.

use std::sync::Arc;
use axum::{extract::{Query, State}, response::IntoResponse, Json};
use tracing::{info, instrument, warn};

use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  match state.platform.fetch_courses().await {
    Ok(courses) => {
      info!(target: "coursepilot_backend", count = courses.len(), "courses listed");
      Json(CoursesOut { success: true, courses, error: None })
    }
    Err(e) => {
      warn!(target: "coursepilot_backend", error = %e, "course listing failed");
      Json(CoursesOut { success: false, courses: Vec::new(), error: Some(e.to_string()) })
    }
  }
}

#[instrument(level = "info", skip(state), fields(courseid = q.courseid))]
pub async fn http_get_files(
  State(state): State<Arc<AppState>>,
  Query(q): Query<FilesQuery>,
) -> impl IntoResponse {
  match state.platform.fetch_files(q.courseid).await {
    Ok(sections) => {
      info!(target: "coursepilot_backend", courseid = q.courseid, count = sections.len(), "files listed");
      Json(FilesOut { success: true, sections, error: None })
    }
    Err(e) => {
      warn!(target: "coursepilot_backend", courseid = q.courseid, error = %e, "file listing failed");
      Json(FilesOut { success: false, sections: Vec::new(), error: Some(e.to_string()) })
    }
  }
}
