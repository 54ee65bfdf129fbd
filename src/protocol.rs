//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, CourseSummary, DraftQuestion, Mode, QuizConfig, SectionListing, Sender};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Send {
        text: String,
    },
    SwitchMode {
        mode: Mode,
    },
    Confirm,
    History,
    ClearHistory,
    QuizSelectCourse {
        courseid: i64,
    },
    QuizSelectSection {
        sectionid: i64,
    },
    QuizSetFiles {
        fileids: Vec<i64>,
    },
    QuizSetConfig {
        #[serde(flatten)]
        config: QuizConfig,
    },
    QuizGenerate {
        #[serde(default)]
        instructions: String,
    },
    QuizUpload {
        questions: Vec<DraftQuestion>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    /// Echo of a message appended to the active mode's log.
    Message {
        text: String,
        sender: Sender,
        mode: Mode,
    },
    History {
        mode: Mode,
        messages: Vec<ChatMessage>,
    },
    /// The confirmation slot was armed; the client should show Confirm.
    ConfirmPrompt {
        note: String,
    },
    ConfirmCleared,
    QuizDraft {
        questions: Vec<DraftQuestion>,
    },
    QuizUploaded {
        message: String,
        settingsurl: String,
        editurl: String,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    pub courseid: i64,
}

#[derive(Serialize)]
pub struct CoursesOut {
    pub success: bool,
    pub courses: Vec<CourseSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct FilesOut {
    pub success: bool,
    pub sections: Vec<SectionListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
