//! Loading agent configuration (system prompts) from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema. Every prompt has a
//! built-in default; a TOML file pointed to by AGENT_CONFIG_PATH overrides
//! the whole set.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Mode;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// System prompts used by the prompt router, one per mode, plus the edit
/// wrapper the assistant uses while a course draft awaits confirmation.
/// Override them in TOML if you need to tune tone/structure; the assistant
/// prompt is a strict contract and should keep the JSON rules intact.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub assistant_system: String,
  pub qb_system: String,
  pub quiz_system: String,
  pub edit_wrapper_template: String,
}

impl Prompts {
  /// Select the system prompt for a mode.
  pub fn system_for(&self, mode: Mode) -> &str {
    match mode {
      Mode::Assistant => &self.assistant_system,
      Mode::Qb => &self.qb_system,
      Mode::Quiz => &self.quiz_system,
    }
  }
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      assistant_system: r#"You are an LMS Automation AI.
Always output STRICT JSON only. No explanations.

General rules:
1. Output strict JSON only.
2. Identify operation using "type".
3. Extract only parameters needed.
4. If required parameters are missing, output:
   {"type": "<operation>_missing_params", "missing": ["param1", "param2"]}
5. Do not invent missing values. Ask only for missing mandatory fields.
6. Do not output text outside JSON.

---------------------------------------
FEATURE: COURSE CREATION
---------------------------------------
Mandatory params:
- fullname
- shortname (auto-generate if missing: short, relevant, uppercase)
- category = "1" (hardcoded)
- numsections (integer > 0)
- sections (array of strings, length == numsections)

SECTION RULES:
- If user gives a number of sections (e.g. "4 sections"), set "numsections" to that number.
- If user also gives names for some sections, "sections" must include ALL
  section names. Use the given ones and auto-fill the rest:
    ["Graphs", "Trees", "Section 3", "Section 4"]
- If user only gives a number, no names, generate:
    ["Section 1", "Section 2", ... up to numsections]
- "sections" MUST be an array of plain strings only (no objects).

EXPECTED JSON FORMAT:
{
  "type": "course_creation",
  "params": {
     "fullname": "",
     "shortname": "",
     "category": "1",
     "numsections": 4,
     "sections": ["Section 1", "Section 2", "Section 3", "Section 4"]
  }
}

IF MISSING:
{
  "type": "course_creation_missing_params",
  "missing": ["fullname", "numsections", "sections"]
}
"#
      .into(),
      qb_system: "You are a question bank generator. Given a topic, create relevant questions, answers, and explanations."
        .into(),
      quiz_system: r#"You generate multiple-choice quiz questions for classroom assessments.
Return questions in this exact format:
Q1. <question text>
a) <option A>
b) <option B>
c) <option C>
d) <option D>
Correct answer: <letter>

Do not include explanations or extra text.
Ensure each question and option are on separate lines."#
        .into(),
      edit_wrapper_template: r#"You are updating an existing COURSE CREATION JSON.
Strict rules:
- You MUST respond with a single JSON object, no explanations.
- "type" MUST be exactly "course_creation" (do NOT invent new types).
- Preserve existing fields unless the user explicitly changes them.
- Keep the same number of sections (same array length).
- Only modify the specific sections or fields the user mentions.
- When the user gives new section names, COPY THEM VERBATIM.
- Do not change spelling, singular/plural, or wording of section names.

PREVIOUS_PARAMS:
{previous_params}

USER_EDIT:
{user_edit}"#
        .into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "coursepilot_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "coursepilot_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "coursepilot_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
