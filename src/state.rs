//! Application state shared by all connections: prompts, the oracle-backed
//! prompt router, and the LMS platform client.
//!
//! Per-conversation state (mode, logs, drafts) lives in `session::ChatSession`,
//! one per WebSocket connection; nothing conversational is global.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{load_agent_config_from_env, Prompts};
use crate::oracle::{OracleClient, OracleRouter, PromptRouter};
use crate::platform::{CoursePlatform, PlatformClient, UnconfiguredPlatform};

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<dyn PromptRouter>,
    pub platform: Arc<dyn CoursePlatform>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, init the oracle and the platform
    /// client. Missing credentials degrade to explanatory runtime errors.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let prompts = load_agent_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let oracle = OracleClient::from_env();
        if let Some(oc) = &oracle {
            info!(target: "coursepilot_backend", base_url = %oc.base_url, model = %oc.model, "Completion oracle enabled.");
        } else {
            info!(target: "coursepilot_backend", "Completion oracle disabled (no ORACLE_API_KEY).");
        }
        let router: Arc<dyn PromptRouter> = Arc::new(OracleRouter::new(oracle, prompts.clone()));

        let platform: Arc<dyn CoursePlatform> = match PlatformClient::from_env() {
            Some(pc) => {
                info!(target: "coursepilot_backend", base_url = %pc.base_url(), "LMS platform client enabled.");
                Arc::new(pc)
            }
            None => {
                info!(target: "coursepilot_backend", "LMS platform client disabled (no PLATFORM_BASE_URL).");
                Arc::new(UnconfiguredPlatform)
            }
        };

        Self { router, platform, prompts }
    }
}
