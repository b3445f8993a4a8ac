use std::sync::Arc;

use crate::llm_client::LanguageModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The text-generation collaborator. `LlmClient` in production, a stub in tests.
    pub llm: Arc<dyn LanguageModel>,
}
