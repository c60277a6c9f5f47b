//! Conversational QA grounded in retrieved workspace context.

use std::sync::Arc;

use tracing::instrument;

use studium_core::defaults::{CHAT_MEMORY_TURNS, CHAT_TOP_K};
use studium_core::{
    ChatRepository, ChatRole, EffectiveConfig, GenerationBackend, Message, Result,
    SettingsRepository, WorkspaceRepository,
};
use studium_db::Database;
use studium_inference::BackendSelector;

use crate::retriever::{context_block, Retriever};

const SYSTEM_PROMPT: &str = "You are an educational assistant. Answer the user's question using \
     only the provided context. If the context does not contain the answer, say \
     \"I don't find that in the provided materials.\" and nothing else. Do not invent \
     information that is not supported by the context.";

/// Chat engine with a bounded conversational memory window.
pub struct ChatEngine {
    db: Database,
    selector: Arc<BackendSelector>,
    retriever: Arc<Retriever>,
}

impl ChatEngine {
    pub fn new(db: Database, selector: Arc<BackendSelector>, retriever: Arc<Retriever>) -> Self {
        Self {
            db,
            selector,
            retriever,
        }
    }

    /// Answer one user message, appending both turns to history.
    #[instrument(skip(self, message), fields(subsystem = "engine", component = "chat", workspace_id))]
    pub async fn chat(&self, workspace_id: i64, message: &str) -> Result<String> {
        let user_message_id = self
            .db
            .chat
            .append(workspace_id, ChatRole::User, message)
            .await?;

        let hits = self
            .retriever
            .retrieve(workspace_id, message, CHAT_TOP_K)
            .await?;
        let context = context_block(&hits);

        // Memory excludes the user turn just appended.
        let memory = self
            .db
            .chat
            .window_before(workspace_id, user_message_id, CHAT_MEMORY_TURNS)
            .await?;

        let mut messages = Vec::with_capacity(memory.len() + 2);
        messages.push(Message::system(format!(
            "{}\n\nContext:\n{}",
            SYSTEM_PROMPT, context
        )));
        for turn in &memory {
            messages.push(Message {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            });
        }
        messages.push(Message::user(message));

        let workspace = self.db.workspaces.get(workspace_id).await?;
        let settings = self.db.settings.get_or_create().await?;
        let cfg = EffectiveConfig::resolve(&workspace, &settings);
        let backend = self.selector.generation(&cfg)?;

        let answer = backend.complete(&messages).await?;
        self.db
            .chat
            .append(workspace_id, ChatRole::Assistant, &answer)
            .await?;

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_carries_refusal_phrase() {
        assert!(SYSTEM_PROMPT.contains("I don't find that in the provided materials."));
    }
}
