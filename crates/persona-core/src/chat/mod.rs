//! Turn pipeline: classify, recall, dispatch, style, remember
//!
//! One inbound message flows through emotion analysis and memory recall,
//! gets completed by the dispatch layer, is styled by the personality
//! pipeline, and finally triggers an asynchronous memory write-back. A
//! dispatch failure never surfaces raw provider detail to the user.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::emotion::{AnalysisContext, Emotion, EmotionAnalysis, EmotionAnalyzer};
use crate::error::DispatchError;
use crate::llm::{AiDispatcher, ProviderId, TokenStream};
use crate::memory::{InMemoryStore, MemoryService, MemoryStore, NewMemory, RetrievalContext};
use crate::personality::{PersonalityEngine, PersonalityTraits, ResponseContext, RelationshipStage};
use crate::types::{ChatMessage, CompletionRequest};

/// Placeholder when a provider answers with an empty completion.
const NO_CONTENT_PLACEHOLDER: &str = "No content";

/// One inbound turn with its situational context.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub agent_id: String,
    pub user_id: String,
    pub message: String,
    pub history: Vec<ChatMessage>,
    pub traits: PersonalityTraits,
    pub relationship_stage: Option<RelationshipStage>,
    pub late_night: bool,
    pub previous_emotion: Option<Emotion>,
}

impl ChatTurn {
    pub fn new(
        agent_id: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let agent_id = agent_id.into();
        Self {
            traits: crate::personality::initialize_traits(&agent_id),
            agent_id,
            user_id: user_id.into(),
            message: message.into(),
            history: Vec::new(),
            relationship_stage: None,
            late_night: false,
            previous_emotion: None,
        }
    }
}

/// The styled reply plus what the pipeline inferred along the way.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub emotion: EmotionAnalysis,
    pub provider: Option<ProviderId>,
    pub model: Option<String>,
}

/// Persistence record for one completed exchange. The core only builds
/// these; durable storage belongs to the embedding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub agent_id: String,
    pub user_id: String,
    pub user_message: String,
    pub agent_response: String,
    pub emotional_context: String,
    pub rating: Option<u8>,
    pub metadata: JsonValue,
}

impl Interaction {
    pub fn from_turn(turn: &ChatTurn, reply: &ChatReply) -> Self {
        Self {
            agent_id: turn.agent_id.clone(),
            user_id: turn.user_id.clone(),
            user_message: turn.message.clone(),
            agent_response: reply.content.clone(),
            emotional_context: reply.emotion.primary_emotion.as_str().to_string(),
            rating: None,
            metadata: serde_json::json!({
                "provider": reply.provider,
                "model": reply.model,
                "intensity": reply.emotion.intensity,
            }),
        }
    }
}

pub struct ChatEngine<S: MemoryStore + 'static = InMemoryStore> {
    dispatcher: AiDispatcher,
    analyzer: EmotionAnalyzer,
    memory: MemoryService<S>,
}

impl<S: MemoryStore + 'static> ChatEngine<S> {
    pub fn new(dispatcher: AiDispatcher, memory: MemoryService<S>) -> Self {
        Self {
            dispatcher,
            analyzer: EmotionAnalyzer::new(),
            memory,
        }
    }

    pub fn memory(&self) -> &MemoryService<S> {
        &self.memory
    }

    /// Handle one turn end to end. The memory write-back runs after the
    /// reply is ready and never delays it.
    pub async fn process_turn(&self, turn: ChatTurn) -> ChatReply {
        let analysis_context = AnalysisContext {
            late_night: turn.late_night,
            previous_emotion: turn.previous_emotion,
        };
        let emotion = self.analyzer.analyze(&turn.message, &analysis_context);

        let retrieval = RetrievalContext {
            current_emotion: Some(emotion.primary_emotion.as_str().to_string()),
            ..Default::default()
        };
        let memories = self.memory.retrieve(&turn.agent_id, &turn.user_id, &retrieval);

        let system_prompt = build_system_prompt(&turn, &emotion, &memories);
        let request = CompletionRequest::new(&turn.agent_id, &turn.message)
            .with_history(turn.history.clone())
            .with_system_prompt(system_prompt);

        let (draft, provider, model) = match self.dispatcher.complete(&request).await {
            Ok(result) => {
                let content = result
                    .content
                    .unwrap_or_else(|| NO_CONTENT_PLACEHOLDER.to_string());
                (content, Some(result.provider), Some(result.model))
            }
            Err(e) => {
                tracing::error!(agent = %turn.agent_id, error = %e, "Dispatch failed for turn");
                return ChatReply {
                    content: e.user_message().to_string(),
                    emotion,
                    provider: None,
                    model: None,
                };
            }
        };

        let style_context = ResponseContext {
            emotion: Some(emotion.primary_emotion),
            relationship_stage: turn.relationship_stage,
        };
        let content = PersonalityEngine::adapt(&draft, &turn.traits, &style_context, &mut rand::rng());

        self.remember_turn(&turn, &emotion);

        ChatReply {
            content,
            emotion,
            provider,
            model,
        }
    }

    /// Streaming variant: chunks are forwarded raw in network order, so the
    /// personality styling pass does not apply. The memory write-back still
    /// happens once the stream is open.
    pub async fn stream_turn(
        &self,
        turn: ChatTurn,
    ) -> Result<(TokenStream, EmotionAnalysis), DispatchError> {
        let analysis_context = AnalysisContext {
            late_night: turn.late_night,
            previous_emotion: turn.previous_emotion,
        };
        let emotion = self.analyzer.analyze(&turn.message, &analysis_context);

        let retrieval = RetrievalContext {
            current_emotion: Some(emotion.primary_emotion.as_str().to_string()),
            ..Default::default()
        };
        let memories = self.memory.retrieve(&turn.agent_id, &turn.user_id, &retrieval);

        let system_prompt = build_system_prompt(&turn, &emotion, &memories);
        let request = CompletionRequest::new(&turn.agent_id, &turn.message)
            .with_history(turn.history.clone())
            .with_system_prompt(system_prompt);

        let stream = self.dispatcher.stream(&request).await?;
        self.remember_turn(&turn, &emotion);
        Ok((stream, emotion))
    }

    fn remember_turn(&self, turn: &ChatTurn, emotion: &EmotionAnalysis) {
        let memory = self.memory.clone();
        let agent_id = turn.agent_id.clone();
        let user_id = turn.user_id.clone();
        let entry = NewMemory::new("context", format!("User said: {}", turn.message))
            .with_emotional_context(emotion.primary_emotion.as_str());
        tokio::spawn(async move {
            if let Err(e) = memory.store(&agent_id, &user_id, entry) {
                tracing::warn!(agent = %agent_id, error = %e, "Memory write-back failed");
            }
        });
    }
}

/// Persona instructions plus inferred emotional state and recalled context.
fn build_system_prompt(
    turn: &ChatTurn,
    emotion: &EmotionAnalysis,
    memories: &[crate::memory::MemoryRecord],
) -> String {
    let mut prompt = format!(
        "You are the {} companion. The user currently reads as {} (intensity {}), so respond in a {:?} manner.",
        turn.agent_id,
        emotion.primary_emotion.as_str(),
        emotion.intensity,
        emotion.suggested_tone,
    );
    if !memories.is_empty() {
        prompt.push_str("\nWhat you remember about this user:");
        for record in memories.iter().take(5) {
            prompt.push_str("\n- ");
            prompt.push_str(&record.content);
        }
    }
    prompt
}
