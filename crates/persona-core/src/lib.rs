pub mod chat;
pub mod config;
pub mod emotion;
pub mod error;
pub mod llm;
pub mod memory;
pub mod personality;
pub mod telemetry;
pub mod types;

// Re-export primary types for convenience
pub use chat::{ChatEngine, ChatReply, ChatTurn, Interaction};
pub use config::{CoreConfig, ProviderSettings, Timeouts};
pub use emotion::{AnalysisContext, Emotion, EmotionAnalysis, EmotionAnalyzer};
pub use error::{DispatchError, SERVICE_UNAVAILABLE_MESSAGE};
pub use llm::{AiDispatcher, Capability, ProviderId, ProviderRegistry, TokenStream};
pub use memory::{MemoryRecord, MemoryService, MemoryType, NewMemory, RetrievalContext};
pub use personality::{PersonalityEngine, PersonalityTraits, ResponseContext};
pub use types::{ChatMessage, CompletionRequest, CompletionResult, Role};

// Re-export common types
pub use anyhow::{Error, Result};
pub use uuid::Uuid;
