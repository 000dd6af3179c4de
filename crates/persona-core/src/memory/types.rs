//! Memory record types and creation-time derivations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Tombstone written over forgotten content.
pub const FORGOTTEN_MARKER: &str = "[forgotten]";

/// The ten recognized memory categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Goal,
    Fact,
    Preference,
    Quirk,
    Context,
    Insight,
    Reminder,
    Experience,
    Relationship,
    Learning,
}

impl MemoryType {
    pub fn parse(raw: &str) -> Option<MemoryType> {
        match raw {
            "goal" => Some(MemoryType::Goal),
            "fact" => Some(MemoryType::Fact),
            "preference" => Some(MemoryType::Preference),
            "quirk" => Some(MemoryType::Quirk),
            "context" => Some(MemoryType::Context),
            "insight" => Some(MemoryType::Insight),
            "reminder" => Some(MemoryType::Reminder),
            "experience" => Some(MemoryType::Experience),
            "relationship" => Some(MemoryType::Relationship),
            "learning" => Some(MemoryType::Learning),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("unknown memory type: {0}")]
    UnknownType(String),
    #[error("memory content must not be empty")]
    EmptyContent,
    #[error("memory record not found")]
    NotFound,
}

/// Input for storing a new memory. The type arrives as a raw string and is
/// validated against the known set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMemory {
    pub kind: String,
    pub content: String,
    pub emotional_context: Option<String>,
}

impl NewMemory {
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
            emotional_context: None,
        }
    }

    pub fn with_emotional_context(mut self, context: impl Into<String>) -> Self {
        self.emotional_context = Some(context.into());
        self
    }
}

/// A stored memory, owned by one (agent, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub agent_id: String,
    pub user_id: String,
    pub kind: MemoryType,
    pub content: String,
    pub emotional_context: String,
    /// Always in [0,10]; feedback and decay adjustments clamp to this range.
    pub importance: u8,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Soft-archived by the age sweep; never returned by retrieval.
    pub archived: bool,
    /// Soft-deleted on user request; identity kept, content tombstoned.
    pub forgotten: bool,
}

impl MemoryRecord {
    pub fn days_old(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }
}

/// Baseline importance plus bumps from emotional weight and category.
/// Computed over the raw requested type string before validation narrows it.
pub fn initial_importance(raw_kind: &str, emotional_context: &str) -> u8 {
    let mut importance = 5u8;
    if !emotional_context.is_empty() && emotional_context != "neutral" {
        importance += 2;
    }
    if raw_kind == "preference" {
        importance += 1;
    }
    if raw_kind == "achievement" {
        importance += 3;
    }
    importance.min(10)
}

/// Deterministic tags from string content: lowercased words longer than 3
/// characters, first 5 unique.
pub fn derive_tags(content: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for word in content
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
    {
        let word = word.to_string();
        if !tags.contains(&word) {
            tags.push(word);
        }
        if tags.len() == 5 {
            break;
        }
    }
    tags
}
