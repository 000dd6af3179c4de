//! Contextual memory: storage, relevance scoring, decay, and clustering
//!
//! Memories belong to one (agent, user) pair. Importance starts from the
//! content's emotional weight and category, drifts down with age, and moves
//! with user feedback. Forgetting is a soft delete: the row keeps its
//! identity but the content is tombstoned and importance drops to zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod store;
pub mod types;

pub use store::{InMemoryStore, MemoryStore};
pub use types::{MemoryError, MemoryRecord, MemoryType, NewMemory, FORGOTTEN_MARKER};

use types::{derive_tags, initial_importance};

/// Records older than this with low importance are archived by the sweep.
const ARCHIVE_AGE_DAYS: i64 = 90;
const ARCHIVE_IMPORTANCE_FLOOR: u8 = 3;
/// Importance lost per day of age, as a fraction.
const DECAY_PER_DAY: f64 = 0.1 / 100.0;

/// Filters for a retrieval pass.
#[derive(Debug, Clone)]
pub struct RetrievalContext {
    pub types: Option<Vec<MemoryType>>,
    pub emotional_context: Option<String>,
    pub min_importance: u8,
    pub within_days: Option<i64>,
    /// When set, memories matching this emotion are promoted to the front.
    pub current_emotion: Option<String>,
    pub limit: usize,
}

impl Default for RetrievalContext {
    fn default() -> Self {
        Self {
            types: None,
            emotional_context: None,
            min_importance: 5,
            within_days: None,
            current_emotion: None,
            limit: 50,
        }
    }
}

/// Thematic grouping of memories with derived commentary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCluster {
    pub theme: String,
    pub memories: Vec<MemoryRecord>,
    pub insights: Vec<String>,
    pub patterns: Vec<String>,
    pub recommendations: Vec<String>,
}

pub struct MemoryService<S: MemoryStore = InMemoryStore> {
    store: Arc<S>,
}

impl<S: MemoryStore> Clone for MemoryService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl Default for MemoryService<InMemoryStore> {
    fn default() -> Self {
        Self::new(InMemoryStore::new())
    }
}

impl<S: MemoryStore> MemoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store: Arc::new(store) }
    }

    /// Validate and persist a new memory, then sweep stale low-importance
    /// records for the same pair.
    pub fn store(
        &self,
        agent_id: &str,
        user_id: &str,
        memory: NewMemory,
    ) -> Result<MemoryRecord, MemoryError> {
        let Some(kind) = MemoryType::parse(&memory.kind) else {
            return Err(MemoryError::UnknownType(memory.kind));
        };
        if memory.content.trim().is_empty() {
            return Err(MemoryError::EmptyContent);
        }

        let emotional_context = memory
            .emotional_context
            .unwrap_or_else(|| "neutral".to_string());
        let record = MemoryRecord {
            id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            user_id: user_id.to_string(),
            kind,
            tags: derive_tags(&memory.content),
            importance: initial_importance(&memory.kind, &emotional_context),
            content: memory.content,
            emotional_context,
            created_at: Utc::now(),
            archived: false,
            forgotten: false,
        };
        tracing::debug!(
            agent = agent_id,
            user = user_id,
            kind = ?record.kind,
            importance = record.importance,
            "Storing memory"
        );
        self.store.insert(record.clone());
        self.sweep(agent_id, user_id, Utc::now());
        Ok(record)
    }

    /// Relevance-ordered retrieval with the decay gate applied.
    pub fn retrieve(
        &self,
        agent_id: &str,
        user_id: &str,
        context: &RetrievalContext,
    ) -> Vec<MemoryRecord> {
        let now = Utc::now();
        let threshold = context.min_importance;

        let mut records: Vec<MemoryRecord> = self
            .store
            .list(agent_id, user_id)
            .into_iter()
            .filter(|r| !r.archived && !r.forgotten)
            .filter(|r| match &context.types {
                Some(types) => types.contains(&r.kind),
                None => true,
            })
            .filter(|r| match &context.emotional_context {
                Some(ctx) => &r.emotional_context == ctx,
                None => true,
            })
            .filter(|r| r.importance >= threshold)
            .filter(|r| match context.within_days {
                Some(days) => r.days_old(now) <= days,
                None => true,
            })
            .filter(|r| !decayed_out(r, threshold, now))
            .collect();

        records.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then(b.created_at.cmp(&a.created_at))
        });

        if let Some(emotion) = &context.current_emotion {
            // Stable partition keeps relative order within each group.
            let (matching, rest): (Vec<_>, Vec<_>) = records
                .into_iter()
                .partition(|r| &r.emotional_context == emotion);
            records = matching;
            records.extend(rest);
        }

        records.truncate(context.limit);
        records
    }

    /// Apply rating feedback to one memory's importance atomically.
    pub fn update_importance(&self, id: Uuid, rating: u8) -> Option<MemoryRecord> {
        let delta: i16 = match rating {
            4 | 5 => 2,
            3 => 1,
            1 | 2 => -1,
            _ => 0,
        };
        let updated = self.store.update(id, &mut |record| {
            record.importance = (record.importance as i16 + delta).clamp(0, 10) as u8;
        });
        if updated {
            self.store.find(id)
        } else {
            None
        }
    }

    /// Soft-delete: identity stays, content and importance are irreversibly
    /// overwritten. Returns false if the record does not exist.
    pub fn forget(&self, id: Uuid, reason: &str) -> bool {
        let forgotten = self.store.update(id, &mut |record| {
            record.content = FORGOTTEN_MARKER.to_string();
            record.importance = 0;
            record.forgotten = true;
        });
        if forgotten {
            tracing::info!(memory = %id, reason = reason, "Memory forgotten");
        }
        forgotten
    }

    /// Group live memories matching a theme and derive commentary from
    /// fixed thresholds. None when nothing matches.
    pub fn cluster_by_theme(
        &self,
        agent_id: &str,
        user_id: &str,
        theme: &str,
    ) -> Option<MemoryCluster> {
        let needle = theme.to_lowercase();
        let memories: Vec<MemoryRecord> = self
            .store
            .list(agent_id, user_id)
            .into_iter()
            .filter(|r| !r.archived && !r.forgotten)
            .filter(|r| {
                r.content.to_lowercase().contains(&needle) || r.tags.contains(&needle)
            })
            .collect();
        if memories.is_empty() {
            return None;
        }

        let count = memories.len();
        let avg_importance =
            memories.iter().map(|r| r.importance as f64).sum::<f64>() / count as f64;

        let mut insights = Vec::new();
        if count > 3 {
            insights.push(format!(
                "'{}' is a recurring theme across {} memories.",
                theme, count
            ));
        }
        if avg_importance > 7.0 {
            insights.push("Memories on this theme carry significant importance.".to_string());
        }

        let mut patterns = Vec::new();
        if let Some(dominant) = dominant_emotion(&memories) {
            patterns.push(format!("This theme often arises when feeling {}.", dominant));
        }

        let recommendations = if count > 3 {
            vec!["Consider revisiting this theme in conversation.".to_string()]
        } else {
            vec!["Keep noting memories on this theme to build a clearer picture.".to_string()]
        };

        Some(MemoryCluster {
            theme: theme.to_string(),
            memories,
            insights,
            patterns,
            recommendations,
        })
    }

    /// Archive records older than the age cutoff whose importance stayed low.
    fn sweep(&self, agent_id: &str, user_id: &str, now: DateTime<Utc>) {
        for record in self.store.list(agent_id, user_id) {
            if !record.archived
                && record.days_old(now) > ARCHIVE_AGE_DAYS
                && record.importance < ARCHIVE_IMPORTANCE_FLOOR
            {
                self.store.update(record.id, &mut |r| r.archived = true);
            }
        }
    }
}

/// Dual decay gate: a record is dropped only when its decayed importance
/// falls below the threshold AND the decay factor itself is below 0.5.
/// A record failing only the first test is still returned.
fn decayed_out(record: &MemoryRecord, threshold: u8, now: DateTime<Utc>) -> bool {
    let decay_factor = 1.0 - record.days_old(now) as f64 * DECAY_PER_DAY;
    let effective = record.importance as f64 * decay_factor;
    effective < threshold as f64 && decay_factor < 0.5
}

/// Most common non-neutral emotional context, if it covers at least half
/// the memories.
fn dominant_emotion(memories: &[MemoryRecord]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for record in memories {
        if record.emotional_context == "neutral" {
            continue;
        }
        match counts.iter_mut().find(|(e, _)| *e == record.emotional_context) {
            Some((_, n)) => *n += 1,
            None => counts.push((&record.emotional_context, 1)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|&(_, n)| n)
        .filter(|&(_, n)| n * 2 >= memories.len())
        .map(|(e, _)| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> MemoryService {
        MemoryService::default()
    }

    fn aged_record(
        service: &MemoryService,
        importance: u8,
        days_old: i64,
    ) -> Uuid {
        let record = MemoryRecord {
            id: Uuid::new_v4(),
            agent_id: "a1".to_string(),
            user_id: "u1".to_string(),
            kind: MemoryType::Fact,
            content: "remembers the lake trip".to_string(),
            emotional_context: "neutral".to_string(),
            importance,
            tags: derive_tags("remembers the lake trip"),
            created_at: Utc::now() - Duration::days(days_old),
            archived: false,
            forgotten: false,
        };
        let id = record.id;
        service.store.insert(record);
        id
    }

    #[test]
    fn test_store_rejects_unknown_type() {
        let service = service();
        let result = service.store("a1", "u1", NewMemory::new("achievement", "won the race"));
        assert!(matches!(result, Err(MemoryError::UnknownType(_))));
        assert!(service.retrieve("a1", "u1", &RetrievalContext::default()).is_empty());
    }

    #[test]
    fn test_store_rejects_empty_content() {
        let service = service();
        let result = service.store("a1", "u1", NewMemory::new("fact", "   "));
        assert!(matches!(result, Err(MemoryError::EmptyContent)));
    }

    #[test]
    fn test_store_derives_importance_and_tags() {
        let service = service();
        let record = service
            .store(
                "a1",
                "u1",
                NewMemory::new("preference", "loves hiking near mountain lakes")
                    .with_emotional_context("happy"),
            )
            .unwrap();
        // 5 base + 2 emotional + 1 preference.
        assert_eq!(record.importance, 8);
        assert_eq!(record.tags, vec!["loves", "hiking", "near", "mountain", "lakes"]);
    }

    #[test]
    fn test_decayed_importance_still_above_threshold_is_returned() {
        let service = service();
        // Importance 8, 10 days old: 8 × 0.99 = 7.92, above the default
        // threshold of 5.
        let id = aged_record(&service, 8, 10);
        let results = service.retrieve("a1", "u1", &RetrievalContext::default());
        assert!(results.iter().any(|r| r.id == id));
    }

    #[test]
    fn test_decay_gate_is_dual() {
        let service = service();
        // 100 days: factor 0.9, effective 5 × 0.9 = 4.5 < 5, but the factor
        // stays above 0.5, so the record is still returned.
        let kept = aged_record(&service, 5, 100);
        // 600 days: factor 0.4, effective 9 × 0.4 = 3.6 < 5 and factor below
        // 0.5, so the record is dropped.
        let dropped = aged_record(&service, 9, 600);
        let results = service.retrieve("a1", "u1", &RetrievalContext::default());
        assert!(results.iter().any(|r| r.id == kept));
        assert!(!results.iter().any(|r| r.id == dropped));
    }

    #[test]
    fn test_retrieve_sorts_and_limits() {
        let service = service();
        aged_record(&service, 6, 1);
        aged_record(&service, 9, 1);
        aged_record(&service, 7, 1);
        let mut context = RetrievalContext::default();
        context.limit = 2;
        let results = service.retrieve("a1", "u1", &context);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].importance, 9);
        assert_eq!(results[1].importance, 7);
    }

    #[test]
    fn test_retrieve_promotes_current_emotion() {
        let service = service();
        service
            .store("a1", "u1", NewMemory::new("fact", "calm morning walks").with_emotional_context("calm"))
            .unwrap();
        service
            .store("a1", "u1", NewMemory::new("goal", "finish the marathon").with_emotional_context("excited"))
            .unwrap();
        let context = RetrievalContext {
            current_emotion: Some("calm".to_string()),
            ..Default::default()
        };
        let results = service.retrieve("a1", "u1", &context);
        assert_eq!(results[0].emotional_context, "calm");
    }

    #[test]
    fn test_retrieve_filters_by_type() {
        let service = service();
        service.store("a1", "u1", NewMemory::new("goal", "learn the violin this year").with_emotional_context("excited")).unwrap();
        service.store("a1", "u1", NewMemory::new("fact", "plays piano well").with_emotional_context("happy")).unwrap();
        let context = RetrievalContext {
            types: Some(vec![MemoryType::Goal]),
            ..Default::default()
        };
        let results = service.retrieve("a1", "u1", &context);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, MemoryType::Goal);
    }

    #[test]
    fn test_forget_tombstones_and_hides() {
        let service = service();
        let record = service
            .store("a1", "u1", NewMemory::new("quirk", "hums while thinking").with_emotional_context("happy"))
            .unwrap();
        assert!(service.forget(record.id, "user_request"));

        let stored = service.store.find(record.id).unwrap();
        assert_eq!(stored.content, FORGOTTEN_MARKER);
        assert_eq!(stored.importance, 0);

        let mut context = RetrievalContext::default();
        context.min_importance = 0;
        assert!(service
            .retrieve("a1", "u1", &context)
            .iter()
            .all(|r| r.id != record.id));
    }

    #[test]
    fn test_forget_unknown_returns_false() {
        assert!(!service().forget(Uuid::new_v4(), "user_request"));
    }

    #[test]
    fn test_update_importance_mapping_and_clamp() {
        let service = service();
        let id = aged_record(&service, 9, 0);
        assert_eq!(service.update_importance(id, 5).unwrap().importance, 10);
        assert_eq!(service.update_importance(id, 3).unwrap().importance, 10);
        assert_eq!(service.update_importance(id, 1).unwrap().importance, 9);
        assert_eq!(service.update_importance(id, 0).unwrap().importance, 9);
        assert!(service.update_importance(Uuid::new_v4(), 5).is_none());
    }

    #[test]
    fn test_sweep_archives_stale_low_importance() {
        let service = service();
        let stale = aged_record(&service, 1, 120);
        let old_but_important = aged_record(&service, 8, 120);
        // Any store triggers the sweep for the pair.
        service.store("a1", "u1", NewMemory::new("fact", "drinks green tea daily")).unwrap();

        assert!(service.store.find(stale).unwrap().archived);
        assert!(!service.store.find(old_but_important).unwrap().archived);
    }

    #[test]
    fn test_cluster_none_without_matches() {
        assert!(service().cluster_by_theme("a1", "u1", "travel").is_none());
    }

    #[test]
    fn test_cluster_insights_thresholds() {
        let service = service();
        for i in 0..4 {
            service
                .store(
                    "a1",
                    "u1",
                    NewMemory::new("experience", format!("travel memory number {}", i))
                        .with_emotional_context("excited"),
                )
                .unwrap();
        }
        let cluster = service.cluster_by_theme("a1", "u1", "travel").unwrap();
        assert_eq!(cluster.memories.len(), 4);
        // 4 matches > 3 and average importance 7 is not > 7.
        assert!(cluster.insights.iter().any(|i| i.contains("recurring theme")));
        assert!(!cluster.insights.iter().any(|i| i.contains("significant importance")));
        assert!(cluster.patterns.iter().any(|p| p.contains("excited")));
    }
}
