//! Persistence seam for memory records
//!
//! The trait is the abstract store surface; the bundled implementation keeps
//! everything in a concurrent map keyed by (agent, user). Mutations go
//! through `update`, which holds the shard lock for the whole read-modify-
//! write so concurrent feedback events cannot lose updates.

use dashmap::DashMap;
use uuid::Uuid;

use super::types::MemoryRecord;

pub trait MemoryStore: Send + Sync {
    fn insert(&self, record: MemoryRecord);

    fn find(&self, id: Uuid) -> Option<MemoryRecord>;

    /// Atomically mutate one record. Returns false if the id is unknown.
    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut MemoryRecord)) -> bool;

    /// All records for one (agent, user) pair, unfiltered.
    fn list(&self, agent_id: &str, user_id: &str) -> Vec<MemoryRecord>;
}

#[derive(Default)]
pub struct InMemoryStore {
    records: DashMap<(String, String), Vec<MemoryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStore for InMemoryStore {
    fn insert(&self, record: MemoryRecord) {
        let key = (record.agent_id.clone(), record.user_id.clone());
        self.records.entry(key).or_default().push(record);
    }

    fn find(&self, id: Uuid) -> Option<MemoryRecord> {
        self.records
            .iter()
            .find_map(|entry| entry.value().iter().find(|r| r.id == id).cloned())
    }

    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut MemoryRecord)) -> bool {
        for mut entry in self.records.iter_mut() {
            if let Some(record) = entry.value_mut().iter_mut().find(|r| r.id == id) {
                apply(record);
                return true;
            }
        }
        false
    }

    fn list(&self, agent_id: &str, user_id: &str) -> Vec<MemoryRecord> {
        self.records
            .get(&(agent_id.to_string(), user_id.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}
