use std::sync::Arc;

use dashmap::DashMap;
use surrealdb::sql::Thing;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// Per-record async locks. Callers that need several must take them in the
/// order participant, task, content item.
#[derive(Debug, Default, Clone)]
pub struct EntityLocks {
    table: Arc<LockTable>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, record: &Thing) -> EntityGuard {
        let key = record.to_string();
        let mutex = self
            .table
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        EntityGuard {
            table: self.table.clone(),
            key,
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

pub struct EntityGuard {
    table: Arc<LockTable>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntityGuard {
    fn drop(&mut self) {
        self.guard.take();
        // nobody else holds or waits on it when only the table references it
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
