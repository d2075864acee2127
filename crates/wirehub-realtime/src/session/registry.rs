//! Session registry — concurrency-safe map from session ID to handle.

use std::sync::Arc;

use dashmap::DashMap;

use wirehub_core::SessionId;

use super::handle::SessionHandle;

/// Thread-safe registry of live sessions.
///
/// Entry operations are atomic: a given entry is yielded by `remove` exactly
/// once even under racing removers, and the handle carries the session's
/// single cancellation token, so removal retires both together.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
}

impl SessionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to the registry.
    pub fn register(&self, handle: Arc<SessionHandle>) {
        self.sessions.insert(handle.id, handle);
    }

    /// Get a session by ID.
    pub fn lookup(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a session. No-op if absent; the entry is returned to exactly
    /// one caller.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    /// Remove every session, returning the drained handles.
    pub fn remove_all(&self) -> Vec<Arc<SessionHandle>> {
        let ids: Vec<SessionId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Returns all tracked session IDs.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::handle::Outbound;
    use tokio::sync::mpsc;

    fn new_handle() -> Arc<SessionHandle> {
        let (tx, _rx) = mpsc::channel::<Outbound>(4);
        Arc::new(SessionHandle::new(SessionId::new(), tx))
    }

    #[test]
    fn register_lookup_remove() {
        let registry = SessionRegistry::new();
        let handle = new_handle();
        let id = handle.id;

        registry.register(handle);
        assert!(registry.lookup(&id).is_some());
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&id).is_some());
        assert!(registry.lookup(&id).is_none());
        assert!(registry.remove(&id).is_none());
    }

    #[test]
    fn remove_unknown_is_noop() {
        let registry = SessionRegistry::new();
        registry.register(new_handle());
        assert!(registry.remove(&SessionId::new()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_all_drains() {
        let registry = SessionRegistry::new();
        for _ in 0..5 {
            registry.register(new_handle());
        }
        let drained = registry.remove_all();
        assert_eq!(drained.len(), 5);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn concurrent_registers_do_not_lose_entries() {
        let registry = Arc::new(SessionRegistry::new());
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let handle = new_handle();
                let id = handle.id;
                registry.register(handle);
                id
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }

        assert_eq!(registry.len(), 32);
        for id in &ids {
            assert!(registry.lookup(id).is_some());
        }
    }

    #[tokio::test]
    async fn racing_removers_get_the_entry_once() {
        let registry = Arc::new(SessionRegistry::new());
        let handle = new_handle();
        let id = handle.id;
        registry.register(handle);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move { registry.remove(&id).is_some() }));
        }

        let mut wins = 0;
        for task in tasks {
            if task.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert!(registry.is_empty());
    }
}
