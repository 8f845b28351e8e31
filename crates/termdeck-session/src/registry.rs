//! Ordered, capped collection of sessions.

use tracing::{debug, error, info, warn};

use termdeck_core::{CommandSpec, Error, Result, SessionId};
use termdeck_host::ProcessHost;

use crate::session::Session;

/// Owns every session, in display order.
///
/// Insertion order is the order shown in the session list and the order the
/// `1`..`9` shortcuts index into. Removing a session keeps the relative
/// order of the rest.
pub struct SessionRegistry {
    host: Box<dyn ProcessHost>,
    sessions: Vec<Session>,
    max_sessions: usize,
}

impl SessionRegistry {
    /// Create an empty registry spawning through `host`.
    pub fn new(host: Box<dyn ProcessHost>, max_sessions: usize) -> Self {
        Self {
            host,
            sessions: Vec::new(),
            max_sessions,
        }
    }

    /// Spawn a session and append it.
    ///
    /// Fails with `CapacityExceeded` at the cap, or with the host's error;
    /// either way nothing is added.
    pub fn create(&mut self, spec: &CommandSpec) -> Result<&mut Session> {
        if self.is_full() {
            warn!(
                "Session limit reached: {}/{}",
                self.sessions.len(),
                self.max_sessions
            );
            return Err(Error::CapacityExceeded(self.max_sessions));
        }

        let id = SessionId::new();
        let handle = self.host.spawn(id, spec).map_err(|e| {
            error!("Failed to spawn session {}: {}", id, e);
            e
        })?;

        assert!(
            self.index_of(id).is_none(),
            "duplicate session id {id} in registry"
        );
        self.sessions.push(Session::new(id, handle));
        info!(
            "Session added: id={}, index={}, count={}",
            id,
            self.sessions.len() - 1,
            self.sessions.len()
        );

        let index = self.sessions.len() - 1;
        Ok(&mut self.sessions[index])
    }

    /// Remove a session, returning the index it occupied.
    pub fn remove(&mut self, id: SessionId) -> Result<usize> {
        let index = self.index_of(id).ok_or(Error::SessionNotFound(id))?;
        let session = self.sessions.remove(index);
        info!(
            "Session removed: id={}, index={}, remaining={}",
            id,
            index,
            self.sessions.len()
        );
        debug!("Dropping session handle: {:?}", session);
        Ok(index)
    }

    /// Display index of a session.
    pub fn index_of(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id() == id)
    }

    /// Whether a session is registered.
    pub fn contains(&self, id: SessionId) -> bool {
        self.index_of(id).is_some()
    }

    /// Number of sessions.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether another session would exceed the cap.
    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.max_sessions
    }

    /// Session at a display index.
    pub fn at(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index)
    }

    /// All sessions in display order.
    pub fn all(&self) -> &[Session] {
        &self.sessions
    }

    /// Look up a session.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    /// Look up a session for mutation.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }

    /// Rename a session. A blank name clears it.
    pub fn rename(&mut self, id: SessionId, name: &str) -> Result<()> {
        let session = self.get_mut(id).ok_or(Error::SessionNotFound(id))?;
        session.set_name(name);
        Ok(())
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions)
            .field("max_sessions", &self.max_sessions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termdeck_host::testing::{FakeControl, FakeHost};

    fn registry(max: usize) -> (SessionRegistry, FakeControl) {
        let host = FakeHost::new();
        let control = host.control();
        (SessionRegistry::new(Box::new(host), max), control)
    }

    fn spec() -> CommandSpec {
        CommandSpec::new("/bin/sh")
    }

    #[test]
    fn test_registry_starts_empty() {
        let (registry, _) = registry(8);
        assert_eq!(registry.count(), 0);
        assert!(registry.is_empty());
        assert!(registry.at(0).is_none());
    }

    #[test]
    fn test_create_appends_in_order() {
        let (mut registry, control) = registry(8);
        let a = registry.create(&spec()).unwrap().id();
        let b = registry.create(&spec()).unwrap().id();

        assert_eq!(registry.index_of(a), Some(0));
        assert_eq!(registry.index_of(b), Some(1));
        assert_eq!(control.spawned().len(), 2);
        assert_eq!(control.spawned()[1].0, b);
    }

    #[test]
    fn test_create_at_cap_fails() {
        let (mut registry, control) = registry(2);
        registry.create(&spec()).unwrap();
        registry.create(&spec()).unwrap();

        let result = registry.create(&spec());
        assert!(matches!(result, Err(Error::CapacityExceeded(2))));
        assert_eq!(registry.count(), 2);
        assert_eq!(control.spawned().len(), 2);
    }

    #[test]
    fn test_spawn_failure_adds_nothing() {
        let (mut registry, control) = registry(8);
        control.fail_next_spawn("exec failed");

        let result = registry.create(&spec());
        assert!(matches!(result, Err(Error::SpawnFailure(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_preserves_order() {
        let (mut registry, _) = registry(8);
        let ids: Vec<_> = (0..4)
            .map(|_| registry.create(&spec()).unwrap().id())
            .collect();

        assert_eq!(registry.remove(ids[1]).unwrap(), 1);
        let remaining: Vec<_> = registry.all().iter().map(|s| s.id()).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_remove_unknown() {
        let (mut registry, _) = registry(8);
        let id = SessionId::new();
        assert!(matches!(
            registry.remove(id),
            Err(Error::SessionNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_rename() {
        let (mut registry, _) = registry(8);
        let id = registry.create(&spec()).unwrap().id();

        registry.rename(id, "logs").unwrap();
        assert_eq!(registry.get(id).unwrap().name(), Some("logs"));
        assert!(registry.rename(SessionId::new(), "x").is_err());
    }
}
