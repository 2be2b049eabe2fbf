use super::state::AnalysisSession;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Arena of live sessions keyed by id.
///
/// Handing out `&mut AnalysisSession` keeps each session exclusively owned by
/// the call path that borrowed it.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, AnalysisSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session and return its id
    pub fn insert(&mut self, session: AnalysisSession) -> Uuid {
        let id = session.id();
        debug!("Registering session {}", id);
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&AnalysisSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut AnalysisSession> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<AnalysisSession> {
        debug!("Removing session {}", id);
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
