use std::collections::HashMap;

use thiserror::Error;

use crate::db_types::UserId;

/// The map of live pairings. A session between `a` and `b` is stored as the two symmetric entries
/// `a → b` and `b → a`; every mutation installs or removes both directions together, so the map
/// can never hold one direction without the other.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    partners: HashMap<UserId, UserId>,
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("{0} is already in a session")]
    AlreadyActive(UserId),
    #[error("Cannot start a session with yourself")]
    SelfPairing,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live sessions (not the number of participants).
    pub fn len(&self) -> usize {
        self.partners.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    pub fn is_active(&self, user_id: UserId) -> bool {
        self.partners.contains_key(&user_id)
    }

    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        self.partners.get(&user_id).copied()
    }

    /// Installs both directions of a new pairing. Neither side may already be in a session.
    pub fn start(&mut self, a: UserId, b: UserId) -> Result<(), SessionError> {
        if a == b {
            return Err(SessionError::SelfPairing);
        }
        if self.is_active(a) {
            return Err(SessionError::AlreadyActive(a));
        }
        if self.is_active(b) {
            return Err(SessionError::AlreadyActive(b));
        }
        self.partners.insert(a, b);
        self.partners.insert(b, a);
        Ok(())
    }

    /// Removes both directions of the user's session, returning the former partner. `None` means
    /// the user had no active session and nothing changed.
    pub fn end(&mut self, user_id: UserId) -> Option<UserId> {
        let partner = self.partners.remove(&user_id)?;
        self.partners.remove(&partner);
        Some(partner)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sessions_are_symmetric() {
        let mut reg = SessionRegistry::new();
        reg.start(UserId(1), UserId(2)).unwrap();
        assert_eq!(reg.partner_of(UserId(1)), Some(UserId(2)));
        assert_eq!(reg.partner_of(UserId(2)), Some(UserId(1)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn busy_users_cannot_start_another_session() {
        let mut reg = SessionRegistry::new();
        reg.start(UserId(1), UserId(2)).unwrap();
        assert!(matches!(reg.start(UserId(1), UserId(3)), Err(SessionError::AlreadyActive(UserId(1)))));
        assert!(matches!(reg.start(UserId(3), UserId(2)), Err(SessionError::AlreadyActive(UserId(2)))));
        assert!(matches!(reg.start(UserId(3), UserId(3)), Err(SessionError::SelfPairing)));
    }

    #[test]
    fn ending_removes_both_directions() {
        let mut reg = SessionRegistry::new();
        reg.start(UserId(1), UserId(2)).unwrap();
        assert_eq!(reg.end(UserId(1)), Some(UserId(2)));
        assert!(!reg.is_active(UserId(1)));
        assert!(!reg.is_active(UserId(2)));
        assert_eq!(reg.end(UserId(2)), None);
    }
}
