//! Angemeldete Sessions

use tokio::sync::mpsc;
use uuid::Uuid;

/// Prozessweit eindeutige Session-ID
///
/// Anzeigenamen sind nicht eindeutig (derselbe Benutzer kann sich mehrfach
/// anmelden), deshalb fuehrt die Registry Sessions unter dieser ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Eine angemeldete Verbindung
///
/// Gehoert exklusiv ihrer `ClientConnection`. Die Registry haelt nur den
/// Sender zum `posteingang`.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub username: String,
    /// Zeilen, die andere Verbindungen fuer diese Session eingereiht haben
    pub posteingang: mpsc::Receiver<String>,
}

impl Session {
    pub fn neu(id: SessionId, username: String, posteingang: mpsc::Receiver<String>) -> Self {
        Self {
            id,
            username,
            posteingang,
        }
    }
}
