//! Fehlertypen fuer den Chat-Kern
//!
//! Alle Fehler bleiben innerhalb des Tasks ihrer Verbindung. Sie beenden
//! diese eine Verbindung und werden nur geloggt.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// IO-Fehler (Socket, zu lange Zeile)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Gegenstelle hat die Verbindung geschlossen
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,

    /// Leerlauf-Timeout abgelaufen
    #[error("Leerlauf-Timeout")]
    Timeout,

    /// Client liest nicht schnell genug
    #[error("Schreib-Timeout")]
    SchreibTimeout,

    /// Posteingang lief ueber, die Registry hat die Session entfernt
    #[error("Posteingang uebergelaufen, Session verdraengt")]
    Verdraengt,
}

impl ChatError {
    /// `true` fuer ein regulaeres Trennen durch den Client
    pub fn ist_regulaer(&self) -> bool {
        matches!(self, Self::VerbindungGetrennt)
    }
}

/// Result-Typ fuer den Chat-Kern
pub type ChatResult<T> = Result<T, ChatError>;
