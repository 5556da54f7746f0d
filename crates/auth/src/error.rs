//! Fehlertypen fuer den Auth-Service

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Service
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Authentifizierung ---
    #[error("Benutzername oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    #[error("Registrierungscode ungueltig")]
    UngueltigerCode,

    // --- Benutzerverwaltung ---
    #[error("Benutzername bereits vergeben: {0}")]
    BenutzernameVergeben(String),

    // --- Speicher ---
    #[error("Speicherfehler: {0}")]
    Speicher(String),

    // --- Zufall ---
    #[error("Zufallsquelle nicht verfuegbar: {0}")]
    Zufall(String),
}

impl AuthError {
    pub fn speicher(msg: impl Into<String>) -> Self {
        Self::Speicher(msg.into())
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;
