//! plauder-auth – Registrierung und Anmeldung
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id (konfigurierbare Kosten)
//! - Prozessweite Geheimnisse (Registrierungscode, Speicherschluessel)
//! - In-Memory-Benutzerspeicher mit atomarem Insert-if-absent
//! - AuthService (Code-Pruefung, Registrierung, Login ohne Username-Enumeration)

pub mod error;
pub mod geheimnis;
pub mod password;
pub mod service;
pub mod store;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use geheimnis::{zufalls_hex, RegistrierungsCode, Speicherschluessel};
pub use password::{HashParameter, PasswortHasher};
pub use service::AuthService;
pub use store::{BenutzerSpeicher, VersiegelterSpeicher};
