//! Gemeinsamer Server-Kontext
//!
//! Wird einmal beim Start gebaut und als `Arc` an jede Verbindung gereicht.
//! Ersetzt prozessweite globale Variablen: Registrierungscode und
//! Benutzerspeicher stecken im `AuthService`, die Sessions in der Registry.

use plauder_auth::AuthService;
use plauder_protocol::STANDARD_MAX_ZEILENLAENGE;
use std::sync::Arc;
use std::time::Duration;

use crate::registry::{SessionRegistry, STANDARD_QUEUE_GROESSE};

/// Standard-Schreib-Timeout pro Zeile
pub const STANDARD_SCHREIB_TIMEOUT: Duration = Duration::from_secs(10);

/// Konfiguration fuer Verbindungen und Listener
#[derive(Debug, Clone)]
pub struct ChatKonfig {
    /// Maximale gleichzeitige Verbindungen (auch unangemeldete)
    pub max_verbindungen: usize,
    /// Maximale Laenge einer Eingabezeile in Bytes
    pub max_zeilenlaenge: usize,
    /// Trennen nach so langer Stille des Clients (`None` = nie)
    pub leerlauf_timeout: Option<Duration>,
    /// Groesse des Posteingangs pro Session, bei Ueberlauf wird verdraengt
    pub sende_queue_groesse: usize,
    /// Maximale Dauer fuer das Schreiben einer Zeile an den Client
    pub schreib_timeout: Duration,
}

impl Default for ChatKonfig {
    fn default() -> Self {
        Self {
            max_verbindungen: 256,
            max_zeilenlaenge: STANDARD_MAX_ZEILENLAENGE,
            leerlauf_timeout: None,
            sende_queue_groesse: STANDARD_QUEUE_GROESSE,
            schreib_timeout: STANDARD_SCHREIB_TIMEOUT,
        }
    }
}

/// Gemeinsamer Server-Kontext (thread-safe, Arc-geteilt)
pub struct ServerKontext {
    pub konfig: ChatKonfig,
    /// Registrierungscode, Benutzerspeicher, Passwort-Hashing
    pub auth: AuthService,
    /// Alle angemeldeten Sessions
    pub registry: SessionRegistry,
}

impl ServerKontext {
    pub fn neu(konfig: ChatKonfig, auth: AuthService) -> Arc<Self> {
        let registry = SessionRegistry::mit_queue_groesse(konfig.sende_queue_groesse);
        Arc::new(Self {
            konfig,
            auth,
            registry,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_auth(code: &str) -> AuthService {
    use plauder_auth::{
        HashParameter, PasswortHasher, RegistrierungsCode, Speicherschluessel,
        VersiegelterSpeicher,
    };

    let speicher = Arc::new(VersiegelterSpeicher::neu(
        &Speicherschluessel::generieren().expect("Schluessel"),
    ));
    let hasher = PasswortHasher::neu(HashParameter {
        speicher_kib: 8,
        iterationen: 1,
        parallelitaet: 1,
    })
    .expect("Test-Parameter");
    AuthService::neu(speicher, hasher, RegistrierungsCode::neu(code)).expect("AuthService")
}
