//! plauder-chat – Verbindungs-Lebenszyklus und Broadcast
//!
//! Dieses Crate implementiert den Kern des Chat-Servers: den Zustandsautomaten
//! jeder Verbindung, die Registry der angemeldeten Sessions und das Verteilen
//! von Nachrichten an alle anderen Teilnehmer.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (ChatServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Zustandsautomat: WartetAufWahl -> Registrierung/Anmeldung -> Chat -> Geschlossen
//!     |
//!     +-- AuthService        (Code-Pruefung, Registrierung, Login)
//!     +-- SessionRegistry    (hinzufuegen, entfernen, an alle ausser einem senden)
//! ```

pub mod connection;
pub mod error;
pub mod registry;
pub mod server_state;
pub mod session;
pub mod tcp;
pub mod zustand;

// Bequeme Re-Exporte
pub use connection::ClientConnection;
pub use error::{ChatError, ChatResult};
pub use registry::SessionRegistry;
pub use server_state::{ChatKonfig, ServerKontext};
pub use session::{Session, SessionId};
pub use tcp::ChatServer;
pub use zustand::{uebergang, Schritt, Zustand};
