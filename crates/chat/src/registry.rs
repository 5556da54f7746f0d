//! Session-Registry – Wer ist angemeldet, wer bekommt Broadcasts
//!
//! Die Registry haelt fuer jede angemeldete Session einen Sender auf deren
//! Posteingang. Broadcasts reihen die Zeile nur nicht-blockierend in die
//! Queues ein; das eigentliche Schreiben auf den Socket uebernimmt der Task
//! der Empfaenger-Verbindung.
//!
//! ## Ueberlauf
//! Ist ein Posteingang voll, wird die Session verdraengt: sie fliegt noch
//! unter demselben Lock aus der Registry und alle uebrigen bekommen ihren
//! Abschied. Ihr Task sieht danach den geschlossenen Posteingang und beendet
//! die Verbindung. Jede registrierte Session erhaelt damit jede Zeile oder
//! ist nicht mehr registriert.
//!
//! ## Reihenfolge
//! Alle Operationen laufen unter einem einzigen Mutex. Zwei Broadcasts
//! erreichen jeden Empfaenger deshalb in derselben Reihenfolge, in der die
//! Registry sie verarbeitet hat.

use parking_lot::Mutex;
use plauder_protocol::nachrichten;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::session::SessionId;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Standard-Groesse des Posteingangs pro Session
pub const STANDARD_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// SessionSender
// ---------------------------------------------------------------------------

/// Ergebnis einer einzelnen Zustellung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zustellung {
    Zugestellt,
    /// Queue voll, die Session muss verdraengt werden
    Voll,
    /// Empfaenger-Task ist schon weg und entfernt sich selbst
    Geschlossen,
}

/// Handle auf den Posteingang einer angemeldeten Session
#[derive(Clone, Debug)]
struct SessionSender {
    username: String,
    tx: mpsc::Sender<String>,
}

impl SessionSender {
    /// Reiht eine Zeile nicht-blockierend ein
    fn senden(&self, id: &SessionId, zeile: String) -> Zustellung {
        match self.tx.try_send(zeile) {
            Ok(()) => Zustellung::Zugestellt,
            Err(mpsc::error::TrySendError::Full(_)) => Zustellung::Voll,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    session = %id,
                    username = %self.username,
                    "Posteingang geschlossen (Client getrennt)"
                );
                Zustellung::Geschlossen
            }
        }
    }
}

type Sessions = HashMap<SessionId, SessionSender>;

/// Verteilt eine Zeile und sammelt die Sessions mit vollem Posteingang
fn verteilen(
    sessions: &Sessions,
    zeile: &str,
    ausgeschlossen: Option<&SessionId>,
    voll: &mut Vec<SessionId>,
) -> usize {
    let mut gesendet = 0;
    for (id, sender) in sessions {
        if Some(id) == ausgeschlossen {
            continue;
        }
        match sender.senden(id, zeile.to_string()) {
            Zustellung::Zugestellt => gesendet += 1,
            Zustellung::Voll => voll.push(*id),
            Zustellung::Geschlossen => {}
        }
    }
    gesendet
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Registry aller angemeldeten Sessions
///
/// Thread-safe via Arc + Mutex. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    sessions: Mutex<Sessions>,
    queue_groesse: usize,
}

impl SessionRegistry {
    pub fn neu() -> Self {
        Self::mit_queue_groesse(STANDARD_QUEUE_GROESSE)
    }

    /// Erstellt eine Registry mit eigener Posteingangs-Groesse
    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: Mutex::new(HashMap::new()),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Registriert eine Session als Broadcast-Ziel und gibt ihren Posteingang zurueck
    pub fn hinzufuegen(&self, id: SessionId, username: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        let sender = SessionSender {
            username: username.to_string(),
            tx,
        };
        self.inner.sessions.lock().insert(id, sender);
        tracing::debug!(session = %id, username = %username, "Session registriert");
        rx
    }

    /// Entfernt eine Session
    ///
    /// Idempotent: gibt `false` zurueck wenn die Session nicht (mehr) registriert
    /// war, etwa weil sie verdraengt wurde.
    pub fn entfernen(&self, id: &SessionId) -> bool {
        let entfernt = self.inner.sessions.lock().remove(id).is_some();
        if entfernt {
            tracing::debug!(session = %id, "Session entfernt");
        }
        entfernt
    }

    /// Sendet eine Zeile an alle registrierten Sessions ausser einer
    ///
    /// Sessions mit vollem Posteingang werden verdraengt und ihr Abschied an
    /// alle uebrigen verteilt (auch an `ausgeschlossen`). Gibt die Anzahl der
    /// Zustellungen der urspruenglichen Zeile zurueck.
    pub fn an_alle_ausser_senden(&self, zeile: &str, ausgeschlossen: &SessionId) -> usize {
        let mut sessions = self.inner.sessions.lock();
        let mut voll = Vec::new();
        let gesendet = verteilen(&sessions, zeile, Some(ausgeschlossen), &mut voll);

        // Ein Abschied kann weitere volle Queues treffen
        while let Some(id) = voll.pop() {
            let Some(sender) = sessions.remove(&id) else {
                continue;
            };
            tracing::warn!(
                session = %id,
                username = %sender.username,
                "Posteingang voll – Session verdraengt"
            );
            let abschied = nachrichten::verlassen(&sender.username);
            verteilen(&sessions, &abschied, None, &mut voll);
        }

        gesendet
    }

    /// Gibt die Anzahl der registrierten Sessions zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Prueft ob eine Session registriert ist
    pub fn ist_registriert(&self, id: &SessionId) -> bool {
        self.inner.sessions.lock().contains_key(id)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
