//! Client-Connection – Verwaltet eine einzelne Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Die Verbindung durchlaeuft zwei Phasen:
//!
//! 1. [`ClientConnection::authentifizieren_oder_registrieren`]: Dialog ueber
//!    den Zustandsautomaten bis zur Anmeldung oder zum Abbruch.
//! 2. [`ClientConnection::weiterleiten`]: eigene Zeilen an alle anderen
//!    verteilen und gleichzeitig den Posteingang auf den Socket schreiben.
//!
//! Der Stream wird auf jedem Ausstiegspfad mit dem `Framed` gedroppt.

use futures_util::{SinkExt, StreamExt};
use plauder_protocol::{nachrichten, ZeilenCodec};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_util::codec::Framed;

use crate::error::{ChatError, ChatResult};
use crate::server_state::ServerKontext;
use crate::session::{Session, SessionId};
use crate::zustand::{begruessung, uebergang, Zustand};

/// Liest die naechste Zeile, optional mit Frist
async fn zeile_lesen<S>(
    framed: &mut Framed<S, ZeilenCodec>,
    frist: Option<Instant>,
) -> ChatResult<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let naechste = match frist {
        Some(frist) => tokio::time::timeout_at(frist, framed.next())
            .await
            .map_err(|_| ChatError::Timeout)?,
        None => framed.next().await,
    };

    match naechste {
        Some(Ok(zeile)) => Ok(zeile),
        Some(Err(e)) => Err(ChatError::Io(e)),
        None => Err(ChatError::VerbindungGetrennt),
    }
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne Verbindung
pub struct ClientConnection {
    kontext: Arc<ServerKontext>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    pub fn neu(kontext: Arc<ServerKontext>, peer_addr: SocketAddr) -> Self {
        Self { kontext, peer_addr }
    }

    /// Fuehrt die Verbindung vom ersten Byte bis zum Schliessen
    pub async fn verarbeiten<S>(self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let peer_addr = self.peer_addr;
        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let codec = ZeilenCodec::mit_max_laenge(self.kontext.konfig.max_zeilenlaenge);
        let mut framed = Framed::new(stream, codec);

        if let Some(session) = self.authentifizieren_oder_registrieren(&mut framed).await {
            self.weiterleiten(session, &mut framed).await;
        }

        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }

    /// Schreibt eine Zeile, begrenzt durch den Schreib-Timeout
    async fn schreiben<S, T>(&self, framed: &mut Framed<S, ZeilenCodec>, zeile: T) -> ChatResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        T: AsRef<str>,
    {
        tokio::time::timeout(self.kontext.konfig.schreib_timeout, framed.send(zeile))
            .await
            .map_err(|_| ChatError::SchreibTimeout)?
            .map_err(ChatError::Io)
    }

    fn lese_frist(&self) -> Option<Instant> {
        self.kontext
            .konfig
            .leerlauf_timeout
            .map(|dauer| Instant::now() + dauer)
    }

    /// Dialog bis zur Anmeldung
    ///
    /// Gibt `None` zurueck wenn die Verbindung im Dialog endet (falsche Wahl,
    /// falscher Code, Registrierung abgeschlossen, Login abgelehnt, Lese- oder
    /// Schreibfehler). Bei `Some` ist die Session bereits registriert und der
    /// Beitritt angekuendigt.
    pub async fn authentifizieren_oder_registrieren<S>(
        &self,
        framed: &mut Framed<S, ZeilenCodec>,
    ) -> Option<Session>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let peer_addr = self.peer_addr;

        for zeile in begruessung() {
            if let Err(e) = self.schreiben(framed, zeile).await {
                tracing::debug!(peer = %peer_addr, fehler = %e, "Begruessung fehlgeschlagen");
                return None;
            }
        }

        let mut zustand = Zustand::WartetAufWahl;
        loop {
            let eingabe = match zeile_lesen(framed, self.lese_frist()).await {
                Ok(eingabe) => eingabe,
                Err(e) => {
                    tracing::debug!(
                        peer = %peer_addr,
                        zustand = ?zustand,
                        fehler = %e,
                        "Dialog abgebrochen"
                    );
                    return None;
                }
            };

            let schritt = uebergang(zustand, &eingabe, &self.kontext.auth);

            // Vor dem Willkommen registrieren: alles, was nach dieser Zeile
            // verteilt wird, landet im Posteingang
            let session = match &schritt.zustand {
                Zustand::Chat { username } => {
                    let id = SessionId::new();
                    let posteingang = self.kontext.registry.hinzufuegen(id, username);
                    Some(Session::neu(id, username.clone(), posteingang))
                }
                _ => None,
            };

            for antwort in &schritt.antworten {
                if let Err(e) = self.schreiben(framed, antwort).await {
                    tracing::debug!(peer = %peer_addr, fehler = %e, "Antwort fehlgeschlagen");
                    if let Some(session) = &session {
                        self.kontext.registry.entfernen(&session.id);
                    }
                    return None;
                }
            }

            if let Some(session) = session {
                tracing::info!(
                    peer = %peer_addr,
                    session = %session.id,
                    username = %session.username,
                    "Chat beigetreten"
                );
                self.kontext
                    .registry
                    .an_alle_ausser_senden(&nachrichten::beigetreten(&session.username), &session.id);
                return Some(session);
            }

            if schritt.zustand.ist_beendet() {
                tracing::debug!(peer = %peer_addr, "Dialog beendet");
                return None;
            }
            zustand = schritt.zustand;
        }
    }

    /// Chat-Schleife einer angemeldeten Session
    ///
    /// Laeuft bis zum Lesefehler, Verbindungsende, Timeout, Schreibfehler oder
    /// bis die Registry die Session wegen vollem Posteingang verdraengt.
    /// Danach ist die Session aus der Registry entfernt und der Abschied genau
    /// einmal an alle anderen verteilt.
    pub async fn weiterleiten<S>(&self, mut session: Session, framed: &mut Framed<S, ZeilenCodec>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let registry = &self.kontext.registry;
        let leerlauf = self.kontext.konfig.leerlauf_timeout;
        let mut zustand = Zustand::Chat {
            username: session.username.clone(),
        };
        let mut letzter_empfang = Instant::now();

        let grund = loop {
            let frist = leerlauf.map(|dauer| letzter_empfang + dauer);

            tokio::select! {
                // Eingehende Zeile vom eigenen Client
                eingabe = zeile_lesen(framed, frist) => {
                    match eingabe {
                        Ok(zeile) => {
                            letzter_empfang = Instant::now();
                            let schritt = uebergang(
                                std::mem::replace(&mut zustand, Zustand::Geschlossen),
                                &zeile,
                                &self.kontext.auth,
                            );
                            zustand = schritt.zustand;
                            if let Some(rundsendung) = schritt.rundsendung {
                                registry.an_alle_ausser_senden(&rundsendung, &session.id);
                            }
                        }
                        Err(e) => break e,
                    }
                }

                // Ausgehende Zeile aus dem Posteingang
                ausgehend = session.posteingang.recv() => {
                    let Some(ausgehend) = ausgehend else {
                        // Registry hat den Sender verworfen und den Abschied verteilt
                        break ChatError::Verdraengt;
                    };
                    if let Err(e) = self.schreiben(framed, ausgehend).await {
                        break e;
                    }
                }
            }
        };

        // Nach einer Verdraengung ist die Session schon entfernt und verabschiedet
        if registry.entfernen(&session.id) {
            registry.an_alle_ausser_senden(&nachrichten::verlassen(&session.username), &session.id);
        }

        if grund.ist_regulaer() {
            tracing::info!(
                peer = %self.peer_addr,
                username = %session.username,
                "Chat verlassen"
            );
        } else {
            tracing::info!(
                peer = %self.peer_addr,
                username = %session.username,
                grund = %grund,
                "Chat verlassen (Fehler)"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
