//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `ChatServer` bindet einen TCP-Socket und startet fuer jede eingehende
//! Verbindung einen eigenen tokio-Task mit einer `ClientConnection`. Ein
//! fehlgeschlagener Accept beendet die Schleife nicht.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::watch;

use crate::connection::ClientConnection;
use crate::server_state::ServerKontext;

/// TCP-Chat-Server
pub struct ChatServer {
    kontext: Arc<ServerKontext>,
    listener: TcpListener,
}

impl ChatServer {
    /// Bindet den Listener
    ///
    /// Port 0 waehlt einen freien Port, siehe [`ChatServer::lokale_addr`].
    pub async fn binden(kontext: Arc<ServerKontext>, addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { kontext, listener })
    }

    pub fn lokale_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    ///
    /// Bestehende Verbindungen laufen nach dem Shutdown in ihren Tasks weiter,
    /// es werden nur keine neuen mehr angenommen.
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let lokale_addr = self.listener.local_addr()?;
        let max_verbindungen = self.kontext.konfig.max_verbindungen;
        let verbindungszaehler = Arc::new(AtomicUsize::new(0));

        tracing::info!(
            adresse = %lokale_addr,
            max_verbindungen,
            "Chat-Server gestartet"
        );

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let aktuelle = verbindungszaehler.fetch_add(1, Ordering::SeqCst);
                            if aktuelle >= max_verbindungen {
                                verbindungszaehler.fetch_sub(1, Ordering::SeqCst);
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = max_verbindungen,
                                    "Server voll – Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!(peer = %peer_addr, fehler = %e, "TCP_NODELAY nicht gesetzt");
                            }

                            let verbindung = ClientConnection::neu(Arc::clone(&self.kontext), peer_addr);
                            let zaehler = Arc::clone(&verbindungszaehler);

                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream).await;
                                zaehler.fetch_sub(1, Ordering::SeqCst);
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Chat-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("Chat-Server gestoppt");
        Ok(())
    }
}
