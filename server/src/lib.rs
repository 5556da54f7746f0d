//! plauder-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod logging;

use anyhow::{Context, Result};
use config::ServerConfig;
use plauder_auth::{
    AuthService, PasswortHasher, RegistrierungsCode, Speicherschluessel, VersiegelterSpeicher,
};
use plauder_chat::{ChatServer, ServerKontext};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

/// Gebundener, noch nicht laufender Server
pub struct GebundenerServer {
    kontext: Arc<ServerKontext>,
    chat: ChatServer,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Erzeugt die Prozess-Geheimnisse und bindet den Listener
    ///
    /// Reihenfolge:
    /// 1. Speicherschluessel und Registrierungscode erzeugen
    /// 2. Benutzerspeicher und AuthService aufbauen
    /// 3. TCP-Listener binden
    pub async fn binden(self) -> Result<GebundenerServer> {
        let schluessel =
            Speicherschluessel::generieren().context("Speicherschluessel nicht erzeugbar")?;
        let code =
            RegistrierungsCode::generieren().context("Registrierungscode nicht erzeugbar")?;

        let speicher = Arc::new(VersiegelterSpeicher::neu(&schluessel));
        let hasher = PasswortHasher::neu(self.config.hash_parameter())
            .context("Ungueltige Argon2-Parameter in [passwort]")?;
        let auth = AuthService::neu(speicher, hasher, code)
            .context("AuthService konnte nicht erstellt werden")?;

        tracing::info!(
            code = %auth.registrierungs_code().als_str(),
            "Registrierungscode fuer neue Benutzer"
        );

        let kontext = ServerKontext::neu(self.config.chat_konfig(), auth);
        let adresse = self.config.tcp_bind_adresse();
        let chat = ChatServer::binden(Arc::clone(&kontext), adresse.as_str())
            .await
            .with_context(|| format!("TCP-Listener auf {adresse} nicht bindbar"))?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %adresse,
            "Server gebunden"
        );

        Ok(GebundenerServer { kontext, chat })
    }

    /// Startet den Server und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let gebunden = self.binden().await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener = tokio::spawn(gebunden.laufen(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        listener.await.context("Listener-Task abgebrochen")??;
        Ok(())
    }
}

impl GebundenerServer {
    pub fn lokale_addr(&self) -> Result<SocketAddr> {
        Ok(self.chat.lokale_addr()?)
    }

    pub fn kontext(&self) -> &Arc<ServerKontext> {
        &self.kontext
    }

    /// Akzeptiert Verbindungen bis zum Shutdown-Signal
    pub async fn laufen(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        self.chat.starten(shutdown_rx).await?;
        Ok(())
    }
}
