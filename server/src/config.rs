//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use plauder_auth::HashParameter;
use plauder_chat::ChatKonfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Limits pro Verbindung
    pub verbindung: VerbindungsEinstellungen,
    /// Argon2id-Parameter fuer Passwort-Digests
    pub passwort: PasswortEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Plauder Server".into(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den TCP-Listener
    pub bind_adresse: String,
    /// TCP-Port
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 9000,
        }
    }
}

/// Limits pro Verbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    /// Maximale gleichzeitige Verbindungen
    pub max_verbindungen: usize,
    /// Maximale Laenge einer Eingabezeile in Bytes
    pub max_zeilenlaenge: usize,
    /// Trennen nach so vielen Sekunden ohne Eingabe (leer = nie)
    pub leerlauf_timeout_sek: Option<u64>,
    /// Posteingang pro Session (Zeilen), bei Ueberlauf wird die Session verdraengt
    pub sende_queue_groesse: usize,
    /// Trennen wenn eine Zeile so viele Sekunden nicht geschrieben werden kann
    pub schreib_timeout_sek: u64,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        let chat = ChatKonfig::default();
        Self {
            max_verbindungen: chat.max_verbindungen,
            max_zeilenlaenge: chat.max_zeilenlaenge,
            leerlauf_timeout_sek: None,
            sende_queue_groesse: chat.sende_queue_groesse,
            schreib_timeout_sek: chat.schreib_timeout.as_secs(),
        }
    }
}

/// Argon2id-Parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswortEinstellungen {
    pub speicher_kib: u32,
    pub iterationen: u32,
    pub parallelitaet: u32,
}

impl Default for PasswortEinstellungen {
    fn default() -> Self {
        let param = HashParameter::default();
        Self {
            speicher_kib: param.speicher_kib,
            iterationen: param.iterationen,
            parallelitaet: param.parallelitaet,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level oder EnvFilter-Direktive, z.B. "info" oder "plauder_chat=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Logging ist hier noch nicht initialisiert
                eprintln!("Konfigurationsdatei '{pfad}' nicht gefunden, verwende Standardwerte");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Uebersetzt die Verbindungs-Einstellungen fuer den Chat-Kern
    pub fn chat_konfig(&self) -> ChatKonfig {
        ChatKonfig {
            max_verbindungen: self.verbindung.max_verbindungen,
            max_zeilenlaenge: self.verbindung.max_zeilenlaenge,
            leerlauf_timeout: self
                .verbindung
                .leerlauf_timeout_sek
                .filter(|sek| *sek > 0)
                .map(Duration::from_secs),
            sende_queue_groesse: self.verbindung.sende_queue_groesse,
            schreib_timeout: Duration::from_secs(self.verbindung.schreib_timeout_sek.max(1)),
        }
    }

    pub fn hash_parameter(&self) -> HashParameter {
        HashParameter {
            speicher_kib: self.passwort.speicher_kib,
            iterationen: self.passwort.iterationen,
            parallelitaet: self.passwort.parallelitaet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.netzwerk.port, 9000);
        assert_eq!(cfg.verbindung.max_verbindungen, 256);
        assert_eq!(cfg.verbindung.max_zeilenlaenge, 4096);
        assert_eq!(cfg.verbindung.leerlauf_timeout_sek, None);
        assert_eq!(cfg.passwort.speicher_kib, 19 * 1024);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn bind_adresse() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.tcp_bind_adresse(), "0.0.0.0:9000");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            name = "Stammtisch"

            [netzwerk]
            port = 9100

            [verbindung]
            leerlauf_timeout_sek = 300
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.name, "Stammtisch");
        assert_eq!(cfg.netzwerk.port, 9100);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.verbindung.sende_queue_groesse, 64);

        let chat = cfg.chat_konfig();
        assert_eq!(chat.leerlauf_timeout, Some(Duration::from_secs(300)));
        assert_eq!(chat.max_zeilenlaenge, 4096);
        assert_eq!(chat.schreib_timeout, Duration::from_secs(10));
    }

    #[test]
    fn leerlauf_timeout_null_heisst_aus() {
        let cfg: ServerConfig = toml::from_str("[verbindung]\nleerlauf_timeout_sek = 0\n").unwrap();
        assert_eq!(cfg.chat_konfig().leerlauf_timeout, None);
    }

    #[test]
    fn schreib_timeout_aus_toml() {
        let cfg: ServerConfig = toml::from_str("[verbindung]\nschreib_timeout_sek = 3\n").unwrap();
        assert_eq!(cfg.chat_konfig().schreib_timeout, Duration::from_secs(3));

        // Null wuerde jeden Schreibvorgang sofort abbrechen
        let cfg: ServerConfig = toml::from_str("[verbindung]\nschreib_timeout_sek = 0\n").unwrap();
        assert_eq!(cfg.chat_konfig().schreib_timeout, Duration::from_secs(1));
    }

    #[test]
    fn fehlende_datei_liefert_standard() {
        let cfg = ServerConfig::laden("/nicht/vorhanden/plauder.toml").unwrap();
        assert_eq!(cfg.netzwerk.port, 9000);
    }

    #[test]
    fn kaputte_datei_ist_fehler() {
        let pfad = std::env::temp_dir().join(format!("plauder-test-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[netzwerk]\nport = \"neuntausend\"\n").unwrap();
        let ergebnis = ServerConfig::laden(pfad.to_str().unwrap());
        std::fs::remove_file(&pfad).unwrap();
        assert!(ergebnis.is_err());
    }

    #[test]
    fn hash_parameter_aus_config() {
        let cfg: ServerConfig =
            toml::from_str("[passwort]\nspeicher_kib = 8\niterationen = 1\n").unwrap();
        let param = cfg.hash_parameter();
        assert_eq!(param.speicher_kib, 8);
        assert_eq!(param.iterationen, 1);
        assert_eq!(param.parallelitaet, 1);
    }
}
