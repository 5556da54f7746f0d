//! Zustandsautomat einer Chat-Verbindung
//!
//! Jede Eingabezeile fuehrt genau einen Uebergang aus. `uebergang` liefert den
//! Folgezustand, die Antwortzeilen fuer den eigenen Client und optional eine
//! Zeile zum Verteilen an alle anderen. Die Funktion beruehrt keinen Socket und
//! keine Registry; das erledigt die `ClientConnection`.
//!
//! ```text
//! WartetAufWahl --register--> RegistrierungCode -> RegistrierungName -> RegistrierungPasswort --> Geschlossen
//!       |
//!       +-------login-------> AnmeldungName -> AnmeldungPasswort --ok--> Chat --(Trennung)--> Geschlossen
//!       |                                            |
//!       +--sonst--> Geschlossen                       +--falsch--> Geschlossen
//! ```

use plauder_auth::{AuthError, AuthService};
use plauder_protocol::nachrichten;

/// Zustand des Dialogs einer Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Zustand {
    /// Wartet auf `login` oder `register`
    WartetAufWahl,
    /// Wartet auf den Registrierungscode
    RegistrierungCode,
    /// Wartet auf den gewuenschten Benutzernamen
    RegistrierungName,
    /// Wartet auf das gewuenschte Passwort
    RegistrierungPasswort { username: String },
    /// Wartet auf den Benutzernamen
    AnmeldungName,
    /// Wartet auf das Passwort
    AnmeldungPasswort { username: String },
    /// Angemeldet, jede Zeile ist eine Chat-Nachricht
    Chat { username: String },
    /// Endzustand, die Verbindung wird geschlossen
    Geschlossen,
}

impl Zustand {
    pub fn ist_beendet(&self) -> bool {
        matches!(self, Self::Geschlossen)
    }

    pub fn ist_angemeldet(&self) -> bool {
        matches!(self, Self::Chat { .. })
    }
}

/// Ergebnis eines Uebergangs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schritt {
    pub zustand: Zustand,
    /// Zeilen an den eigenen Client, in dieser Reihenfolge
    pub antworten: Vec<String>,
    /// Zeile fuer alle anderen angemeldeten Sessions
    pub rundsendung: Option<String>,
}

impl Schritt {
    fn weiter(zustand: Zustand, antwort: &str) -> Self {
        Self {
            zustand,
            antworten: vec![antwort.to_string()],
            rundsendung: None,
        }
    }

    fn schliessen(antwort: &str) -> Self {
        Self::weiter(Zustand::Geschlossen, antwort)
    }
}

/// Zeilen, die jede neue Verbindung vor der ersten Eingabe bekommt
pub fn begruessung() -> [&'static str; 2] {
    [nachrichten::WILLKOMMEN, nachrichten::WAHL_PROMPT]
}

/// Fuehrt den Uebergang fuer eine Eingabezeile aus
///
/// Benutzernamen und Passwoerter werden getrimmt, Chat-Zeilen nicht.
pub fn uebergang(zustand: Zustand, eingabe: &str, auth: &AuthService) -> Schritt {
    match zustand {
        Zustand::WartetAufWahl => {
            let wahl = eingabe.trim();
            if wahl.eq_ignore_ascii_case(nachrichten::WAHL_REGISTRIEREN) {
                Schritt::weiter(Zustand::RegistrierungCode, nachrichten::CODE_PROMPT)
            } else if wahl.eq_ignore_ascii_case(nachrichten::WAHL_ANMELDEN) {
                Schritt::weiter(Zustand::AnmeldungName, nachrichten::NAME_PROMPT)
            } else {
                Schritt::schliessen(nachrichten::UNGUELTIGE_WAHL)
            }
        }

        Zustand::RegistrierungCode => match auth.code_pruefen(eingabe) {
            Ok(()) => Schritt::weiter(Zustand::RegistrierungName, nachrichten::REG_NAME_PROMPT),
            Err(_) => Schritt::schliessen(nachrichten::UNGUELTIGER_CODE),
        },

        Zustand::RegistrierungName => Schritt::weiter(
            Zustand::RegistrierungPasswort {
                username: eingabe.trim().to_string(),
            },
            nachrichten::REG_PASSWORT_PROMPT,
        ),

        Zustand::RegistrierungPasswort { username } => {
            match auth.registrieren(&username, eingabe.trim()) {
                Ok(()) => Schritt::schliessen(nachrichten::REGISTRIERUNG_ERFOLGREICH),
                Err(AuthError::BenutzernameVergeben(_)) => {
                    Schritt::schliessen(nachrichten::REGISTRIERUNG_NAME_VERGEBEN)
                }
                Err(e) => {
                    tracing::error!(username = %username, fehler = %e, "Registrierung fehlgeschlagen");
                    Schritt::schliessen(nachrichten::REGISTRIERUNG_FEHLER)
                }
            }
        }

        Zustand::AnmeldungName => Schritt::weiter(
            Zustand::AnmeldungPasswort {
                username: eingabe.trim().to_string(),
            },
            nachrichten::PASSWORT_PROMPT,
        ),

        Zustand::AnmeldungPasswort { username } => {
            match auth.anmelden(&username, eingabe.trim()) {
                Ok(()) => {
                    let willkommen = nachrichten::willkommen_zurueck(&username);
                    Schritt::weiter(Zustand::Chat { username }, &willkommen)
                }
                Err(AuthError::UngueltigeAnmeldedaten) => {
                    Schritt::schliessen(nachrichten::UNGUELTIGE_ANMELDEDATEN)
                }
                Err(e) => {
                    // Nach aussen identisch zu falschen Anmeldedaten
                    tracing::error!(username = %username, fehler = %e, "Login-Fehler");
                    Schritt::schliessen(nachrichten::UNGUELTIGE_ANMELDEDATEN)
                }
            }
        }

        Zustand::Chat { username } => {
            let zeile = nachrichten::chat_zeile(&username, eingabe);
            Schritt {
                zustand: Zustand::Chat { username },
                antworten: Vec::new(),
                rundsendung: Some(zeile),
            }
        }

        Zustand::Geschlossen => Schritt {
            zustand: Zustand::Geschlossen,
            antworten: Vec::new(),
            rundsendung: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_state::test_auth;

    const CODE: &str = "a1b2c3d4e5f6a7b8c9d0";

    /// Spielt mehrere Eingaben ab und sammelt alle Antworten
    fn abspielen(auth: &AuthService, eingaben: &[&str]) -> (Zustand, Vec<String>) {
        let mut zustand = Zustand::WartetAufWahl;
        let mut ausgabe = Vec::new();
        for eingabe in eingaben {
            let schritt = uebergang(zustand, eingabe, auth);
            ausgabe.extend(schritt.antworten);
            zustand = schritt.zustand;
        }
        (zustand, ausgabe)
    }

    #[test]
    fn begruessung_zeilen() {
        assert_eq!(
            begruessung(),
            [
                "Welcome to the secure chat server!",
                "Enter 'login' or 'register': "
            ]
        );
    }

    #[test]
    fn ungueltige_wahl_schliesst() {
        let auth = test_auth(CODE);
        let (zustand, ausgabe) = abspielen(&auth, &["chat"]);
        assert_eq!(zustand, Zustand::Geschlossen);
        assert_eq!(ausgabe, vec!["Invalid choice. Closing."]);
    }

    #[test]
    fn wahl_ignoriert_gross_kleinschreibung_und_whitespace() {
        let auth = test_auth(CODE);
        let schritt = uebergang(Zustand::WartetAufWahl, "  LoGiN ", &auth);
        assert_eq!(schritt.zustand, Zustand::AnmeldungName);
        assert_eq!(schritt.antworten, vec!["Username: "]);

        let schritt = uebergang(Zustand::WartetAufWahl, "REGISTER", &auth);
        assert_eq!(schritt.zustand, Zustand::RegistrierungCode);
        assert_eq!(schritt.antworten, vec!["Enter the server's registration code: "]);
    }

    #[test]
    fn falscher_code_schliesst() {
        let auth = test_auth(CODE);
        let (zustand, ausgabe) = abspielen(&auth, &["register", "a1b2c3d4e5f6a7b8c9d1"]);
        assert_eq!(zustand, Zustand::Geschlossen);
        assert_eq!(
            ausgabe.last().unwrap(),
            "Invalid registration code. Closing connection."
        );
        assert_eq!(auth.benutzer_anzahl(), 0);
    }

    #[test]
    fn registrierung_mit_geklammertem_code() {
        let auth = test_auth(CODE);
        let (zustand, ausgabe) =
            abspielen(&auth, &["register", &format!("[{CODE}]"), "alice", "pw1"]);
        assert_eq!(zustand, Zustand::Geschlossen);
        assert_eq!(
            ausgabe,
            vec![
                "Enter the server's registration code: ",
                "Enter your desired username: ",
                "Enter your desired password (typing not hidden): ",
                "Registration successful! You can now login.",
            ]
        );
        assert!(auth.anmelden("alice", "pw1").is_ok());
    }

    #[test]
    fn registrierung_doppelter_name() {
        let auth = test_auth(CODE);
        abspielen(&auth, &["register", CODE, "alice", "pw1"]);
        let (zustand, ausgabe) = abspielen(&auth, &["register", CODE, "alice", "pw2"]);
        assert_eq!(zustand, Zustand::Geschlossen);
        assert_eq!(
            ausgabe.last().unwrap(),
            "Registration failed: username already taken."
        );
    }

    #[test]
    fn anmeldung_erfolgreich_fuehrt_in_den_chat() {
        let auth = test_auth(CODE);
        auth.registrieren("alice", "pw1").unwrap();

        let (zustand, ausgabe) = abspielen(&auth, &["login", " alice ", "pw1\t"]);
        assert_eq!(
            zustand,
            Zustand::Chat {
                username: "alice".into()
            }
        );
        assert!(zustand.ist_angemeldet());
        assert_eq!(
            ausgabe,
            vec![
                "Username: ",
                "Password (typing not hidden): ",
                "Welcome back, alice!"
            ]
        );
    }

    #[test]
    fn keine_username_enumeration() {
        let auth = test_auth(CODE);
        auth.registrieren("alice", "pw1").unwrap();

        let (z1, falsches_pw) = abspielen(&auth, &["login", "alice", "pw2"]);
        let (z2, unbekannt) = abspielen(&auth, &["login", "mallory", "pw1"]);

        assert!(z1.ist_beendet());
        assert!(z2.ist_beendet());
        assert_eq!(falsches_pw.last().unwrap(), "Invalid username or password.");
        assert_eq!(falsches_pw, unbekannt);
    }

    #[test]
    fn chat_zeile_wird_verteilt() {
        let auth = test_auth(CODE);
        let schritt = uebergang(
            Zustand::Chat {
                username: "bob".into(),
            },
            "hello",
            &auth,
        );
        assert_eq!(schritt.rundsendung.as_deref(), Some("bob: hello"));
        assert!(schritt.antworten.is_empty());
        assert!(schritt.zustand.ist_angemeldet());
    }

    #[test]
    fn geschlossen_bleibt_geschlossen() {
        let auth = test_auth(CODE);
        let schritt = uebergang(Zustand::Geschlossen, "login", &auth);
        assert!(schritt.zustand.ist_beendet());
        assert!(schritt.antworten.is_empty());
        assert!(schritt.rundsendung.is_none());
    }
}
