//! Auth-Service fuer Plauder
//!
//! Zentraler Einstiegspunkt fuer Registrierungscode-Pruefung, Registrierung
//! und Login. Wird einmal beim Start erzeugt und von allen Verbindungen
//! gemeinsam genutzt.

use std::sync::Arc;

use crate::{
    error::{AuthError, AuthResult},
    geheimnis::RegistrierungsCode,
    password::PasswortHasher,
    store::BenutzerSpeicher,
};

/// Auth-Service – Registrierung und Anmeldung gegen den Benutzerspeicher
pub struct AuthService {
    speicher: Arc<dyn BenutzerSpeicher>,
    hasher: PasswortHasher,
    code: RegistrierungsCode,
    /// Wird fuer unbekannte Benutzer verifiziert, damit beide Ablehnungen
    /// gleich lange dauern
    dummy_digest: String,
}

impl AuthService {
    /// Erstellt einen neuen AuthService
    pub fn neu(
        speicher: Arc<dyn BenutzerSpeicher>,
        hasher: PasswortHasher,
        code: RegistrierungsCode,
    ) -> AuthResult<Self> {
        let dummy_digest = hasher.hashen("plauder-dummy-passwort")?;
        Ok(Self {
            speicher,
            hasher,
            code,
            dummy_digest,
        })
    }

    pub fn registrierungs_code(&self) -> &RegistrierungsCode {
        &self.code
    }

    /// Prueft eine Client-Eingabe gegen den Registrierungscode
    pub fn code_pruefen(&self, eingabe: &str) -> AuthResult<()> {
        if self.code.pruefen(eingabe) {
            Ok(())
        } else {
            tracing::warn!("Registrierung mit falschem Code versucht");
            Err(AuthError::UngueltigerCode)
        }
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Ueberschreibt nie: existiert der Name, kommt `BenutzernameVergeben`.
    pub fn registrieren(&self, username: &str, passwort: &str) -> AuthResult<()> {
        let digest = self.hasher.hashen(passwort)?;

        if !self.speicher.einfuegen_falls_neu(username, &digest)? {
            tracing::info!(username = %username, "Registrierung abgelehnt: Name vergeben");
            return Err(AuthError::BenutzernameVergeben(username.to_string()));
        }

        tracing::info!(username = %username, "Neuer Benutzer registriert");
        Ok(())
    }

    /// Prueft Benutzername und Passwort
    ///
    /// Unbekannter Name und falsches Passwort liefern denselben Fehler.
    pub fn anmelden(&self, username: &str, passwort: &str) -> AuthResult<()> {
        let korrekt = match self.speicher.digest_laden(username)? {
            Some(digest) => self.hasher.verifizieren(passwort, &digest)?,
            None => {
                let _ = self.hasher.verifizieren(passwort, &self.dummy_digest);
                false
            }
        };

        if !korrekt {
            tracing::warn!(username = %username, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        tracing::info!(username = %username, "Benutzer angemeldet");
        Ok(())
    }

    /// Anzahl registrierter Benutzer
    pub fn benutzer_anzahl(&self) -> usize {
        self.speicher.anzahl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geheimnis::Speicherschluessel;
    use crate::password::test_hasher;
    use crate::store::VersiegelterSpeicher;

    const CODE: &str = "00112233445566778899";

    fn service() -> AuthService {
        let speicher = Arc::new(VersiegelterSpeicher::neu(
            &Speicherschluessel::generieren().unwrap(),
        ));
        AuthService::neu(speicher, test_hasher(), RegistrierungsCode::neu(CODE)).unwrap()
    }

    #[test]
    fn registrieren_und_anmelden() {
        let auth = service();
        auth.registrieren("alice", "pw1").unwrap();
        assert!(auth.anmelden("alice", "pw1").is_ok());
        assert_eq!(auth.benutzer_anzahl(), 1);
    }

    #[test]
    fn zweite_registrierung_scheitert() {
        let auth = service();
        auth.registrieren("alice", "pw1").unwrap();
        let err = auth.registrieren("alice", "anderes").unwrap_err();
        assert!(matches!(err, AuthError::BenutzernameVergeben(ref n) if n == "alice"));

        // Das erste Passwort bleibt gueltig
        assert!(auth.anmelden("alice", "pw1").is_ok());
        assert!(auth.anmelden("alice", "anderes").is_err());
    }

    #[test]
    fn falsches_passwort_und_unbekannter_name_gleicher_fehler() {
        let auth = service();
        auth.registrieren("bob", "pw2").unwrap();

        let falsch = auth.anmelden("bob", "falsch").unwrap_err();
        let unbekannt = auth.anmelden("niemand", "pw2").unwrap_err();
        assert!(matches!(falsch, AuthError::UngueltigeAnmeldedaten));
        assert!(matches!(unbekannt, AuthError::UngueltigeAnmeldedaten));
        assert_eq!(falsch.to_string(), unbekannt.to_string());
    }

    #[test]
    fn code_pruefung() {
        let auth = service();
        assert!(auth.code_pruefen(CODE).is_ok());
        assert!(auth.code_pruefen(&format!("[{CODE}]")).is_ok());
        assert!(matches!(
            auth.code_pruefen("00112233445566778890"),
            Err(AuthError::UngueltigerCode)
        ));
    }

    #[test]
    fn gleichzeitige_registrierung_genau_ein_erfolg() {
        let auth = Arc::new(service());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let auth = Arc::clone(&auth);
                std::thread::spawn(move || auth.registrieren("carol", &format!("pw{i}")).is_ok())
            })
            .collect();

        let erfolge = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(erfolge, 1);
    }
}
