//! Passwort-Hashing mit Argon2id
//!
//! Der Chat-Kern behandelt das Hashing als opake Einwegfunktion:
//! `hashen(klartext) -> digest` und `verifizieren(klartext, digest) -> bool`.
//! Die Kostenparameter kommen aus der Server-Konfiguration, damit Tests mit
//! billigen Parametern laufen koennen.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::{AuthError, AuthResult};

/// Kostenparameter fuer Argon2id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParameter {
    /// Speicherbedarf in KiB
    pub speicher_kib: u32,
    /// Anzahl Iterationen
    pub iterationen: u32,
    /// Parallelitaet (Lanes)
    pub parallelitaet: u32,
}

impl Default for HashParameter {
    /// OWASP-Empfehlung fuer Argon2id: 19 MiB, 2 Iterationen, 1 Lane
    fn default() -> Self {
        Self {
            speicher_kib: 19 * 1024,
            iterationen: 2,
            parallelitaet: 1,
        }
    }
}

/// Argon2id-Hasher mit festen Parametern
#[derive(Clone)]
pub struct PasswortHasher {
    argon2: Argon2<'static>,
}

impl PasswortHasher {
    /// Erstellt einen Hasher; ungueltige Parameter sind ein Startfehler
    pub fn neu(parameter: HashParameter) -> AuthResult<Self> {
        let params = Params::new(
            parameter.speicher_kib,
            parameter.iterationen,
            parameter.parallelitaet,
            None,
        )
        .map_err(|e| AuthError::PasswortHashing(format!("Argon2-Parameter ungueltig: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hasht ein Passwort mit zufaelligem Salt und gibt den PHC-String zurueck
    pub fn hashen(&self, passwort: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(passwort.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswortHashing(e.to_string()))
    }

    /// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
    pub fn verifizieren(&self, passwort: &str, digest: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| AuthError::PasswortHashing(format!("Ungueltiges Hash-Format: {e}")))?;

        match self.argon2.verify_password(passwort.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::PasswortHashing(e.to_string())),
        }
    }
}

impl std::fmt::Debug for PasswortHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswortHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswortHasher {
    PasswortHasher::neu(HashParameter {
        speicher_kib: 8,
        iterationen: 1,
        parallelitaet: 1,
    })
    .expect("Test-Parameter muessen gueltig sein")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwort_hashen_und_verifizieren() {
        let hasher = test_hasher();
        let hash = hasher.hashen("pw1").expect("Hashing fehlgeschlagen");

        assert!(
            hash.starts_with("$argon2id$"),
            "Hash muss mit $argon2id$ beginnen"
        );
        assert!(hasher.verifizieren("pw1", &hash).unwrap());
    }

    #[test]
    fn falsches_passwort_wird_abgelehnt() {
        let hasher = test_hasher();
        let hash = hasher.hashen("richtig").unwrap();
        assert!(!hasher.verifizieren("falsch", &hash).unwrap());
    }

    #[test]
    fn gleiche_passwoerter_unterschiedliche_hashes() {
        let hasher = test_hasher();
        let hash1 = hasher.hashen("gleich").unwrap();
        let hash2 = hasher.hashen("gleich").unwrap();
        assert_ne!(hash1, hash2, "Salt muss verschiedene Hashes erzeugen");
    }

    #[test]
    fn ungueltiges_hash_format_gibt_fehler() {
        let hasher = test_hasher();
        assert!(hasher.verifizieren("pw", "kein_gueltiger_hash").is_err());
    }

    #[test]
    fn ungueltige_parameter_werden_abgelehnt() {
        let ergebnis = PasswortHasher::neu(HashParameter {
            speicher_kib: 1,
            iterationen: 0,
            parallelitaet: 1,
        });
        assert!(ergebnis.is_err());
    }

    #[test]
    fn standard_parameter_sind_gueltig() {
        assert!(PasswortHasher::neu(HashParameter::default()).is_ok());
    }
}
