//! Benutzerspeicher
//!
//! Der Chat-Kern braucht vom Speicher nur zwei Operationen: "einfuegen oder
//! scheitern, falls der Name existiert" und "Digest zu einem Namen laden".
//! Die Standard-Implementierung haelt alles im Speicher und versiegelt jeden
//! Digest mit AES-256-GCM unter dem prozessweiten Speicherschluessel.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::{rngs::OsRng, RngCore};

use crate::error::{AuthError, AuthResult};
use crate::geheimnis::Speicherschluessel;

/// Schnittstelle zum Benutzerspeicher
///
/// `einfuegen_falls_neu` muss atomar sein: zwei gleichzeitige Aufrufe mit
/// demselben Namen ergeben genau einmal `Ok(true)`.
pub trait BenutzerSpeicher: Send + Sync {
    /// Legt einen Benutzer an. `Ok(false)` wenn der Name bereits existiert.
    fn einfuegen_falls_neu(&self, username: &str, digest: &str) -> AuthResult<bool>;

    /// Laedt den gespeicherten Digest. `Ok(None)` fuer unbekannte Namen.
    fn digest_laden(&self, username: &str) -> AuthResult<Option<String>>;

    /// Anzahl registrierter Benutzer
    fn anzahl(&self) -> usize;
}

// ---------------------------------------------------------------------------
// VersiegelterSpeicher
// ---------------------------------------------------------------------------

/// Ein versiegelter Digest (Nonce + Ciphertext inkl. Auth-Tag)
struct Versiegelt {
    nonce: [u8; 12],
    chiffre: Vec<u8>,
}

/// In-Memory-Speicher, Digests mit AES-256-GCM versiegelt
///
/// Der Benutzername geht als AAD in die Versiegelung ein, ein Datensatz
/// laesst sich also nicht unter einem anderen Namen entsiegeln.
pub struct VersiegelterSpeicher {
    benutzer: DashMap<String, Versiegelt>,
    cipher: Aes256Gcm,
}

impl VersiegelterSpeicher {
    /// Initialisiert den Speicher mit dem prozessweiten Schluessel
    pub fn neu(schluessel: &Speicherschluessel) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(schluessel.als_bytes());
        Self {
            benutzer: DashMap::new(),
            cipher: Aes256Gcm::new(key),
        }
    }

    fn versiegeln(&self, username: &str, digest: &str) -> AuthResult<Versiegelt> {
        let mut nonce = [0u8; 12];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| AuthError::Zufall(e.to_string()))?;

        let chiffre = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: digest.as_bytes(),
                    aad: username.as_bytes(),
                },
            )
            .map_err(|_| AuthError::speicher("Versiegeln fehlgeschlagen"))?;

        Ok(Versiegelt { nonce, chiffre })
    }

    fn entsiegeln(&self, username: &str, versiegelt: &Versiegelt) -> AuthResult<String> {
        let klartext = self
            .cipher
            .decrypt(
                Nonce::from_slice(&versiegelt.nonce),
                Payload {
                    msg: &versiegelt.chiffre,
                    aad: username.as_bytes(),
                },
            )
            .map_err(|_| AuthError::speicher("Entsiegeln fehlgeschlagen"))?;

        String::from_utf8(klartext).map_err(|e| AuthError::speicher(e.to_string()))
    }
}

impl BenutzerSpeicher for VersiegelterSpeicher {
    fn einfuegen_falls_neu(&self, username: &str, digest: &str) -> AuthResult<bool> {
        // Der Entry haelt den Shard-Lock bis zum Insert
        match self.benutzer.entry(username.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(frei) => {
                let versiegelt = self.versiegeln(username, digest)?;
                frei.insert(versiegelt);
                Ok(true)
            }
        }
    }

    fn digest_laden(&self, username: &str) -> AuthResult<Option<String>> {
        match self.benutzer.get(username) {
            Some(eintrag) => self.entsiegeln(username, eintrag.value()).map(Some),
            None => Ok(None),
        }
    }

    fn anzahl(&self) -> usize {
        self.benutzer.len()
    }
}
