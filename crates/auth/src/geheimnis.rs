//! Prozessweite Geheimnisse
//!
//! Beide Werte werden genau einmal beim Start erzeugt und danach nur noch
//! gelesen. Nichts davon wird persistiert: nach Prozessende sind Code,
//! Schluessel und alle damit versiegelten Daten wertlos.

use rand::{rngs::OsRng, RngCore};

use crate::error::{AuthError, AuthResult};

/// Anzahl Zufallsbytes des Registrierungscodes (20 Hex-Zeichen)
const CODE_BYTES: usize = 10;

/// Gibt `n_bytes` Zufallsbytes aus dem OS-RNG als Hex-String zurueck
pub fn zufalls_hex(n_bytes: usize) -> AuthResult<String> {
    let mut bytes = vec![0u8; n_bytes];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Zufall(e.to_string()))?;
    Ok(hex::encode(bytes))
}

// ---------------------------------------------------------------------------
// Registrierungscode
// ---------------------------------------------------------------------------

/// Gemeinsamer Code, ohne den keine Registrierung moeglich ist
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrierungsCode(String);

impl RegistrierungsCode {
    /// Erzeugt einen neuen zufaelligen Code
    pub fn generieren() -> AuthResult<Self> {
        Ok(Self(zufalls_hex(CODE_BYTES)?))
    }

    /// Uebernimmt einen festen Wert (Tests, Betrieb mit vorgegebenem Code)
    pub fn neu(wert: impl Into<String>) -> Self {
        Self(wert.into())
    }

    /// Gibt den Code fuer die Operator-Konsole zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }

    /// Normalisiert eine Client-Eingabe: erst Whitespace trimmen, dann jedes
    /// `[` und `]` entfernen
    pub fn normalisieren(eingabe: &str) -> String {
        eingabe
            .trim()
            .chars()
            .filter(|c| *c != '[' && *c != ']')
            .collect()
    }

    /// Vergleicht eine Client-Eingabe byteweise mit dem Code
    pub fn pruefen(&self, eingabe: &str) -> bool {
        let kandidat = Self::normalisieren(eingabe);
        let (a, b) = (kandidat.as_bytes(), self.0.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl std::fmt::Debug for RegistrierungsCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RegistrierungsCode(..)")
    }
}

// ---------------------------------------------------------------------------
// Speicherschluessel
// ---------------------------------------------------------------------------

/// 256-Bit-Schluessel, mit dem der Benutzerspeicher seine Digests versiegelt
#[derive(Clone)]
pub struct Speicherschluessel([u8; 32]);

impl Speicherschluessel {
    pub fn generieren() -> AuthResult<Self> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::Zufall(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn als_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for Speicherschluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Speicherschluessel(<verborgen>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zufalls_hex_laenge_und_alphabet() {
        let wert = zufalls_hex(16).unwrap();
        assert_eq!(wert.len(), 32);
        assert!(wert.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(wert, zufalls_hex(16).unwrap());
    }

    #[test]
    fn generierter_code_hat_20_zeichen() {
        let code = RegistrierungsCode::generieren().unwrap();
        assert_eq!(code.als_str().len(), 20);
    }

    #[test]
    fn code_exakt_und_mit_klammern() {
        let code = RegistrierungsCode::neu("0123456789abcdef0123");
        assert!(code.pruefen("0123456789abcdef0123"));
        assert!(code.pruefen("[0123456789abcdef0123]"));
        assert!(code.pruefen("  [0123456789abcdef0123]\t"));
        assert!(code.pruefen("0123[456789]abcdef0123"));
    }

    #[test]
    fn code_mit_einem_abweichenden_zeichen_wird_abgelehnt() {
        let code = RegistrierungsCode::neu("0123456789abcdef0123");
        assert!(!code.pruefen("0123456789abcdef0124"));
        assert!(!code.pruefen("0123456789abcdef012"));
        assert!(!code.pruefen("0123456789ABCDEF0123"));
        assert!(!code.pruefen(""));
    }

    #[test]
    fn whitespace_innerhalb_der_klammern_bleibt_erhalten() {
        // Trimmen passiert vor dem Entfernen der Klammern
        let code = RegistrierungsCode::neu("abc");
        assert!(!code.pruefen("[ abc ]"));
        assert_eq!(RegistrierungsCode::normalisieren("[ abc ]"), " abc ");
    }

    #[test]
    fn debug_verraet_keine_geheimnisse() {
        let code = RegistrierungsCode::neu("geheim");
        assert!(!format!("{code:?}").contains("geheim"));

        let schluessel = Speicherschluessel::generieren().unwrap();
        let hex = hex::encode(schluessel.als_bytes());
        assert!(!format!("{schluessel:?}").contains(&hex));
    }
}
