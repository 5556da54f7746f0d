//! Wire-Format fuer TCP-Verbindungen
//!
//! Zeilenbasiertes Protokoll: UTF-8-Text, jede Nachricht endet mit `\n`.
//! Ein `\r` vor dem Zeilenende wird beim Lesen toleriert und entfernt.
//! Ungueltige UTF-8-Sequenzen werden durch U+FFFD ersetzt, die Zeile selbst
//! bleibt gueltige Eingabe.
//!
//! Die maximale Zeilenlaenge ist konfigurierbar (Standard: 4 KiB). Laengere
//! Zeilen fuehren zu einem `InvalidData`-Fehler, die Verbindung wird danach
//! vom Aufrufer geschlossen.

use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Zeilenlaenge in Bytes (ohne Zeilenende)
pub const STANDARD_MAX_ZEILENLAENGE: usize = 4096;

// ---------------------------------------------------------------------------
// ZeilenCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer newline-terminierte Textzeilen
///
/// ```rust,no_run
/// use tokio_util::codec::Framed;
/// use plauder_protocol::ZeilenCodec;
///
/// // let stream = TcpStream::connect(...).await?;
/// // let framed = Framed::new(stream, ZeilenCodec::new());
/// ```
#[derive(Debug, Clone)]
pub struct ZeilenCodec {
    max_zeilenlaenge: usize,
    /// Bis zu diesem Offset wurde der Buffer bereits erfolglos nach `\n` durchsucht
    gesucht_bis: usize,
}

impl ZeilenCodec {
    /// Erstellt einen `ZeilenCodec` mit Standard-Limit
    pub fn new() -> Self {
        Self::mit_max_laenge(STANDARD_MAX_ZEILENLAENGE)
    }

    /// Erstellt einen `ZeilenCodec` mit eigener maximaler Zeilenlaenge
    pub fn mit_max_laenge(max_zeilenlaenge: usize) -> Self {
        Self {
            max_zeilenlaenge,
            gesucht_bis: 0,
        }
    }

    fn zu_lang(&self, laenge: usize) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Zeile zu lang: {} Bytes (Maximum: {} Bytes)",
                laenge, self.max_zeilenlaenge
            ),
        )
    }
}

impl Default for ZeilenCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Laenge ohne ein abschliessendes `\r`
fn nutzlaenge(roh: &[u8]) -> usize {
    match roh.last() {
        Some(b'\r') => roh.len() - 1,
        _ => roh.len(),
    }
}

/// Wandelt rohe Zeilen-Bytes (ohne `\n`) in einen String um
fn zeile_dekodieren(roh: &[u8]) -> String {
    String::from_utf8_lossy(&roh[..nutzlaenge(roh)]).into_owned()
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for ZeilenCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let start = self.gesucht_bis.min(src.len());
        let newline = src[start..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|pos| start + pos);

        match newline {
            Some(index) => {
                self.gesucht_bis = 0;
                let laenge = nutzlaenge(&src[..index]);
                if laenge > self.max_zeilenlaenge {
                    return Err(self.zu_lang(laenge));
                }
                let zeile = src.split_to(index + 1);
                Ok(Some(zeile_dekodieren(&zeile[..index])))
            }
            None => {
                // Ein `\r` am Pufferende kann noch zum Zeilenende gehoeren
                let laenge = nutzlaenge(src);
                if laenge > self.max_zeilenlaenge {
                    return Err(self.zu_lang(laenge));
                }
                self.gesucht_bis = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(zeile) = self.decode(src)? {
            return Ok(Some(zeile));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Letzte Zeile ohne Zeilenende
        self.gesucht_bis = 0;
        let rest = src.split_to(src.len());
        Ok(Some(zeile_dekodieren(&rest)))
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl<T: AsRef<str>> Encoder<T> for ZeilenCodec {
    type Error = io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let text = item.as_ref();
        dst.reserve(text.len() + 1);
        dst.put_slice(text.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
