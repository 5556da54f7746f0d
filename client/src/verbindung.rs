//! Client-seitige TCP-Verbindung zum Plauder-Server
//!
//! Nutzt den `ZeilenCodec` aus plauder-protocol fuer das Wire-Format. Die
//! Schleife leitet Server-Zeilen auf das Terminal und Terminal-Zeilen an den
//! Server weiter, bis eine Seite schliesst oder `/exit` eingegeben wird.

use futures_util::{SinkExt, StreamExt};
use plauder_protocol::ZeilenCodec;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// Lokaler Befehl zum Beenden, wird nie an den Server gesendet
pub const EXIT_BEFEHL: &str = "/exit";

/// Am Text erkennbare Anmeldung (siehe Server-Texte)
const ANMELDUNG_ERFOLGREICH: &str = "Welcome back";

pub fn ist_exit_befehl(eingabe: &str) -> bool {
    eingabe.trim() == EXIT_BEFEHL
}

/// Prompts enden ohne Zeilenumbruch, damit die Eingabe dahinter steht
fn ist_prompt(zeile: &str) -> bool {
    zeile.ends_with(": ")
}

/// Warum die Sitzung geendet hat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ende {
    /// `/exit` eingegeben
    Exit,
    /// Eingabe (stdin) geschlossen
    EingabeGeschlossen,
    /// Server hat die Verbindung geschlossen
    ServerGeschlossen,
}

/// Verbindung zum Chat-Server
pub struct ServerVerbindung<S> {
    framed: Framed<S, ZeilenCodec>,
    /// Nach "Welcome back" gilt jede Eingabe als Chat-Nachricht
    im_chat: bool,
}

impl ServerVerbindung<TcpStream> {
    /// Baut eine TCP-Verbindung zum Server auf
    pub async fn verbinden(adresse: &str) -> std::io::Result<Self> {
        tracing::info!(adresse = %adresse, "Verbinde");
        let stream = TcpStream::connect(adresse).await?;
        tracing::info!(adresse = %adresse, "TCP-Verbindung hergestellt");
        Ok(Self::neu(stream))
    }
}

impl<S> ServerVerbindung<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn neu(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, ZeilenCodec::new()),
            im_chat: false,
        }
    }

    /// Leitet in beide Richtungen weiter bis eine Seite endet
    pub async fn weiterleiten<E, A>(mut self, eingabe: E, mut ausgabe: A) -> std::io::Result<Ende>
    where
        E: AsyncBufRead + Unpin,
        A: AsyncWrite + Unpin,
    {
        let mut eingabe_zeilen = eingabe.lines();

        loop {
            tokio::select! {
                zeile = self.framed.next() => {
                    match zeile {
                        Some(Ok(zeile)) => self.anzeigen(&zeile, &mut ausgabe).await?,
                        Some(Err(e)) => {
                            tracing::warn!(fehler = %e, "Lesefehler vom Server");
                            return Err(e);
                        }
                        None => {
                            ausgabe.write_all(b"Connection closed by server.\n").await?;
                            ausgabe.flush().await?;
                            return Ok(Ende::ServerGeschlossen);
                        }
                    }
                }

                zeile = eingabe_zeilen.next_line() => {
                    let Some(zeile) = zeile? else {
                        return Ok(Ende::EingabeGeschlossen);
                    };
                    if ist_exit_befehl(&zeile) {
                        return Ok(Ende::Exit);
                    }
                    // Leere Zeilen sind gueltige Eingaben (z.B. leeres Passwort)
                    self.framed.send(zeile.as_str()).await?;
                    if self.im_chat && !zeile.is_empty() {
                        ausgabe.write_all(format!("You: {zeile}\n").as_bytes()).await?;
                        ausgabe.flush().await?;
                    }
                }
            }
        }
    }

    async fn anzeigen<A>(&mut self, zeile: &str, ausgabe: &mut A) -> std::io::Result<()>
    where
        A: AsyncWrite + Unpin,
    {
        if zeile.starts_with(ANMELDUNG_ERFOLGREICH) {
            self.im_chat = true;
        }
        if ist_prompt(zeile) {
            ausgabe.write_all(zeile.as_bytes()).await?;
        } else {
            ausgabe.write_all(zeile.as_bytes()).await?;
            ausgabe.write_all(b"\n").await?;
        }
        ausgabe.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    #[test]
    fn exit_befehl_erkennen() {
        assert!(ist_exit_befehl("/exit"));
        assert!(ist_exit_befehl("  /exit\r"));
        assert!(!ist_exit_befehl("/exit bitte"));
        assert!(!ist_exit_befehl("exit"));
    }

    #[test]
    fn prompts_erkennen() {
        assert!(ist_prompt("Username: "));
        assert!(ist_prompt("Password (typing not hidden): "));
        assert!(!ist_prompt("bob: hello"));
        assert!(!ist_prompt("Welcome to the secure chat server!"));
    }

    #[tokio::test]
    async fn server_ende_wird_gemeldet() {
        let (client, mut server) = tokio::io::duplex(1024);
        server
            .write_all(b"Welcome to the secure chat server!\nEnter 'login' or 'register': \n")
            .await
            .unwrap();
        drop(server);

        // Eingabe bleibt offen, bis der Server schliesst
        let (_eingabe_tx, eingabe_rx) = tokio::io::duplex(64);
        let mut ausgabe = Vec::new();
        let ende = ServerVerbindung::neu(client)
            .weiterleiten(BufReader::new(eingabe_rx), &mut ausgabe)
            .await
            .unwrap();

        assert_eq!(ende, Ende::ServerGeschlossen);
        assert_eq!(
            String::from_utf8(ausgabe).unwrap(),
            "Welcome to the secure chat server!\nEnter 'login' or 'register': Connection closed by server.\n"
        );
    }

    #[tokio::test]
    async fn exit_sendet_nichts_leere_zeile_schon() {
        let (client, mut server) = tokio::io::duplex(1024);
        let eingabe: &[u8] = b"login\n\n/exit\nnie gesendet\n";
        let mut ausgabe = Vec::new();

        let ende = ServerVerbindung::neu(client)
            .weiterleiten(BufReader::new(eingabe), &mut ausgabe)
            .await
            .unwrap();
        assert_eq!(ende, Ende::Exit);

        let mut empfangen = String::new();
        server.read_to_string(&mut empfangen).await.unwrap();
        assert_eq!(empfangen, "login\n\n");
    }

    #[tokio::test]
    async fn chat_zeilen_werden_lokal_angezeigt() {
        let (client, mut server) = tokio::io::duplex(1024);
        server.write_all(b"Welcome back, alice!\n").await.unwrap();

        let mut verbindung = ServerVerbindung::neu(client);
        let mut ausgabe = Vec::new();
        // Willkommen zuerst verarbeiten, dann die Eingabe
        let zeile = verbindung.framed.next().await.unwrap().unwrap();
        verbindung.anzeigen(&zeile, &mut ausgabe).await.unwrap();
        assert!(verbindung.im_chat);

        let eingabe: &[u8] = b"hallo\n\n";
        let ende = verbindung
            .weiterleiten(BufReader::new(eingabe), &mut ausgabe)
            .await
            .unwrap();
        assert_eq!(ende, Ende::EingabeGeschlossen);
        assert_eq!(
            String::from_utf8(ausgabe).unwrap(),
            "Welcome back, alice!\nYou: hallo\n"
        );

        let mut empfangen = String::new();
        server.read_to_string(&mut empfangen).await.unwrap();
        // Die leere Zeile geht raus, wird aber nicht als "You:" angezeigt
        assert_eq!(empfangen, "hallo\n\n");
    }
}
