//! Plauder Client – Terminal-Client fuer den Chat-Server
//!
//! Zeigt jede Server-Zeile an und sendet jede eingegebene Zeile. `/exit`
//! beendet den Client ohne etwas zu senden.

mod verbindung;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use verbindung::{Ende, ServerVerbindung};

#[derive(Parser)]
#[command(name = "plauder-client", about = "Terminal-Client fuer den Plauder-Chat")]
struct Args {
    /// Server-Adresse, z.B. 127.0.0.1:9000 (ohne Angabe wird nachgefragt)
    #[arg(env = "PLAUDER_SERVER")]
    adresse: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PLAUDER_LOG_LEVEL")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut stdin = BufReader::new(tokio::io::stdin());

    let adresse = match args.adresse {
        Some(adresse) => adresse,
        None => adresse_abfragen(&mut stdin).await?,
    };

    let verbindung = ServerVerbindung::verbinden(&adresse)
        .await
        .with_context(|| format!("Verbindung zu {adresse} fehlgeschlagen"))?;

    let ende = verbindung
        .weiterleiten(stdin, tokio::io::stdout())
        .await
        .context("Verbindung abgebrochen")?;

    tracing::info!(ende = ?ende, "Client beendet");
    if ende == Ende::Exit {
        println!("Bye.");
    }
    Ok(())
}

async fn adresse_abfragen(stdin: &mut BufReader<tokio::io::Stdin>) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Server address (e.g. 127.0.0.1:9000): ").await?;
    stdout.flush().await?;

    let mut zeile = String::new();
    stdin.read_line(&mut zeile).await?;
    let adresse = zeile.trim();
    if adresse.is_empty() {
        anyhow::bail!("Keine Server-Adresse angegeben");
    }
    Ok(adresse.to_string())
}
