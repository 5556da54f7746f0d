//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable, die Werte aus `[logging]` werden
//! dabei ueberschrieben:
//! - `PLAUDER_LOG_LEVEL`: Log-Level oder EnvFilter-Direktive, Standard: info
//! - `PLAUDER_LOG_FORMAT`: Format (text/json), Standard: text

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "PLAUDER_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "PLAUDER_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// Ungueltige Filter fallen auf `info` zurueck, unbekannte Formate auf `text`.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let env_format = std::env::var(ENV_LOG_FORMAT).ok();
    let format = format_waehlen(env_format.as_deref(), format);

    match format {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Umgebung vor Konfiguration, ungueltige Werte zaehlen nicht
fn format_waehlen<'a>(aus_env: Option<&'a str>, aus_config: &'a str) -> &'a str {
    [aus_env, Some(aus_config)]
        .into_iter()
        .flatten()
        .find(|f| log_format_gueltig(f))
        .unwrap_or("text")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
