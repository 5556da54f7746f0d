//! Wire-Texte des Chat-Protokolls
//!
//! Alle Zeilen, die der Server sendet, stehen hier an einer Stelle. Clients
//! erkennen Zustaende teilweise am Text (z.B. `(typing not hidden):` fuer
//! Passwort-Eingaben), deshalb duerfen sich die Strings nicht aendern.
//! Das Zeilenende (`\n`) haengt der [`ZeilenCodec`](crate::ZeilenCodec) an.

// ---------------------------------------------------------------------------
// Begruessung und Auswahl
// ---------------------------------------------------------------------------

pub const WILLKOMMEN: &str = "Welcome to the secure chat server!";
pub const WAHL_PROMPT: &str = "Enter 'login' or 'register': ";
pub const UNGUELTIGE_WAHL: &str = "Invalid choice. Closing.";

/// Schluesselwoerter der Auswahl (Vergleich ohne Gross-/Kleinschreibung)
pub const WAHL_REGISTRIEREN: &str = "register";
pub const WAHL_ANMELDEN: &str = "login";

// ---------------------------------------------------------------------------
// Registrierung
// ---------------------------------------------------------------------------

pub const CODE_PROMPT: &str = "Enter the server's registration code: ";
pub const UNGUELTIGER_CODE: &str = "Invalid registration code. Closing connection.";
pub const REG_NAME_PROMPT: &str = "Enter your desired username: ";
pub const REG_PASSWORT_PROMPT: &str = "Enter your desired password (typing not hidden): ";
pub const REGISTRIERUNG_ERFOLGREICH: &str = "Registration successful! You can now login.";
pub const REGISTRIERUNG_NAME_VERGEBEN: &str = "Registration failed: username already taken.";
pub const REGISTRIERUNG_FEHLER: &str = "Registration failed: internal error.";

// ---------------------------------------------------------------------------
// Anmeldung
// ---------------------------------------------------------------------------

pub const NAME_PROMPT: &str = "Username: ";
pub const PASSWORT_PROMPT: &str = "Password (typing not hidden): ";

/// Einheitliche Ablehnung fuer unbekannte Benutzer UND falsche Passwoerter
pub const UNGUELTIGE_ANMELDEDATEN: &str = "Invalid username or password.";

pub fn willkommen_zurueck(username: &str) -> String {
    format!("Welcome back, {username}!")
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

pub fn beigetreten(username: &str) -> String {
    format!("{username} has joined the chat")
}

pub fn verlassen(username: &str) -> String {
    format!("{username} has left the chat")
}

/// Formatiert eine weitergeleitete Chat-Zeile
pub fn chat_zeile(username: &str, text: &str) -> String {
    format!("{username}: {text}")
}
