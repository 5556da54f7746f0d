//! plauder-protocol – Zeilenbasiertes Wire-Protokoll
//!
//! Dieses Crate definiert alle Texte, die der Server an Clients sendet,
//! sowie den Codec fuer die newline-terminierte Rahmung.

pub mod nachrichten;
pub mod wire;

pub use wire::{ZeilenCodec, STANDARD_MAX_ZEILENLAENGE};
