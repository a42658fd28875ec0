//! Foreign-language entry point for Meshtag.
//!
//! Re-exports [`meshtag_core`] together with its `UniFFI` scaffolding so a single
//! `staticlib`/`cdylib` carries the whole API into Swift and Kotlin apps.

pub use meshtag_core::*;

meshtag_core::uniffi_reexport_scaffolding!();

uniffi::setup_scaffolding!("meshtag");
