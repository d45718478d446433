//! Pure signing and verification for the Ozow and PayGate adapters, plus the
//! port traits that the application layer drives.

pub mod callback_url;
pub mod canonical;
pub mod digest;
pub mod fields;
pub mod format;
pub mod ozow;
pub mod paygate;
pub mod ports;
pub mod variant;
