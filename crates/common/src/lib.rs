//! Error scaffolding shared across all lapak crates.

pub mod error;

pub use error::FromMessage;
