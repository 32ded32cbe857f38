//! Common types for Streamgate: ingestion profiles, errors, and network constants

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod network;
pub mod profile;

pub use config::load_profiles;
pub use error::Error;
pub use profile::{BackendVariant, IngestionProfile, ListenerPorts, SinkTarget, Tier};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
