//! Network constants for the ingestion gateway
//!
//! Single source of truth for the ports and paths shared by security-graph
//! and listener planning.

// =============================================================================
// Ports
// =============================================================================

/// Default public HTTP listener port on the gateway.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default public HTTPS listener port on the gateway.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Internal port every backend variant accepts forwarded traffic on.
///
/// Container backends bind their proxy here; the function receiver's network
/// boundary opens the same port so both kinds share one gateway edge shape.
pub const BACKEND_PORT: u16 = 8088;

/// First port of the message broker's client range.
pub const BROKER_PORT_START: u16 = 9092;

/// Last port of the message broker's client range.
///
/// The range spans plaintext, TLS and IAM-authenticated client listeners.
pub const BROKER_PORT_END: u16 = 9198;

// =============================================================================
// Paths
// =============================================================================

/// Health probe path, reserved: ingestion paths may not use it.
pub const HEALTH_PATH: &str = "/health";

/// Default ingestion path when a profile does not name one.
pub const DEFAULT_ENDPOINT_PATH: &str = "/collect";
