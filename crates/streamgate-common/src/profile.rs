//! Ingestion profile: the declarative input to topology resolution
//!
//! A profile names a capacity tier, a backend variant and a sink target, plus
//! the handful of explicit switches that influence sizing. Profiles are plain
//! values; [`IngestionProfile::validate`] enforces the cross-field invariants.

use serde::{Deserialize, Serialize};

use crate::network::{DEFAULT_ENDPOINT_PATH, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT, HEALTH_PATH};
use crate::{Error, Result};

/// Discrete capacity class driving scale-unit counts and sink sizing
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Single scale unit, development and evaluation traffic
    XSmall,
    /// Two scale units
    Small,
    /// Four scale units
    Medium,
    /// Eight scale units
    Large,
}

impl Tier {
    /// Every tier, smallest first
    pub const ALL: [Tier; 4] = [Tier::XSmall, Tier::Small, Tier::Medium, Tier::Large];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XSmall => write!(f, "xsmall"),
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

/// Kind of ingestion component accepting traffic forwarded by the gateway
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "camelCase")]
pub enum BackendVariant {
    /// Proxy plus forwarding agent on a host scaling group
    #[default]
    ContainerProxyAgent,
    /// Scripted proxy that forwards on its own, on a host scaling group
    ContainerProxyOnly,
    /// Proxy writing logs that a host log agent ships, on a host scaling group
    ContainerProxyLogAgent,
    /// Self-contained server process that writes to the sink itself, on a
    /// host scaling group
    ContainerServer,
    /// Proxy plus forwarding agent as a serverless task, no host scaling group
    ServerlessProxyAgent,
    /// Function receiver invoked directly by the gateway
    FunctionReceiver,
}

impl BackendVariant {
    /// Every backend variant
    pub const ALL: [BackendVariant; 6] = [
        BackendVariant::ContainerProxyAgent,
        BackendVariant::ContainerProxyOnly,
        BackendVariant::ContainerProxyLogAgent,
        BackendVariant::ContainerServer,
        BackendVariant::ServerlessProxyAgent,
        BackendVariant::FunctionReceiver,
    ];

    /// Returns true if the variant runs on hosts managed by a scaling group
    ///
    /// The scaling group's service role acts on its own behalf and needs
    /// independent broker access.
    pub fn is_scaling_group_managed(&self) -> bool {
        matches!(
            self,
            Self::ContainerProxyAgent
                | Self::ContainerProxyOnly
                | Self::ContainerProxyLogAgent
                | Self::ContainerServer
        )
    }

    /// Returns true if the variant is a container backend
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::FunctionReceiver)
    }

    /// Returns true if the variant runs a forwarding agent beside the proxy
    pub fn has_forwarding_agent(&self) -> bool {
        matches!(self, Self::ContainerProxyAgent | Self::ServerlessProxyAgent)
    }
}

impl std::fmt::Display for BackendVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContainerProxyAgent => write!(f, "container-proxy-agent"),
            Self::ContainerProxyOnly => write!(f, "container-proxy-only"),
            Self::ContainerProxyLogAgent => write!(f, "container-proxy-log-agent"),
            Self::ContainerServer => write!(f, "container-server"),
            Self::ServerlessProxyAgent => write!(f, "serverless-proxy-agent"),
            Self::FunctionReceiver => write!(f, "function-receiver"),
        }
    }
}

/// Durable destination ingested data is handed to
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SinkTarget {
    /// Managed data stream, reached through identity-based permissions
    StreamService,
    /// Message broker cluster, reached over the network
    MessageBroker,
    /// No sink; the backend buffers or discards
    None,
}

impl SinkTarget {
    /// Every sink target
    pub const ALL: [SinkTarget; 3] = [
        SinkTarget::StreamService,
        SinkTarget::MessageBroker,
        SinkTarget::None,
    ];
}

impl std::fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StreamService => write!(f, "stream-service"),
            Self::MessageBroker => write!(f, "message-broker"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Public listener ports on the gateway
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ListenerPorts {
    /// Plain HTTP listener port
    #[serde(default = "default_http_port")]
    pub http: u16,
    /// TLS listener port
    #[serde(default = "default_https_port")]
    pub https: u16,
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

fn default_https_port() -> u16 {
    DEFAULT_HTTPS_PORT
}

impl Default for ListenerPorts {
    fn default() -> Self {
        Self {
            http: DEFAULT_HTTP_PORT,
            https: DEFAULT_HTTPS_PORT,
        }
    }
}

fn default_endpoint_path() -> String {
    DEFAULT_ENDPOINT_PATH.to_string()
}

/// Declarative description of one ingestion gateway deployment
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct IngestionProfile {
    /// Capacity tier
    pub tier: Tier,

    /// Backend variant receiving forwarded traffic
    #[serde(default)]
    pub backend_variant: BackendVariant,

    /// Where ingested data ends up
    pub sink_target: SinkTarget,

    /// Opaque certificate reference; presence enables TLS termination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_certificate_ref: Option<String>,

    /// Ingestion path prefix (e.g., "/collect")
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,

    /// Run on the alternate host architecture
    #[serde(default)]
    pub use_alternate_architecture: bool,

    /// Have the forwarding agent acknowledge writes end to end
    #[serde(default)]
    pub stream_ack_enabled: bool,

    /// Attach persistent shared storage where the variant supports it optionally
    #[serde(default)]
    pub attach_shared_storage: bool,

    /// Public listener ports
    #[serde(default)]
    pub listener_ports: ListenerPorts,
}

impl IngestionProfile {
    /// Create a profile with defaults for everything but the three selectors
    pub fn new(tier: Tier, backend_variant: BackendVariant, sink_target: SinkTarget) -> Self {
        Self {
            tier,
            backend_variant,
            sink_target,
            tls_certificate_ref: None,
            endpoint_path: default_endpoint_path(),
            use_alternate_architecture: false,
            stream_ack_enabled: false,
            attach_shared_storage: false,
            listener_ports: ListenerPorts::default(),
        }
    }

    /// Set the certificate reference, enabling TLS termination
    pub fn with_certificate(mut self, certificate_ref: impl Into<String>) -> Self {
        self.tls_certificate_ref = Some(certificate_ref.into());
        self
    }

    /// Set the ingestion path
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Select the alternate host architecture
    pub fn with_alternate_architecture(mut self, enabled: bool) -> Self {
        self.use_alternate_architecture = enabled;
        self
    }

    /// Enable or disable end-to-end stream acknowledgment
    pub fn with_stream_ack(mut self, enabled: bool) -> Self {
        self.stream_ack_enabled = enabled;
        self
    }

    /// Enable or disable optional shared storage
    pub fn with_shared_storage(mut self, enabled: bool) -> Self {
        self.attach_shared_storage = enabled;
        self
    }

    /// Override the public listener ports
    pub fn with_listener_ports(mut self, http: u16, https: u16) -> Self {
        self.listener_ports = ListenerPorts { http, https };
        self
    }

    /// Validate cross-field invariants
    ///
    /// Checks, in order: variant/sink compatibility, endpoint path, listener
    /// ports. The first violation is returned.
    pub fn validate(&self) -> Result<()> {
        if self.backend_variant == BackendVariant::FunctionReceiver
            && self.sink_target == SinkTarget::None
        {
            return Err(Error::invalid_profile_field(
                "sinkTarget",
                format!(
                    "backend variant '{}' requires a sink, got '{}'",
                    self.backend_variant, self.sink_target
                ),
            ));
        }

        if self.endpoint_path.is_empty() {
            return Err(Error::invalid_profile_field(
                "endpointPath",
                "endpoint path must not be empty",
            ));
        }

        if self.endpoint_path == HEALTH_PATH {
            return Err(Error::invalid_profile_field(
                "endpointPath",
                format!("endpoint path '{}' is reserved for health probes", HEALTH_PATH),
            ));
        }

        if self.listener_ports.http == 0 || self.listener_ports.https == 0 {
            return Err(Error::invalid_profile_field(
                "listenerPorts",
                "listener ports must be greater than 0",
            ));
        }

        if self.listener_ports.http == self.listener_ports.https {
            return Err(Error::invalid_profile_field(
                "listenerPorts",
                format!(
                    "http and https listeners cannot share port {}",
                    self.listener_ports.http
                ),
            ));
        }

        Ok(())
    }
}
