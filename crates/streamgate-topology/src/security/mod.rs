//! Security-boundary graph for the ingestion gateway
//!
//! Edges are directed ingress grants: the source principal may open a
//! connection to the destination on the listed ports. The builder emits the
//! minimal set of edges traffic needs to flow from the internet to the sink:
//!
//! - **Backbone**: internet → gateway on the public listener ports
//! - **Forwarding**: gateway → backend on the backend port
//! - **Broker access**: backend → broker, plus the scaling-group role when
//!   the backend runs on a managed host group
//!
//! Stream-service sinks are reached through identity-based permissions, not
//! the network, so they contribute no edge.
//!
//! Principals are ordered by traffic direction. Every edge points from a
//! lower-ranked principal to a higher-ranked one, which keeps the graph
//! acyclic and keeps the internet out of every destination slot.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use streamgate_common::network::{BACKEND_PORT, BROKER_PORT_END, BROKER_PORT_START};
use streamgate_common::{BackendVariant, Error, IngestionProfile, Result, SinkTarget};

// =============================================================================
// Principals and ports
// =============================================================================

/// A party in the security graph
///
/// Declaration order is traffic order; the derived `Ord` relies on it.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Principal {
    /// Any address on the public internet
    Internet,
    /// The public load balancer
    Gateway,
    /// Container backend tasks
    Backend,
    /// Function receiver
    FunctionReceiver,
    /// Service role of the backend's host scaling group
    ScalingGroupRole,
    /// Message broker cluster
    MessageBroker,
}

impl Principal {
    /// The principal that receives forwarded traffic for a backend variant
    pub fn for_backend(variant: BackendVariant) -> Self {
        match variant {
            BackendVariant::FunctionReceiver => Self::FunctionReceiver,
            _ => Self::Backend,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internet => write!(f, "internet"),
            Self::Gateway => write!(f, "gateway"),
            Self::Backend => write!(f, "backend"),
            Self::FunctionReceiver => write!(f, "function-receiver"),
            Self::ScalingGroupRole => write!(f, "scaling-group-role"),
            Self::MessageBroker => write!(f, "message-broker"),
        }
    }
}

/// Inclusive TCP port range
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortRange {
    /// First port
    pub start: u16,
    /// Last port
    pub end: u16,
}

impl PortRange {
    /// A single port
    pub fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// An inclusive range
    pub fn range(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Returns true if the range contains no usable port
    pub fn is_empty(&self) -> bool {
        self.start == 0 || self.start > self.end
    }

    /// Returns true if `port` falls inside the range
    pub fn contains(&self, port: u16) -> bool {
        !self.is_empty() && (self.start..=self.end).contains(&port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

// =============================================================================
// Edges
// =============================================================================

/// Directed ingress grant between two principals
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEdge {
    source: Principal,
    destination: Principal,
    ports: Vec<PortRange>,
}

impl SecurityEdge {
    /// Create an edge, rejecting ones that break the graph's invariants
    ///
    /// The internet may never be a destination, edges must move forward in
    /// traffic order, and every edge needs at least one non-empty port range.
    pub fn new(
        source: Principal,
        destination: Principal,
        ports: impl IntoIterator<Item = PortRange>,
    ) -> Result<Self> {
        let ports: Vec<PortRange> = ports.into_iter().collect();

        if destination == Principal::Internet {
            return Err(Error::invalid_edge(
                source,
                destination,
                "the public internet cannot be a destination",
            ));
        }
        if source >= destination {
            return Err(Error::invalid_edge(
                source,
                destination,
                "edges must follow traffic direction",
            ));
        }
        if ports.is_empty() {
            return Err(Error::invalid_edge(source, destination, "no ports given"));
        }
        if let Some(bad) = ports.iter().find(|p| p.is_empty()) {
            return Err(Error::invalid_edge(
                source,
                destination,
                format!("empty port range {}-{}", bad.start, bad.end),
            ));
        }

        Ok(Self {
            source,
            destination,
            ports,
        })
    }

    /// Principal initiating connections
    pub fn source(&self) -> Principal {
        self.source
    }

    /// Principal accepting connections
    pub fn destination(&self) -> Principal {
        self.destination
    }

    /// Allowed destination ports
    pub fn ports(&self) -> &[PortRange] {
        &self.ports
    }

    /// Returns true if the edge allows `port`
    pub fn allows_port(&self, port: u16) -> bool {
        self.ports.iter().any(|p| p.contains(port))
    }
}

impl fmt::Display for SecurityEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ports: Vec<String> = self.ports.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{}->{}:[{}]",
            self.source,
            self.destination,
            ports.join(",")
        )
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Derives the security edges for an ingestion profile
pub struct SecurityGraphBuilder;

impl SecurityGraphBuilder {
    /// Build the ordered edge list for a profile
    ///
    /// Edges come out in traffic order: backbone, forwarding, then sink
    /// access.
    pub fn build(profile: &IngestionProfile) -> Result<Vec<SecurityEdge>> {
        let backend = Principal::for_backend(profile.backend_variant);
        let mut edges = Vec::with_capacity(4);

        edges.push(SecurityEdge::new(
            Principal::Internet,
            Principal::Gateway,
            [
                PortRange::single(profile.listener_ports.http),
                PortRange::single(profile.listener_ports.https),
            ],
        )?);

        edges.push(SecurityEdge::new(
            Principal::Gateway,
            backend,
            [PortRange::single(BACKEND_PORT)],
        )?);

        match profile.sink_target {
            SinkTarget::MessageBroker => {
                Self::add_broker_edges(profile.backend_variant, backend, &mut edges)?;
            }
            // Stream access goes through the identity channel, not the network
            SinkTarget::StreamService | SinkTarget::None => {}
        }

        debug!(
            variant = %profile.backend_variant,
            sink = %profile.sink_target,
            edges = edges.len(),
            "built security graph"
        );

        Ok(edges)
    }

    fn add_broker_edges(
        variant: BackendVariant,
        backend: Principal,
        edges: &mut Vec<SecurityEdge>,
    ) -> Result<()> {
        let broker_ports = PortRange::range(BROKER_PORT_START, BROKER_PORT_END);

        edges.push(SecurityEdge::new(
            backend,
            Principal::MessageBroker,
            [broker_ports],
        )?);

        if variant.is_scaling_group_managed() {
            edges.push(SecurityEdge::new(
                Principal::ScalingGroupRole,
                Principal::MessageBroker,
                [broker_ports],
            )?);
        }

        Ok(())
    }
}
