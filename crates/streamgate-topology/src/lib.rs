//! Topology resolution for the Streamgate ingestion gateway
//!
//! This crate turns an [`IngestionProfile`] into everything the provisioning
//! layer needs to stand up one gateway deployment:
//!
//! - **Sizing**: backend capacity per tier and variant, plus sink capacity
//! - **Security**: the directed ingress edges traffic needs, nothing more
//! - **Listener**: gateway listeners, ordered rules and the target group
//! - **Resolver**: validates the profile and composes the three
//!
//! Everything here is pure computation over owned values.

pub mod listener;
pub mod resolver;
pub mod security;
pub mod sizing;

pub use listener::{ListenerPlan, ListenerPlanner, TlsMode};
pub use resolver::{ResolvedTopology, TopologyResolver};
pub use security::{PortRange, Principal, SecurityEdge, SecurityGraphBuilder};
pub use sizing::{SinkSizing, SizingEntry, SizingOptions, SizingTable};

pub use streamgate_common::{Error, IngestionProfile, Result};
