//! Topology resolution for Streamgate
//!
//! The resolver composes the per-concern builders into one result:
//!
//! 1. Validate the profile; nothing is computed for an invalid one
//! 2. [`SizingTable`] and [`SinkSizing`] capacity lookups
//! 3. [`SecurityGraphBuilder`] edges
//! 4. [`ListenerPlanner`] routing plan for the backend's target group
//!
//! # Usage
//!
//! ```text
//! let profile = IngestionProfile::new(Tier::Small, BackendVariant::default(), SinkTarget::MessageBroker)
//!     .with_certificate("cert-1");
//! let topology = TopologyResolver::new().resolve(&profile)?;
//! // topology.sizing, topology.security_edges, topology.listener_plan
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use streamgate_common::{BackendVariant, IngestionProfile, Result};

use crate::listener::{ListenerPlan, ListenerPlanner, TargetGroup, TlsMode};
use crate::security::{SecurityEdge, SecurityGraphBuilder};
use crate::sizing::{SinkSizing, SizingEntry, SizingOptions, SizingTable};

/// Target group reference used for container backends unless overridden
pub const DEFAULT_CONTAINER_TARGET: &str = "container-targets";

/// Target group reference used for the function receiver unless overridden
pub const DEFAULT_FUNCTION_TARGET: &str = "function-targets";

/// Everything derived from one ingestion profile
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTopology {
    /// Profile the topology was resolved from
    pub profile: IngestionProfile,
    /// Backend capacity
    pub sizing: SizingEntry,
    /// Sink capacity; absent without a sink
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<SinkSizing>,
    /// Ingress grants in traffic order
    pub security_edges: Vec<SecurityEdge>,
    /// Gateway listeners and target group
    pub listener_plan: ListenerPlan,
}

impl ResolvedTopology {
    /// Public URL clients send data to, once the gateway host is known
    pub fn endpoint_url(&self, gateway_host: &str) -> String {
        self.listener_plan.endpoint_url(gateway_host)
    }
}

/// Resolves ingestion profiles into topologies
///
/// Holds the opaque target group references the provisioning layer hands
/// out; resolution itself is stateless.
#[derive(Clone, Debug)]
pub struct TopologyResolver {
    container_target: String,
    function_target: String,
}

impl Default for TopologyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyResolver {
    /// Resolver using the default target group references
    pub fn new() -> Self {
        Self {
            container_target: DEFAULT_CONTAINER_TARGET.to_string(),
            function_target: DEFAULT_FUNCTION_TARGET.to_string(),
        }
    }

    /// Override the container target group reference
    pub fn with_container_target(mut self, reference: impl Into<String>) -> Self {
        self.container_target = reference.into();
        self
    }

    /// Override the function target group reference
    pub fn with_function_target(mut self, reference: impl Into<String>) -> Self {
        self.function_target = reference.into();
        self
    }

    /// Target group the gateway forwards to for a variant
    pub fn target_group(&self, variant: BackendVariant) -> TargetGroup {
        match variant {
            BackendVariant::FunctionReceiver => TargetGroup::function(&self.function_target),
            _ => TargetGroup::container(&self.container_target),
        }
    }

    /// Resolve a profile
    ///
    /// Fails with `InvalidProfile` when the profile breaks an invariant.
    pub fn resolve(&self, profile: &IngestionProfile) -> Result<ResolvedTopology> {
        if let Err(e) = profile.validate() {
            warn!(
                tier = %profile.tier,
                variant = %profile.backend_variant,
                sink = %profile.sink_target,
                error = %e,
                "rejected ingestion profile"
            );
            return Err(e);
        }

        let sizing = SizingTable::lookup(
            profile.tier,
            profile.backend_variant,
            SizingOptions::from(profile),
        );
        let sink = SinkSizing::lookup(profile.tier, profile.sink_target);
        let security_edges = SecurityGraphBuilder::build(profile)?;

        let tls = TlsMode::from_certificate(profile.tls_certificate_ref.as_deref());
        let listener_plan = ListenerPlanner::new(self.target_group(profile.backend_variant)).plan(
            &tls,
            &profile.endpoint_path,
            profile.listener_ports,
        );

        debug!(
            tier = %profile.tier,
            variant = %profile.backend_variant,
            sink = %profile.sink_target,
            scale = sizing.scale.max,
            edges = security_edges.len(),
            secured = tls.is_secured(),
            "resolved ingestion topology"
        );

        Ok(ResolvedTopology {
            profile: profile.clone(),
            sizing,
            sink,
            security_edges,
            listener_plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{ListenerId, RuleAction, RulePriority, TargetKind};
    use streamgate_common::{Error, SinkTarget, Tier};

    fn broker_profile() -> IngestionProfile {
        IngestionProfile::new(
            Tier::Small,
            BackendVariant::ContainerProxyAgent,
            SinkTarget::MessageBroker,
        )
        .with_certificate("cert-1")
        .with_endpoint_path("/collect")
    }

    #[test]
    fn story_secured_broker_deployment_on_scaling_group() {
        let topology = TopologyResolver::new().resolve(&broker_profile()).unwrap();

        assert_eq!(topology.sizing.scale.min, 2);
        assert_eq!(topology.sizing.scale.max, 2);

        let edges: Vec<String> = topology
            .security_edges
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            edges,
            vec![
                "internet->gateway:[80,443]",
                "gateway->backend:[8088]",
                "backend->message-broker:[9092-9198]",
                "scaling-group-role->message-broker:[9092-9198]",
            ]
        );

        let https = topology
            .listener_plan
            .rules(ListenerId::Https)
            .expect("https listener");
        assert_eq!(https.len(), 2);
        assert_eq!(https[0].priority.value(), Some(1));
        assert_eq!(
            https[0].action,
            RuleAction::Forward {
                target_group: DEFAULT_CONTAINER_TARGET.to_string()
            }
        );
        assert!(https[0].path_patterns.contains("/collect*"));
        assert!(https[0].path_patterns.contains("/health"));
        assert!(https[1].action.is_fixed_response());

        let http = topology
            .listener_plan
            .rules(ListenerId::Http)
            .expect("http listener");
        assert_eq!(http.len(), 1);
        assert_eq!(http[0].priority, RulePriority::Default);
        assert_eq!(
            http[0].action,
            RuleAction::Redirect {
                protocol: ListenerId::Https,
                port: 443
            }
        );

        assert!(matches!(
            topology.sink,
            Some(SinkSizing::MessageBroker { .. })
        ));
    }

    #[test]
    fn story_resolution_is_idempotent() {
        let resolver = TopologyResolver::new();
        let first = resolver.resolve(&broker_profile()).unwrap();
        let second = resolver.resolve(&broker_profile()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn story_function_receiver_needs_a_sink() {
        let resolver = TopologyResolver::new();
        let profile = IngestionProfile::new(
            Tier::XSmall,
            BackendVariant::FunctionReceiver,
            SinkTarget::None,
        );
        let err = resolver.resolve(&profile).unwrap_err();
        assert!(matches!(err, Error::InvalidProfile { .. }));
        assert_eq!(err.field(), Some("sinkTarget"));

        let profile = IngestionProfile::new(
            Tier::XSmall,
            BackendVariant::FunctionReceiver,
            SinkTarget::StreamService,
        );
        let topology = resolver.resolve(&profile).unwrap();
        assert_eq!(
            topology.listener_plan.target_group().kind,
            TargetKind::Function
        );
        assert_eq!(
            topology.listener_plan.target_group().reference,
            DEFAULT_FUNCTION_TARGET
        );
    }

    #[test]
    fn story_reserved_health_path_rejected() {
        let profile = broker_profile().with_endpoint_path("/health");
        let err = TopologyResolver::new().resolve(&profile).unwrap_err();
        assert_eq!(err.field(), Some("endpointPath"));
    }

    #[test]
    fn story_custom_target_references() {
        let resolver = TopologyResolver::new()
            .with_container_target("tg-containers")
            .with_function_target("tg-fn");

        let topology = resolver.resolve(&broker_profile()).unwrap();
        assert_eq!(topology.listener_plan.target_group().reference, "tg-containers");

        let profile = IngestionProfile::new(
            Tier::Medium,
            BackendVariant::FunctionReceiver,
            SinkTarget::MessageBroker,
        );
        let topology = resolver.resolve(&profile).unwrap();
        assert_eq!(topology.listener_plan.target_group().reference, "tg-fn");
    }

    #[test]
    fn story_endpoint_url_follows_tls() {
        let resolver = TopologyResolver::new();
        let topology = resolver.resolve(&broker_profile()).unwrap();
        assert_eq!(
            topology.endpoint_url("ingest.example.com"),
            "https://ingest.example.com/collect"
        );

        let plain = IngestionProfile::new(
            Tier::Small,
            BackendVariant::ContainerProxyOnly,
            SinkTarget::StreamService,
        );
        let topology = resolver.resolve(&plain).unwrap();
        assert_eq!(
            topology.endpoint_url("ingest.example.com"),
            "http://ingest.example.com/collect"
        );
    }

    #[test]
    fn story_topology_serializes_camel_case() {
        let topology = TopologyResolver::new().resolve(&broker_profile()).unwrap();
        let json = serde_json::to_value(&topology).unwrap();
        assert_eq!(json["sizing"]["scale"]["max"], 2);
        assert_eq!(json["sink"]["kind"], "messageBroker");
        assert_eq!(json["securityEdges"].as_array().map(Vec::len), Some(4));
        assert_eq!(json["profile"]["backendVariant"], "containerProxyAgent");
        assert!(json["listenerPlan"]["listeners"]["https"].is_object());
    }
}
