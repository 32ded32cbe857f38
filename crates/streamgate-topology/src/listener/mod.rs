//! Listener routing plan for the public gateway
//!
//! The planner works in one of two modes, chosen once from the TLS input:
//!
//! - **Secured**: the HTTPS listener terminates TLS and carries the forward
//!   rule plus a 403 catch-all. The HTTP listener does nothing but redirect
//!   to HTTPS; the redirect is its default, so it needs no catch-all.
//! - **Plain**: the HTTP listener carries the forward rule and the 403
//!   catch-all. No HTTPS listener exists.
//!
//! Health probes and ingestion share a single forward rule: its path
//! patterns are always `{endpoint_path + "*", "/health"}`.

mod types;

pub use types::{
    HealthCheck, Listener, ListenerId, ListenerRule, RuleAction, RulePriority, TargetGroup,
    TargetKind,
};

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use streamgate_common::network::{DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT, HEALTH_PATH};
use streamgate_common::ListenerPorts;

/// Status code of the catch-all response
pub const DENY_STATUS_CODE: u16 = 403;

/// Body of the catch-all response
pub const DENY_BODY: &str = "DefaultAction: Invalid request";

const DENY_CONTENT_TYPE: &str = "text/plain";

/// TLS termination mode
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum TlsMode {
    /// Terminate TLS with the referenced certificate
    #[serde(rename_all = "camelCase")]
    Secured {
        /// Opaque certificate reference
        certificate_ref: String,
    },
    /// Serve plain HTTP only
    Plain,
}

impl TlsMode {
    /// Secured when a certificate reference is present
    pub fn from_certificate(certificate_ref: Option<&str>) -> Self {
        match certificate_ref {
            Some(reference) => Self::Secured {
                certificate_ref: reference.to_string(),
            },
            None => Self::Plain,
        }
    }

    /// Returns true in secured mode
    pub fn is_secured(&self) -> bool {
        matches!(self, Self::Secured { .. })
    }
}

/// Path patterns of the forward rule
pub fn forward_path_patterns(endpoint_path: &str) -> [String; 2] {
    [format!("{endpoint_path}*"), HEALTH_PATH.to_string()]
}

fn deny_action() -> RuleAction {
    RuleAction::FixedResponse {
        status_code: DENY_STATUS_CODE,
        content_type: DENY_CONTENT_TYPE.to_string(),
        body: DENY_BODY.to_string(),
    }
}

/// Listeners, their rules, and the target group the forward rule points at
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ListenerPlan {
    tls: TlsMode,
    endpoint_path: String,
    listeners: BTreeMap<ListenerId, Listener>,
    target_group: TargetGroup,
}

impl ListenerPlan {
    /// TLS mode the plan was built for
    pub fn tls(&self) -> &TlsMode {
        &self.tls
    }

    /// All listeners keyed by identity
    pub fn listeners(&self) -> &BTreeMap<ListenerId, Listener> {
        &self.listeners
    }

    /// A single listener
    pub fn listener(&self, id: ListenerId) -> Option<&Listener> {
        self.listeners.get(&id)
    }

    /// Ordered rules of a listener
    pub fn rules(&self, id: ListenerId) -> Option<&[ListenerRule]> {
        self.listener(id).map(Listener::rules)
    }

    /// Target group of the forward rule
    pub fn target_group(&self) -> &TargetGroup {
        &self.target_group
    }

    /// Listener carrying the forward rule
    pub fn forwarding_listener(&self) -> ListenerId {
        if self.tls.is_secured() {
            ListenerId::Https
        } else {
            ListenerId::Http
        }
    }

    /// Public URL clients send data to
    ///
    /// The scheme follows the TLS mode. The forwarding listener's port is
    /// included unless it is the scheme's default.
    pub fn endpoint_url(&self, gateway_host: &str) -> String {
        let (scheme, default_port) = if self.tls.is_secured() {
            ("https", DEFAULT_HTTPS_PORT)
        } else {
            ("http", DEFAULT_HTTP_PORT)
        };
        match self.listener(self.forwarding_listener()).map(Listener::port) {
            Some(port) if port != default_port => {
                format!("{scheme}://{gateway_host}:{port}{}", self.endpoint_path)
            }
            _ => format!("{scheme}://{gateway_host}{}", self.endpoint_path),
        }
    }
}

/// Builds listener plans for one backend target
pub struct ListenerPlanner {
    target_group: TargetGroup,
}

impl ListenerPlanner {
    /// Create a planner forwarding to `target_group`
    pub fn new(target_group: TargetGroup) -> Self {
        Self { target_group }
    }

    /// Plan the gateway listeners
    pub fn plan(&self, tls: &TlsMode, endpoint_path: &str, ports: ListenerPorts) -> ListenerPlan {
        let forward = RuleAction::Forward {
            target_group: self.target_group.reference.clone(),
        };

        let mut listeners = BTreeMap::new();
        match tls {
            TlsMode::Secured { certificate_ref } => {
                let mut https = Listener::new(ListenerId::Https, ports.https, deny_action())
                    .with_certificate(certificate_ref.clone());
                https.push_rule(forward_path_patterns(endpoint_path), forward);

                let http = Listener::new(
                    ListenerId::Http,
                    ports.http,
                    RuleAction::Redirect {
                        protocol: ListenerId::Https,
                        port: ports.https,
                    },
                );

                listeners.insert(ListenerId::Https, https);
                listeners.insert(ListenerId::Http, http);
            }
            TlsMode::Plain => {
                let mut http = Listener::new(ListenerId::Http, ports.http, deny_action());
                http.push_rule(forward_path_patterns(endpoint_path), forward);
                listeners.insert(ListenerId::Http, http);
            }
        }

        debug!(
            secured = tls.is_secured(),
            listeners = listeners.len(),
            target = %self.target_group.reference,
            "planned gateway listeners"
        );

        ListenerPlan {
            tls: tls.clone(),
            endpoint_path: endpoint_path.to_string(),
            listeners,
            target_group: self.target_group.clone(),
        }
    }
}
