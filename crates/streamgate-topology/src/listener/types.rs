//! Listener, rule and target-group types emitted by the planner

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

use serde::Serialize;

use streamgate_common::network::{BACKEND_PORT, HEALTH_PATH};

// =============================================================================
// Listeners
// =============================================================================

/// Identity of a gateway listener
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListenerId {
    /// Plain HTTP listener
    Http,
    /// TLS-terminating listener
    Https,
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "HTTP"),
            Self::Https => write!(f, "HTTPS"),
        }
    }
}

/// Rule evaluation order within a listener
///
/// Explicit priorities are evaluated lowest first; the listener default
/// always comes after every explicit priority.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RulePriority {
    /// Explicit, unique within the listener
    Explicit(NonZeroU32),
    /// The listener's catch-all
    Default,
}

impl RulePriority {
    /// Explicit priority value, `None` for the default rule
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Explicit(p) => Some(p.get()),
            Self::Default => None,
        }
    }
}

/// What a listener does with a matching request
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleAction {
    /// Forward to a target group
    #[serde(rename_all = "camelCase")]
    Forward {
        /// Opaque target group reference
        target_group: String,
    },
    /// Redirect the client to another listener
    #[serde(rename_all = "camelCase")]
    Redirect {
        /// Protocol to redirect to
        protocol: ListenerId,
        /// Port to redirect to
        port: u16,
    },
    /// Answer directly without reaching a backend
    #[serde(rename_all = "camelCase")]
    FixedResponse {
        /// HTTP status code
        status_code: u16,
        /// Response content type
        content_type: String,
        /// Response body
        body: String,
    },
}

impl RuleAction {
    /// Returns true for [`RuleAction::Forward`]
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward { .. })
    }

    /// Returns true for [`RuleAction::Redirect`]
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    /// Returns true for [`RuleAction::FixedResponse`]
    pub fn is_fixed_response(&self) -> bool {
        matches!(self, Self::FixedResponse { .. })
    }
}

/// One entry of a listener's ordered rule list
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ListenerRule {
    /// Evaluation order
    pub priority: RulePriority,
    /// Path conditions; empty for the default rule
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub path_patterns: BTreeSet<String>,
    /// Action taken on match
    pub action: RuleAction,
}

/// A gateway listener and its ordered rules
///
/// Rules are kept sorted by priority and the default rule is always last.
/// Explicit priorities are assigned on insertion, so they are unique by
/// construction.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    id: ListenerId,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate_ref: Option<String>,
    rules: Vec<ListenerRule>,
}

impl Listener {
    /// Create a listener whose only rule is the given default action
    pub fn new(id: ListenerId, port: u16, default_action: RuleAction) -> Self {
        Self {
            id,
            port,
            certificate_ref: None,
            rules: vec![ListenerRule {
                priority: RulePriority::Default,
                path_patterns: BTreeSet::new(),
                action: default_action,
            }],
        }
    }

    /// Attach a TLS certificate reference
    pub fn with_certificate(mut self, certificate_ref: impl Into<String>) -> Self {
        self.certificate_ref = Some(certificate_ref.into());
        self
    }

    /// Add a rule with the next free explicit priority
    ///
    /// The rule lands after every existing explicit rule and before the
    /// default.
    pub fn push_rule<I, S>(&mut self, path_patterns: I, action: RuleAction) -> RulePriority
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let taken = self.explicit_rules().len() as u32;
        let priority = RulePriority::Explicit(NonZeroU32::MIN.saturating_add(taken));
        let position = self.rules.len() - 1;
        self.rules.insert(
            position,
            ListenerRule {
                priority,
                path_patterns: path_patterns.into_iter().map(Into::into).collect(),
                action,
            },
        );
        priority
    }

    /// Listener identity
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Listener port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Certificate reference for TLS listeners
    pub fn certificate_ref(&self) -> Option<&str> {
        self.certificate_ref.as_deref()
    }

    /// Every rule in evaluation order, default last
    pub fn rules(&self) -> &[ListenerRule] {
        &self.rules
    }

    /// Rules with explicit priorities
    pub fn explicit_rules(&self) -> &[ListenerRule] {
        &self.rules[..self.rules.len() - 1]
    }

    /// The catch-all rule
    pub fn default_rule(&self) -> &ListenerRule {
        // `new` seeds the default and nothing removes it
        &self.rules[self.rules.len() - 1]
    }
}

// =============================================================================
// Target groups
// =============================================================================

/// Kind of backend a target group points at
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Container tasks reached on the backend port
    Container,
    /// Function invoked by the gateway
    Function,
}

/// Health-check parameters for a target group
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    /// Probe path
    pub path: String,
    /// Probe port; `None` lets the target decide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Seconds between probes
    pub interval_secs: u32,
    /// Seconds before a probe counts as failed
    pub timeout_secs: u32,
    /// Consecutive successes before a target is healthy
    pub healthy_threshold: u32,
    /// Consecutive failures before a target is unhealthy
    pub unhealthy_threshold: u32,
}

impl HealthCheck {
    /// Container probes: short interval for fast failure detection
    pub fn container() -> Self {
        Self {
            path: HEALTH_PATH.to_string(),
            port: Some(BACKEND_PORT),
            interval_secs: 10,
            timeout_secs: 6,
            healthy_threshold: 2,
            unhealthy_threshold: 5,
        }
    }

    /// Function probes: long interval tolerating cold starts
    pub fn function() -> Self {
        Self {
            path: HEALTH_PATH.to_string(),
            port: None,
            interval_secs: 60,
            timeout_secs: 10,
            healthy_threshold: 2,
            unhealthy_threshold: 2,
        }
    }
}

/// Forwarding destination of the ingestion rule
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    /// Opaque reference supplied by the provisioning layer
    pub reference: String,
    /// Backend kind
    pub kind: TargetKind,
    /// Port forwarded traffic arrives on; `None` for functions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Health-check parameters
    pub health_check: HealthCheck,
}

impl TargetGroup {
    /// Target group for container backends
    pub fn container(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            kind: TargetKind::Container,
            port: Some(BACKEND_PORT),
            health_check: HealthCheck::container(),
        }
    }

    /// Target group for the function receiver
    pub fn function(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            kind: TargetKind::Function,
            port: None,
            health_check: HealthCheck::function(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deny() -> RuleAction {
        RuleAction::FixedResponse {
            status_code: 403,
            content_type: "text/plain".to_string(),
            body: "denied".to_string(),
        }
    }

    #[test]
    fn story_rules_stay_ahead_of_default() {
        let mut listener = Listener::new(ListenerId::Http, 80, deny());
        let first = listener.push_rule(
            ["/a*"],
            RuleAction::Forward {
                target_group: "tg".to_string(),
            },
        );
        let second = listener.push_rule(
            ["/b*"],
            RuleAction::Forward {
                target_group: "tg".to_string(),
            },
        );

        assert_eq!(first.value(), Some(1));
        assert_eq!(second.value(), Some(2));
        assert_eq!(listener.rules().len(), 3);
        assert_eq!(listener.explicit_rules().len(), 2);
        assert_eq!(listener.default_rule().priority, RulePriority::Default);
        assert!(listener.default_rule().path_patterns.is_empty());

        let priorities: Vec<_> = listener.rules().iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn story_default_priority_orders_last() {
        let explicit = RulePriority::Explicit(NonZeroU32::new(u32::MAX).unwrap());
        assert!(explicit < RulePriority::Default);
        assert_eq!(RulePriority::Default.value(), None);
    }

    #[test]
    fn story_health_checks_differ_by_kind() {
        let container = TargetGroup::container("c");
        assert_eq!(container.health_check.interval_secs, 10);
        assert_eq!(container.health_check.timeout_secs, 6);
        assert_eq!(container.health_check.unhealthy_threshold, 5);
        assert_eq!(container.health_check.port, Some(8088));

        let function = TargetGroup::function("f");
        assert_eq!(function.health_check.interval_secs, 60);
        assert_eq!(function.health_check.timeout_secs, 10);
        assert_eq!(function.health_check.unhealthy_threshold, 2);
        assert_eq!(function.port, None);
        assert_eq!(function.health_check.path, "/health");
    }

    #[test]
    fn story_actions_serialize_tagged() {
        let redirect = RuleAction::Redirect {
            protocol: ListenerId::Https,
            port: 443,
        };
        assert!(redirect.is_redirect());
        assert!(!redirect.is_forward());
        let json = serde_json::to_value(redirect).unwrap();
        assert_eq!(json["type"], "redirect");
        assert_eq!(json["protocol"], "https");
        assert_eq!(json["port"], 443);

        let json = serde_json::to_value(deny()).unwrap();
        assert_eq!(json["type"], "fixedResponse");
        assert_eq!(json["statusCode"], 403);
    }
}
