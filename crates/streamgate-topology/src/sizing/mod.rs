//! Capacity sizing for backend variants
//!
//! The sizing table is a total function over (tier, variant): every pair has
//! an entry, so lookups never fail. Scale is fixed per tier; there is no
//! autoscaling policy in the core.
//!
//! CPU is expressed in scheduler shares (1024 = one vCPU). For variants with
//! a forwarding agent, the proxy receives a fixed eighth of the allocation and
//! the agent everything else.

mod sink;

pub use sink::{BrokerInstanceSize, ConnectorSizing, SinkSizing};

use serde::Serialize;
use tracing::warn;

use streamgate_common::{BackendVariant, IngestionProfile, Tier};

/// CPU shares allocated to every container task
pub const CONTAINER_TASK_CPU: u32 = 2 * 1024;

/// Memory allocated to serverless container tasks
pub const SERVERLESS_TASK_MEMORY_MIB: u32 = 4 * 1024;

/// Memory allocated to the function receiver
pub const FUNCTION_MEMORY_MIB: u32 = 1024;

/// Invocation timeout for the function receiver
pub const FUNCTION_TIMEOUT_SECS: u32 = 60;

/// Root volume attached to hosts that buffer data locally
pub const LOCAL_BUFFER_ROOT_VOLUME_GIB: u32 = 100;

/// Forwarding agent worker threads on the default architecture
pub const DEFAULT_AGENT_THREADS: u32 = 6;

/// Forwarding agent worker threads on the alternate architecture.
///
/// The agent's multi-threaded mode is unstable there.
pub const ALTERNATE_ARCH_AGENT_THREADS: u32 = 1;

/// Host instance family on the default architecture
pub const DEFAULT_INSTANCE_TYPE: &str = "c6i.large";

/// Host instance family on the alternate architecture
pub const ALTERNATE_INSTANCE_TYPE: &str = "c6g.large";

/// Divisor giving the proxy's share of a proxy/agent task
const PROXY_SHARE_DIVISOR: u32 = 8;

/// Fixed minimum and maximum counts of a scaled resource
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ScaleBounds {
    /// Minimum count
    pub min: u32,
    /// Maximum count
    pub max: u32,
}

impl ScaleBounds {
    /// Bounds with min == max
    pub fn fixed(count: u32) -> Self {
        Self {
            min: count,
            max: count,
        }
    }
}

/// CPU allocation split between the proxy and the forwarding agent
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct CpuShares {
    /// Total shares allocated to the task
    pub total: u32,
    /// Shares reserved for the proxy, or the standalone server process
    pub proxy: u32,
    /// Shares reserved for the forwarding agent
    pub agent: u32,
}

impl CpuShares {
    /// Proxy gets a fixed fraction of `total`, the agent the remainder
    fn split(total: u32) -> Self {
        let proxy = total / PROXY_SHARE_DIVISOR;
        Self {
            total,
            proxy,
            agent: total - proxy,
        }
    }

    /// Proxy gets everything
    fn proxy_only(total: u32) -> Self {
        Self {
            total,
            proxy: total,
            agent: 0,
        }
    }

    /// No CPU reservation at all
    fn none() -> Self {
        Self {
            total: 0,
            proxy: 0,
            agent: 0,
        }
    }
}

/// Forwarding agent settings
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    /// Worker thread count hint
    pub threads: u32,
    /// Acknowledge writes end to end before answering the proxy
    pub stream_ack_enabled: bool,
    /// Refuse to start until the sink is reachable
    pub require_healthy: bool,
}

/// Function receiver settings
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSettings {
    /// Memory size
    pub memory_mib: u32,
    /// Invocation timeout
    pub timeout_secs: u32,
}

/// Capacity and resource parameters for one backend deployment
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SizingEntry {
    /// Tier the entry was computed for
    pub tier: Tier,
    /// Variant the entry was computed for
    pub variant: BackendVariant,
    /// Backend scale units (tasks or receivers)
    pub scale: ScaleBounds,
    /// Host instance counts for scaling-group variants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_capacity: Option<ScaleBounds>,
    /// CPU split
    pub cpu: CpuShares,
    /// Task memory limit where the platform requires one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mib: Option<u32>,
    /// Persistent shared storage attached to the backend
    pub shared_storage: bool,
    /// Root volume size for hosts that buffer locally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_volume_gib: Option<u32>,
    /// Hosts use the alternate architecture
    pub alternate_architecture: bool,
    /// Host instance family for scaling-group variants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// Forwarding agent settings, for variants that run one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentSettings>,
    /// Function settings, for the function receiver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionSettings>,
}

/// Inputs to a lookup beyond tier and variant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizingOptions {
    /// Request the alternate host architecture
    pub alternate_architecture: bool,
    /// Agent stream acknowledgment
    pub stream_ack_enabled: bool,
    /// Attach optional shared storage
    pub shared_storage: bool,
}

impl From<&IngestionProfile> for SizingOptions {
    fn from(profile: &IngestionProfile) -> Self {
        Self {
            alternate_architecture: profile.use_alternate_architecture,
            stream_ack_enabled: profile.stream_ack_enabled,
            shared_storage: profile.attach_shared_storage,
        }
    }
}

/// Per-tier capacity lookup
pub struct SizingTable;

impl SizingTable {
    /// Backend scale units for a tier
    pub fn scale_units(tier: Tier) -> u32 {
        match tier {
            Tier::XSmall => 1,
            Tier::Small => 2,
            Tier::Medium => 4,
            Tier::Large => 8,
        }
    }

    /// Look up the sizing entry for a tier and variant
    pub fn lookup(tier: Tier, variant: BackendVariant, options: SizingOptions) -> SizingEntry {
        let scale = ScaleBounds::fixed(Self::scale_units(tier));
        let base = SizingEntry {
            tier,
            variant,
            scale,
            host_capacity: None,
            cpu: CpuShares::none(),
            memory_mib: None,
            shared_storage: false,
            root_volume_gib: None,
            alternate_architecture: false,
            instance_type: None,
            agent: None,
            function: None,
        };

        match variant {
            BackendVariant::ContainerProxyAgent => {
                let alternate = options.alternate_architecture;
                SizingEntry {
                    host_capacity: Some(scale),
                    cpu: CpuShares::split(CONTAINER_TASK_CPU),
                    alternate_architecture: alternate,
                    instance_type: Some(instance_type(alternate).to_string()),
                    agent: Some(agent_settings(alternate, options.stream_ack_enabled)),
                    ..base
                }
            }
            BackendVariant::ContainerProxyOnly => {
                warn_default_hosts_only(tier, variant, options);
                SizingEntry {
                    host_capacity: Some(scale),
                    cpu: CpuShares::proxy_only(CONTAINER_TASK_CPU),
                    instance_type: Some(DEFAULT_INSTANCE_TYPE.to_string()),
                    ..base
                }
            }
            BackendVariant::ContainerProxyLogAgent => SizingEntry {
                host_capacity: Some(scale),
                cpu: CpuShares::proxy_only(CONTAINER_TASK_CPU),
                shared_storage: options.shared_storage,
                root_volume_gib: Some(LOCAL_BUFFER_ROOT_VOLUME_GIB),
                instance_type: Some(DEFAULT_INSTANCE_TYPE.to_string()),
                ..base
            },
            // Single process owns the whole task; storage is never shared
            BackendVariant::ContainerServer => {
                warn_default_hosts_only(tier, variant, options);
                SizingEntry {
                    host_capacity: Some(scale),
                    cpu: CpuShares::proxy_only(CONTAINER_TASK_CPU),
                    root_volume_gib: Some(LOCAL_BUFFER_ROOT_VOLUME_GIB),
                    instance_type: Some(DEFAULT_INSTANCE_TYPE.to_string()),
                    ..base
                }
            }
            BackendVariant::ServerlessProxyAgent => {
                let alternate = options.alternate_architecture;
                SizingEntry {
                    cpu: CpuShares::split(CONTAINER_TASK_CPU),
                    memory_mib: Some(SERVERLESS_TASK_MEMORY_MIB),
                    shared_storage: true,
                    alternate_architecture: alternate,
                    agent: Some(agent_settings(alternate, options.stream_ack_enabled)),
                    ..base
                }
            }
            BackendVariant::FunctionReceiver => SizingEntry {
                memory_mib: Some(FUNCTION_MEMORY_MIB),
                function: Some(FunctionSettings {
                    memory_mib: FUNCTION_MEMORY_MIB,
                    timeout_secs: FUNCTION_TIMEOUT_SECS,
                }),
                ..base
            },
        }
    }
}

fn warn_default_hosts_only(tier: Tier, variant: BackendVariant, options: SizingOptions) {
    if options.alternate_architecture {
        warn!(
            %tier,
            %variant,
            "alternate architecture is not supported by this backend, using default hosts"
        );
    }
}

fn instance_type(alternate_architecture: bool) -> &'static str {
    if alternate_architecture {
        ALTERNATE_INSTANCE_TYPE
    } else {
        DEFAULT_INSTANCE_TYPE
    }
}

fn agent_settings(alternate_architecture: bool, stream_ack_enabled: bool) -> AgentSettings {
    AgentSettings {
        threads: if alternate_architecture {
            ALTERNATE_ARCH_AGENT_THREADS
        } else {
            DEFAULT_AGENT_THREADS
        },
        stream_ack_enabled,
        require_healthy: false,
    }
}
