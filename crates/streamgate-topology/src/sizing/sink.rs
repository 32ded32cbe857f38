//! Sink sizing per tier
//!
//! Stream shard counts grow with the tier. Broker clusters keep the same
//! node and partition layout and scale instance size instead; the connector
//! draining the broker into object storage gains one worker per tier.

use serde::Serialize;

use streamgate_common::{SinkTarget, Tier};

/// Retention for both sink kinds
pub const SINK_RETENTION_HOURS: u32 = 120;

const BROKER_NODES_PER_AZ: u32 = 6;
const BROKER_TOPIC_PARTITIONS: u32 = 12;
const BROKER_VOLUME_GIB: u32 = 1000;

/// Broker instance size within its family
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BrokerInstanceSize {
    /// 2 vCPU
    Large,
    /// 4 vCPU
    XLarge,
    /// 8 vCPU
    #[serde(rename = "2xlarge")]
    XLarge2,
}

/// Connector workers moving broker data to long-term storage
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSizing {
    /// Minimum worker count
    pub min_workers: u32,
    /// Maximum worker count
    pub max_workers: u32,
    /// Capacity units per worker
    pub worker_units: u32,
}

/// Capacity parameters for the selected sink
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SinkSizing {
    /// Managed data stream
    #[serde(rename_all = "camelCase")]
    StreamService {
        /// Provisioned shard count
        shard_count: u32,
        /// Record retention
        retention_hours: u32,
    },
    /// Message broker cluster
    #[serde(rename_all = "camelCase")]
    MessageBroker {
        /// Broker instance size
        instance_size: BrokerInstanceSize,
        /// Broker nodes in each availability zone
        nodes_per_az: u32,
        /// Partitions of the ingestion topic
        topic_partitions: u32,
        /// Storage per broker
        volume_gib: u32,
        /// Record retention
        retention_hours: u32,
        /// Drain connector
        connector: ConnectorSizing,
    },
}

impl SinkSizing {
    /// Sizing for a sink target, `None` when there is no sink
    pub fn lookup(tier: Tier, sink: SinkTarget) -> Option<Self> {
        match sink {
            SinkTarget::StreamService => Some(Self::StreamService {
                shard_count: match tier {
                    Tier::XSmall => 12,
                    Tier::Small => 32,
                    Tier::Medium => 64,
                    Tier::Large => 128,
                },
                retention_hours: SINK_RETENTION_HOURS,
            }),
            SinkTarget::MessageBroker => Some(Self::MessageBroker {
                instance_size: match tier {
                    Tier::XSmall => BrokerInstanceSize::Large,
                    Tier::Small => BrokerInstanceSize::XLarge,
                    Tier::Medium | Tier::Large => BrokerInstanceSize::XLarge2,
                },
                nodes_per_az: BROKER_NODES_PER_AZ,
                topic_partitions: BROKER_TOPIC_PARTITIONS,
                volume_gib: BROKER_VOLUME_GIB,
                retention_hours: SINK_RETENTION_HOURS,
                connector: ConnectorSizing {
                    min_workers: 1,
                    max_workers: match tier {
                        Tier::XSmall => 2,
                        Tier::Small => 3,
                        Tier::Medium => 4,
                        Tier::Large => 5,
                    },
                    worker_units: 1,
                },
            }),
            SinkTarget::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::xsmall(Tier::XSmall, 12)]
    #[case::small(Tier::Small, 32)]
    #[case::medium(Tier::Medium, 64)]
    #[case::large(Tier::Large, 128)]
    fn story_stream_shards_scale_with_tier(#[case] tier: Tier, #[case] shards: u32) {
        assert_eq!(
            SinkSizing::lookup(tier, SinkTarget::StreamService),
            Some(SinkSizing::StreamService {
                shard_count: shards,
                retention_hours: 120
            })
        );
    }

    #[test]
    fn story_broker_scales_instance_size_not_layout() {
        let Some(SinkSizing::MessageBroker {
            instance_size,
            nodes_per_az,
            topic_partitions,
            connector,
            ..
        }) = SinkSizing::lookup(Tier::XSmall, SinkTarget::MessageBroker)
        else {
            panic!("expected broker sizing");
        };
        assert_eq!(instance_size, BrokerInstanceSize::Large);
        assert_eq!(nodes_per_az, 6);
        assert_eq!(topic_partitions, 12);
        assert_eq!(connector.max_workers, 2);

        let Some(SinkSizing::MessageBroker {
            instance_size,
            connector,
            ..
        }) = SinkSizing::lookup(Tier::Large, SinkTarget::MessageBroker)
        else {
            panic!("expected broker sizing");
        };
        assert_eq!(instance_size, BrokerInstanceSize::XLarge2);
        assert_eq!(connector.max_workers, 5);
        assert_eq!(connector.min_workers, 1);
    }

    #[test]
    fn story_no_sink_no_sizing() {
        for tier in Tier::ALL {
            assert!(SinkSizing::lookup(tier, SinkTarget::None).is_none());
        }
    }

    #[test]
    fn story_sink_sizing_serializes_tagged() {
        let sizing = SinkSizing::lookup(Tier::Medium, SinkTarget::MessageBroker).unwrap();
        let json = serde_json::to_value(sizing).unwrap();
        assert_eq!(json["kind"], "messageBroker");
        assert_eq!(json["instanceSize"], "2xlarge");
        assert_eq!(json["connector"]["maxWorkers"], 4);
    }
}
