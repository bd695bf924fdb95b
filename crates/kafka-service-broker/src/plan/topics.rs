use tracing::debug;

use kafka_broker_cluster::{ClusterConnector, ClusterSession, NewTopic, Result};

use crate::config::KafkaConfiguration;

use super::PlanName;
use super::sweep::{DestroyReport, SweepLimits, sweep_prefixed_topics};

/// Topic operations shared by both plans.
///
/// Every call opens its own session, dropped before returning.
#[derive(Debug)]
pub(crate) struct InstanceTopics<C> {
    connector: C,
    config: KafkaConfiguration,
    plan: PlanName,
}

impl<C> InstanceTopics<C>
where
    C: ClusterConnector,
{
    pub(crate) fn new(connector: C, config: KafkaConfiguration, plan: PlanName) -> Self {
        Self {
            connector,
            config,
            plan,
        }
    }

    pub(crate) fn config(&self) -> &KafkaConfiguration {
        &self.config
    }

    pub(crate) fn plan(&self) -> PlanName {
        self.plan
    }

    pub(crate) async fn exists(&self, name: &str) -> Result<bool> {
        let session = self.connector.connect().await?;
        session.topic_exists(name).await
    }

    /// create the topic named exactly `name` with the configured layout
    pub(crate) async fn create(&self, name: &str) -> Result<()> {
        let topic = NewTopic::new(
            name,
            self.config.partition_count,
            self.config.replication_factor,
        )
        .with_options(self.config.topic_options.clone());
        debug!(
            topic = name,
            partitions = topic.partitions,
            replication_factor = topic.replication_factor,
            plan = %self.plan,
            "creating topic"
        );
        let session = self.connector.connect().await?;
        session.create_topic(topic).await
    }

    /// delete every topic prefixed by `prefix`
    pub(crate) async fn sweep(&self, prefix: &str) -> Result<DestroyReport> {
        let limits = SweepLimits {
            deletion_timeout: self.config.deletion_timeout,
            sweep_timeout: self.config.sweep_timeout,
        };
        let session = self.connector.connect().await?;
        sweep_prefixed_topics(&session, prefix, self.plan, &limits).await
    }
}
