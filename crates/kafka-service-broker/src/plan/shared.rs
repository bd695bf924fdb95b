use async_trait::async_trait;
use tracing::{info, instrument};

use kafka_broker_cluster::{ClusterConnector, Result};

use crate::config::KafkaConfiguration;
use crate::credentials::InstanceCredentials;

use super::topics::InstanceTopics;
use super::{DestroyReport, PlanName, PlanStrategy};

/// A topic name prefix per instance.
///
/// Provisioning creates a marker topic named after the instance so that the instance
/// can be found again; applications create their own topics under the prefix.
#[derive(Debug)]
pub struct SharedPrefixPlan<C> {
    topics: InstanceTopics<C>,
}

impl<C> SharedPrefixPlan<C>
where
    C: ClusterConnector,
{
    pub fn new(connector: C, config: KafkaConfiguration) -> Self {
        Self {
            topics: InstanceTopics::new(connector, config, PlanName::Shared),
        }
    }
}

#[async_trait]
impl<C> PlanStrategy for SharedPrefixPlan<C>
where
    C: ClusterConnector,
{
    async fn instance_exists(&self, instance_id: &str) -> Result<bool> {
        self.topics.exists(instance_id).await
    }

    #[instrument(skip(self), fields(plan = %PlanName::Shared))]
    async fn create(&self, instance_id: &str) -> Result<()> {
        self.topics.create(instance_id).await?;
        info!(topic = instance_id, "created marker topic");
        Ok(())
    }

    #[instrument(skip(self), fields(plan = %PlanName::Shared))]
    async fn destroy(&self, instance_id: &str) -> Result<DestroyReport> {
        let report = self.topics.sweep(instance_id).await?;
        info!(
            deleted = report.succeeded(),
            failed = report.failed_count(),
            "swept shared prefix"
        );
        Ok(report)
    }

    async fn bind(&self, instance_id: &str, binding_id: &str) -> Result<InstanceCredentials> {
        let config = self.topics.config();
        info!(instance_id, binding_id, plan = %self.topics.plan(), "issuing prefix credentials");
        Ok(InstanceCredentials::prefix(
            &config.zookeeper_peers,
            &config.kafka_hostnames,
            instance_id,
        ))
    }

    async fn unbind(&self, instance_id: &str, binding_id: &str) -> Result<()> {
        info!(instance_id, binding_id, plan = %self.topics.plan(), "unbind");
        Ok(())
    }
}
