use async_trait::async_trait;
use tracing::{info, instrument};

use kafka_broker_cluster::{ClusterConnector, Result};

use crate::config::KafkaConfiguration;
use crate::credentials::InstanceCredentials;

use super::topics::InstanceTopics;
use super::{DestroyReport, PlanName, PlanStrategy};

/// One topic per instance, named after the instance.
#[derive(Debug)]
pub struct DedicatedTopicPlan<C> {
    topics: InstanceTopics<C>,
}

impl<C> DedicatedTopicPlan<C>
where
    C: ClusterConnector,
{
    pub fn new(connector: C, config: KafkaConfiguration) -> Self {
        Self {
            topics: InstanceTopics::new(connector, config, PlanName::Topic),
        }
    }
}

#[async_trait]
impl<C> PlanStrategy for DedicatedTopicPlan<C>
where
    C: ClusterConnector,
{
    async fn instance_exists(&self, instance_id: &str) -> Result<bool> {
        self.topics.exists(instance_id).await
    }

    #[instrument(skip(self), fields(plan = %PlanName::Topic))]
    async fn create(&self, instance_id: &str) -> Result<()> {
        self.topics.create(instance_id).await?;
        info!(topic = instance_id, "created instance topic");
        Ok(())
    }

    /// Deletes the instance topic together with anything created under its name
    #[instrument(skip(self), fields(plan = %PlanName::Topic))]
    async fn destroy(&self, instance_id: &str) -> Result<DestroyReport> {
        self.topics.sweep(instance_id).await
    }

    async fn bind(&self, instance_id: &str, binding_id: &str) -> Result<InstanceCredentials> {
        let config = self.topics.config();
        info!(instance_id, binding_id, plan = %self.topics.plan(), "issuing topic credentials");
        Ok(InstanceCredentials::topic(
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

#[cfg(test)]
mod tests {
    use kafka_broker_cluster::memory::MemoryCluster;

    use crate::credentials::TopicGrant;

    use super::*;

    fn config() -> KafkaConfiguration {
        KafkaConfiguration {
            zookeeper_peers: "zk1:2181,zk2:2181".to_owned(),
            kafka_hostnames: "kafka1:9092,kafka2:9092".to_owned(),
            partition_count: 3,
            replication_factor: 2,
            ..Default::default()
        }
    }

    #[fluvio_future::test]
    async fn test_create_uses_configured_layout() {
        //given
        let cluster = MemoryCluster::new();
        let mut config = config();
        config
            .topic_options
            .insert("retention.ms".to_owned(), "86400000".to_owned());
        let plan = DedicatedTopicPlan::new(cluster.clone(), config);

        //when
        plan.create("abc123").await.expect("created");

        //then
        let topic = cluster.topic("abc123").await.expect("topic");
        assert_eq!(topic.partitions, 3);
        assert!(plan.instance_exists("abc123").await.expect("exists"));
        assert!(!plan.instance_exists("abc").await.expect("exists"));
        assert_eq!(cluster.open_sessions(), 0);
    }

    #[fluvio_future::test]
    async fn test_create_twice_is_rejected_by_cluster() {
        let cluster = MemoryCluster::new();
        let plan = DedicatedTopicPlan::new(cluster.clone(), config());

        plan.create("abc123").await.expect("created");
        let err = plan.create("abc123").await.expect_err("duplicate");

        assert!(matches!(
            err,
            kafka_broker_cluster::ClusterError::TopicAlreadyExists(_)
        ));
    }

    #[fluvio_future::test]
    async fn test_destroy_sweeps_prefix() {
        //given
        let cluster = MemoryCluster::new();
        let plan = DedicatedTopicPlan::new(cluster.clone(), config());
        plan.create("abc123").await.expect("created");
        cluster.insert_topic("abc123-retry").await;
        cluster.insert_topic("abc12").await;

        //when
        let report = plan.destroy("abc123").await.expect("destroyed");

        //then
        assert_eq!(report.succeeded(), 2);
        assert!(report.is_complete());
        assert_eq!(cluster.topic_names().await, vec!["abc12"]);
        assert!(!plan.instance_exists("abc123").await.expect("exists"));
        assert_eq!(cluster.open_sessions(), 0);
    }

    #[fluvio_future::test]
    async fn test_bind_issues_exact_topic() {
        let plan = DedicatedTopicPlan::new(MemoryCluster::new(), config());

        let credentials = plan.bind("abc123", "b1").await.expect("bound");

        assert_eq!(credentials.grant, TopicGrant::Topic("abc123".to_owned()));
        assert_eq!(credentials.uri(), "kafka://kafka1:9092,kafka2:9092/abc123");
        plan.unbind("abc123", "b1").await.expect("unbound");
    }

    #[fluvio_future::test]
    async fn test_connection_failure_is_reported() {
        let cluster = MemoryCluster::new();
        cluster.refuse_connections(true).await;
        let plan = DedicatedTopicPlan::new(cluster, config());

        let err = plan.instance_exists("abc123").await.expect_err("refused");

        assert!(matches!(
            err,
            kafka_broker_cluster::ClusterError::Connection { .. }
        ));
    }
}
