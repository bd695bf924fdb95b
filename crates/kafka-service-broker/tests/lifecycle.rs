use std::time::Duration;

use serde_json::json;

use kafka_service_broker::broker::{
    BindDetails, DeprovisionDetails, ProvisionDetails, UnbindDetails,
};
use kafka_service_broker::catalog::{Catalog, CatalogResolver};
use kafka_service_broker::cluster::memory::MemoryCluster;
use kafka_service_broker::config::{DeprovisionPolicy, KafkaConfiguration};
use kafka_service_broker::plan::{DedicatedTopicPlan, PlanName, PlanRegistry, SharedPrefixPlan};
use kafka_service_broker::{BrokerError, KafkaServiceBroker};

const TOPIC_PLAN: &str = "4820d23c-360a-11e7-9547-d78770a33c5b";
const SHARED_PLAN: &str = "6a3e1f2c-360a-11e7-b2d4-7f5c1a9e0d3b";

fn kafka_config() -> KafkaConfiguration {
    KafkaConfiguration {
        zookeeper_peers: "zk1:2181,zk2:2181".to_owned(),
        kafka_hostnames: "kafka1:9092,kafka2:9092".to_owned(),
        deletion_timeout: Duration::from_millis(200),
        sweep_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

fn broker_on(cluster: &MemoryCluster) -> KafkaServiceBroker {
    let plans = PlanRegistry::new()
        .register(
            PlanName::Topic,
            DedicatedTopicPlan::new(cluster.clone(), kafka_config()),
        )
        .register(
            PlanName::Shared,
            SharedPrefixPlan::new(cluster.clone(), kafka_config()),
        );
    let catalog = Catalog::embedded().expect("catalog");
    KafkaServiceBroker::new(catalog, plans)
}

#[fluvio_future::test]
async fn dedicated_instance_lifecycle() {
    //given
    let cluster = MemoryCluster::new();
    let broker = broker_on(&cluster);
    broker.check_plans().expect("every plan registered");

    //when
    broker
        .provision("abc123", ProvisionDetails::new(TOPIC_PLAN))
        .await
        .expect("provisioned");

    //then
    assert_eq!(cluster.topic_names().await, vec!["abc123"]);

    let binding = broker
        .bind("abc123", "b1", BindDetails::new(TOPIC_PLAN))
        .await
        .expect("bound");
    assert_eq!(
        serde_json::to_value(&binding.credentials).expect("json"),
        json!({
            "zkPeers": "zk1:2181,zk2:2181",
            "hostname": "kafka1:9092,kafka2:9092",
            "topicName": "abc123",
            "uri": "kafka://kafka1:9092,kafka2:9092/abc123",
        })
    );

    broker
        .unbind("abc123", "b1", UnbindDetails::new(TOPIC_PLAN))
        .await
        .expect("unbound");

    let spec = broker
        .deprovision("abc123", DeprovisionDetails::default())
        .await
        .expect("deprovisioned");
    assert_eq!(spec.plan, PlanName::Topic);
    assert!(!cluster.contains("abc123").await);
    assert_eq!(cluster.open_sessions(), 0);
}

#[fluvio_future::test]
async fn instance_ids_are_unique_across_plans() {
    let cluster = MemoryCluster::new();
    let broker = broker_on(&cluster);

    broker
        .provision("abc123", ProvisionDetails::new(TOPIC_PLAN))
        .await
        .expect("provisioned");
    let err = broker
        .provision("abc123", ProvisionDetails::new(SHARED_PLAN))
        .await
        .expect_err("duplicate");

    assert!(matches!(err, BrokerError::InstanceAlreadyExists));
    assert_eq!(cluster.create_requests().await, vec!["abc123"]);
}

#[fluvio_future::test]
async fn missing_instance_is_not_found() {
    let cluster = MemoryCluster::new();
    let broker = broker_on(&cluster);

    let err = broker
        .deprovision("nope", DeprovisionDetails::default())
        .await
        .expect_err("missing");
    assert!(matches!(err, BrokerError::InstanceDoesNotExist));

    let err = broker
        .bind("nope", "b1", BindDetails::new(SHARED_PLAN))
        .await
        .expect_err("missing");
    assert!(matches!(err, BrokerError::InstanceDoesNotExist));

    let err = broker
        .unbind("nope", "b1", UnbindDetails::new(SHARED_PLAN))
        .await
        .expect_err("missing");
    assert!(matches!(err, BrokerError::InstanceDoesNotExist));
}

#[fluvio_future::test]
async fn shared_instance_sweeps_application_topics() {
    //given
    let cluster = MemoryCluster::new();
    let broker = broker_on(&cluster);
    broker
        .provision("team-a", ProvisionDetails::new(SHARED_PLAN))
        .await
        .expect("provisioned");
    for index in 0..20 {
        cluster.insert_topic(format!("team-a-{index}")).await;
    }
    cluster.insert_topic("team-b").await;

    let binding = broker
        .bind("team-a", "b1", BindDetails::new(SHARED_PLAN))
        .await
        .expect("bound");
    assert_eq!(binding.credentials.uri(), "kafka://kafka1:9092,kafka2:9092");

    //when
    let spec = broker
        .deprovision("team-a", DeprovisionDetails::default())
        .await
        .expect("deprovisioned");

    //then
    assert_eq!(spec.plan, PlanName::Shared);
    assert_eq!(spec.report.succeeded(), 21);
    assert_eq!(cluster.topic_names().await, vec!["team-b"]);
    assert_eq!(cluster.open_sessions(), 0);
}

#[fluvio_future::test]
async fn partial_sweep_depends_on_policy() {
    //given
    let cluster = MemoryCluster::new();
    let broker = broker_on(&cluster);
    broker
        .provision("team-a", ProvisionDetails::new(SHARED_PLAN))
        .await
        .expect("provisioned");
    cluster.insert_topic("team-a.stuck").await;
    cluster.insert_topic("team-a.ok").await;
    cluster.stall_deletion_of("team-a.stuck").await;

    //when
    let spec = broker
        .deprovision("team-a", DeprovisionDetails::default())
        .await
        .expect("best effort");

    //then
    assert_eq!(spec.report.failed_topics(), vec!["team-a.stuck"]);
    assert_eq!(cluster.topic_names().await, vec!["team-a.stuck"]);

    // leftovers no longer mark an instance, recreate one to test strict mode
    let strict = broker_on(&cluster).with_deprovision_policy(DeprovisionPolicy::Strict);
    strict
        .provision("team-a", ProvisionDetails::new(SHARED_PLAN))
        .await
        .expect("provisioned");
    let err = strict
        .deprovision("team-a", DeprovisionDetails::default())
        .await
        .expect_err("strict");
    assert!(matches!(
        err,
        BrokerError::PartialDeprovision { ref failed, .. } if failed == &vec!["team-a.stuck".to_owned()]
    ));
    assert_eq!(cluster.topic_names().await, vec!["team-a.stuck"]);
}

#[fluvio_future::test]
async fn unreachable_cluster_is_reported() {
    let cluster = MemoryCluster::new();
    cluster.refuse_connections(true).await;
    let broker = broker_on(&cluster);

    let err = broker
        .provision("abc123", ProvisionDetails::new(TOPIC_PLAN))
        .await
        .expect_err("refused");

    assert!(matches!(err, BrokerError::Cluster(_)));
}

#[test]
fn embedded_catalog_resolves_plans() {
    let catalog = Catalog::embedded().expect("catalog");

    assert_eq!(catalog.plan_name(TOPIC_PLAN), Some("topic"));
    assert_eq!(catalog.plan_name(SHARED_PLAN), Some("shared"));
    assert_eq!(catalog.plan_name("unknown"), None);
}
