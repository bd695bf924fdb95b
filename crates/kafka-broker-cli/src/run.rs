use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use kafka_broker_api::{BasicCredentials, BrokerServer};
use kafka_broker_cluster::ClusterConnector;
use kafka_broker_cluster::kafka::KafkaConnector;
use kafka_service_broker::KafkaServiceBroker;
use kafka_service_broker::catalog::Catalog;
use kafka_service_broker::config::BrokerConfig;
use kafka_service_broker::plan::{DedicatedTopicPlan, PlanName, PlanRegistry, SharedPrefixPlan};

#[derive(Debug, Args)]
pub struct RunBrokerOpt {
    /// Broker configuration file (YAML)
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides configuration and PORT
    #[arg(long, value_name = "host:port")]
    bind: Option<String>,
}

impl RunBrokerOpt {
    pub async fn process(self) -> Result<()> {
        let mut config = BrokerConfig::load(self.config.as_deref())?;
        if let Some(bind) = self.bind {
            config.broker.listen_addr = bind;
        }
        let addr: SocketAddr = config
            .broker
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", config.broker.listen_addr))?;

        let catalog = Catalog::load()?;
        let connector = KafkaConnector::new(config.kafka.cluster_client_config());
        let broker = build_broker(catalog, &config, connector)?;

        info!(
            version = crate::VERSION,
            kafka_hostnames = %config.kafka.kafka_hostnames,
            zookeeper_peers = %config.kafka.zookeeper_peers,
            deprovision = %config.deprovision,
            "starting service broker"
        );

        let credentials = BasicCredentials::new(config.broker.username, config.broker.password);
        BrokerServer::new(broker, credentials).run(addr).await?;
        Ok(())
    }
}

/// both plans over one cluster, refusing to start if the catalog names a plan without strategy
fn build_broker<C>(catalog: Catalog, config: &BrokerConfig, connector: C) -> Result<KafkaServiceBroker>
where
    C: ClusterConnector + Clone,
{
    let plans = PlanRegistry::new()
        .register(
            PlanName::Topic,
            DedicatedTopicPlan::new(connector.clone(), config.kafka.clone()),
        )
        .register(
            PlanName::Shared,
            SharedPrefixPlan::new(connector, config.kafka.clone()),
        );

    let broker = KafkaServiceBroker::new(catalog, plans).with_deprovision_policy(config.deprovision);
    broker.check_plans()?;
    Ok(broker)
}
