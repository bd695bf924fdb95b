//!
//! # Credential sanity tests
//!
//! Reads the credentials a binding returned from STDIN and checks that the topic
//! they point at exists in the cluster.
//!
use std::io::Read;

use clap::Args;
use tracing::debug;

use kafka_broker_cluster::kafka::KafkaConnector;
use kafka_broker_cluster::{ClusterClientConfig, ClusterConnector, ClusterError, ClusterSession};
use kafka_service_broker::config::{BrokerConfig, ConfigError};
use kafka_service_broker::credentials::{
    BindingCredentials, HOSTNAME_KEY, TOPIC_NAME_KEY, TOPIC_NAME_PREFIX_KEY, ZK_PEERS_KEY,
};

#[derive(thiserror::Error, Debug)]
pub enum SanityError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to read credentials: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to unmarshal credentials: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("credentials were not provided: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
    #[error("Could not connect to Kafka: {0}")]
    Connect(ClusterError),
    #[error("Topic {topic} could not be looked up: {source}")]
    Lookup { topic: String, source: ClusterError },
    #[error("Topic {0} does not exist")]
    TopicMissing(String),
}

impl SanityError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Read(_) | Self::Parse(_) => 1,
            Self::MissingKeys(_) => 2,
            Self::Config(_) | Self::Connect(_) => 3,
            Self::Lookup { .. } | Self::TopicMissing(_) => 4,
        }
    }
}

/// Which plan's credentials are being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanityPlan {
    Topic,
    Shared,
}

impl SanityPlan {
    /// key naming the topic to look up; for shared credentials the prefix is the marker topic
    fn topic_key(&self) -> &'static str {
        match self {
            Self::Topic => TOPIC_NAME_KEY,
            Self::Shared => TOPIC_NAME_PREFIX_KEY,
        }
    }
}

#[derive(Debug, Args)]
pub struct SanityTestOpt {}

impl SanityTestOpt {
    pub async fn process(self, plan: SanityPlan) -> anyhow::Result<()> {
        let setup = client_config(|key| std::env::var(key).ok())
            .and_then(|client| read_stdin().map(|input| (client, input)));
        let outcome = match setup {
            Ok((client, input)) => {
                sanity_test(plan, &input, |hostname| {
                    KafkaConnector::new(ClusterClientConfig {
                        endpoints: hostname.to_owned(),
                        ..client
                    })
                })
                .await
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(topic) => {
                println!("Topic {topic} exists");
                Ok(())
            }
            Err(err) => {
                eprintln!("* {err}");
                std::process::exit(err.exit_code());
            }
        }
    }
}

/// cluster client settings from the same environment overrides the broker reads;
/// endpoints come from the credentials under test
fn client_config<F>(lookup: F) -> Result<ClusterClientConfig, SanityError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BrokerConfig::default();
    config.apply_overrides(lookup)?;
    config.kafka.validate()?;
    Ok(config.kafka.cluster_client_config())
}

fn read_stdin() -> Result<String, SanityError> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

/// Check credentials in `input` against the cluster reached through `connector`.
/// Returns the name of the topic found.
pub async fn sanity_test<C, F>(
    plan: SanityPlan,
    input: &str,
    connector: F,
) -> Result<String, SanityError>
where
    C: ClusterConnector,
    F: FnOnce(&str) -> C,
{
    let credentials: BindingCredentials = serde_json::from_str(input)?;
    println!("Loaded credentials: {credentials:?}");

    let topic_key = plan.topic_key();
    let missing = credentials.missing(&[topic_key, ZK_PEERS_KEY, HOSTNAME_KEY]);
    let (Some(topic), Some(hostname)) = (credentials.get(topic_key), credentials.get(HOSTNAME_KEY))
    else {
        return Err(SanityError::MissingKeys(missing));
    };
    if !missing.is_empty() {
        return Err(SanityError::MissingKeys(missing));
    }

    debug!(%hostname, topic, "checking topic");
    let session = connector(hostname)
        .connect()
        .await
        .map_err(SanityError::Connect)?;
    let exists = session
        .topic_exists(topic)
        .await
        .map_err(|source| SanityError::Lookup {
            topic: topic.to_owned(),
            source,
        })?;

    if exists {
        Ok(topic.to_owned())
    } else {
        Err(SanityError::TopicMissing(topic.to_owned()))
    }
}
