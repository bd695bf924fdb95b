//!
//! # Broker configuration
//!
//! Parameters are overwritten in the following sequence:
//!     1) default values
//!     2) yaml configuration file, if provided
//!     3) environment variables
//!     4) command line parameters (applied by the caller)
//!
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Error as IoError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use kafka_broker_cluster::ClusterClientConfig;

pub const ZOOKEEPER_PEERS_ENV: &str = "ZOOKEEPER_PEERS";
pub const ZOOKEEPER_TIMEOUT_ENV: &str = "ZOOKEEPER_TIMEOUT";
pub const KAFKA_HOSTNAMES_ENV: &str = "KAFKA_HOSTNAMES";
pub const KAFKA_PARTITION_COUNT_ENV: &str = "KAFKA_PARTITION_COUNT";
pub const KAFKA_REPLICATION_FACTOR_ENV: &str = "KAFKA_REPLICATION_FACTOR";
pub const KAFKA_DELETION_TIMEOUT_ENV: &str = "KAFKA_DELETION_TIMEOUT";
pub const KAFKA_SWEEP_TIMEOUT_ENV: &str = "KAFKA_SWEEP_TIMEOUT";
pub const BROKER_USERNAME_ENV: &str = "BROKER_USERNAME";
pub const BROKER_PASSWORD_ENV: &str = "BROKER_PASSWORD";
pub const BROKER_DEPROVISION_POLICY_ENV: &str = "BROKER_DEPROVISION_POLICY";
pub const PORT_ENV: &str = "PORT";

/// librdkafka rejects a socket connection setup timeout below one second
const MIN_CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);
const MIN_OPERATION_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {path}")]
    Io { path: PathBuf, source: IoError },
    #[error("unable to parse config file into YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} must be provided")]
    Missing(&'static str),
}

/// Broker's primary configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub broker: BrokerServerConfig,
    pub kafka: KafkaConfiguration,
    pub deprovision: DeprovisionPolicy,
}

/// Where the provisioning API listens and which credentials it accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerServerConfig {
    pub listen_addr: String,
    pub username: String,
    pub password: String,
}

impl Default for BrokerServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_owned(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Location of the Kafka cluster and how instance topics are shaped.
/// One bundle per cluster, shared by every plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfiguration {
    /// coordination service peers, handed out in credentials
    pub zookeeper_peers: String,
    /// bootstrap brokers, handed out in credentials and used for topic administration
    pub kafka_hostnames: String,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    pub partition_count: i32,
    pub replication_factor: i32,
    /// topic level configuration applied to every topic the broker creates
    pub topic_options: BTreeMap<String, String>,
    /// upper bound for deleting a single topic
    #[serde(with = "humantime_serde")]
    pub deletion_timeout: Duration,
    /// upper bound for deleting every topic of an instance
    #[serde(with = "humantime_serde")]
    pub sweep_timeout: Duration,
}

impl Default for KafkaConfiguration {
    fn default() -> Self {
        Self {
            zookeeper_peers: "localhost:2181".to_owned(),
            kafka_hostnames: "localhost:9092".to_owned(),
            connect_timeout: Duration::from_millis(1000),
            partition_count: 1,
            replication_factor: 1,
            topic_options: BTreeMap::new(),
            deletion_timeout: Duration::from_secs(30),
            sweep_timeout: Duration::from_secs(120),
        }
    }
}

impl KafkaConfiguration {
    /// checks what the cluster client and the sweep need, credentials aside
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kafka_hostnames.is_empty() {
            return Err(ConfigError::Missing(KAFKA_HOSTNAMES_ENV));
        }
        ensure_positive(KAFKA_PARTITION_COUNT_ENV, self.partition_count)?;
        ensure_positive(KAFKA_REPLICATION_FACTOR_ENV, self.replication_factor)?;
        ensure_at_least(ZOOKEEPER_TIMEOUT_ENV, self.connect_timeout, MIN_CONNECT_TIMEOUT)?;
        ensure_at_least(KAFKA_DELETION_TIMEOUT_ENV, self.deletion_timeout, MIN_OPERATION_TIMEOUT)?;
        ensure_at_least(KAFKA_SWEEP_TIMEOUT_ENV, self.sweep_timeout, MIN_OPERATION_TIMEOUT)?;
        Ok(())
    }

    pub fn cluster_client_config(&self) -> ClusterClientConfig {
        ClusterClientConfig::new(self.kafka_hostnames.clone(), self.connect_timeout)
            .with_operation_timeout(self.deletion_timeout)
    }
}

/// What deprovisioning reports when some topics of an instance could not be deleted.
/// Every deletion is attempted either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeprovisionPolicy {
    /// report success, carrying the failures in the response
    #[default]
    BestEffort,
    /// fail the request
    Strict,
}

impl fmt::Display for DeprovisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestEffort => write!(f, "best-effort"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for DeprovisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best-effort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown deprovision policy '{other}'")),
        }
    }
}

impl BrokerConfig {
    /// defaults, then file, then process environment; validated
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config file");
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// apply environment style overrides; `lookup` returns the value for a variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(peers) = lookup(ZOOKEEPER_PEERS_ENV) {
            self.kafka.zookeeper_peers = peers;
        }
        if let Some(hostnames) = lookup(KAFKA_HOSTNAMES_ENV) {
            self.kafka.kafka_hostnames = hostnames;
        }
        if let Some(value) = lookup(ZOOKEEPER_TIMEOUT_ENV) {
            self.kafka.connect_timeout = parse_millis(ZOOKEEPER_TIMEOUT_ENV, value)?;
        }
        if let Some(value) = lookup(KAFKA_DELETION_TIMEOUT_ENV) {
            self.kafka.deletion_timeout = parse_millis(KAFKA_DELETION_TIMEOUT_ENV, value)?;
        }
        if let Some(value) = lookup(KAFKA_SWEEP_TIMEOUT_ENV) {
            self.kafka.sweep_timeout = parse_millis(KAFKA_SWEEP_TIMEOUT_ENV, value)?;
        }
        if let Some(value) = lookup(KAFKA_PARTITION_COUNT_ENV) {
            self.kafka.partition_count = parse_value(KAFKA_PARTITION_COUNT_ENV, value)?;
        }
        if let Some(value) = lookup(KAFKA_REPLICATION_FACTOR_ENV) {
            self.kafka.replication_factor = parse_value(KAFKA_REPLICATION_FACTOR_ENV, value)?;
        }
        if let Some(username) = lookup(BROKER_USERNAME_ENV) {
            self.broker.username = username;
        }
        if let Some(password) = lookup(BROKER_PASSWORD_ENV) {
            self.broker.password = password;
        }
        if let Some(port) = lookup(PORT_ENV) {
            let port: u16 = parse_value(PORT_ENV, port)?;
            self.broker.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Some(value) = lookup(BROKER_DEPROVISION_POLICY_ENV) {
            self.deprovision = parse_value(BROKER_DEPROVISION_POLICY_ENV, value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.username.is_empty() {
            return Err(ConfigError::Missing(BROKER_USERNAME_ENV));
        }
        if self.broker.password.is_empty() {
            return Err(ConfigError::Missing(BROKER_PASSWORD_ENV));
        }
        self.kafka.validate()
    }
}

fn parse_value<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
        key,
        reason: err.to_string(),
        value,
    })
}

fn parse_millis(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    parse_value::<u64>(key, value).map(Duration::from_millis)
}

fn ensure_at_least(key: &'static str, value: Duration, min: Duration) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: format!("{}ms", value.as_millis()),
            reason: format!("must be at least {}ms", min.as_millis()),
        })
    }
}

fn ensure_positive(key: &'static str, value: i32) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_owned(),
        })
    }
}
