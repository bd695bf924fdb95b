//!
//! # Kafka admin client
//!
//! Cluster access over the Kafka admin protocol, backed by librdkafka's `AdminClient`.
//! Metadata requests are blocking calls in librdkafka and are moved to the blocking pool.
//!
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fluvio_future::task::spawn_blocking;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic as KafkaNewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::metadata::Metadata;
use tracing::{debug, instrument};

use crate::{
    ClusterClientConfig, ClusterConnector, ClusterError, ClusterSession, NewTopic, Result,
    TopicMetadata,
};

type Admin = AdminClient<DefaultClientContext>;

/// Opens an admin client against the bootstrap endpoints for every session
#[derive(Debug, Clone)]
pub struct KafkaConnector {
    config: ClusterClientConfig,
}

impl KafkaConnector {
    pub fn new(config: ClusterClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClusterConnector for KafkaConnector {
    type Session = KafkaSession;

    #[instrument(skip(self), fields(endpoints = %self.config.endpoints))]
    async fn connect(&self) -> Result<Self::Session> {
        let timeout_ms = self.config.connect_timeout.as_millis().to_string();
        let admin: Admin = ClientConfig::new()
            .set("bootstrap.servers", &self.config.endpoints)
            .set("socket.connection.setup.timeout.ms", &timeout_ms)
            .set("socket.timeout.ms", &timeout_ms)
            .create()
            .map_err(|err| ClusterError::Connection {
                endpoints: self.config.endpoints.clone(),
                reason: err.to_string(),
            })?;

        let session = KafkaSession {
            admin: Arc::new(admin),
            endpoints: self.config.endpoints.clone(),
            connect_timeout: self.config.connect_timeout,
            operation_timeout: self.config.operation_timeout,
        };

        // librdkafka connects lazily; make sure the brokers answer before handing out the session
        session
            .metadata()
            .await
            .map_err(|err| ClusterError::Connection {
                endpoints: self.config.endpoints.clone(),
                reason: err.to_string(),
            })?;
        debug!("admin session established");
        Ok(session)
    }
}

pub struct KafkaSession {
    admin: Arc<Admin>,
    endpoints: String,
    connect_timeout: Duration,
    operation_timeout: Duration,
}

impl std::fmt::Debug for KafkaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSession")
            .field("endpoints", &self.endpoints)
            .field("connect_timeout", &self.connect_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl KafkaSession {
    fn admin_options(&self) -> AdminOptions {
        AdminOptions::new()
            .request_timeout(Some(self.operation_timeout))
            .operation_timeout(Some(self.operation_timeout))
    }

    /// full cluster metadata; never names a topic so brokers with
    /// auto-creation enabled don't create it as a side effect
    async fn metadata(&self) -> Result<Metadata> {
        let admin = self.admin.clone();
        let timeout = self.connect_timeout;
        spawn_blocking(move || admin.inner().fetch_metadata(None, timeout))
            .await
            .map_err(|err| from_kafka("fetch metadata", err, timeout))
    }
}

#[async_trait]
impl ClusterSession for KafkaSession {
    async fn topic_exists(&self, name: &str) -> Result<bool> {
        let metadata = self.metadata().await?;
        Ok(metadata
            .topics()
            .iter()
            .any(|topic| topic.name() == name && topic.error().is_none()))
    }

    #[instrument(skip(self, topic), fields(name = %topic.name))]
    async fn create_topic(&self, topic: NewTopic) -> Result<()> {
        let request = topic.options.iter().fold(
            KafkaNewTopic::new(
                &topic.name,
                topic.partitions,
                TopicReplication::Fixed(topic.replication_factor),
            ),
            |request, (key, value)| request.set(key, value),
        );

        let results = self
            .admin
            .create_topics([&request], &self.admin_options())
            .await
            .map_err(|err| from_kafka("create topic", err, self.operation_timeout))?;

        for result in results {
            result.map_err(|(name, code)| create_error(name, code))?;
        }
        debug!("topic created");
        Ok(())
    }

    async fn topics(&self) -> Result<Vec<TopicMetadata>> {
        let metadata = self.metadata().await?;
        Ok(metadata
            .topics()
            .iter()
            .filter(|topic| topic.error().is_none())
            .map(|topic| TopicMetadata::new(topic.name(), topic.partitions().len() as i32))
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_topic(&self, name: &str) -> Result<()> {
        let results = self
            .admin
            .delete_topics(&[name], &self.admin_options())
            .await
            .map_err(|err| from_kafka("delete topic", err, self.operation_timeout))?;

        for result in results {
            result.map_err(|(name, code)| delete_error(name, code))?;
        }
        debug!("topic deleted");
        Ok(())
    }
}

fn from_kafka(operation: &str, err: KafkaError, timeout: Duration) -> ClusterError {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::OperationTimedOut) | Some(RDKafkaErrorCode::RequestTimedOut) => {
            ClusterError::timeout(operation, timeout)
        }
        _ => ClusterError::request(operation, err),
    }
}

fn create_error(name: String, code: RDKafkaErrorCode) -> ClusterError {
    match code {
        RDKafkaErrorCode::TopicAlreadyExists => ClusterError::TopicAlreadyExists(name),
        code => ClusterError::request(format!("create topic {name}"), code),
    }
}

fn delete_error(name: String, code: RDKafkaErrorCode) -> ClusterError {
    match code {
        RDKafkaErrorCode::UnknownTopicOrPartition => ClusterError::TopicNotFound(name),
        code => ClusterError::request(format!("delete topic {name}"), code),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_timed_out_admin_operation_maps_to_timeout() {
        let budget = Duration::from_secs(30);
        for code in [
            RDKafkaErrorCode::OperationTimedOut,
            RDKafkaErrorCode::RequestTimedOut,
        ] {
            let err = from_kafka("delete topic", KafkaError::AdminOp(code), budget);
            assert_eq!(err, ClusterError::timeout("delete topic", budget));
        }
    }

    #[test]
    fn test_other_admin_failures_map_to_request() {
        let err = from_kafka(
            "create topic",
            KafkaError::AdminOp(RDKafkaErrorCode::BrokerNotAvailable),
            Duration::from_secs(1),
        );
        assert!(matches!(err, ClusterError::Request { ref operation, .. } if operation == "create topic"));
    }

    #[test]
    fn test_create_topic_result_codes() {
        assert_eq!(
            create_error("orders".to_owned(), RDKafkaErrorCode::TopicAlreadyExists),
            ClusterError::TopicAlreadyExists("orders".to_owned())
        );
        assert!(matches!(
            create_error("orders".to_owned(), RDKafkaErrorCode::InvalidPartitions),
            ClusterError::Request { ref operation, .. } if operation == "create topic orders"
        ));
    }

    #[test]
    fn test_delete_topic_result_codes() {
        assert_eq!(
            delete_error("orders".to_owned(), RDKafkaErrorCode::UnknownTopicOrPartition),
            ClusterError::TopicNotFound("orders".to_owned())
        );
        assert!(matches!(
            delete_error("orders".to_owned(), RDKafkaErrorCode::TopicAuthorizationFailed),
            ClusterError::Request { ref operation, .. } if operation == "delete topic orders"
        ));
    }
}
