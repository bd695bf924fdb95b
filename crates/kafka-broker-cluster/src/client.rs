use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Connection settings shared by every connector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterClientConfig {
    /// comma separated list of `host:port`
    pub endpoints: String,
    /// socket setup and metadata requests
    pub connect_timeout: Duration,
    /// budget for a topic create or delete, including the broker side work
    pub operation_timeout: Duration,
}

impl ClusterClientConfig {
    pub fn new(endpoints: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            endpoints: endpoints.into(),
            connect_timeout,
            operation_timeout: connect_timeout,
        }
    }

    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }
}

/// Topic as seen in the cluster's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub name: String,
    pub partitions: i32,
}

impl TopicMetadata {
    pub fn new(name: impl Into<String>, partitions: i32) -> Self {
        Self {
            name: name.into(),
            partitions,
        }
    }
}

/// Request to create a single topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    /// topic level configuration, passed through as-is
    pub options: BTreeMap<String, String>,
}

impl NewTopic {
    pub fn new(name: impl Into<String>, partitions: i32, replication_factor: i32) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
            options: BTreeMap::new(),
        }
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }
}

/// Opens sessions against the cluster's metadata service.
///
/// Connectors are cheap to hold and carry only configuration; all connection
/// state lives in the session.
#[async_trait]
pub trait ClusterConnector: Debug + Send + Sync + 'static {
    type Session: ClusterSession;

    async fn connect(&self) -> Result<Self::Session>;
}

/// A live connection to the metadata service. Closed on drop.
#[async_trait]
pub trait ClusterSession: Send + Sync {
    /// check if a topic with exactly this name exists
    async fn topic_exists(&self, name: &str) -> Result<bool>;

    async fn create_topic(&self, topic: NewTopic) -> Result<()>;

    /// every live topic in the cluster
    async fn topics(&self) -> Result<Vec<TopicMetadata>>;

    async fn delete_topic(&self, name: &str) -> Result<()>;
}
