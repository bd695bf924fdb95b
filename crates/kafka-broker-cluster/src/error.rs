use std::time::Duration;

/// Possible errors while talking to the cluster's metadata service
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("Could not connect to cluster at {endpoints}: {reason}")]
    Connection { endpoints: String, reason: String },
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: String,
        elapsed: Duration,
    },
    #[error("Topic already exists: {0}")]
    TopicAlreadyExists(String),
    #[error("Topic not found: {0}")]
    TopicNotFound(String),
    #[error("{operation} failed: {reason}")]
    Request { operation: String, reason: String },
}

impl ClusterError {
    pub fn request(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Request {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed,
        }
    }
}
