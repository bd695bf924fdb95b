//!
//! # In-memory cluster
//!
//! Keeps the live topic set in local memory. Used by tests and by local runs without
//! a Kafka cluster. Faults can be injected per topic to exercise partial failures.
//!
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_lock::RwLock;
use async_trait::async_trait;
use fluvio_future::timer::sleep;
use tracing::{debug, trace};

use crate::{ClusterConnector, ClusterError, ClusterSession, NewTopic, Result, TopicMetadata};

const MEMORY_ENDPOINT: &str = "memory";

#[derive(Debug, Default)]
struct ClusterState {
    topics: BTreeMap<String, TopicMetadata>,
    refuse_connections: bool,
    failing_deletions: BTreeSet<String>,
    stalled_deletions: BTreeSet<String>,
    delayed_deletions: BTreeMap<String, Duration>,
    create_requests: Vec<String>,
}

/// Shared in-memory topic store. Clones see the same cluster.
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    state: Arc<RwLock<ClusterState>>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// add a topic behind the broker's back, as a producer would
    pub async fn insert_topic(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state.write().await;
        state
            .topics
            .insert(name.clone(), TopicMetadata::new(name, 1));
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.state.read().await.topics.contains_key(name)
    }

    /// names of every live topic, sorted
    pub async fn topic_names(&self) -> Vec<String> {
        self.state.read().await.topics.keys().cloned().collect()
    }

    pub async fn topic(&self, name: &str) -> Option<TopicMetadata> {
        self.state.read().await.topics.get(name).cloned()
    }

    /// every create request received, in order, including rejected ones
    pub async fn create_requests(&self) -> Vec<String> {
        self.state.read().await.create_requests.clone()
    }

    pub async fn refuse_connections(&self, refuse: bool) {
        self.state.write().await.refuse_connections = refuse;
    }

    /// deletion of `name` will fail with a request error
    pub async fn fail_deletion_of(&self, name: impl Into<String>) {
        self.state.write().await.failing_deletions.insert(name.into());
    }

    /// deletion of `name` will never complete
    pub async fn stall_deletion_of(&self, name: impl Into<String>) {
        self.state.write().await.stalled_deletions.insert(name.into());
    }

    /// deletion of `name` completes only after `delay`
    pub async fn delay_deletion_of(&self, name: impl Into<String>, delay: Duration) {
        self.state
            .write()
            .await
            .delayed_deletions
            .insert(name.into(), delay);
    }

    /// number of sessions not yet dropped
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterConnector for MemoryCluster {
    type Session = MemorySession;

    async fn connect(&self) -> Result<Self::Session> {
        if self.state.read().await.refuse_connections {
            return Err(ClusterError::Connection {
                endpoints: MEMORY_ENDPOINT.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        trace!("memory session opened");
        Ok(MemorySession {
            state: self.state.clone(),
            open_sessions: self.open_sessions.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MemorySession {
    state: Arc<RwLock<ClusterState>>,
    open_sessions: Arc<AtomicUsize>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
        trace!("memory session closed");
    }
}

#[async_trait]
impl ClusterSession for MemorySession {
    async fn topic_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.read().await.topics.contains_key(name))
    }

    async fn create_topic(&self, topic: NewTopic) -> Result<()> {
        let mut state = self.state.write().await;
        state.create_requests.push(topic.name.clone());
        if state.topics.contains_key(&topic.name) {
            return Err(ClusterError::TopicAlreadyExists(topic.name));
        }
        debug!(name = %topic.name, partitions = topic.partitions, "memory topic created");
        state.topics.insert(
            topic.name.clone(),
            TopicMetadata::new(topic.name, topic.partitions),
        );
        Ok(())
    }

    async fn topics(&self) -> Result<Vec<TopicMetadata>> {
        Ok(self.state.read().await.topics.values().cloned().collect())
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        let (stalled, failing, delay) = {
            let state = self.state.read().await;
            (
                state.stalled_deletions.contains(name),
                state.failing_deletions.contains(name),
                state.delayed_deletions.get(name).copied(),
            )
        };

        if stalled {
            debug!(name, "memory topic deletion stalled");
            std::future::pending::<()>().await;
        }
        if failing {
            return Err(ClusterError::request("delete topic", "injected failure"));
        }
        if let Some(delay) = delay {
            trace!(name, ?delay, "memory topic deletion delayed");
            sleep(delay).await;
        }

        let mut state = self.state.write().await;
        match state.topics.remove(name) {
            Some(_) => {
                debug!(name, "memory topic deleted");
                Ok(())
            }
            None => Err(ClusterError::TopicNotFound(name.to_owned())),
        }
    }
}
