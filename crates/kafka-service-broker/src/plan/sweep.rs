//!
//! # Prefix sweep
//!
//! Nothing indexes which topics belong to an instance other than their names:
//! every topic whose name starts with the instance id is the instance's. Deletion
//! therefore lists the live topic set once and deletes every match concurrently.
//!
use std::time::Duration;

use fluvio_future::future::timeout;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use kafka_broker_cluster::{ClusterError, ClusterSession, Result};

use super::PlanName;

/// Bounds for a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepLimits {
    /// upper bound for a single deletion
    pub deletion_timeout: Duration,
    /// upper bound for the whole sweep
    pub sweep_timeout: Duration,
}

impl SweepLimits {
    /// all deletions start together, so bounding each one by the sweep budget bounds the sweep
    fn per_deletion(&self) -> Duration {
        self.deletion_timeout.min(self.sweep_timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub topic: String,
    pub reason: String,
}

/// Outcome of deleting an instance's topics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DestroyReport {
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDeletion>,
}

impl DestroyReport {
    pub fn succeeded(&self) -> usize {
        self.deleted.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// true if no deletion failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_topics(&self) -> Vec<String> {
        self.failed.iter().map(|failed| failed.topic.clone()).collect()
    }
}

/// Delete every topic whose name starts with `prefix`.
///
/// Returns once every deletion has finished or hit its timeout. Individual failures
/// are collected in the report; only failing to list the topics is an error.
#[instrument(skip(session, limits))]
pub async fn sweep_prefixed_topics<S>(
    session: &S,
    prefix: &str,
    plan: PlanName,
    limits: &SweepLimits,
) -> Result<DestroyReport>
where
    S: ClusterSession + ?Sized,
{
    let topics = session.topics().await?;
    let budget = limits.per_deletion();

    let deletions = topics
        .into_iter()
        .filter(|topic| topic.name.starts_with(prefix))
        .map(|topic| async move {
            debug!(topic = %topic.name, "deleting topic");
            let outcome = match timeout(budget, session.delete_topic(&topic.name)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ClusterError::timeout(
                    format!("delete topic {}", topic.name),
                    budget,
                )),
            };
            (topic.name, outcome)
        });

    let mut report = DestroyReport::default();
    for (topic, outcome) in join_all(deletions).await {
        match outcome {
            Ok(()) => {
                info!(instance_id = prefix, %plan, %topic, "deleted topic");
                report.deleted.push(topic);
            }
            // gone between listing and deleting
            Err(ClusterError::TopicNotFound(_)) => {
                debug!(instance_id = prefix, %plan, %topic, "topic already deleted");
                report.deleted.push(topic);
            }
            Err(err) => {
                error!(instance_id = prefix, %plan, %topic, %err, "failed to delete topic");
                report.failed.push(FailedDeletion {
                    topic,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}
