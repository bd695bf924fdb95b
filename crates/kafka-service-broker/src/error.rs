use kafka_broker_cluster::ClusterError;

use crate::plan::PlanName;

/// Errors reported to the provisioning protocol
#[derive(thiserror::Error, Debug)]
pub enum BrokerError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("plan_id not recognized: {0}")]
    PlanNotRecognized(String),
    #[error("no strategy configured for plan: {0}")]
    PlanNotConfigured(String),
    #[error("instance already exists")]
    InstanceAlreadyExists,
    #[error("instance does not exist")]
    InstanceDoesNotExist,
    #[error("binding does not exist")]
    BindingDoesNotExist,
    #[error("changing plan from {from} to {to} is not supported")]
    PlanChangeNotSupported { from: PlanName, to: PlanName },
    #[error("instance {instance_id} partially deprovisioned, failed to delete: {}", .failed.join(", "))]
    PartialDeprovision {
        instance_id: String,
        failed: Vec<String>,
    },
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

impl BrokerError {
    pub(crate) fn plan_id_required() -> Self {
        Self::InvalidRequest("plan_id required".to_owned())
    }
}
