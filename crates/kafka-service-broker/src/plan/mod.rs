//!
//! # Plan strategies
//!
//! A plan strategy turns an opaque instance id into topics in the cluster.
//! Strategies are registered by [`PlanName`] in a [`PlanRegistry`].
//!
mod dedicated;
mod shared;
mod sweep;
mod topics;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use kafka_broker_cluster::Result;

use crate::credentials::InstanceCredentials;

pub use dedicated::DedicatedTopicPlan;
pub use shared::SharedPrefixPlan;
pub use sweep::{DestroyReport, FailedDeletion, SweepLimits, sweep_prefixed_topics};

/// Logical plan name, as used in the catalog's plan `name`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanName {
    /// one topic per instance
    Topic,
    /// a topic name prefix per instance
    Shared,
}

impl PlanName {
    pub const ALL: [PlanName; 2] = [PlanName::Topic, PlanName::Shared];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PlanName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for PlanName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PlanName::ALL
            .into_iter()
            .find(|plan| plan.as_str() == s)
            .ok_or_else(|| format!("unknown plan name '{s}'"))
    }
}

/// How one service plan manages instances.
///
/// Instance ids are unique across plans. `bind` and `unbind` are only called for
/// instances that exist.
#[async_trait]
pub trait PlanStrategy: fmt::Debug + Send + Sync {
    /// true if the instance's topic is present in the cluster
    async fn instance_exists(&self, instance_id: &str) -> Result<bool>;

    async fn create(&self, instance_id: &str) -> Result<()>;

    /// delete every topic belonging to the instance, attempting all of them
    async fn destroy(&self, instance_id: &str) -> Result<DestroyReport>;

    async fn bind(&self, instance_id: &str, binding_id: &str) -> Result<InstanceCredentials>;

    async fn unbind(&self, instance_id: &str, binding_id: &str) -> Result<()>;
}

/// Strategies by plan name. Iteration follows [`PlanName`] order.
#[derive(Debug, Default, Clone)]
pub struct PlanRegistry {
    plans: BTreeMap<PlanName, Arc<dyn PlanStrategy>>,
}

impl PlanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, plan: PlanName, strategy: impl PlanStrategy + 'static) -> Self {
        self.plans.insert(plan, Arc::new(strategy));
        self
    }

    /// register an already shared strategy, possibly under several names
    pub fn register_shared(mut self, plan: PlanName, strategy: Arc<dyn PlanStrategy>) -> Self {
        self.plans.insert(plan, strategy);
        self
    }

    pub fn get(&self, plan: PlanName) -> Option<&Arc<dyn PlanStrategy>> {
        self.plans.get(&plan)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlanName, &Arc<dyn PlanStrategy>)> {
        self.plans.iter().map(|(plan, strategy)| (*plan, strategy))
    }
}
