//!
//! # Instance lifecycle
//!
//! Routes provisioning requests to the plan strategy selected by the request's plan id.
//! Whether an instance exists is decided by asking every registered strategy, in
//! [`PlanName`] order, so instance ids are unique across plans.
//!
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::{CatalogResolver, Service};
use crate::config::DeprovisionPolicy;
use crate::credentials::InstanceCredentials;
use crate::plan::{DestroyReport, PlanName, PlanRegistry, PlanStrategy};
use crate::{BrokerError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProvisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub organization_guid: String,
    #[serde(default)]
    pub space_guid: String,
}

impl ProvisionDetails {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateDetails {
    #[serde(default)]
    pub service_id: String,
    /// empty when the plan is not being changed
    #[serde(default)]
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BindDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub app_guid: String,
}

impl BindDetails {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnbindDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

impl UnbindDetails {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            ..Default::default()
        }
    }
}

/// Deprovisioning finds the plan from the cluster, the details are informational
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeprovisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedServiceSpec {
    pub is_async: bool,
    pub plan: PlanName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeprovisionServiceSpec {
    pub is_async: bool,
    pub plan: PlanName,
    pub report: DestroyReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateServiceSpec {
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub credentials: InstanceCredentials,
}

/// Every operation completes before it responds, so none is ever reported in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LastOperationState {
    #[serde(rename = "succeeded")]
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastOperation {
    pub state: LastOperationState,
    pub description: String,
}

/// Dispatches lifecycle operations to plan strategies
pub struct KafkaServiceBroker {
    catalog: Box<dyn CatalogResolver>,
    plans: PlanRegistry,
    deprovision_policy: DeprovisionPolicy,
}

impl fmt::Debug for KafkaServiceBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaServiceBroker")
            .field("plans", &self.plans.iter().map(|(plan, _)| plan).collect::<Vec<_>>())
            .field("deprovision_policy", &self.deprovision_policy)
            .finish()
    }
}

impl KafkaServiceBroker {
    pub fn new(catalog: impl CatalogResolver + 'static, plans: PlanRegistry) -> Self {
        Self {
            catalog: Box::new(catalog),
            plans,
            deprovision_policy: DeprovisionPolicy::default(),
        }
    }

    pub fn with_deprovision_policy(mut self, policy: DeprovisionPolicy) -> Self {
        self.deprovision_policy = policy;
        self
    }

    pub fn services(&self) -> &[Service] {
        &self.catalog.catalog().services
    }

    /// Every plan in the catalog must have a registered strategy
    pub fn check_plans(&self) -> Result<()> {
        for plan in self.catalog.catalog().plans() {
            let registered = plan
                .name
                .parse::<PlanName>()
                .ok()
                .and_then(|name| self.plans.get(name));
            if registered.is_none() {
                error!(plan_id = %plan.id, plan = %plan.name, "no strategy registered for catalog plan");
                return Err(BrokerError::PlanNotConfigured(plan.name.clone()));
            }
        }
        Ok(())
    }

    #[instrument(skip(self, details), fields(plan_id = %details.plan_id))]
    pub async fn provision(
        &self,
        instance_id: &str,
        details: ProvisionDetails,
    ) -> Result<ProvisionedServiceSpec> {
        if let Some((existing, _)) = self.find_instance(instance_id).await? {
            warn!(plan = %existing, "instance already exists");
            return Err(BrokerError::InstanceAlreadyExists);
        }

        let (plan, strategy) = self.strategy_for(&details.plan_id)?;
        strategy.create(instance_id).await?;
        info!(%plan, "provisioned instance");

        Ok(ProvisionedServiceSpec {
            is_async: false,
            plan,
        })
    }

    #[instrument(skip(self, _details))]
    pub async fn deprovision(
        &self,
        instance_id: &str,
        _details: DeprovisionDetails,
    ) -> Result<DeprovisionServiceSpec> {
        let Some((plan, strategy)) = self.find_instance(instance_id).await? else {
            return Err(BrokerError::InstanceDoesNotExist);
        };

        let report = strategy.destroy(instance_id).await?;
        if !report.is_complete() {
            warn!(
                %plan,
                deleted = report.succeeded(),
                failed = report.failed_count(),
                policy = %self.deprovision_policy,
                "instance partially deprovisioned"
            );
            if self.deprovision_policy == DeprovisionPolicy::Strict {
                return Err(BrokerError::PartialDeprovision {
                    instance_id: instance_id.to_owned(),
                    failed: report.failed_topics(),
                });
            }
        } else {
            info!(%plan, deleted = report.succeeded(), "deprovisioned instance");
        }

        Ok(DeprovisionServiceSpec {
            is_async: false,
            plan,
            report,
        })
    }

    #[instrument(skip(self, details), fields(plan_id = %details.plan_id))]
    pub async fn bind(
        &self,
        instance_id: &str,
        binding_id: &str,
        details: BindDetails,
    ) -> Result<Binding> {
        let (plan, strategy) = self.strategy_for(&details.plan_id)?;
        if !strategy.instance_exists(instance_id).await? {
            return Err(BrokerError::InstanceDoesNotExist);
        }

        let credentials = strategy.bind(instance_id, binding_id).await?;
        info!(%plan, "bound instance");
        Ok(Binding { credentials })
    }

    #[instrument(skip(self, details), fields(plan_id = %details.plan_id))]
    pub async fn unbind(
        &self,
        instance_id: &str,
        binding_id: &str,
        details: UnbindDetails,
    ) -> Result<()> {
        let (plan, strategy) = self.strategy_for(&details.plan_id)?;
        if !strategy.instance_exists(instance_id).await? {
            return Err(BrokerError::InstanceDoesNotExist);
        }

        strategy.unbind(instance_id, binding_id).await.map_err(|err| {
            error!(%plan, %err, "unbind failed");
            BrokerError::BindingDoesNotExist
        })
    }

    /// Instances cannot move between plans. Anything else is accepted without change.
    #[instrument(skip(self, details), fields(plan_id = %details.plan_id))]
    pub async fn update(
        &self,
        instance_id: &str,
        details: UpdateDetails,
    ) -> Result<UpdateServiceSpec> {
        let Some((current, _)) = self.find_instance(instance_id).await? else {
            return Err(BrokerError::InstanceDoesNotExist);
        };

        if !details.plan_id.is_empty() {
            let (requested, _) = self.strategy_for(&details.plan_id)?;
            if requested != current {
                return Err(BrokerError::PlanChangeNotSupported {
                    from: current,
                    to: requested,
                });
            }
        }

        debug!(plan = %current, "nothing to update");
        Ok(UpdateServiceSpec { is_async: false })
    }

    /// Every operation completes before returning
    pub fn last_operation(&self, instance_id: &str) -> LastOperation {
        debug!(instance_id, "last operation");
        LastOperation {
            state: LastOperationState::Succeeded,
            description: "operation completed".to_owned(),
        }
    }

    /// resolve a caller supplied plan id to its registered strategy
    fn strategy_for(&self, plan_id: &str) -> Result<(PlanName, &Arc<dyn PlanStrategy>)> {
        if plan_id.is_empty() {
            return Err(BrokerError::plan_id_required());
        }

        let name = self
            .catalog
            .plan_name(plan_id)
            .ok_or_else(|| BrokerError::PlanNotRecognized(plan_id.to_owned()))?;

        name.parse::<PlanName>()
            .ok()
            .and_then(|plan| self.plans.get(plan).map(|strategy| (plan, strategy)))
            .ok_or_else(|| BrokerError::PlanNotConfigured(name.to_owned()))
    }

    /// first strategy reporting the instance
    async fn find_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<(PlanName, &Arc<dyn PlanStrategy>)>> {
        for (plan, strategy) in self.plans.iter() {
            if strategy.instance_exists(instance_id).await? {
                debug!(instance_id, %plan, "instance found");
                return Ok(Some((plan, strategy)));
            }
        }
        Ok(None)
    }
}
