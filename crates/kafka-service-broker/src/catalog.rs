//!
//! # Service catalog
//!
//! The catalog document returned to the platform. A default document is compiled in;
//! it can be replaced or patched through environment variables.
//!
use std::fmt::Debug;
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const CATALOG_JSON_ENV: &str = "BROKER_CATALOG_JSON";
pub const SERVICE_GUID_ENV: &str = "BROKER_SERVICE_GUID";
pub const SERVICE_NAME_ENV: &str = "BROKER_SERVICE_NAME";

const DEFAULT_CATALOG: &str = include_str!("../assets/catalog.json");

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("unable to read catalog file {path}")]
    Io { path: PathBuf, source: IoError },
    #[error("unable to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Service catalog returned via `/v2/catalog`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bindable: bool,
    #[serde(default)]
    pub plan_updateable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub plans: Vec<ServicePlan>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServicePlan {
    #[serde(default)]
    pub id: String,
    /// logical plan name, selects the plan strategy
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Maps the plan identifiers callers send to logical plan names
pub trait CatalogResolver: Debug + Send + Sync {
    fn catalog(&self) -> &Catalog;

    fn plan_name(&self, plan_id: &str) -> Option<&str>;
}

impl CatalogResolver for Catalog {
    fn catalog(&self) -> &Catalog {
        self
    }

    fn plan_name(&self, plan_id: &str) -> Option<&str> {
        self.plans()
            .find(|plan| plan.id == plan_id)
            .map(|plan| plan.name.as_str())
    }
}

impl Catalog {
    /// the catalog compiled into the broker
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// load with overrides from the process environment
    pub fn load() -> Result<Self, CatalogError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// `BROKER_CATALOG_JSON` replaces the whole document, either as a file path or as inline
    /// JSON. Service id/name and plan ids of the first service can then be patched.
    pub fn load_with<F>(lookup: F) -> Result<Self, CatalogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mut catalog = match lookup(CATALOG_JSON_ENV) {
            Some(value) => {
                let path = Path::new(&value);
                if path.exists() {
                    debug!(path = %path.display(), "loading catalog file");
                    let json = std::fs::read_to_string(path).map_err(|source| {
                        CatalogError::Io {
                            path: path.to_owned(),
                            source,
                        }
                    })?;
                    Self::from_json(&json)?
                } else {
                    debug!("loading inline catalog");
                    Self::from_json(&value)?
                }
            }
            None => Self::embedded()?,
        };

        if let Some(service) = catalog.services.first_mut() {
            if let Some(guid) = lookup(SERVICE_GUID_ENV) {
                service.id = guid;
            }
            if let Some(name) = lookup(SERVICE_NAME_ENV) {
                service.name = name;
            }
            for (index, plan) in service.plans.iter_mut().enumerate() {
                if let Some(guid) = lookup(&format!("BROKER_PLAN{index}_GUID")) {
                    plan.id = guid;
                }
            }
        }

        Ok(catalog)
    }

    /// every plan of every service
    pub fn plans(&self) -> impl Iterator<Item = &ServicePlan> {
        self.services.iter().flat_map(|service| service.plans.iter())
    }
}
