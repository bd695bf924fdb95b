//!
//! # Kafka Service Broker
//!
//! Exposes Kafka topics as service instances. Instance state is never stored by the
//! broker: whether an instance exists is asked of the cluster on every call.
//!
//! Requests are routed by [`broker::KafkaServiceBroker`] to the [`plan::PlanStrategy`]
//! registered for the plan named in the catalog.
//!
pub mod broker;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod plan;

mod error;

pub use broker::KafkaServiceBroker;
pub use error::BrokerError;

pub use kafka_broker_cluster as cluster;

pub type Result<T, E = BrokerError> = core::result::Result<T, E>;
