//!
//! # Kafka Service Broker API
//!
//! Open Service Broker v2 routes over [`KafkaServiceBroker`], protected by HTTP basic
//! authentication.
//!
//! [`KafkaServiceBroker`]: kafka_service_broker::KafkaServiceBroker
//!
mod auth;
mod error;
mod server;

pub use auth::BasicCredentials;
pub use error::ApiError;
pub use server::{BrokerServer, router};
