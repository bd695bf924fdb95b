//!
//! # Cluster metadata access
//!
//! Capability the service broker uses to look at, create and remove topics in the
//! Kafka cluster. A [`ClusterConnector`] opens one [`ClusterSession`] per logical
//! operation; the session is closed when it is dropped.
//!
mod client;
mod error;

pub mod memory;
#[cfg(feature = "kafka")]
pub mod kafka;

pub use client::*;
pub use error::ClusterError;

pub type Result<T, E = ClusterError> = core::result::Result<T, E>;
