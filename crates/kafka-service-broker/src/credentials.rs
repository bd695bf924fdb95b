//!
//! # Binding credentials
//!
//! What a binding hands to an application: where the cluster is and which topic, or
//! topic name prefix, it may use.
//!
use serde::{Deserialize, Serialize, Serializer};

pub const ZK_PEERS_KEY: &str = "zkPeers";
pub const HOSTNAME_KEY: &str = "hostname";
pub const TOPIC_NAME_KEY: &str = "topicName";
pub const TOPIC_NAME_PREFIX_KEY: &str = "topicNamePrefix";
pub const URI_KEY: &str = "uri";

/// Topics a binding is granted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicGrant {
    /// exactly one topic
    Topic(String),
    /// any topic whose name starts with the prefix
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceCredentials {
    pub zookeeper_peers: String,
    pub kafka_hostnames: String,
    pub grant: TopicGrant,
}

impl InstanceCredentials {
    pub fn topic(
        zookeeper_peers: impl Into<String>,
        kafka_hostnames: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            zookeeper_peers: zookeeper_peers.into(),
            kafka_hostnames: kafka_hostnames.into(),
            grant: TopicGrant::Topic(topic.into()),
        }
    }

    pub fn prefix(
        zookeeper_peers: impl Into<String>,
        kafka_hostnames: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            zookeeper_peers: zookeeper_peers.into(),
            kafka_hostnames: kafka_hostnames.into(),
            grant: TopicGrant::Prefix(prefix.into()),
        }
    }

    /// `kafka://<hosts>/<topic>` for a topic grant, `kafka://<hosts>` for a prefix grant
    pub fn uri(&self) -> String {
        match &self.grant {
            TopicGrant::Topic(topic) => format!("kafka://{}/{}", self.kafka_hostnames, topic),
            TopicGrant::Prefix(_) => format!("kafka://{}", self.kafka_hostnames),
        }
    }

    pub fn to_wire(&self) -> BindingCredentials {
        let (topic_name, topic_name_prefix) = match &self.grant {
            TopicGrant::Topic(topic) => (Some(topic.clone()), None),
            TopicGrant::Prefix(prefix) => (None, Some(prefix.clone())),
        };
        BindingCredentials {
            zk_peers: Some(self.zookeeper_peers.clone()),
            hostname: Some(self.kafka_hostnames.clone()),
            topic_name,
            topic_name_prefix,
            uri: Some(self.uri()),
        }
    }
}

impl Serialize for InstanceCredentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire().serialize(serializer)
    }
}

/// Credentials map as it travels over the wire. Every key is optional so that maps
/// produced elsewhere can be checked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BindingCredentials {
    #[serde(rename = "zkPeers", default, skip_serializing_if = "Option::is_none")]
    pub zk_peers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(rename = "topicName", default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(
        rename = "topicNamePrefix",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub topic_name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl BindingCredentials {
    /// value of a wire key; empty strings count as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            ZK_PEERS_KEY => &self.zk_peers,
            HOSTNAME_KEY => &self.hostname,
            TOPIC_NAME_KEY => &self.topic_name,
            TOPIC_NAME_PREFIX_KEY => &self.topic_name_prefix,
            URI_KEY => &self.uri,
            _ => return None,
        };
        value.as_deref().filter(|value| !value.is_empty())
    }

    /// keys from `required` that are absent
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|key| self.get(key).is_none())
            .collect()
    }
}
