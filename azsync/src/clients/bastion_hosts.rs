//! Bastion hosts (`Microsoft.Network/bastionHosts`).

use serde::{Deserialize, Serialize};

use super::arm::{ArmResource, ArmResourceClient, ResourceType};
use crate::tags::Tags;

pub const BASTION_HOSTS: ResourceType = ResourceType {
    provider: "Microsoft.Network",
    collection: "bastionHosts",
    api_version: "2019-06-01",
    client_name: "network.BastionHostsClient",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BastionHost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    #[serde(default)]
    pub properties: BastionHostProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BastionHostProperties {
    #[serde(default)]
    pub ip_configurations: Vec<BastionIpConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BastionIpConfiguration {
    pub name: String,
    pub properties: BastionIpConfigurationProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BastionIpConfigurationProperties {
    pub subnet: SubResource,
    pub public_ip_address: SubResource,
}

/// Reference to another resource by ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

impl ArmResource for BastionHost {
    const TYPE: ResourceType = BASTION_HOSTS;
}

pub type BastionHostsClient = ArmResourceClient<BastionHost>;
