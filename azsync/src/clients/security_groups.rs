//! Network security groups (`Microsoft.Network/networkSecurityGroups`).

use serde::{Deserialize, Serialize};

use super::arm::{ArmResource, ArmResourceClient, ResourceType};
use crate::tags::Tags;

pub const SECURITY_GROUPS: ResourceType = ResourceType {
    provider: "Microsoft.Network",
    collection: "networkSecurityGroups",
    api_version: "2019-06-01",
    client_name: "network.SecurityGroupsClient",
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    #[serde(default)]
    pub properties: SecurityGroupProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupProperties {
    #[serde(default)]
    pub security_rules: Vec<SecurityRule>,
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    pub name: String,
    pub properties: SecurityRuleProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Tcp`, `Udp` or `*`.
    pub protocol: String,
    pub source_port_range: String,
    pub destination_port_range: String,
    pub source_address_prefix: String,
    pub destination_address_prefix: String,
    /// `Allow` or `Deny`.
    pub access: String,
    /// 100 to 4096; lower wins.
    pub priority: u32,
    /// `Inbound` or `Outbound`.
    pub direction: String,
}

impl ArmResource for SecurityGroup {
    const TYPE: ResourceType = SECURITY_GROUPS;
}

pub type SecurityGroupsClient = ArmResourceClient<SecurityGroup>;
