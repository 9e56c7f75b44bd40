//! Managed disks (`Microsoft.Compute/disks`).

use serde::{Deserialize, Serialize};

use super::arm::{ArmResource, ArmResourceClient, ResourceType};
use crate::tags::Tags;

pub const DISKS: ResourceType = ResourceType {
    provider: "Microsoft.Compute",
    collection: "disks",
    api_version: "2019-12-01",
    client_name: "compute.DisksClient",
};

/// Create option for a blank data disk.
pub const CREATE_OPTION_EMPTY: &str = "Empty";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<DiskSku>,
    #[serde(default)]
    pub properties: DiskProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskSku {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskProperties {
    #[serde(default)]
    pub creation_data: CreationData,
    #[serde(default, rename = "diskSizeGB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<u32>,
    #[serde(default, skip_serializing)]
    pub disk_state: Option<String>,
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationData {
    pub create_option: String,
}

impl ArmResource for Disk {
    const TYPE: ResourceType = DISKS;
}

pub type DisksClient = ArmResourceClient<Disk>;
