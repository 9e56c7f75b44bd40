//! Managed data disks.

use serde::{Deserialize, Serialize};

use super::{ResourceKind, ResourceSpec, Service};
use crate::clients::disks::{CreationData, Disk, DiskProperties, DiskSku, CREATE_OPTION_EMPTY};
use crate::scope::ClusterScope;
use crate::tags::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub name: String,
    pub size_gb: u32,
    /// Storage SKU such as `Premium_LRS`. The provider default applies when unset.
    #[serde(default)]
    pub sku: Option<String>,
}

pub struct DiskKind;

impl ResourceKind for DiskKind {
    type Spec = DiskSpec;
    type Value = Disk;

    const NAME: &'static str = "disk";
    const TITLE: &'static str = "Disk";

    fn select(spec: &ResourceSpec) -> Option<&DiskSpec> {
        match spec {
            ResourceSpec::Disk(s) => Some(s),
            _ => None,
        }
    }

    fn name(spec: &DiskSpec) -> &str {
        &spec.name
    }

    fn desired(spec: &DiskSpec, scope: &ClusterScope) -> Disk {
        Disk {
            location: Some(scope.location().to_string()),
            tags: scope.standard_tags(&spec.name, Role::Node),
            sku: spec.sku.clone().map(|name| DiskSku { name }),
            properties: DiskProperties {
                creation_data: CreationData {
                    create_option: CREATE_OPTION_EMPTY.to_string(),
                },
                disk_size_gb: Some(spec.size_gb),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

pub type DiskService = Service<DiskKind>;
