//! Bastion hosts giving SSH access to cluster nodes.

use serde::{Deserialize, Serialize};

use super::{ResourceKind, ResourceSpec, Service};
use crate::clients::bastion_hosts::{
    BastionHost, BastionHostProperties, BastionIpConfiguration, BastionIpConfigurationProperties,
    SubResource,
};
use crate::scope::ClusterScope;
use crate::tags::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BastionHostSpec {
    pub name: String,
    /// ID of the `AzureBastionSubnet` subnet.
    pub subnet_id: String,
    pub public_ip_id: String,
}

pub struct BastionHostKind;

impl ResourceKind for BastionHostKind {
    type Spec = BastionHostSpec;
    type Value = BastionHost;

    const NAME: &'static str = "bastion host";
    const TITLE: &'static str = "Bastion Host";

    fn select(spec: &ResourceSpec) -> Option<&BastionHostSpec> {
        match spec {
            ResourceSpec::BastionHost(s) => Some(s),
            _ => None,
        }
    }

    fn name(spec: &BastionHostSpec) -> &str {
        &spec.name
    }

    fn desired(spec: &BastionHostSpec, scope: &ClusterScope) -> BastionHost {
        BastionHost {
            location: Some(scope.location().to_string()),
            tags: scope.standard_tags(&spec.name, Role::Bastion),
            properties: BastionHostProperties {
                ip_configurations: vec![BastionIpConfiguration {
                    name: format!("{}-bastionIP", spec.name),
                    properties: BastionIpConfigurationProperties {
                        subnet: SubResource {
                            id: spec.subnet_id.clone(),
                        },
                        public_ip_address: SubResource {
                            id: spec.public_ip_id.clone(),
                        },
                    },
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

pub type BastionHostService = Service<BastionHostKind>;
