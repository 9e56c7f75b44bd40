//! Read-only view over the declared cluster and its network.

use crate::config::{ClusterConfig, ConfigError};
use crate::tags::{build_tags, BuildTagsParams, Ownership, Role, Tags};

/// Identity and tags of the virtual network.
#[derive(Debug, Clone)]
pub struct NetworkContext {
    pub resource_group: String,
    pub name: String,
    pub id: String,
    pub tags: Tags,
    ownership: Ownership,
}

impl NetworkContext {
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }
}

/// Inputs for [`ClusterScope::new`].
#[derive(Debug, Clone, Default)]
pub struct ClusterScopeParams {
    pub cluster_name: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
    pub vnet_name: String,
    pub vnet_resource_group: Option<String>,
    pub vnet_id: String,
    pub vnet_tags: Tags,
    pub additional_tags: Tags,
}

/// Cluster configuration as seen by the reconciliation services.
///
/// Built once and shared behind an `Arc`; the network ownership class is
/// computed here and never recomputed during a call.
#[derive(Debug, Clone)]
pub struct ClusterScope {
    cluster_name: String,
    subscription_id: String,
    resource_group: String,
    location: String,
    vnet: NetworkContext,
    additional_tags: Tags,
}

impl ClusterScope {
    pub fn new(params: ClusterScopeParams) -> Result<Self, ConfigError> {
        if params.cluster_name.is_empty() {
            return Err(ConfigError::MissingField("cluster_name"));
        }
        if params.resource_group.is_empty() {
            return Err(ConfigError::MissingField("resource_group"));
        }

        let ownership = params.vnet_tags.ownership(&params.cluster_name);
        let vnet_resource_group = params
            .vnet_resource_group
            .filter(|rg| !rg.is_empty())
            .unwrap_or_else(|| params.resource_group.clone());

        Ok(Self {
            vnet: NetworkContext {
                resource_group: vnet_resource_group,
                name: params.vnet_name,
                id: params.vnet_id,
                tags: params.vnet_tags,
                ownership,
            },
            cluster_name: params.cluster_name,
            subscription_id: params.subscription_id,
            resource_group: params.resource_group,
            location: params.location,
            additional_tags: params.additional_tags,
        })
    }

    pub fn from_config(config: &ClusterConfig) -> Result<Self, ConfigError> {
        Self::new(ClusterScopeParams {
            cluster_name: config.cluster_name.clone(),
            subscription_id: config.subscription_id.clone(),
            resource_group: config.resource_group.clone(),
            location: config.location.clone(),
            vnet_name: config.vnet.name.clone(),
            vnet_resource_group: Some(config.vnet.resource_group.clone()),
            vnet_id: config.vnet.id.clone(),
            vnet_tags: config.vnet.tags.clone(),
            additional_tags: config.additional_tags.clone(),
        })
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn vnet(&self) -> &NetworkContext {
        &self.vnet
    }

    /// Ownership of the cluster network.
    pub fn ownership(&self) -> Ownership {
        self.vnet.ownership
    }

    /// Tags for a resource this cluster creates.
    pub fn standard_tags(&self, name: &str, role: Role) -> Tags {
        build_tags(BuildTagsParams {
            cluster_name: &self.cluster_name,
            name,
            role,
            additional: &self.additional_tags,
        })
    }
}

/// Scope used throughout the unit tests.
#[cfg(test)]
pub(crate) fn test_scope(vnet_tags: Tags) -> ClusterScope {
    ClusterScope::new(ClusterScopeParams {
        cluster_name: "test-cluster".into(),
        subscription_id: "123".into(),
        resource_group: "my-rg".into(),
        location: "test-location".into(),
        vnet_name: "my-vnet".into(),
        vnet_resource_group: None,
        vnet_id: String::new(),
        vnet_tags,
        additional_tags: Tags::new(),
    })
    .unwrap()
}

#[cfg(test)]
pub(crate) fn owned_tags() -> Tags {
    [("azsync.io_cluster_test-cluster", "owned")]
        .into_iter()
        .collect()
}

#[cfg(test)]
pub(crate) fn shared_tags() -> Tags {
    [("azsync.io_cluster_test-cluster", "shared")]
        .into_iter()
        .collect()
}
