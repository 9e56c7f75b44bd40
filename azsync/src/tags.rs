//! Resource tags and the ownership convention built on them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every tag key azsync writes.
pub const TAG_PREFIX: &str = "azsync.io_";

/// Key of the role tag.
pub const ROLE_TAG: &str = "azsync.io_role";

/// Key of the human-readable name tag.
pub const NAME_TAG: &str = "Name";

/// Value marking a resource whose lifecycle the cluster owns.
pub const OWNED: &str = "owned";

/// Value marking a resource that exists independently of the cluster.
pub const SHARED: &str = "shared";

/// Ownership tag key for a cluster.
pub fn cluster_tag_key(cluster_name: &str) -> String {
    format!("{TAG_PREFIX}cluster_{cluster_name}")
}

/// Tag map attached to a cloud resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Classify these tags for `cluster_name`.
    pub fn ownership(&self, cluster_name: &str) -> Ownership {
        match self.get(&cluster_tag_key(cluster_name)) {
            None => Ownership::Unmanaged,
            Some(SHARED) => Ownership::Shared,
            Some(_) => Ownership::Owned,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Who controls the lifecycle of a network and its member resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// No ownership tag for this cluster.
    Unmanaged,
    /// Tagged as pre-existing and shared with the cluster.
    Shared,
    /// Created by and for this cluster.
    Owned,
}

impl Ownership {
    /// Only owned networks may have member resources created or deleted.
    pub fn permits_mutation(self) -> bool {
        matches!(self, Ownership::Owned)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Unmanaged => write!(f, "unmanaged"),
            Ownership::Shared => write!(f, "shared"),
            Ownership::Owned => write!(f, "owned"),
        }
    }
}

/// Role a resource plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Common,
    Bastion,
    Node,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Common => "common",
            Role::Bastion => "bastion",
            Role::Node => "node",
        }
    }
}

/// Inputs for [`build_tags`].
#[derive(Debug, Clone)]
pub struct BuildTagsParams<'a> {
    pub cluster_name: &'a str,
    pub name: &'a str,
    pub role: Role,
    pub additional: &'a Tags,
}

/// Tags stamped on every resource azsync creates.
///
/// Additional tags never override the ownership, name or role keys.
pub fn build_tags(params: BuildTagsParams<'_>) -> Tags {
    let mut tags = params.additional.clone();
    tags.insert(cluster_tag_key(params.cluster_name), OWNED);
    tags.insert(NAME_TAG, params.name);
    tags.insert(ROLE_TAG, params.role.as_str());
    tags
}
