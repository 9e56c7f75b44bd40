//! Resource client adapters for the Azure Resource Manager API.
//!
//! Each adapter exposes the same three calls for one resource kind:
//! - `get`: read the current resource
//! - `create_or_update`: submit a PUT and wait for the long-running operation
//! - `delete`: submit a DELETE and wait for the long-running operation
//!
//! Errors are returned raw; the reconciliation service classifies them.

pub mod arm;
pub mod bastion_hosts;
pub mod disks;
mod poller;
pub mod route_tables;
pub mod security_groups;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::ClientError;

pub use arm::{ArmClient, ArmResource, ArmResourceClient, Authorizer, NullAuthorizer, StaticToken};
pub use bastion_hosts::{BastionHost, BastionHostsClient};
pub use disks::{Disk, DisksClient};
pub use route_tables::{RouteTable, RouteTablesClient};
pub use security_groups::{SecurityGroup, SecurityGroupsClient};

/// Remote operations for one resource kind.
#[async_trait]
pub trait ResourceClient<V: Send + 'static>: Send + Sync {
    /// Fetch the resource `name` in `resource_group`.
    async fn get(&self, ctx: &Context, resource_group: &str, name: &str) -> Result<V, ClientError>;

    /// Create or update the resource and wait until the provider finishes.
    async fn create_or_update(
        &self,
        ctx: &Context,
        resource_group: &str,
        name: &str,
        value: V,
    ) -> Result<(), ClientError>;

    /// Delete the resource and wait until the provider finishes.
    async fn delete(&self, ctx: &Context, resource_group: &str, name: &str)
        -> Result<(), ClientError>;
}
