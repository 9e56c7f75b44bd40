//! Reconciliation services, one per resource kind.
//!
//! Every kind shares the same decision logic in [`Service`]:
//! - `get` reads the resource and reports a missing one as not found
//! - `reconcile` creates or updates it when the cluster owns the network
//! - `delete` removes it when the cluster owns the network, treating a
//!   missing resource as already deleted
//!
//! Kinds only supply their spec type, desired value and kind names through
//! [`ResourceKind`].

pub mod bastion_host;
pub mod disk;
pub mod route_table;
pub mod security_group;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clients::ResourceClient;
use crate::context::Context;
use crate::error::{classify, ClientError, ErrorClass, Operation, ReconcileError};
use crate::scope::ClusterScope;

pub use bastion_host::{BastionHostKind, BastionHostService, BastionHostSpec};
pub use disk::{DiskKind, DiskService, DiskSpec};
pub use route_table::{RouteTableKind, RouteTableService, RouteTableSpec};
pub use security_group::{
    IngressRule, Protocol, SecurityGroupKind, SecurityGroupService, SecurityGroupSpec,
};

/// Declared resource, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    RouteTable(RouteTableSpec),
    SecurityGroup(SecurityGroupSpec),
    Disk(DiskSpec),
    BastionHost(BastionHostSpec),
}

impl ResourceSpec {
    pub fn name(&self) -> &str {
        match self {
            ResourceSpec::RouteTable(s) => &s.name,
            ResourceSpec::SecurityGroup(s) => &s.name,
            ResourceSpec::Disk(s) => &s.name,
            ResourceSpec::BastionHost(s) => &s.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::RouteTable(_) => RouteTableKind::NAME,
            ResourceSpec::SecurityGroup(_) => SecurityGroupKind::NAME,
            ResourceSpec::Disk(_) => DiskKind::NAME,
            ResourceSpec::BastionHost(_) => BastionHostKind::NAME,
        }
    }

    /// Title-case kind name, as used in invalid specification errors.
    pub fn title(&self) -> &'static str {
        match self {
            ResourceSpec::RouteTable(_) => RouteTableKind::TITLE,
            ResourceSpec::SecurityGroup(_) => SecurityGroupKind::TITLE,
            ResourceSpec::Disk(_) => DiskKind::TITLE,
            ResourceSpec::BastionHost(_) => BastionHostKind::TITLE,
        }
    }
}

/// What distinguishes one resource kind from another.
pub trait ResourceKind: Send + Sync + 'static {
    type Spec: Send + Sync + 'static;
    type Value: Send + Sync + 'static;

    /// Lowercase name used in error messages, e.g. `route table`.
    const NAME: &'static str;
    /// Title-case name, e.g. `Route Table`.
    const TITLE: &'static str;

    /// The spec for this kind, or `None` if `spec` is another kind.
    fn select(spec: &ResourceSpec) -> Option<&Self::Spec>;

    fn name(spec: &Self::Spec) -> &str;

    /// Value to submit for `spec` in this cluster.
    fn desired(spec: &Self::Spec, scope: &ClusterScope) -> Self::Value;
}

/// Generic reconciliation service for kind `K`.
pub struct Service<K: ResourceKind> {
    scope: Arc<ClusterScope>,
    client: Arc<dyn ResourceClient<K::Value>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Service<K> {
    pub fn new(scope: Arc<ClusterScope>, client: Arc<dyn ResourceClient<K::Value>>) -> Self {
        Self {
            scope,
            client,
            _kind: PhantomData,
        }
    }

    pub fn scope(&self) -> &ClusterScope {
        &self.scope
    }

    fn validate<'a>(&self, spec: &'a ResourceSpec) -> Result<&'a K::Spec, ReconcileError> {
        K::select(spec).ok_or(ReconcileError::InvalidSpecification { kind: K::TITLE })
    }

    fn cancelled(&self, operation: Operation, name: &str, source: ClientError) -> ReconcileError {
        ReconcileError::Cancelled {
            operation,
            kind: K::NAME,
            name: name.to_string(),
            resource_group: self.scope.resource_group().to_string(),
            source,
        }
    }

    /// Fetch the current value of the resource.
    pub async fn get(&self, ctx: &Context, spec: &ResourceSpec) -> Result<K::Value, ReconcileError> {
        let spec = self.validate(spec)?;
        let name = K::name(spec);

        self.client
            .get(ctx, self.scope.resource_group(), name)
            .await
            .map_err(|err| match classify(&err) {
                ErrorClass::NotFound => ReconcileError::NotFound {
                    kind: K::NAME,
                    name: name.to_string(),
                    source: err,
                },
                ErrorClass::Cancelled => self.cancelled(Operation::Get, name, err),
                _ => ReconcileError::Client(err),
            })
    }

    /// Create or update the resource if the cluster owns its network.
    pub async fn reconcile(&self, ctx: &Context, spec: &ResourceSpec) -> Result<(), ReconcileError> {
        let spec = self.validate(spec)?;
        let name = K::name(spec);
        let ownership = self.scope.ownership();

        if !ownership.permits_mutation() {
            debug!(
                kind = K::NAME,
                name = %name,
                vnet = %self.scope.vnet().name,
                ownership = %ownership,
                "Skipping reconcile in network not owned by cluster"
            );
            return Ok(());
        }

        let resource_group = self.scope.resource_group();
        info!(kind = K::NAME, name = %name, resource_group = %resource_group, "Creating or updating");

        let value = K::desired(spec, &self.scope);
        self.client
            .create_or_update(ctx, resource_group, name, value)
            .await
            .map_err(|err| match classify(&err) {
                ErrorClass::Cancelled => self.cancelled(Operation::Create, name, err),
                _ => ReconcileError::CreateFailed {
                    kind: K::NAME,
                    name: name.to_string(),
                    resource_group: resource_group.to_string(),
                    source: err,
                },
            })?;

        info!(kind = K::NAME, name = %name, "Successfully created or updated");
        Ok(())
    }

    /// Delete the resource if the cluster owns its network.
    pub async fn delete(&self, ctx: &Context, spec: &ResourceSpec) -> Result<(), ReconcileError> {
        let spec = self.validate(spec)?;
        let name = K::name(spec);
        let ownership = self.scope.ownership();

        if !ownership.permits_mutation() {
            debug!(
                kind = K::NAME,
                name = %name,
                vnet = %self.scope.vnet().name,
                ownership = %ownership,
                "Skipping delete in network not owned by cluster"
            );
            return Ok(());
        }

        let resource_group = self.scope.resource_group();
        info!(kind = K::NAME, name = %name, resource_group = %resource_group, "Deleting");

        match self.client.delete(ctx, resource_group, name).await {
            Ok(()) => {
                info!(kind = K::NAME, name = %name, "Successfully deleted");
                Ok(())
            }
            Err(err) => match classify(&err) {
                ErrorClass::NotFound => {
                    debug!(kind = K::NAME, name = %name, "Already deleted");
                    Ok(())
                }
                ErrorClass::Cancelled => Err(self.cancelled(Operation::Delete, name, err)),
                _ => Err(ReconcileError::DeleteFailed {
                    kind: K::NAME,
                    name: name.to_string(),
                    resource_group: resource_group.to_string(),
                    source: err,
                }),
            },
        }
    }
}

/// Object-safe view of a [`Service`], used to drive mixed manifests.
#[async_trait]
pub trait Reconciler: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Whether `spec` is of this reconciler's kind.
    fn accepts(&self, spec: &ResourceSpec) -> bool;

    async fn reconcile(&self, ctx: &Context, spec: &ResourceSpec) -> Result<(), ReconcileError>;

    async fn delete(&self, ctx: &Context, spec: &ResourceSpec) -> Result<(), ReconcileError>;

    /// Current value as JSON.
    async fn fetch(
        &self,
        ctx: &Context,
        spec: &ResourceSpec,
    ) -> Result<serde_json::Value, ReconcileError>;
}

#[async_trait]
impl<K> Reconciler for Service<K>
where
    K: ResourceKind,
    K::Value: Serialize,
{
    fn kind(&self) -> &'static str {
        K::NAME
    }

    fn accepts(&self, spec: &ResourceSpec) -> bool {
        K::select(spec).is_some()
    }

    async fn reconcile(&self, ctx: &Context, spec: &ResourceSpec) -> Result<(), ReconcileError> {
        Service::<K>::reconcile(self, ctx, spec).await
    }

    async fn delete(&self, ctx: &Context, spec: &ResourceSpec) -> Result<(), ReconcileError> {
        Service::<K>::delete(self, ctx, spec).await
    }

    async fn fetch(
        &self,
        ctx: &Context,
        spec: &ResourceSpec,
    ) -> Result<serde_json::Value, ReconcileError> {
        let value = Service::<K>::get(self, ctx, spec).await?;
        serde_json::to_value(&value).map_err(|source| {
            ReconcileError::Client(ClientError::Decode {
                operation: format!("encode {}", K::NAME),
                source,
            })
        })
    }
}
