//! Manifest runner: drives every declared resource through its kind's
//! reconciliation service, in dependency order.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::clients::{
    ArmClient, BastionHostsClient, DisksClient, RouteTablesClient, SecurityGroupsClient,
};
use crate::config::ConfigError;
use crate::context::Context;
use crate::error::ReconcileError;
use crate::reconciler::{
    BastionHostService, DiskService, Reconciler, ResourceSpec, RouteTableService,
    SecurityGroupService,
};
use crate::scope::ClusterScope;

/// Resources to converge, as read from a manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Resources sorted so that dependencies come first.
    fn ordered(&self) -> Vec<&ResourceSpec> {
        let mut ordered: Vec<&ResourceSpec> = self.resources.iter().collect();
        ordered.sort_by_key(|spec| apply_rank(spec));
        ordered
    }
}

/// Security groups and route tables are referenced by subnets the bastion
/// host lives in; disks depend on nothing.
fn apply_rank(spec: &ResourceSpec) -> u8 {
    match spec {
        ResourceSpec::SecurityGroup(_) => 0,
        ResourceSpec::RouteTable(_) => 1,
        ResourceSpec::BastionHost(_) => 2,
        ResourceSpec::Disk(_) => 3,
    }
}

/// Result for one resource.
#[derive(Debug)]
pub struct Outcome<T = ()> {
    pub kind: &'static str,
    pub name: String,
    pub result: Result<T, ReconcileError>,
}

/// Results of a manifest run.
#[derive(Debug, Default)]
pub struct RunReport<T = ()> {
    pub outcomes: Vec<Outcome<T>>,
    /// Set when the run stopped early because the context ended.
    pub cancelled: bool,
}

impl<T> RunReport<T> {
    pub fn failures(&self) -> impl Iterator<Item = &Outcome<T>> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failures().next().is_none()
    }
}

/// Holds one reconciler per resource kind.
pub struct Agent {
    reconcilers: Vec<Box<dyn Reconciler>>,
}

impl Agent {
    pub fn new(reconcilers: Vec<Box<dyn Reconciler>>) -> Self {
        Self { reconcilers }
    }

    /// Agent backed by the Resource Manager API.
    pub fn from_arm(scope: Arc<ClusterScope>, arm: ArmClient) -> Self {
        let route_tables = Arc::new(RouteTablesClient::new(arm.clone()));
        let security_groups = Arc::new(SecurityGroupsClient::new(arm.clone()));
        let disks = Arc::new(DisksClient::new(arm.clone()));
        let bastion_hosts = Arc::new(BastionHostsClient::new(arm));

        Self::new(vec![
            Box::new(RouteTableService::new(scope.clone(), route_tables)),
            Box::new(SecurityGroupService::new(scope.clone(), security_groups)),
            Box::new(DiskService::new(scope.clone(), disks)),
            Box::new(BastionHostService::new(scope, bastion_hosts)),
        ])
    }

    fn reconciler_for(&self, spec: &ResourceSpec) -> Result<&dyn Reconciler, ReconcileError> {
        self.reconcilers
            .iter()
            .find(|r| r.accepts(spec))
            .map(|r| r.as_ref())
            .ok_or(ReconcileError::InvalidSpecification { kind: spec.title() })
    }

    /// Create or update every resource in dependency order.
    pub async fn apply(&self, ctx: &Context, manifest: &Manifest) -> RunReport {
        info!("Applying {} resources", manifest.resources.len());
        let mut report = RunReport::default();

        for spec in manifest.ordered() {
            if ctx.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let result = match self.reconciler_for(spec) {
                Ok(r) => r.reconcile(ctx, spec).await,
                Err(e) => Err(e),
            };
            if !record(&mut report, spec, result) {
                break;
            }
        }

        report
    }

    /// Delete every resource in reverse dependency order.
    pub async fn delete(&self, ctx: &Context, manifest: &Manifest) -> RunReport {
        info!("Deleting {} resources", manifest.resources.len());
        let mut report = RunReport::default();

        for spec in manifest.ordered().into_iter().rev() {
            if ctx.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let result = match self.reconciler_for(spec) {
                Ok(r) => r.delete(ctx, spec).await,
                Err(e) => Err(e),
            };
            if !record(&mut report, spec, result) {
                break;
            }
        }

        report
    }

    /// Fetch the current value of every resource.
    pub async fn get(&self, ctx: &Context, manifest: &Manifest) -> RunReport<serde_json::Value> {
        let mut report = RunReport::default();

        for spec in &manifest.resources {
            if ctx.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let result = match self.reconciler_for(spec) {
                Ok(r) => r.fetch(ctx, spec).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                if !e.is_not_found() {
                    warn!("Failed to get {} {}: {}", spec.kind(), spec.name(), e);
                }
            }
            let cancelled = matches!(&result, Err(e) if e.is_cancelled());
            report.outcomes.push(Outcome {
                kind: spec.kind(),
                name: spec.name().to_string(),
                result,
            });
            if cancelled {
                report.cancelled = true;
                break;
            }
        }

        report
    }
}

/// Push an outcome; returns false if the run should stop.
fn record(report: &mut RunReport, spec: &ResourceSpec, result: Result<(), ReconcileError>) -> bool {
    let cancelled = matches!(&result, Err(e) if e.is_cancelled());
    if let Err(e) = &result {
        error!("{} {} failed: {}", spec.kind(), spec.name(), e);
    }
    report.outcomes.push(Outcome {
        kind: spec.kind(),
        name: spec.name().to_string(),
        result,
    });
    if cancelled {
        report.cancelled = true;
    }
    !cancelled
}
