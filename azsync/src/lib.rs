//! azsync: converges cluster network resources against the Azure Resource
//! Manager API.
//!
//! Each resource kind gets a [`reconciler::Service`] that reads, creates or
//! deletes one resource at a time, honoring the cluster's ownership of the
//! virtual network. The [`agent::Agent`] runs a whole manifest through them.

pub mod agent;
pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod reconciler;
pub mod scope;
pub mod tags;

pub use agent::{Agent, Manifest, RunReport};
pub use clients::{ArmClient, ResourceClient};
pub use config::{ClusterConfig, ConfigError};
pub use context::Context;
pub use error::{classify, ClientError, ErrorClass, ReconcileError};
pub use reconciler::{Reconciler, ResourceKind, ResourceSpec, Service};
pub use scope::{ClusterScope, ClusterScopeParams};
pub use tags::{Ownership, Tags};
