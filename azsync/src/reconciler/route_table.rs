//! Route tables for cluster subnets.

use serde::{Deserialize, Serialize};

use super::{ResourceKind, ResourceSpec, Service};
use crate::clients::route_tables::{RouteTable, RouteTableProperties};
use crate::scope::ClusterScope;
use crate::tags::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTableSpec {
    pub name: String,
}

pub struct RouteTableKind;

impl ResourceKind for RouteTableKind {
    type Spec = RouteTableSpec;
    type Value = RouteTable;

    const NAME: &'static str = "route table";
    const TITLE: &'static str = "Route Table";

    fn select(spec: &ResourceSpec) -> Option<&RouteTableSpec> {
        match spec {
            ResourceSpec::RouteTable(s) => Some(s),
            _ => None,
        }
    }

    fn name(spec: &RouteTableSpec) -> &str {
        &spec.name
    }

    fn desired(spec: &RouteTableSpec, scope: &ClusterScope) -> RouteTable {
        RouteTable {
            location: Some(scope.location().to_string()),
            tags: scope.standard_tags(&spec.name, Role::Common),
            properties: RouteTableProperties::default(),
            ..Default::default()
        }
    }
}

pub type RouteTableService = Service<RouteTableKind>;
