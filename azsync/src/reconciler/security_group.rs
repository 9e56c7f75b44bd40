//! Network security groups and their ingress rules.

use serde::{Deserialize, Serialize};

use super::{ResourceKind, ResourceSpec, Service};
use crate::clients::security_groups::{
    SecurityGroup, SecurityGroupProperties, SecurityRule, SecurityRuleProperties,
};
use crate::scope::ClusterScope;
use crate::tags::Role;

/// Transport protocol matched by a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    All,
}

impl Protocol {
    fn as_api(self) -> &'static str {
        match self {
            Protocol::Tcp => "Tcp",
            Protocol::Udp => "Udp",
            Protocol::All => "*",
        }
    }
}

/// Inbound allow rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressRule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub protocol: Protocol,
    /// Defaults to any source.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_ports: Option<String>,
    /// Defaults to any destination.
    #[serde(default)]
    pub destination: Option<String>,
    /// Single port or range such as `22` or `30000-32767`.
    pub destination_ports: String,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub name: String,
    #[serde(default)]
    pub ingress_rules: Vec<IngressRule>,
    /// Whether the group fronts the bastion host.
    #[serde(default)]
    pub bastion: bool,
}

fn any(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "*".to_string())
}

impl From<&IngressRule> for SecurityRule {
    fn from(rule: &IngressRule) -> Self {
        SecurityRule {
            name: rule.name.clone(),
            properties: SecurityRuleProperties {
                description: rule.description.clone(),
                protocol: rule.protocol.as_api().to_string(),
                source_port_range: any(&rule.source_ports),
                destination_port_range: rule.destination_ports.clone(),
                source_address_prefix: any(&rule.source),
                destination_address_prefix: any(&rule.destination),
                access: "Allow".to_string(),
                priority: rule.priority,
                direction: "Inbound".to_string(),
            },
        }
    }
}

pub struct SecurityGroupKind;

impl ResourceKind for SecurityGroupKind {
    type Spec = SecurityGroupSpec;
    type Value = SecurityGroup;

    const NAME: &'static str = "security group";
    const TITLE: &'static str = "Security Group";

    fn select(spec: &ResourceSpec) -> Option<&SecurityGroupSpec> {
        match spec {
            ResourceSpec::SecurityGroup(s) => Some(s),
            _ => None,
        }
    }

    fn name(spec: &SecurityGroupSpec) -> &str {
        &spec.name
    }

    fn desired(spec: &SecurityGroupSpec, scope: &ClusterScope) -> SecurityGroup {
        let role = if spec.bastion { Role::Bastion } else { Role::Node };
        SecurityGroup {
            location: Some(scope.location().to_string()),
            tags: scope.standard_tags(&spec.name, role),
            properties: SecurityGroupProperties {
                security_rules: spec.ingress_rules.iter().map(SecurityRule::from).collect(),
                provisioning_state: None,
            },
            ..Default::default()
        }
    }
}

pub type SecurityGroupService = Service<SecurityGroupKind>;
