//! Resource identifiers persisted for each EKS resource kind

use std::fmt;

use eks_lifecycle_core::{KeyFormat, KeyResult};

pub const CLUSTER_ID: KeyFormat = KeyFormat::new(&["CLUSTER_NAME"]);
pub const ADDON_ID: KeyFormat = KeyFormat::new(&["CLUSTER_NAME", "ADDON_NAME"]);
pub const NODE_GROUP_ID: KeyFormat = KeyFormat::new(&["CLUSTER_NAME", "NODE_GROUP_NAME"]);
pub const FARGATE_PROFILE_ID: KeyFormat =
    KeyFormat::new(&["CLUSTER_NAME", "FARGATE_PROFILE_NAME"]);
pub const CAPABILITY_ID: KeyFormat = KeyFormat::new(&["CLUSTER_NAME", "CAPABILITY_NAME"]);
pub const IDENTITY_PROVIDER_CONFIG_ID: KeyFormat =
    KeyFormat::new(&["CLUSTER_NAME", "CONFIG_NAME"]);
/// Principal ARNs contain ':' themselves.
pub const ACCESS_ENTRY_ID: KeyFormat =
    KeyFormat::new(&["CLUSTER_NAME", "PRINCIPAL_ARN"]).with_open_trailing_part();
pub const ACCESS_POLICY_ASSOCIATION_ID: KeyFormat =
    KeyFormat::new(&["CLUSTER_NAME", "PRINCIPAL_ARN", "POLICY_ARN"]).with_separator('#');

pub const CLUSTER_UPDATE_ID: KeyFormat = KeyFormat::new(&["CLUSTER_NAME", "UPDATE_ID"]);
pub const ADDON_UPDATE_ID: KeyFormat =
    KeyFormat::new(&["CLUSTER_NAME", "ADDON_NAME", "UPDATE_ID"]);
pub const NODE_GROUP_UPDATE_ID: KeyFormat =
    KeyFormat::new(&["CLUSTER_NAME", "NODE_GROUP_NAME", "UPDATE_ID"]);

/// A resource owned by a cluster and named within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterChildId {
    pub cluster: String,
    pub name: String,
}

impl ClusterChildId {
    pub fn new(cluster: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            name: name.into(),
        }
    }

    pub fn parse(format: &KeyFormat, id: &str) -> KeyResult<Self> {
        let [cluster, name] = format.decode_array(id)?;
        Ok(Self { cluster, name })
    }

    pub fn encode(&self, format: &KeyFormat) -> KeyResult<String> {
        format.encode(&[self.cluster.as_str(), self.name.as_str()])
    }
}

impl fmt::Display for ClusterChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cluster, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessEntryId {
    pub cluster: String,
    pub principal_arn: String,
}

impl AccessEntryId {
    pub fn parse(id: &str) -> KeyResult<Self> {
        let [cluster, principal_arn] = ACCESS_ENTRY_ID.decode_array(id)?;
        Ok(Self {
            cluster,
            principal_arn,
        })
    }
}

impl fmt::Display for AccessEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cluster, self.principal_arn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessPolicyAssociationId {
    pub cluster: String,
    pub principal_arn: String,
    pub policy_arn: String,
}

impl AccessPolicyAssociationId {
    pub fn parse(id: &str) -> KeyResult<Self> {
        let [cluster, principal_arn, policy_arn] = ACCESS_POLICY_ASSOCIATION_ID.decode_array(id)?;
        Ok(Self {
            cluster,
            principal_arn,
            policy_arn,
        })
    }
}

impl fmt::Display for AccessPolicyAssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}#{}",
            self.cluster, self.principal_arn, self.policy_arn
        )
    }
}

/// What an update was applied to. Add-on and node group updates are described
/// through their parent cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpdateScope {
    Cluster,
    Addon(String),
    NodeGroup(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpdateId {
    pub cluster: String,
    pub scope: UpdateScope,
    pub update_id: String,
}

impl UpdateId {
    pub fn cluster(cluster: impl Into<String>, update_id: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            scope: UpdateScope::Cluster,
            update_id: update_id.into(),
        }
    }

    pub fn addon(parent: &ClusterChildId, update_id: impl Into<String>) -> Self {
        Self {
            cluster: parent.cluster.clone(),
            scope: UpdateScope::Addon(parent.name.clone()),
            update_id: update_id.into(),
        }
    }

    pub fn node_group(parent: &ClusterChildId, update_id: impl Into<String>) -> Self {
        Self {
            cluster: parent.cluster.clone(),
            scope: UpdateScope::NodeGroup(parent.name.clone()),
            update_id: update_id.into(),
        }
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            UpdateScope::Cluster => write!(f, "{}:{}", self.cluster, self.update_id),
            UpdateScope::Addon(name) | UpdateScope::NodeGroup(name) => {
                write!(f, "{}:{}:{}", self.cluster, name, self.update_id)
            }
        }
    }
}
