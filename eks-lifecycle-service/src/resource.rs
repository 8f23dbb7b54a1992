//! Resource kinds addressable by ID alone

use std::fmt;

use eks_lifecycle_core::{CancellationToken, KeyError, KeyFormat, KeyResult};

use crate::commands::service::Target;
use crate::commands::LifecycleService;
use crate::error::{LifecycleError, LifecycleResult, Operation};
use crate::ids::{
    AccessEntryId, AccessPolicyAssociationId, ClusterChildId, UpdateId, UpdateScope,
    ACCESS_ENTRY_ID, ACCESS_POLICY_ASSOCIATION_ID, ADDON_ID, ADDON_UPDATE_ID, CAPABILITY_ID,
    CLUSTER_ID, CLUSTER_UPDATE_ID, FARGATE_PROFILE_ID, IDENTITY_PROVIDER_CONFIG_ID, NODE_GROUP_ID,
    NODE_GROUP_UPDATE_ID,
};
use crate::probers::{
    AddonProber, CapabilityProber, ClusterProber, FargateProfileProber,
    IdentityProviderConfigProber, NodeGroupProber, Snapshot,
};
use crate::waiters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Cluster,
    Addon,
    Capability,
    NodeGroup,
    FargateProfile,
    IdentityProviderConfig,
    AccessEntry,
    AccessPolicyAssociation,
}

/// The state change a wait observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }

    fn operation(self) -> Operation {
        match self {
            Self::Created => Operation::Create,
            Self::Updated => Operation::Update,
            Self::Deleted => Operation::Delete,
        }
    }
}

/// A parsed identifier of one resource or in-flight update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Cluster(String),
    Addon(ClusterChildId),
    Capability(ClusterChildId),
    NodeGroup(ClusterChildId),
    FargateProfile(ClusterChildId),
    IdentityProviderConfig(ClusterChildId),
    AccessEntry(AccessEntryId),
    AccessPolicyAssociation(AccessPolicyAssociationId),
    Update(UpdateId),
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Cluster(_) => ResourceKind::Cluster,
            Self::Addon(_) => ResourceKind::Addon,
            Self::Capability(_) => ResourceKind::Capability,
            Self::NodeGroup(_) => ResourceKind::NodeGroup,
            Self::FargateProfile(_) => ResourceKind::FargateProfile,
            Self::IdentityProviderConfig(_) => ResourceKind::IdentityProviderConfig,
            Self::AccessEntry(_) => ResourceKind::AccessEntry,
            Self::AccessPolicyAssociation(_) => ResourceKind::AccessPolicyAssociation,
            Self::Update(update) => match update.scope {
                UpdateScope::Cluster => ResourceKind::Cluster,
                UpdateScope::Addon(_) => ResourceKind::Addon,
                UpdateScope::NodeGroup(_) => ResourceKind::NodeGroup,
            },
        }
    }

    fn unsupported(&self, transition: Transition) -> LifecycleError {
        LifecycleError::Unsupported {
            kind: self.kind().display_name(),
            transition: transition.as_str(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster(name) => f.write_str(name),
            Self::Addon(id)
            | Self::Capability(id)
            | Self::NodeGroup(id)
            | Self::FargateProfile(id)
            | Self::IdentityProviderConfig(id) => write!(f, "{id}"),
            Self::AccessEntry(id) => write!(f, "{id}"),
            Self::AccessPolicyAssociation(id) => write!(f, "{id}"),
            Self::Update(id) => write!(f, "{id}"),
        }
    }
}

impl ResourceKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cluster => crate::commands::cluster::KIND,
            Self::Addon => crate::commands::addon::KIND,
            Self::Capability => crate::commands::capability::KIND,
            Self::NodeGroup => crate::commands::node_group::KIND,
            Self::FargateProfile => crate::commands::fargate_profile::KIND,
            Self::IdentityProviderConfig => crate::commands::identity_provider::KIND,
            Self::AccessEntry => crate::commands::access::ENTRY_KIND,
            Self::AccessPolicyAssociation => crate::commands::access::ASSOCIATION_KIND,
        }
    }

    /// ID format for waiting on `transition`, if this kind supports it.
    pub fn id_format(self, transition: Transition) -> Option<KeyFormat> {
        match (self, transition) {
            (Self::Cluster, Transition::Updated) => Some(CLUSTER_UPDATE_ID),
            (Self::Addon, Transition::Updated) => Some(ADDON_UPDATE_ID),
            (Self::NodeGroup, Transition::Updated) => Some(NODE_GROUP_UPDATE_ID),
            (_, Transition::Updated) => None,
            (Self::Cluster, _) => Some(CLUSTER_ID),
            (Self::Addon, _) => Some(ADDON_ID),
            (Self::Capability, _) => Some(CAPABILITY_ID),
            (Self::NodeGroup, _) => Some(NODE_GROUP_ID),
            (Self::FargateProfile, _) => Some(FARGATE_PROFILE_ID),
            (Self::IdentityProviderConfig, _) => Some(IDENTITY_PROVIDER_CONFIG_ID),
            (Self::AccessEntry, _) => Some(ACCESS_ENTRY_ID),
            (Self::AccessPolicyAssociation, _) => Some(ACCESS_POLICY_ASSOCIATION_ID),
        }
    }

    /// Parse `id` as the subject of `transition`. Never touches the network.
    pub fn parse(self, id: &str, transition: Transition) -> LifecycleResult<ResourceRef> {
        let format = self
            .id_format(transition)
            .ok_or(LifecycleError::Unsupported {
                kind: self.display_name(),
                transition: transition.as_str(),
            })?;
        self.decode(&format, id, transition)
            .map_err(|source| LifecycleError::InvalidId {
                kind: self.display_name(),
                source,
            })
    }

    fn decode(self, format: &KeyFormat, id: &str, transition: Transition) -> KeyResult<ResourceRef> {
        if transition == Transition::Updated {
            let mut parts = format.decode(id)?;
            let update_id = parts.pop().unwrap_or_default();
            let update = match (self, parts.as_slice()) {
                (Self::Cluster, [cluster]) => UpdateId::cluster(cluster.clone(), update_id),
                (Self::Addon, [cluster, name]) => {
                    UpdateId::addon(&ClusterChildId::new(cluster.clone(), name.clone()), update_id)
                }
                (Self::NodeGroup, [cluster, name]) => UpdateId::node_group(
                    &ClusterChildId::new(cluster.clone(), name.clone()),
                    update_id,
                ),
                _ => {
                    return Err(KeyError::Malformed {
                        id: id.to_string(),
                        expected: format.to_string(),
                    })
                }
            };
            return Ok(ResourceRef::Update(update));
        }

        Ok(match self {
            Self::Cluster => {
                let [name] = format.decode_array(id)?;
                ResourceRef::Cluster(name)
            }
            Self::Addon => ResourceRef::Addon(ClusterChildId::parse(format, id)?),
            Self::Capability => ResourceRef::Capability(ClusterChildId::parse(format, id)?),
            Self::NodeGroup => ResourceRef::NodeGroup(ClusterChildId::parse(format, id)?),
            Self::FargateProfile => {
                ResourceRef::FargateProfile(ClusterChildId::parse(format, id)?)
            }
            Self::IdentityProviderConfig => {
                ResourceRef::IdentityProviderConfig(ClusterChildId::parse(format, id)?)
            }
            Self::AccessEntry => ResourceRef::AccessEntry(AccessEntryId::parse(id)?),
            Self::AccessPolicyAssociation => {
                ResourceRef::AccessPolicyAssociation(AccessPolicyAssociationId::parse(id)?)
            }
        })
    }
}

impl LifecycleService {
    /// Wait for an existing resource to reach the end of `transition`, without
    /// mutating it.
    ///
    /// Returns the final snapshot, or `None` when the resource is gone.
    pub async fn wait_for(
        &self,
        resource: &ResourceRef,
        transition: Transition,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Option<Snapshot>> {
        let kind = resource.kind().display_name();
        let target = Target::new(kind, resource, transition.operation());
        let client = || self.client.clone();
        let config = &self.config;

        let snapshot = match (resource, transition) {
            (ResourceRef::Cluster(name), Transition::Created | Transition::Deleted) => {
                let spec = if transition == Transition::Created {
                    waiters::cluster_created(config)
                } else {
                    waiters::cluster_deleted(config)
                };
                let prober = ClusterProber::new(client());
                self.await_state(&target, &spec, &prober, name.as_str(), cancel)
                    .await?
                    .map(Snapshot::from)
            }
            (ResourceRef::Addon(id), Transition::Created | Transition::Deleted) => {
                let spec = if transition == Transition::Created {
                    waiters::addon_created(config)
                } else {
                    waiters::addon_deleted(config)
                };
                let prober = AddonProber::new(client());
                self.await_state(&target, &spec, &prober, id, cancel)
                    .await?
                    .map(Snapshot::from)
            }
            (ResourceRef::Capability(id), Transition::Created | Transition::Deleted) => {
                let spec = if transition == Transition::Created {
                    waiters::capability_created(config)
                } else {
                    waiters::capability_deleted(config)
                };
                let prober = CapabilityProber::new(client());
                self.await_state(&target, &spec, &prober, id, cancel)
                    .await?
                    .map(Snapshot::from)
            }
            (ResourceRef::NodeGroup(id), Transition::Created | Transition::Deleted) => {
                let spec = if transition == Transition::Created {
                    waiters::node_group_created(config)
                } else {
                    waiters::node_group_deleted(config)
                };
                let prober = NodeGroupProber::new(client());
                self.await_state(&target, &spec, &prober, id, cancel)
                    .await?
                    .map(Snapshot::from)
            }
            (ResourceRef::FargateProfile(id), Transition::Created | Transition::Deleted) => {
                let spec = if transition == Transition::Created {
                    waiters::fargate_profile_created(config)
                } else {
                    waiters::fargate_profile_deleted(config)
                };
                let prober = FargateProfileProber::new(client());
                self.await_state(&target, &spec, &prober, id, cancel)
                    .await?
                    .map(Snapshot::from)
            }
            (
                ResourceRef::IdentityProviderConfig(id),
                Transition::Created | Transition::Deleted,
            ) => {
                let spec = if transition == Transition::Created {
                    waiters::identity_provider_config_created(config)
                } else {
                    waiters::identity_provider_config_deleted(config)
                };
                let prober = IdentityProviderConfigProber::new(client());
                self.await_state(&target, &spec, &prober, id, cancel)
                    .await?
                    .map(Snapshot::from)
            }
            (ResourceRef::Update(id), Transition::Updated) => {
                Some(self.await_update(&target, id, cancel).await?.into())
            }
            _ => return Err(resource.unsupported(transition)),
        };
        Ok(snapshot)
    }

    /// Delete any resource by reference, waiting where its kind has a
    /// deletion wait.
    pub async fn delete(
        &self,
        resource: &ResourceRef,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        match resource {
            ResourceRef::Cluster(name) => self.delete_cluster(name, cancel).await,
            ResourceRef::Addon(id) => {
                let request = self
                    .client
                    .delete_addon()
                    .cluster_name(&id.cluster)
                    .addon_name(&id.name);
                self.delete_addon(id, request, cancel).await
            }
            ResourceRef::Capability(id) => self.delete_capability(id, cancel).await,
            ResourceRef::NodeGroup(id) => self.delete_node_group(id, cancel).await,
            ResourceRef::FargateProfile(id) => self.delete_fargate_profile(id, cancel).await,
            ResourceRef::IdentityProviderConfig(id) => {
                self.disassociate_identity_provider_config(id, cancel).await
            }
            ResourceRef::AccessEntry(id) => self.delete_access_entry(id, cancel).await,
            ResourceRef::AccessPolicyAssociation(id) => {
                self.disassociate_access_policy(id, cancel).await
            }
            ResourceRef::Update(_) => Err(resource.unsupported(Transition::Deleted)),
        }
    }
}
