//! Group synchronization and membership provisioning.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use xavyo_connector::annotations::{Annotated, Annotations};
use xavyo_connector::error::{ConnectorError, ConnectorResult};
use xavyo_connector::pagination::{Page, PageToken};
use xavyo_connector::resource::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use xavyo_connector::traits::{GrantProvisioner, ResourceSyncer};

use crate::client::DirectoryClient;
use crate::error::backend_error;
use crate::models::{Membership, MembershipListing, MembershipRequest};
use crate::resources::{
    map_group, parse_backend_id, GROUP_RESOURCE_TYPE, GROUP_RESOURCE_TYPE_ID, USER_RESOURCE_TYPE,
    USER_RESOURCE_TYPE_ID,
};

pub const MEMBER_PERMISSION: &str = "member";
pub const MANAGER_PERMISSION: &str = "manager";

/// Kind of group membership an entitlement stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPermission {
    Member,
    /// Only offered on paid plans.
    Manager,
}

impl GroupPermission {
    /// Slug used in entitlement ids.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            GroupPermission::Member => MEMBER_PERMISSION,
            GroupPermission::Manager => MANAGER_PERMISSION,
        }
    }

    /// Human label used in entitlement names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GroupPermission::Member => "Member",
            GroupPermission::Manager => "Manager",
        }
    }

    #[must_use]
    pub fn is_manager(self) -> bool {
        self == GroupPermission::Manager
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            MEMBER_PERMISSION => Some(GroupPermission::Member),
            MANAGER_PERMISSION => Some(GroupPermission::Manager),
            _ => None,
        }
    }

    /// Kind of a membership row.
    #[must_use]
    pub fn of_membership(membership: &Membership) -> Self {
        if membership.is_group_manager {
            GroupPermission::Manager
        } else {
            GroupPermission::Member
        }
    }

    /// Recover the permission kind from an entitlement.
    ///
    /// The structured slug is used when present; otherwise the id must end in
    /// `:member`/`:manager` or be the bare kind.
    pub fn from_entitlement(entitlement: &Entitlement) -> ConnectorResult<Self> {
        let kind = if entitlement.slug.is_empty() {
            let id = entitlement.id.as_str();
            [GroupPermission::Manager, GroupPermission::Member]
                .into_iter()
                .find(|p| {
                    id == p.slug()
                        || id
                            .strip_suffix(p.slug())
                            .is_some_and(|rest| rest.ends_with(':'))
                })
        } else {
            Self::from_slug(&entitlement.slug)
        };
        kind.ok_or_else(|| ConnectorError::unsupported_entitlement(&entitlement.id))
    }
}

/// Entitlement for one permission kind on a group resource.
#[must_use]
pub fn group_entitlement(group: &Resource, permission: GroupPermission) -> Entitlement {
    Entitlement::assignment(group, permission.slug())
        .with_display_name(format!("{} {}", group.display_name, permission.label()))
        .with_description(format!(
            "Is a {} of {} group in Metabase",
            permission.label(),
            group.display_name
        ))
        .with_grantable_to(&USER_RESOURCE_TYPE)
}

/// Entitlements a group offers: always `member`, plus `manager` on paid plans.
#[must_use]
pub fn derive_entitlements(group: &Resource, paid_plan: bool) -> Vec<Entitlement> {
    let mut entitlements = vec![group_entitlement(group, GroupPermission::Member)];
    if paid_plan {
        entitlements.push(group_entitlement(group, GroupPermission::Manager));
    }
    entitlements
}

/// First membership row matching `(group_id, user_id)`, scanning every bucket.
#[must_use]
pub fn find_membership(
    listing: &MembershipListing,
    group_id: i64,
    user_id: i64,
) -> Option<&Membership> {
    listing
        .values()
        .flatten()
        .find(|m| m.group_id == group_id && m.user_id == user_id)
}

/// Syncer for Metabase permission groups.
pub struct GroupSyncer {
    client: Arc<dyn DirectoryClient>,
}

impl GroupSyncer {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self { client }
    }

    async fn list_groups(&self, annotations: &mut Annotations) -> ConnectorResult<Page<Resource>> {
        let groups = self
            .client
            .list_groups()
            .await
            .absorb(annotations)
            .map_err(|e| backend_error("failed to list groups", e))?;

        let resources = groups
            .iter()
            .map(map_group)
            .collect::<ConnectorResult<Vec<_>>>()?;
        debug!(count = resources.len(), "Listed groups");
        Ok(Page::last(resources))
    }

    async fn add_membership(
        &self,
        principal: &Resource,
        entitlement: &Entitlement,
        annotations: &mut Annotations,
    ) -> ConnectorResult<()> {
        let group_id = parse_backend_id(GROUP_RESOURCE_TYPE_ID, &entitlement.resource.id.resource)?;
        let user_id = parse_backend_id(USER_RESOURCE_TYPE_ID, &principal.id.resource)?;
        let permission = GroupPermission::from_entitlement(entitlement)?;

        let request = MembershipRequest {
            group_id,
            user_id,
            is_group_manager: permission.is_manager(),
        };
        self.client
            .add_user_to_group(&request)
            .await
            .absorb(annotations)
            .map_err(|e| {
                backend_error(
                    format!("failed to grant user {user_id} to group {group_id}"),
                    e,
                )
            })?;

        info!(group_id, user_id, permission = permission.slug(), "Granted group membership");
        Ok(())
    }

    async fn remove_membership(
        &self,
        grant: &Grant,
        annotations: &mut Annotations,
    ) -> ConnectorResult<()> {
        let group_id =
            parse_backend_id(GROUP_RESOURCE_TYPE_ID, &grant.entitlement.resource.id.resource)?;
        let user_id = parse_backend_id(USER_RESOURCE_TYPE_ID, &grant.principal.id.resource)?;

        let listing = self
            .client
            .list_memberships()
            .await
            .absorb(annotations)
            .map_err(|e| backend_error("failed to list memberships", e))?;

        let Some(membership) = find_membership(&listing, group_id, user_id) else {
            debug!(group_id, user_id, "No membership to revoke");
            return Ok(());
        };

        self.client
            .remove_user_from_group(membership.membership_id)
            .await
            .absorb(annotations)
            .map_err(|e| {
                backend_error(
                    format!("failed to revoke user {user_id} from group {group_id}"),
                    e,
                )
            })?;

        info!(
            group_id,
            user_id,
            membership_id = membership.membership_id,
            "Revoked group membership"
        );
        Ok(())
    }
}

#[async_trait]
impl ResourceSyncer for GroupSyncer {
    fn resource_type(&self) -> &ResourceType {
        &GROUP_RESOURCE_TYPE
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        _parent: Option<&ResourceId>,
        _page: &PageToken,
    ) -> Annotated<Page<Resource>> {
        let mut annotations = Annotations::new();
        let result = self.list_groups(&mut annotations).await;
        Annotated::new(result, annotations)
    }

    #[instrument(skip(self, group), fields(resource = %group.id))]
    async fn entitlements(
        &self,
        group: &Resource,
        _page: &PageToken,
    ) -> Annotated<Page<Entitlement>> {
        Annotated::ok(Page::last(derive_entitlements(
            group,
            self.client.is_paid_plan(),
        )))
    }

    /// Always empty: membership grants are emitted from the user side only.
    async fn grants(&self, _group: &Resource, _page: &PageToken) -> Annotated<Page<Grant>> {
        Annotated::ok(Page::empty())
    }
}

#[async_trait]
impl GrantProvisioner for GroupSyncer {
    #[instrument(
        skip(self, principal, entitlement),
        fields(principal = %principal.id, entitlement = %entitlement.id)
    )]
    async fn grant(&self, principal: &Resource, entitlement: &Entitlement) -> Annotated<()> {
        let mut annotations = Annotations::new();
        let result = self
            .add_membership(principal, entitlement, &mut annotations)
            .await;
        Annotated::new(result, annotations)
    }

    #[instrument(skip(self, grant), fields(grant = %grant.id))]
    async fn revoke(&self, grant: &Grant) -> Annotated<()> {
        let mut annotations = Annotations::new();
        let result = self.remove_membership(grant, &mut annotations).await;
        Annotated::new(result, annotations)
    }
}
