//! Connector Framework traits
//!
//! Capability-based trait definitions the host sync runtime drives. Every
//! operation returns an [`Annotated`] outcome so rate-limit signals reach the
//! host whether the call succeeded or not.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::account::{ActionResponse, ActionSchema, ArgumentBag, CreatedAccount, FieldSchema};
use crate::annotations::Annotated;
use crate::pagination::{Page, PageToken};
use crate::resource::{Entitlement, Grant, Resource, ResourceId, ResourceType};

/// Descriptive metadata for a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub display_name: String,
    pub description: String,
    /// Fields accepted by account creation.
    pub account_creation_schema: Vec<FieldSchema>,
}

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Describe the connector.
    fn metadata(&self) -> ConnectorMetadata;

    /// Check that the backend is reachable and credentials work.
    async fn validate(&self) -> Annotated<()>;
}

/// Capability for syncing one resource type.
///
/// Each call processes exactly one page; page-walking belongs to the host.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    /// The resource type this syncer produces.
    fn resource_type(&self) -> &ResourceType;

    /// List resources of this type.
    async fn list(&self, parent: Option<&ResourceId>, page: &PageToken)
        -> Annotated<Page<Resource>>;

    /// List entitlements offered by a resource.
    async fn entitlements(&self, resource: &Resource, page: &PageToken)
        -> Annotated<Page<Entitlement>>;

    /// List grants related to a resource.
    async fn grants(&self, resource: &Resource, page: &PageToken) -> Annotated<Page<Grant>>;
}

/// Capability for mutating grants on the resources a syncer owns.
#[async_trait]
pub trait GrantProvisioner: ResourceSyncer {
    /// Give `principal` the entitlement.
    async fn grant(&self, principal: &Resource, entitlement: &Entitlement) -> Annotated<()>;

    /// Remove a grant. Revoking a grant that no longer exists succeeds.
    async fn revoke(&self, grant: &Grant) -> Annotated<()>;
}

/// Capability for provisioning new accounts.
#[async_trait]
pub trait AccountManager: ResourceSyncer {
    /// Create an account from a profile argument bag.
    ///
    /// On success returns the new resource and the plaintext credentials to
    /// deliver once.
    async fn create_account(&self, profile: &ArgumentBag) -> Annotated<CreatedAccount>;
}

/// Capability for running named actions with argument bags.
#[async_trait]
pub trait ActionManager: Send + Sync {
    /// Actions the connector supports.
    fn action_schemas(&self) -> Vec<ActionSchema>;

    /// Run an action by name.
    async fn invoke_action(&self, name: &str, args: &ArgumentBag) -> Annotated<ActionResponse>;
}
