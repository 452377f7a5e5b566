//! Normalized resource graph.
//!
//! Directory entities become [`Resource`]s, grantable permissions on them
//! become [`Entitlement`]s, and realized principal/entitlement edges become
//! [`Grant`]s. All values are snapshots; nothing here holds backend state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trait a resource type exhibits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTrait {
    /// A person that can be granted entitlements.
    User,
    /// A collection of principals.
    Group,
}

/// Describes a kind of resource the connector syncs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    /// Stable type id (e.g. `user`).
    pub id: String,
    /// Human readable name.
    pub display_name: String,
    /// Traits of the type.
    pub traits: Vec<ResourceTrait>,
}

impl ResourceType {
    /// Create a resource type.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        traits: Vec<ResourceTrait>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            traits,
        }
    }
}

/// Stable identifier of a resource: its type plus the backend's external id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    /// Resource type id.
    pub resource_type: String,
    /// External id in the backend.
    pub resource: String,
}

impl ResourceId {
    /// Create a resource id.
    pub fn new(resource_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.resource)
    }
}

/// Account status of a user resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Enabled,
    Disabled,
}

impl UserStatus {
    /// Status from an active flag.
    #[must_use]
    pub fn from_active(active: bool) -> Self {
        if active {
            UserStatus::Enabled
        } else {
            UserStatus::Disabled
        }
    }
}

/// Trait-specific data carried by a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceTraits {
    User {
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        login: Option<String>,
        status: UserStatus,
        profile: serde_json::Map<String, serde_json::Value>,
    },
    Group {
        profile: serde_json::Map<String, serde_json::Value>,
    },
}

impl ResourceTraits {
    /// Secondary attributes of the resource.
    #[must_use]
    pub fn profile(&self) -> &serde_json::Map<String, serde_json::Value> {
        match self {
            ResourceTraits::User { profile, .. } | ResourceTraits::Group { profile } => profile,
        }
    }
}

/// A normalized directory entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<ResourceTraits>,
}

impl Resource {
    /// Create a bare resource reference with no traits.
    pub fn reference(id: ResourceId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            traits: None,
        }
    }

    /// Attach trait data.
    #[must_use]
    pub fn with_traits(mut self, traits: ResourceTraits) -> Self {
        self.traits = Some(traits);
        self
    }

    /// Profile attribute lookup.
    #[must_use]
    pub fn profile_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.traits.as_ref().and_then(|t| t.profile().get(key))
    }
}

/// Purpose of an entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementPurpose {
    /// Assignment to the resource (e.g. group membership).
    #[default]
    Assignment,
    /// A permission on the resource.
    Permission,
}

/// A grantable permission tied to a resource.
///
/// `slug` carries the permission kind as a structured field; `id` keeps the
/// `<resource-type>:<resource-id>:<slug>` external format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub resource: Resource,
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub purpose: EntitlementPurpose,
    /// Resource type ids that may receive this entitlement.
    pub grantable_to: Vec<String>,
}

impl Entitlement {
    /// Derive the external entitlement id for a resource and slug.
    #[must_use]
    pub fn id_for(resource: &ResourceId, slug: &str) -> String {
        format!("{}:{}:{}", resource.resource_type, resource.resource, slug)
    }

    /// Create an assignment entitlement on a resource.
    pub fn assignment(resource: &Resource, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: Self::id_for(&resource.id, &slug),
            resource: resource.clone(),
            display_name: slug.clone(),
            description: String::new(),
            slug,
            purpose: EntitlementPurpose::Assignment,
            grantable_to: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_grantable_to(mut self, resource_type: &ResourceType) -> Self {
        self.grantable_to.push(resource_type.id.clone());
        self
    }
}

/// A realized edge between a principal and an entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub entitlement: Entitlement,
    pub principal: Resource,
}

impl Grant {
    /// Create a grant; the id is `<entitlement-id>:<principal-id>`.
    pub fn new(entitlement: Entitlement, principal: Resource) -> Self {
        Self {
            id: format!("{}:{}", entitlement.id, principal.id),
            entitlement,
            principal,
        }
    }
}
