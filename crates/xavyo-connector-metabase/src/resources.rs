//! Resource mapping for Metabase users and groups.

use serde_json::{Map, Value};
use std::sync::LazyLock;
use xavyo_connector::error::{ConnectorError, ConnectorResult};
use xavyo_connector::resource::{
    Resource, ResourceId, ResourceTrait, ResourceTraits, ResourceType, UserStatus,
};

use crate::models::{Group, User};

pub const USER_RESOURCE_TYPE_ID: &str = "user";
pub const GROUP_RESOURCE_TYPE_ID: &str = "group";

/// The `user` resource type.
pub static USER_RESOURCE_TYPE: LazyLock<ResourceType> =
    LazyLock::new(|| ResourceType::new(USER_RESOURCE_TYPE_ID, "User", vec![ResourceTrait::User]));

/// The `group` resource type.
pub static GROUP_RESOURCE_TYPE: LazyLock<ResourceType> = LazyLock::new(|| {
    ResourceType::new(GROUP_RESOURCE_TYPE_ID, "Group", vec![ResourceTrait::Group])
});

/// Parse a resource's external id as the numeric id Metabase requires.
pub fn parse_backend_id(resource_type: &str, id: &str) -> ConnectorResult<i64> {
    id.parse::<i64>()
        .map_err(|e| ConnectorError::invalid_resource_id(resource_type, id, e))
}

fn external_id(resource_type: &str, id: i64) -> ConnectorResult<String> {
    if id <= 0 {
        return Err(ConnectorError::invalid_resource_id(
            resource_type,
            id.to_string(),
            "backend returned no id",
        ));
    }
    Ok(id.to_string())
}

/// `first last`, trimmed; falls back to the email when both are blank.
fn user_display_name(user: &User) -> String {
    let name = format!(
        "{} {}",
        user.first_name.as_deref().unwrap_or_default(),
        user.last_name.as_deref().unwrap_or_default()
    );
    let name = name.trim();
    if name.is_empty() {
        user.email.clone()
    } else {
        name.to_string()
    }
}

/// Map a Metabase user to a `user` resource.
pub fn map_user(user: &User) -> ConnectorResult<Resource> {
    let id = external_id(USER_RESOURCE_TYPE_ID, user.id)?;

    let mut profile = Map::new();
    profile.insert("email".into(), Value::from(user.email.clone()));
    profile.insert(
        "first_name".into(),
        Value::from(user.first_name.clone().unwrap_or_default()),
    );
    profile.insert(
        "last_name".into(),
        Value::from(user.last_name.clone().unwrap_or_default()),
    );
    profile.insert("is_active".into(), Value::from(user.is_active));

    let email = (!user.email.is_empty()).then(|| user.email.clone());
    Ok(
        Resource::reference(ResourceId::new(USER_RESOURCE_TYPE_ID, id), user_display_name(user))
            .with_traits(ResourceTraits::User {
                login: email.clone(),
                email,
                status: UserStatus::from_active(user.is_active),
                profile,
            }),
    )
}

/// Map a Metabase group to a `group` resource.
pub fn map_group(group: &Group) -> ConnectorResult<Resource> {
    let id = external_id(GROUP_RESOURCE_TYPE_ID, group.id)?;

    let mut profile = Map::new();
    profile.insert("name".into(), Value::from(group.name.clone()));
    profile.insert("member_count".into(), Value::from(group.member_count));

    Ok(
        Resource::reference(ResourceId::new(GROUP_RESOURCE_TYPE_ID, id), group.name.clone())
            .with_traits(ResourceTraits::Group { profile }),
    )
}
