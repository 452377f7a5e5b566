//! Metabase API payloads.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// A Metabase user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Metabase user id. Zero means the backend omitted it.
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A Metabase permission group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub member_count: i64,
}

/// One user-in-group row. `membership_id` is the only handle for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub membership_id: i64,
    pub group_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub is_group_manager: bool,
}

/// Full membership listing as Metabase groups it.
///
/// The engine scans every bucket and never relies on the key. A `BTreeMap`
/// keeps the scan order stable across calls.
pub type MembershipListing = BTreeMap<String, Vec<Membership>>;

/// Body for creating a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MembershipRequest {
    pub group_id: i64,
    pub user_id: i64,
    pub is_group_manager: bool,
}

/// Body for creating a user.
#[derive(Debug, Serialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Paging input for user listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageOptions {
    pub page_size: u32,
    /// Opaque cursor; empty starts from the beginning.
    pub page_token: String,
}

/// One page of users plus the cursor for the next page (empty when done).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPage {
    pub users: Vec<User>,
    pub next_page_token: String,
}

/// Envelope Metabase wraps paged user listings in.
#[derive(Debug, Deserialize)]
pub(crate) struct UserListResponse {
    #[serde(default)]
    pub data: Vec<User>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Instance version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VersionInfo {
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl VersionInfo {
    /// Metabase tags Enterprise (paid) builds `v1.x` and open-source builds `v0.x`.
    #[must_use]
    pub fn is_paid_plan(&self) -> bool {
        self.tag.starts_with("v1.")
    }
}

/// `GET /api/session/properties` subset.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionProperties {
    #[serde(default)]
    pub version: VersionInfo,
}
