//! Metabase Connector for xavyo
//!
//! This crate implements the xavyo-connector traits for Metabase, syncing
//! users, permission groups and group memberships into the normalized
//! resource graph.
//!
//! # Features
//!
//! - Paged user sync and group sync
//! - Group `member` entitlements, plus `manager` on paid (Enterprise) plans
//! - Membership grants correlated from the user side
//! - Grant/revoke group membership
//! - Account creation with a generated initial password
//! - Enable/disable user actions
//! - Rate-limit annotations on every outcome, successful or not
//!
//! # Example
//!
//! ```no_run
//! use xavyo_connector::prelude::*;
//! use xavyo_connector_metabase::{MetabaseConfig, MetabaseConnector, MetabaseCredentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MetabaseConfig::builder()
//!     .base_url("https://metabase.example.com")
//!     .build()?;
//!
//! let connector = MetabaseConnector::new(config, MetabaseCredentials::new("mb_api_key"))?;
//! connector.validate().await.result?;
//!
//! let page = connector.groups().list(None, &PageToken::first()).await.result?;
//! for group in page.items {
//!     println!("{}", group.display_name);
//! }
//! # Ok(())
//! # }
//! ```

mod actions;
mod client;
mod config;
mod connector;
mod credentials;
mod error;
mod groups;
mod http_client;
pub mod models;
pub mod rate_limit;
mod resources;
mod users;

// Re-exports
pub use actions::{
    action_schemas, UserStatusRequest, DISABLE_USER_ACTION, ENABLE_USER_ACTION, USER_ID_ARGUMENT,
};
pub use client::{ClientResponse, DirectoryClient};
pub use config::{MetabaseConfig, MetabaseConfigBuilder, MetabaseCredentials};
pub use connector::MetabaseConnector;
pub use credentials::{CredentialGenerator, RandomPasswordGenerator};
pub use error::{MetabaseError, MetabaseResult};
pub use groups::{
    derive_entitlements, find_membership, group_entitlement, GroupPermission, GroupSyncer,
    MANAGER_PERMISSION, MEMBER_PERMISSION,
};
pub use http_client::MetabaseClient;
pub use resources::{
    map_group, map_user, parse_backend_id, GROUP_RESOURCE_TYPE, GROUP_RESOURCE_TYPE_ID,
    USER_RESOURCE_TYPE, USER_RESOURCE_TYPE_ID,
};
pub use users::{
    grants_for_principal, parse_account_profile, UserSyncer, PASSWORD_ARTIFACT, PROFILE_FIELDS,
};
