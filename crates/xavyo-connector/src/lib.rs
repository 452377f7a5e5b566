//! # Connector Framework
//!
//! Core abstractions for syncing identity and access data from external
//! directory services into xavyo.
//!
//! A connector exposes each directory entity kind through a
//! [`ResourceSyncer`](traits::ResourceSyncer), producing a normalized graph of
//! resources, entitlements and grants. Mutations (grant, revoke, account
//! lifecycle) go through capability traits layered on top.
//!
//! ## Architecture
//!
//! - [`Connector`](traits::Connector) - metadata and validation
//! - [`ResourceSyncer`](traits::ResourceSyncer) - list resources, entitlements, grants
//! - [`GrantProvisioner`](traits::GrantProvisioner) - grant / revoke
//! - [`AccountManager`](traits::AccountManager) - account creation
//! - [`ActionManager`](traits::ActionManager) - named actions with argument bags
//!
//! Every operation returns an [`Annotated`](annotations::Annotated) outcome:
//! a result plus annotations such as backend rate-limit signals, which are
//! reported regardless of success or failure.
//!
//! ## Example
//!
//! ```ignore
//! use xavyo_connector::prelude::*;
//!
//! let mut token = PageToken::first();
//! loop {
//!     let outcome = syncer.list(None, &token).await;
//!     if let Some(rl) = outcome.annotations.rate_limit() {
//!         back_off_until(rl.reset_at);
//!     }
//!     let page = outcome.result?;
//!     store(page.items);
//!     if !page.has_more() {
//!         break;
//!     }
//!     token = PageToken::resume(page.next_page_token);
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`resource`] - Resource graph types
//! - [`annotations`] - Rate-limit annotations and the annotated outcome
//! - [`pagination`] - Page tokens and pages
//! - [`account`] - Argument bags, action responses, credential artifacts
//! - [`error`] - Error types with validation/backend classification
//! - [`traits`] - Connector capability traits

pub mod account;
pub mod annotations;
pub mod error;
pub mod pagination;
pub mod resource;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use xavyo_connector::prelude::*;
/// ```
pub mod prelude {
    // Resource graph
    pub use crate::resource::{
        Entitlement, EntitlementPurpose, Grant, Resource, ResourceId, ResourceTrait,
        ResourceTraits, ResourceType, UserStatus,
    };

    // Annotations
    pub use crate::annotations::{
        Annotated, Annotation, Annotations, RateLimitDescription, RateLimitStatus,
    };

    // Pagination
    pub use crate::pagination::{Page, PageToken};

    // Accounts and actions
    pub use crate::account::{
        ActionResponse, ActionSchema, ArgumentBag, CreatedAccount, FieldSchema, PlaintextData,
    };

    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Traits
    pub use crate::traits::{
        AccountManager, ActionManager, Connector, ConnectorMetadata, GrantProvisioner,
        ResourceSyncer,
    };
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
