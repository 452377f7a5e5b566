//! Directory client contract.
//!
//! The engine depends only on [`DirectoryClient`]; [`MetabaseClient`] is the
//! HTTP implementation and tests substitute their own.
//!
//! [`MetabaseClient`]: crate::MetabaseClient

use async_trait::async_trait;
use xavyo_connector::annotations::{Annotations, RateLimitDescription};

use crate::models::{
    CreateUserRequest, Group, MembershipListing, MembershipRequest, PageOptions, User, UserPage,
    VersionInfo,
};
use crate::{MetabaseError, MetabaseResult};

/// Outcome of one backend call: a result plus an optional rate-limit signal.
///
/// The signal may accompany a failure as well as a success.
#[derive(Debug)]
pub struct ClientResponse<T> {
    pub result: MetabaseResult<T>,
    pub rate_limit: Option<RateLimitDescription>,
}

impl<T> ClientResponse<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            rate_limit: None,
        }
    }

    pub fn err(error: MetabaseError) -> Self {
        Self {
            result: Err(error),
            rate_limit: None,
        }
    }

    /// Attach a rate-limit signal.
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitDescription) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Move the rate-limit signal into `annotations` and yield the result.
    ///
    /// The signal is recorded whether or not the call failed.
    pub fn absorb(self, annotations: &mut Annotations) -> MetabaseResult<T> {
        annotations.maybe_rate_limiting(self.rate_limit);
        self.result
    }
}

/// Capabilities the engine needs from the directory backend.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// One page of users.
    async fn list_users(&self, options: &PageOptions) -> ClientResponse<UserPage>;

    /// All permission groups.
    async fn list_groups(&self) -> ClientResponse<Vec<Group>>;

    /// Every membership row, bucketed by the backend.
    async fn list_memberships(&self) -> ClientResponse<MembershipListing>;

    /// Create one membership row.
    async fn add_user_to_group(&self, request: &MembershipRequest) -> ClientResponse<()>;

    /// Delete a membership row by its id.
    async fn remove_user_from_group(&self, membership_id: i64) -> ClientResponse<()>;

    /// Set a user's active flag in a single request.
    ///
    /// The updated user is returned when the backend answers with one.
    async fn update_user_active_status(
        &self,
        user_id: i64,
        active: bool,
    ) -> ClientResponse<Option<User>>;

    /// Create a user.
    async fn create_user(&self, request: &CreateUserRequest) -> ClientResponse<User>;

    /// Whether the instance runs a paid plan. Read on every call, never cached
    /// by the engine.
    fn is_paid_plan(&self) -> bool;

    /// Instance version.
    async fn get_version(&self) -> ClientResponse<VersionInfo>;
}
