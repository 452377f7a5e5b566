//! User synchronization, grant correlation and account creation.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use xavyo_connector::account::{ArgumentBag, CreatedAccount, PlaintextData};
use xavyo_connector::annotations::{Annotated, Annotations};
use xavyo_connector::error::{ConnectorError, ConnectorResult};
use xavyo_connector::pagination::{Page, PageToken};
use xavyo_connector::resource::{Entitlement, Grant, Resource, ResourceId, ResourceType};
use xavyo_connector::traits::{AccountManager, ResourceSyncer};

use crate::client::DirectoryClient;
use crate::config::MAX_PAGE_SIZE;
use crate::credentials::CredentialGenerator;
use crate::error::backend_error;
use crate::groups::{group_entitlement, GroupPermission};
use crate::models::{CreateUserRequest, MembershipListing, PageOptions};
use crate::resources::{
    map_user, parse_backend_id, GROUP_RESOURCE_TYPE_ID, USER_RESOURCE_TYPE, USER_RESOURCE_TYPE_ID,
};

/// Profile keys accepted by account creation.
pub const PROFILE_FIELDS: [&str; 3] = ["email", "first_name", "last_name"];

/// Name of the credential artifact returned on account creation.
pub const PASSWORD_ARTIFACT: &str = "password";

/// Grants held by the user `user_id`, one per membership row whose user id
/// matches. `principal` is the resource the grants are issued to.
///
/// Rows are matched on their own `user_id`; the bucket key is ignored. The
/// listing carries no group names, so group references are named by id.
#[must_use]
pub fn grants_for_principal(
    listing: &MembershipListing,
    user_id: i64,
    principal: &Resource,
) -> Vec<Grant> {
    listing
        .values()
        .flatten()
        .filter(|m| m.user_id == user_id)
        .map(|m| {
            let group_id = m.group_id.to_string();
            let group = Resource::reference(
                ResourceId::new(GROUP_RESOURCE_TYPE_ID, group_id.clone()),
                group_id,
            );
            let entitlement = group_entitlement(&group, GroupPermission::of_membership(m));
            Grant::new(entitlement, principal.clone())
        })
        .collect()
}

/// Typed account-creation request from a profile bag.
///
/// `email` is checked first so a missing email is always reported as such.
pub fn parse_account_profile(
    profile: &ArgumentBag,
) -> ConnectorResult<(String, Option<String>, Option<String>)> {
    let email = profile.required_field("email")?;
    if let Some(unknown) = profile.keys().find(|k| !PROFILE_FIELDS.contains(k)) {
        return Err(ConnectorError::invalid_argument(format!(
            "unsupported profile field {unknown:?}"
        )));
    }
    Ok((
        email,
        profile.get_str("first_name"),
        profile.get_str("last_name"),
    ))
}

/// Syncer for Metabase users.
pub struct UserSyncer {
    client: Arc<dyn DirectoryClient>,
    credentials: Arc<dyn CredentialGenerator>,
    page_size: u32,
}

impl UserSyncer {
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        credentials: Arc<dyn CredentialGenerator>,
        page_size: u32,
    ) -> Self {
        Self {
            client,
            credentials,
            page_size,
        }
    }

    async fn list_users(
        &self,
        page: &PageToken,
        annotations: &mut Annotations,
    ) -> ConnectorResult<Page<Resource>> {
        let page_size = match page.size {
            0 => self.page_size,
            size if size > MAX_PAGE_SIZE => {
                return Err(ConnectorError::invalid_argument(format!(
                    "page size {size} exceeds the maximum of {MAX_PAGE_SIZE}"
                )))
            }
            size => size,
        };
        let options = PageOptions {
            page_size,
            page_token: page.token.clone(),
        };

        let users = self
            .client
            .list_users(&options)
            .await
            .absorb(annotations)
            .map_err(|e| backend_error("failed to list users", e))?;

        let resources = users
            .users
            .iter()
            .map(map_user)
            .collect::<ConnectorResult<Vec<_>>>()?;
        debug!(
            count = resources.len(),
            next_page_token = %users.next_page_token,
            "Listed users"
        );
        Ok(Page::with_next(resources, users.next_page_token))
    }

    async fn list_grants(
        &self,
        principal: &Resource,
        annotations: &mut Annotations,
    ) -> ConnectorResult<Page<Grant>> {
        let user_id = parse_backend_id(USER_RESOURCE_TYPE_ID, &principal.id.resource)?;
        let listing = self
            .client
            .list_memberships()
            .await
            .absorb(annotations)
            .map_err(|e| backend_error("failed to list memberships", e))?;

        let grants = grants_for_principal(&listing, user_id, principal);
        debug!(count = grants.len(), "Correlated grants");
        Ok(Page::last(grants))
    }

    async fn create_user(
        &self,
        profile: &ArgumentBag,
        annotations: &mut Annotations,
    ) -> ConnectorResult<CreatedAccount> {
        let (email, first_name, last_name) = parse_account_profile(profile)?;
        let password = self.credentials.generate()?;

        let request = CreateUserRequest {
            email,
            first_name,
            last_name,
            password: SecretString::from(password.expose_secret().to_string()),
        };
        let user = self
            .client
            .create_user(&request)
            .await
            .absorb(annotations)
            .map_err(|e| backend_error(format!("failed to create user {}", request.email), e))?;

        let resource = map_user(&user)?;
        info!(user = %resource.id, "Created Metabase account");
        Ok(CreatedAccount {
            resource,
            plaintexts: vec![PlaintextData::new(
                PASSWORD_ARTIFACT,
                "Initial password for the new Metabase account",
                password,
            )],
        })
    }
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn resource_type(&self) -> &ResourceType {
        &USER_RESOURCE_TYPE
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        _parent: Option<&ResourceId>,
        page: &PageToken,
    ) -> Annotated<Page<Resource>> {
        let mut annotations = Annotations::new();
        let result = self.list_users(page, &mut annotations).await;
        Annotated::new(result, annotations)
    }

    /// Users offer nothing grantable.
    async fn entitlements(
        &self,
        _user: &Resource,
        _page: &PageToken,
    ) -> Annotated<Page<Entitlement>> {
        Annotated::ok(Page::empty())
    }

    #[instrument(skip(self, user), fields(principal = %user.id))]
    async fn grants(&self, user: &Resource, _page: &PageToken) -> Annotated<Page<Grant>> {
        let mut annotations = Annotations::new();
        let result = self.list_grants(user, &mut annotations).await;
        Annotated::new(result, annotations)
    }
}

#[async_trait]
impl AccountManager for UserSyncer {
    #[instrument(skip(self, profile))]
    async fn create_account(&self, profile: &ArgumentBag) -> Annotated<CreatedAccount> {
        let mut annotations = Annotations::new();
        let result = self.create_user(profile, &mut annotations).await;
        Annotated::new(result, annotations)
    }
}
