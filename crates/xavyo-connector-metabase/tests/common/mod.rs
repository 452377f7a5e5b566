//! Common test utilities for xavyo-connector-metabase integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use xavyo_connector::annotations::RateLimitDescription;
use xavyo_connector::error::ConnectorResult;
use xavyo_connector_metabase::models::{
    CreateUserRequest, Group, Membership, MembershipListing, MembershipRequest, PageOptions, User,
    UserPage, VersionInfo,
};
use xavyo_connector_metabase::{
    ClientResponse, CredentialGenerator, DirectoryClient, MetabaseConnector, MetabaseError,
};

type Handler<A, T> = Box<dyn Fn(&A) -> ClientResponse<T> + Send + Sync>;
type NoArgHandler<T> = Box<dyn Fn() -> ClientResponse<T> + Send + Sync>;
type StatusHandler = Box<dyn Fn(i64, bool) -> ClientResponse<Option<User>> + Send + Sync>;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListUsers(PageOptions),
    ListGroups,
    ListMemberships,
    AddUserToGroup(MembershipRequest),
    RemoveUserFromGroup(i64),
    UpdateUserActiveStatus { user_id: i64, active: bool },
    CreateUser { email: String, password: String },
    GetVersion,
}

/// Hand-rolled directory client double. Unconfigured calls fail with a 501.
#[derive(Default)]
pub struct MockDirectoryClient {
    list_users: Option<Handler<PageOptions, UserPage>>,
    list_groups: Option<NoArgHandler<Vec<Group>>>,
    list_memberships: Option<NoArgHandler<MembershipListing>>,
    add_user_to_group: Option<Handler<MembershipRequest, ()>>,
    remove_user_from_group: Option<Handler<i64, ()>>,
    update_user_active_status: Option<StatusHandler>,
    create_user: Option<Handler<CreateUserRequest, User>>,
    get_version: Option<NoArgHandler<VersionInfo>>,
    paid_plan: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

fn not_mocked<T>(operation: &str) -> ClientResponse<T> {
    ClientResponse::err(MetabaseError::Api {
        status: 501,
        message: format!("{operation} not mocked"),
    })
}

impl MockDirectoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_list_users(
        mut self,
        f: impl Fn(&PageOptions) -> ClientResponse<UserPage> + Send + Sync + 'static,
    ) -> Self {
        self.list_users = Some(Box::new(f));
        self
    }

    pub fn on_list_groups(
        mut self,
        f: impl Fn() -> ClientResponse<Vec<Group>> + Send + Sync + 'static,
    ) -> Self {
        self.list_groups = Some(Box::new(f));
        self
    }

    pub fn on_list_memberships(
        mut self,
        f: impl Fn() -> ClientResponse<MembershipListing> + Send + Sync + 'static,
    ) -> Self {
        self.list_memberships = Some(Box::new(f));
        self
    }

    pub fn on_add_user_to_group(
        mut self,
        f: impl Fn(&MembershipRequest) -> ClientResponse<()> + Send + Sync + 'static,
    ) -> Self {
        self.add_user_to_group = Some(Box::new(f));
        self
    }

    pub fn on_remove_user_from_group(
        mut self,
        f: impl Fn(&i64) -> ClientResponse<()> + Send + Sync + 'static,
    ) -> Self {
        self.remove_user_from_group = Some(Box::new(f));
        self
    }

    pub fn on_update_user_active_status(
        mut self,
        f: impl Fn(i64, bool) -> ClientResponse<Option<User>> + Send + Sync + 'static,
    ) -> Self {
        self.update_user_active_status = Some(Box::new(f));
        self
    }

    pub fn on_create_user(
        mut self,
        f: impl Fn(&CreateUserRequest) -> ClientResponse<User> + Send + Sync + 'static,
    ) -> Self {
        self.create_user = Some(Box::new(f));
        self
    }

    pub fn on_get_version(
        mut self,
        f: impl Fn() -> ClientResponse<VersionInfo> + Send + Sync + 'static,
    ) -> Self {
        self.get_version = Some(Box::new(f));
        self
    }

    pub fn with_paid_plan(self, paid: bool) -> Self {
        self.set_paid_plan(paid);
        self
    }

    pub fn set_paid_plan(&self, paid: bool) {
        self.paid_plan.store(paid, Ordering::SeqCst);
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DirectoryClient for MockDirectoryClient {
    async fn list_users(&self, options: &PageOptions) -> ClientResponse<UserPage> {
        self.record(Call::ListUsers(options.clone()));
        match &self.list_users {
            Some(f) => f(options),
            None => not_mocked("list_users"),
        }
    }

    async fn list_groups(&self) -> ClientResponse<Vec<Group>> {
        self.record(Call::ListGroups);
        match &self.list_groups {
            Some(f) => f(),
            None => not_mocked("list_groups"),
        }
    }

    async fn list_memberships(&self) -> ClientResponse<MembershipListing> {
        self.record(Call::ListMemberships);
        match &self.list_memberships {
            Some(f) => f(),
            None => not_mocked("list_memberships"),
        }
    }

    async fn add_user_to_group(&self, request: &MembershipRequest) -> ClientResponse<()> {
        self.record(Call::AddUserToGroup(*request));
        match &self.add_user_to_group {
            Some(f) => f(request),
            None => not_mocked("add_user_to_group"),
        }
    }

    async fn remove_user_from_group(&self, membership_id: i64) -> ClientResponse<()> {
        self.record(Call::RemoveUserFromGroup(membership_id));
        match &self.remove_user_from_group {
            Some(f) => f(&membership_id),
            None => not_mocked("remove_user_from_group"),
        }
    }

    async fn update_user_active_status(
        &self,
        user_id: i64,
        active: bool,
    ) -> ClientResponse<Option<User>> {
        self.record(Call::UpdateUserActiveStatus { user_id, active });
        match &self.update_user_active_status {
            Some(f) => f(user_id, active),
            None => not_mocked("update_user_active_status"),
        }
    }

    async fn create_user(&self, request: &CreateUserRequest) -> ClientResponse<User> {
        self.record(Call::CreateUser {
            email: request.email.clone(),
            password: request.password.expose_secret().to_string(),
        });
        match &self.create_user {
            Some(f) => f(request),
            None => not_mocked("create_user"),
        }
    }

    fn is_paid_plan(&self) -> bool {
        self.paid_plan.load(Ordering::SeqCst)
    }

    async fn get_version(&self) -> ClientResponse<VersionInfo> {
        self.record(Call::GetVersion);
        match &self.get_version {
            Some(f) => f(),
            None => not_mocked("get_version"),
        }
    }
}

/// Credential generator that always returns the same password.
pub struct FixedPassword(pub &'static str);

impl CredentialGenerator for FixedPassword {
    fn generate(&self) -> ConnectorResult<SecretString> {
        Ok(SecretString::from(self.0.to_string()))
    }
}

pub const TEST_PASSWORD: &str = "Temp#Pass1234";
pub const TEST_PAGE_SIZE: u32 = 50;

/// Connector over a mock client with a fixed initial password.
pub fn connector(mock: &Arc<MockDirectoryClient>) -> MetabaseConnector {
    let client: Arc<dyn DirectoryClient> = mock.clone();
    MetabaseConnector::with_credential_generator(
        client,
        TEST_PAGE_SIZE,
        Arc::new(FixedPassword(TEST_PASSWORD)),
    )
}

pub fn user(id: i64, first: &str, last: &str, email: &str) -> User {
    User {
        id,
        email: email.to_string(),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        is_active: true,
    }
}

pub fn group(id: i64, name: &str, member_count: i64) -> Group {
    Group {
        id,
        name: name.to_string(),
        member_count,
    }
}

pub fn membership(membership_id: i64, group_id: i64, user_id: i64, manager: bool) -> Membership {
    Membership {
        membership_id,
        group_id,
        user_id,
        is_group_manager: manager,
    }
}

/// Listing bucketed by group id, the way Metabase returns it.
pub fn listing(rows: Vec<Membership>) -> MembershipListing {
    let mut listing = MembershipListing::new();
    for row in rows {
        listing.entry(row.group_id.to_string()).or_default().push(row);
    }
    listing
}

pub fn api_error(status: u16, message: &str) -> MetabaseError {
    MetabaseError::Api {
        status,
        message: message.to_string(),
    }
}

pub fn rate_limit(limit: u64) -> RateLimitDescription {
    RateLimitDescription::with_limit(limit)
}

/// JSON body of a Metabase user.
pub fn user_json(id: i64, first: &str, last: &str, active: bool) -> Value {
    json!({
        "id": id,
        "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        "first_name": first,
        "last_name": last,
        "common_name": format!("{first} {last}"),
        "is_active": active,
        "is_superuser": false,
        "last_login": null
    })
}
