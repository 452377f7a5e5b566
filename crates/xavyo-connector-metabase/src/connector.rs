//! Metabase connector facade.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};
use xavyo_connector::account::{ActionResponse, ActionSchema, ArgumentBag, FieldSchema};
use xavyo_connector::annotations::{Annotated, Annotations};
use xavyo_connector::error::{ConnectorError, ConnectorResult};
use xavyo_connector::traits::{
    AccountManager, ActionManager, Connector, ConnectorMetadata, GrantProvisioner, ResourceSyncer,
};

use crate::actions::{
    action_schemas, set_user_status, UserStatusRequest, DISABLE_USER_ACTION, ENABLE_USER_ACTION,
};
use crate::client::DirectoryClient;
use crate::credentials::{CredentialGenerator, RandomPasswordGenerator};
use crate::error::backend_error;
use crate::groups::GroupSyncer;
use crate::users::UserSyncer;
use crate::{MetabaseClient, MetabaseConfig, MetabaseCredentials, MetabaseError};

/// Metabase connector: user and group syncers plus user-status actions.
pub struct MetabaseConnector {
    client: Arc<dyn DirectoryClient>,
    users: Arc<UserSyncer>,
    groups: Arc<GroupSyncer>,
}

impl std::fmt::Debug for MetabaseConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetabaseConnector").finish_non_exhaustive()
    }
}

impl MetabaseConnector {
    /// Create a connector talking to a Metabase instance over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MetabaseConfig, credentials: MetabaseCredentials) -> ConnectorResult<Self> {
        let client = MetabaseClient::new(&config, credentials).map_err(|e| match e {
            MetabaseError::Config(message) => ConnectorError::InvalidConfiguration { message },
            other => ConnectorError::InvalidConfiguration {
                message: other.to_string(),
            },
        })?;
        Ok(Self::with_client(Arc::new(client), config.page_size))
    }

    /// Create a connector over any directory client.
    pub fn with_client(client: Arc<dyn DirectoryClient>, page_size: u32) -> Self {
        Self::with_credential_generator(
            client,
            page_size,
            Arc::new(RandomPasswordGenerator::default()),
        )
    }

    /// Create a connector with a custom initial-password generator.
    pub fn with_credential_generator(
        client: Arc<dyn DirectoryClient>,
        page_size: u32,
        credentials: Arc<dyn CredentialGenerator>,
    ) -> Self {
        Self {
            users: Arc::new(UserSyncer::new(client.clone(), credentials, page_size)),
            groups: Arc::new(GroupSyncer::new(client.clone())),
            client,
        }
    }

    /// The user syncer; also provisions accounts.
    #[must_use]
    pub fn users(&self) -> Arc<UserSyncer> {
        self.users.clone()
    }

    /// The group syncer; also grants and revokes memberships.
    #[must_use]
    pub fn groups(&self) -> Arc<GroupSyncer> {
        self.groups.clone()
    }

    /// All syncers, users first.
    #[must_use]
    pub fn resource_syncers(&self) -> Vec<Arc<dyn ResourceSyncer>> {
        let users: Arc<dyn ResourceSyncer> = self.users.clone();
        let groups: Arc<dyn ResourceSyncer> = self.groups.clone();
        vec![users, groups]
    }

    /// Syncers that can mutate grants.
    #[must_use]
    pub fn grant_provisioners(&self) -> Vec<Arc<dyn GrantProvisioner>> {
        let groups: Arc<dyn GrantProvisioner> = self.groups.clone();
        vec![groups]
    }

    /// The account manager.
    #[must_use]
    pub fn account_manager(&self) -> Arc<dyn AccountManager> {
        self.users.clone()
    }

    /// Reactivate a user.
    #[instrument(skip(self, args))]
    pub async fn enable_user(&self, args: &ArgumentBag) -> Annotated<ActionResponse> {
        self.update_user_status(args, true).await
    }

    /// Deactivate a user.
    #[instrument(skip(self, args))]
    pub async fn disable_user(&self, args: &ArgumentBag) -> Annotated<ActionResponse> {
        self.update_user_status(args, false).await
    }

    async fn update_user_status(&self, args: &ArgumentBag, active: bool) -> Annotated<ActionResponse> {
        let request = match UserStatusRequest::from_args(args, active) {
            Ok(request) => request,
            Err(e) => return Annotated::err(e),
        };
        let mut annotations = Annotations::new();
        let result = set_user_status(self.client.as_ref(), &request, &mut annotations).await;
        Annotated::new(result, annotations)
    }
}

#[async_trait]
impl Connector for MetabaseConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "Metabase".to_string(),
            description: "Syncs Metabase users, groups and group memberships".to_string(),
            account_creation_schema: vec![
                FieldSchema::required("email", "Email"),
                FieldSchema::optional("first_name", "First name"),
                FieldSchema::optional("last_name", "Last name"),
            ],
        }
    }

    #[instrument(skip(self))]
    async fn validate(&self) -> Annotated<()> {
        let mut annotations = Annotations::new();
        let result = self
            .client
            .get_version()
            .await
            .absorb(&mut annotations)
            .map(|version| {
                info!(
                    version = %version.tag,
                    paid_plan = version.is_paid_plan(),
                    "Validated Metabase connection"
                );
            })
            .map_err(|e| backend_error("failed to fetch Metabase version", e));
        Annotated::new(result, annotations)
    }
}

#[async_trait]
impl ActionManager for MetabaseConnector {
    fn action_schemas(&self) -> Vec<ActionSchema> {
        action_schemas()
    }

    #[instrument(skip(self, args))]
    async fn invoke_action(&self, name: &str, args: &ArgumentBag) -> Annotated<ActionResponse> {
        match name {
            ENABLE_USER_ACTION => self.enable_user(args).await,
            DISABLE_USER_ACTION => self.disable_user(args).await,
            other => Annotated::err(ConnectorError::invalid_argument(format!(
                "unknown action {other:?}"
            ))),
        }
    }
}
