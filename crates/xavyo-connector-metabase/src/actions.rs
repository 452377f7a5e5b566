//! User status actions.

use tracing::info;
use xavyo_connector::account::{ActionResponse, ActionSchema, ArgumentBag, FieldSchema};
use xavyo_connector::annotations::Annotations;
use xavyo_connector::error::{ConnectorError, ConnectorResult};

use crate::client::DirectoryClient;
use crate::error::backend_error;
use crate::resources::{parse_backend_id, USER_RESOURCE_TYPE_ID};

pub const ENABLE_USER_ACTION: &str = "enable_user";
pub const DISABLE_USER_ACTION: &str = "disable_user";
pub const USER_ID_ARGUMENT: &str = "userId";

/// Validated request to flip a user's active flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatusRequest {
    pub user_id: i64,
    pub active: bool,
}

impl UserStatusRequest {
    /// Build from an action argument bag. Only `userId` is accepted, and it
    /// must be a numeric Metabase user id.
    pub fn from_args(args: &ArgumentBag, active: bool) -> ConnectorResult<Self> {
        let user_id = parse_backend_id(
            USER_RESOURCE_TYPE_ID,
            &args.required_argument(USER_ID_ARGUMENT)?,
        )?;
        if let Some(unknown) = args.keys().find(|k| *k != USER_ID_ARGUMENT) {
            return Err(ConnectorError::invalid_argument(format!(
                "unsupported argument {unknown:?}"
            )));
        }
        Ok(Self { user_id, active })
    }

    fn verb(&self) -> &'static str {
        if self.active {
            "enable"
        } else {
            "disable"
        }
    }
}

fn user_status_schema(name: &str, display_name: &str) -> ActionSchema {
    ActionSchema {
        name: name.to_string(),
        display_name: display_name.to_string(),
        arguments: vec![FieldSchema::required(USER_ID_ARGUMENT, "User ID")],
        return_types: vec![FieldSchema::required("success", "Success")],
    }
}

/// Schemas of the supported actions.
#[must_use]
pub fn action_schemas() -> Vec<ActionSchema> {
    vec![
        user_status_schema(ENABLE_USER_ACTION, "Enable User"),
        user_status_schema(DISABLE_USER_ACTION, "Disable User"),
    ]
}

/// Issue exactly one active-status update for the request.
pub(crate) async fn set_user_status(
    client: &dyn DirectoryClient,
    request: &UserStatusRequest,
    annotations: &mut Annotations,
) -> ConnectorResult<ActionResponse> {
    let user = client
        .update_user_active_status(request.user_id, request.active)
        .await
        .absorb(annotations)
        .map_err(|e| {
            backend_error(
                format!("failed to {} user {}", request.verb(), request.user_id),
                e,
            )
        })?;

    info!(
        user_id = request.user_id,
        is_active = user.map_or(request.active, |u| u.is_active),
        "Updated Metabase user status"
    );
    Ok(ActionResponse::success())
}
