//! Account lifecycle values: argument bags, action results and one-time
//! credential artifacts.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConnectorError, ConnectorResult};
use crate::resource::Resource;

/// Loosely-typed key/value arguments supplied by the host.
///
/// Connectors turn these into typed requests at the boundary, before any I/O.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgumentBag(Map<String, Value>);

impl ArgumentBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// A non-empty string value, if present.
    ///
    /// Numbers are accepted and rendered as strings since hosts send ids both
    /// ways.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A required argument; absence is a `MissingArgument` error.
    pub fn required_argument(&self, key: &str) -> ConnectorResult<String> {
        self.get_str(key)
            .ok_or_else(|| ConnectorError::missing_argument(key))
    }

    /// A required profile field; absence is a `MissingField` error.
    pub fn required_field(&self, key: &str) -> ConnectorResult<String> {
        self.get_str(key).ok_or_else(|| ConnectorError::missing_field(key))
    }

    /// Keys present in the bag.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ArgumentBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Structured result of an action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ActionResponse {
    /// A successful response with no extra fields.
    #[must_use]
    pub fn success() -> Self {
        Self {
            success: true,
            fields: Map::new(),
        }
    }

    /// Add a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A plaintext secret delivered to the host exactly once.
///
/// The connector never persists it.
#[derive(Debug)]
pub struct PlaintextData {
    pub name: String,
    pub description: String,
    pub bytes: SecretString,
}

impl PlaintextData {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        bytes: SecretString,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            bytes,
        }
    }

    /// Reveal the secret for delivery.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.bytes.expose_secret()
    }
}

/// Result of provisioning a new account.
#[derive(Debug)]
pub struct CreatedAccount {
    pub resource: Resource,
    pub plaintexts: Vec<PlaintextData>,
}

/// Field in an account-creation or action schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub display_name: String,
    pub required: bool,
}

impl FieldSchema {
    pub fn required(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            required: false,
        }
    }
}

/// Description of an action the connector can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSchema {
    pub name: String,
    pub display_name: String,
    pub arguments: Vec<FieldSchema>,
    pub return_types: Vec<FieldSchema>,
}
