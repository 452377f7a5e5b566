//! Connector Framework error types
//!
//! Error definitions with validation/backend classification. Validation errors
//! are raised before any backend call; backend errors always carry the name of
//! the operation that failed.

use thiserror::Error;

/// Boxed source error returned by a directory backend.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Validation errors (raised before any backend call)
    /// A required action argument was not supplied.
    #[error("missing required argument {name}")]
    MissingArgument { name: String },

    /// A required profile field was not supplied.
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// An argument was supplied but could not be interpreted.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A resource id could not be converted to the backend's id format.
    #[error("invalid {resource_type} id {id:?}: {message}")]
    InvalidResourceId {
        resource_type: String,
        id: String,
        message: String,
    },

    // Unsupported input
    /// The entitlement does not name a permission this connector understands.
    #[error("unsupported entitlement id {id:?}")]
    UnsupportedEntitlement { id: String },

    // Backend errors
    /// A directory backend call failed.
    #[error("{context}: {source}")]
    Backend {
        context: String,
        transient: bool,
        #[source]
        source: BoxedSource,
    },

    // Configuration errors
    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ConnectorError {
    /// Check if this error was raised by input validation.
    ///
    /// Validation errors never reach the backend and never carry rate-limit
    /// annotations.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConnectorError::MissingArgument { .. }
                | ConnectorError::MissingField { .. }
                | ConnectorError::InvalidArgument { .. }
                | ConnectorError::InvalidResourceId { .. }
                | ConnectorError::UnsupportedEntitlement { .. }
        )
    }

    /// Check if this error is transient and the caller may retry later.
    ///
    /// The engine never retries on its own; this only informs the host.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ConnectorError::Backend { transient: true, .. })
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::MissingArgument { .. } => "MISSING_ARGUMENT",
            ConnectorError::MissingField { .. } => "MISSING_FIELD",
            ConnectorError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            ConnectorError::InvalidResourceId { .. } => "INVALID_RESOURCE_ID",
            ConnectorError::UnsupportedEntitlement { .. } => "UNSUPPORTED_ENTITLEMENT",
            ConnectorError::Backend { .. } => "BACKEND_ERROR",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create a missing argument error.
    pub fn missing_argument(name: impl Into<String>) -> Self {
        ConnectorError::MissingArgument { name: name.into() }
    }

    /// Create a missing profile field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        ConnectorError::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ConnectorError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid resource id error.
    pub fn invalid_resource_id(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        ConnectorError::InvalidResourceId {
            resource_type: resource_type.into(),
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Create an unsupported entitlement error.
    pub fn unsupported_entitlement(id: impl Into<String>) -> Self {
        ConnectorError::UnsupportedEntitlement { id: id.into() }
    }

    /// Wrap a backend failure with the operation that produced it.
    pub fn backend(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Backend {
            context: context.into(),
            transient: false,
            source: Box::new(source),
        }
    }

    /// Wrap a backend failure that the host may retry later.
    pub fn transient_backend(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Backend {
            context: context.into(),
            transient: true,
            source: Box::new(source),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ConnectorError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
