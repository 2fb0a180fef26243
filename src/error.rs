//! Provider-level errors

use crate::id::IdError;
use crate::mapper::MapError;
use crate::schema::SchemaError;
use crate::state::StateError;
use crate::tencentcloud::error::{format_sdk_error, SdkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Id(#[from] IdError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    State(#[from] StateError),

    /// Local precondition on the configuration or the remote entity
    #[error("[CHECK][{resource}][{op}] check: {message}")]
    Check {
        resource: String,
        op: &'static str,
        message: String,
    },

    #[error("argument `{0}` cannot be changed")]
    Immutable(String),

    #[error("changing {} requires replacing the resource", .0.join(", "))]
    RequiresReplace(Vec<String>),

    /// Replacement deleted `id`, then failed to create its successor
    #[error("`{id}` was deleted for replacement, but create failed: {source}")]
    ReplaceFailed {
        id: String,
        #[source]
        source: Box<ProviderError>,
    },

    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    #[error("{0} does not support import")]
    NotImportable(String),

    #[error("{resource} `{id}` not found")]
    NotFound { resource: String, id: String },

    #[error("{0}: create finished without setting an id")]
    MissingId(String),

    #[error("CLB task {task_id} {state}")]
    Task { task_id: String, state: &'static str },

    #[error("writing {path} failed: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },
}

impl ProviderError {
    pub fn check(resource: &str, op: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Check {
            resource: resource.to_string(),
            op,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ProviderError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the instance in prior state no longer exists remotely
    pub fn prior_deleted(&self) -> bool {
        matches!(self, ProviderError::ReplaceFailed { .. })
    }

    /// Short message for the terminal
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Sdk(e) => format_sdk_error(e),
            ProviderError::ReplaceFailed { id, source } => {
                format!("`{}` was deleted for replacement, but create failed: {}", id, source.user_message())
            },
            other => other.to_string(),
        }
    }
}
