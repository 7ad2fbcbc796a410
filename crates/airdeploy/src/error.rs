//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use airdeploy_config::ConfigError;
use airdeploy_core::{CoreError, StoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const STORAGE_QUOTA: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(airdeploy::connection_failed),
        help(
            "Check that the controller is running and reachable: {reason}\n\
             Self-signed certificate? Try --insecure or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(airdeploy::timeout),
        help("Increase timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(airdeploy::auth_failed),
        help("Verify the API key for this profile, or re-run: airdeploy config init")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(airdeploy::no_credentials),
        help(
            "Configure credentials with: airdeploy config init\n\
             Or set the AIRDEPLOY_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(airdeploy::not_found),
        help("Run: airdeploy {list_command} to see what is tracked")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(airdeploy::api_error))]
    ApiError { code: String, message: String },

    #[error("Operation '{operation}' is not supported by this controller")]
    #[diagnostic(code(airdeploy::unsupported))]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(airdeploy::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid deployment policy for site {site}")]
    #[diagnostic(
        code(airdeploy::policy_invalid),
        help("{violations}")
    )]
    PolicyInvalid { site: String, violations: String },

    // ── Outcomes ─────────────────────────────────────────────────────
    #[error("{operation}: {failed} of {total} failed")]
    #[diagnostic(
        code(airdeploy::partial_failure),
        help("Inspect with: airdeploy assignments <WLAN> --unhealthy, then run: airdeploy remediate <WLAN>")
    )]
    PartialFailure {
        operation: String,
        failed: usize,
        total: usize,
    },

    // ── Storage ──────────────────────────────────────────────────────
    #[error("Assignment store is full ({required} bytes needed, limit {limit})")]
    #[diagnostic(
        code(airdeploy::storage_quota),
        help(
            "Forget WLANs you no longer manage with: airdeploy delete <WLAN>\n\
             Or raise [store] quota_bytes in the config file."
        )
    )]
    StorageQuota { required: u64, limit: u64 },

    #[error("Assignment store error: {message}")]
    #[diagnostic(code(airdeploy::storage))]
    Storage { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(airdeploy::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: airdeploy config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(airdeploy::no_config),
        help(
            "Create a config with: airdeploy config init\n\
             Expected at: {path}\n\
             Or pass --controller and --api-key."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(airdeploy::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(code(airdeploy::keyring))]
    Keyring(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(airdeploy::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(airdeploy::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    #[diagnostic(code(airdeploy::yaml), help("Check the file contents and try again."))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. }
            | Self::PolicyInvalid { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::StorageQuota { .. } => exit_code::STORAGE_QUOTA,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Keyring(e) => CliError::Keyring(e.to_string()),
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuotaExceeded {
                required, limit, ..
            } => CliError::StorageQuota { required, limit },
            other => CliError::Storage {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: "status".into(),
                resource_type: entity_type,
                identifier,
            },

            CoreError::PolicyInvalid {
                site_id,
                violations,
            } => CliError::PolicyInvalid {
                site: site_id.to_string(),
                violations: violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Unsupported { operation } => CliError::Unsupported { operation },

            CoreError::OperationFailed { message } => CliError::ApiError {
                code: "operation_failed".into(),
                message,
            },

            CoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Storage(e) => e.into(),

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}
