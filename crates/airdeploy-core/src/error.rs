// ── Core error types ──
//
// User-facing errors from airdeploy-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<airdeploy_api::Error>`
// impl translates transport-layer errors into domain variants.
//
// Mismatches between intended and observed state are NOT errors. They are
// modeled in `crate::model::MismatchReason`.

use thiserror::Error;

use crate::effective::PolicyViolation;
use crate::model::EntityId;
use crate::store::StoreError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Invalid deployment policy for site {site_id}: {}", format_violations(.violations))]
    PolicyInvalid {
        site_id: EntityId,
        violations: Vec<PolicyViolation>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Controller-specific error code, when the body carried one.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Storage errors ───────────────────────────────────────────────
    #[error(transparent)]
    Storage(#[from] StoreError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Storage ran out of room; callers should prompt for cleanup.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Storage(StoreError::QuotaExceeded { .. }))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Storage(StoreError::NotFound { .. })
        )
    }
}

fn format_violations(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<airdeploy_api::Error> for CoreError {
    fn from(err: airdeploy_api::Error) -> Self {
        match err {
            airdeploy_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            airdeploy_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            airdeploy_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        entity_type: "resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            airdeploy_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            airdeploy_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            airdeploy_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            airdeploy_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                code: Some("rate_limited".into()),
                status: Some(429),
            },
            airdeploy_api::Error::Api {
                message,
                code: _,
                status: 404,
            } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            airdeploy_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            airdeploy_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_404_becomes_not_found() {
        let err = CoreError::from(airdeploy_api::Error::Api {
            message: "profile p9 not found".into(),
            code: Some("not_found".into()),
            status: 404,
        });
        assert!(err.is_not_found());
    }

    #[test]
    fn quota_is_distinguished_from_io() {
        let quota = CoreError::from(StoreError::QuotaExceeded {
            collection: "wlan_profile_assignments".into(),
            required: 2048,
            limit: 1024,
        });
        assert!(quota.is_quota_exceeded());

        let io = CoreError::from(StoreError::Io {
            collection: "wlan_profile_assignments".into(),
            source: std::io::Error::other("disk on fire"),
        });
        assert!(!io.is_quota_exceeded());
    }
}
