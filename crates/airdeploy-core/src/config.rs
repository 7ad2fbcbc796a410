// ── Runtime configuration ──
//
// These types describe how to reach a controller and how to run a
// deployment. They carry credential data and tuning, but never touch disk.
// The CLI constructs them and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://controller.example.com`).
    pub url: Url,
    pub api_key: SecretString,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build the HTTP client for this controller.
    pub fn connect(&self) -> Result<airdeploy_api::Client, crate::CoreError> {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => airdeploy_api::TlsMode::System,
            TlsVerification::CustomCa(path) => airdeploy_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => airdeploy_api::TlsMode::DangerAcceptInvalid,
        };
        let transport = airdeploy_api::TransportConfig {
            tls,
            timeout: self.timeout,
        };
        let client =
            airdeploy_api::Client::from_api_key(self.url.as_str(), &self.api_key, &transport)?;
        Ok(client)
    }
}

/// Default number of in-flight assignment calls per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Knobs for a single `deploy` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployOptions {
    /// Validate, discover and compute targets only. No remote writes, no store writes.
    pub dry_run: bool,
    /// Push configuration to devices after assignment.
    pub sync: bool,
    /// Assignment calls in flight at once. Zero is treated as one.
    pub batch_size: usize,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            sync: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl DeployOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub(crate) fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
