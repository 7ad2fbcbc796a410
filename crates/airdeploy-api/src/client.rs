// Hand-crafted async HTTP client for the controller management API.
//
// Base path: /management/v1/
// Auth: X-API-KEY header

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    DeviceGroupResponse, ProfileResponse, ServiceAssignment, ServiceCreate, ServiceRef,
    ServiceResponse, SiteResponse, SyncRequest,
};

// ── Error response shape from the management API ────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "errorCode")]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the controller management API.
///
/// Uses API-key authentication and communicates via JSON REST endpoints
/// under `/management/v1/`. Cheap to clone: the inner `reqwest::Client`
/// is reference counted.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `X-API-KEY` as a default header on every request.
    pub fn from_api_key(
        base_url: &str,
        api_key: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("X-API-KEY", key_value);

        let http = transport.build_client(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Build the base URL ending in `/management`.
    ///
    /// `https://host` and `https://host/management/` both become
    /// `https://host/management`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/management") {
            url.set_path(&path);
        } else {
            url.set_path(&format!("{path}/management"));
        }

        Ok(url)
    }

    /// The normalized API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<(), Error> {
        let url = self.url(segments)?;
        debug!("POST {url}");

        let mut req = self.http.post(url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        self.handle_empty(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), Error> {
        let url = self.url(segments)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidApiKey;
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(1);
            return Error::RateLimited { retry_after_secs };
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            Error::Api {
                status: status.as_u16(),
                message: err.message.unwrap_or_else(|| status.to_string()),
                code: err.code,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }

    // ── Sites & device groups ────────────────────────────────────────

    pub async fn list_sites(&self) -> Result<Vec<SiteResponse>, Error> {
        self.get(&["v1", "sites"]).await
    }

    pub async fn list_device_groups(&self, site_id: &str) -> Result<Vec<DeviceGroupResponse>, Error> {
        self.get(&["v1", "sites", site_id, "devicegroups"]).await
    }

    // ── Profiles ─────────────────────────────────────────────────────

    pub async fn list_profiles(&self, device_group_id: &str) -> Result<Vec<ProfileResponse>, Error> {
        self.get(&["v1", "devicegroups", device_group_id, "profiles"])
            .await
    }

    pub async fn get_profile(&self, profile_id: &str) -> Result<ProfileResponse, Error> {
        self.get(&["v1", "profiles", profile_id]).await
    }

    pub async fn update_profile(&self, profile: &ProfileResponse) -> Result<ProfileResponse, Error> {
        self.put(&["v1", "profiles", profile.id.as_str()], profile).await
    }

    /// Add a service to a profile's service list.
    ///
    /// Read-modify-write: fetches the profile, appends the service if it is
    /// not already present, and writes the full profile back. Returns the
    /// profile as the controller reports it afterwards.
    pub async fn assign_service_to_profile(
        &self,
        service_id: &str,
        profile_id: &str,
    ) -> Result<ProfileResponse, Error> {
        let mut profile = self.get_profile(profile_id).await?;
        if profile.has_service(service_id) {
            debug!(service_id, profile_id, "service already assigned");
            return Ok(profile);
        }

        profile.services.push(ServiceRef::Object(ServiceAssignment {
            service_id: service_id.to_owned(),
            extra: std::collections::HashMap::new(),
        }));
        self.update_profile(&profile).await
    }

    /// Remove a service from a profile's service list.
    pub async fn unassign_service_from_profile(
        &self,
        service_id: &str,
        profile_id: &str,
    ) -> Result<ProfileResponse, Error> {
        let mut profile = self.get_profile(profile_id).await?;
        if !profile.has_service(service_id) {
            debug!(service_id, profile_id, "service not assigned");
            return Ok(profile);
        }

        profile.services.retain(|s| s.service_id() != service_id);
        self.update_profile(&profile).await
    }

    // ── Services ─────────────────────────────────────────────────────

    pub async fn list_services(&self) -> Result<Vec<ServiceResponse>, Error> {
        self.get(&["v1", "services"]).await
    }

    pub async fn create_service(&self, body: &ServiceCreate) -> Result<ServiceResponse, Error> {
        self.post(&["v1", "services"], body).await
    }

    pub async fn delete_service(&self, service_id: &str) -> Result<(), Error> {
        self.delete(&["v1", "services", service_id]).await
    }

    // ── Sync ─────────────────────────────────────────────────────────

    /// Push a single profile's configuration to its devices.
    pub async fn sync_profile(&self, profile_id: &str) -> Result<(), Error> {
        self.post_no_response::<SyncRequest>(&["v1", "profiles", profile_id, "sync"], None)
            .await
    }

    /// Push several profiles in one call. The controller treats the batch
    /// as a unit: any failure fails the whole request.
    pub async fn sync_profiles(&self, profile_ids: &[String]) -> Result<(), Error> {
        let body = SyncRequest {
            profile_ids: profile_ids.to_vec(),
        };
        self.post_no_response(&["v1", "profiles", "sync"], Some(&body))
            .await
    }
}
