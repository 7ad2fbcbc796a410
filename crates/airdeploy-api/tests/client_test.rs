// Integration tests for `Client` using wiremock.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use airdeploy_api::types::{ServiceCreate, ServiceRef};
use airdeploy_api::{Client, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let client = Client::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn profile_body(id: &str, services: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "profileName": "AP3000-default",
        "deviceGroupId": "dg-1",
        "services": services,
        "radios": [{ "band": "5GHz", "channel": 36 }]
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_device_groups() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/sites/site-1/devicegroups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "dg-1", "groupName": "Lobby", "siteId": "site-1" },
            { "id": "dg-2", "name": "Warehouse" }
        ])))
        .mount(&server)
        .await;

    let groups = client.list_device_groups("site-1").await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].group_name.as_deref(), Some("Lobby"));
    assert_eq!(groups[1].name.as_deref(), Some("Warehouse"));
    assert!(groups[1].site_id.is_none());
}

#[tokio::test]
async fn test_get_profile_accepts_both_service_shapes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/profiles/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(
            "p1",
            json!(["svc-a", { "serviceId": "svc-b", "radioIfList": [1, 2] }]),
        )))
        .mount(&server)
        .await;

    let profile = client.get_profile("p1").await.unwrap();

    assert_eq!(profile.profile_name.as_deref(), Some("AP3000-default"));
    assert!(profile.has_service("svc-a"));
    assert!(profile.has_service("svc-b"));
    assert!(!profile.has_service("svc-c"));
    assert!(matches!(profile.services[1], ServiceRef::Object(_)));
    assert!(profile.extra.contains_key("radios"));
}

#[tokio::test]
async fn test_assign_service_puts_full_profile() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/profiles/p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(profile_body("p1", json!(["svc-a"]))),
        )
        .mount(&server)
        .await;

    let expected_put = profile_body("p1", json!(["svc-a", { "serviceId": "svc-new" }]));
    Mock::given(method("PUT"))
        .and(path("/management/v1/profiles/p1"))
        .and(body_json(&expected_put))
        .respond_with(ResponseTemplate::new(200).set_body_json(&expected_put))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client.assign_service_to_profile("svc-new", "p1").await.unwrap();
    assert!(updated.has_service("svc-new"));
}

#[tokio::test]
async fn test_assign_already_present_skips_put() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/profiles/p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(profile_body("p1", json!(["svc-a"]))),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let profile = client.assign_service_to_profile("svc-a", "p1").await.unwrap();
    assert!(profile.has_service("svc-a"));
}

#[tokio::test]
async fn test_unassign_service() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/profiles/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile_body("p1", json!(["svc-a", "svc-b"]))),
        )
        .mount(&server)
        .await;

    let expected_put = profile_body("p1", json!(["svc-b"]));
    Mock::given(method("PUT"))
        .and(path("/management/v1/profiles/p1"))
        .and(body_json(&expected_put))
        .respond_with(ResponseTemplate::new(200).set_body_json(&expected_put))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client.unassign_service_from_profile("svc-a", "p1").await.unwrap();
    assert!(!updated.has_service("svc-a"));
}

#[tokio::test]
async fn test_create_service() {
    let (server, client) = setup().await;

    let request = ServiceCreate {
        service_name: "Guest".into(),
        ssid: "Guest".into(),
        status: "enabled".into(),
        security_mode: "WPA2_PSK".into(),
        passphrase: Some("hunter22".into()),
        vlan_id: Some(30),
        band: "all".into(),
    };

    Mock::given(method("POST"))
        .and(path("/management/v1/services"))
        .and(body_json(json!({
            "serviceName": "Guest",
            "ssid": "Guest",
            "status": "enabled",
            "securityMode": "WPA2_PSK",
            "passphrase": "hunter22",
            "vlanId": 30,
            "band": "all"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "svc-9",
            "serviceName": "Guest",
            "ssid": "Guest",
            "status": "enabled",
            "vlanId": 30
        })))
        .mount(&server)
        .await;

    let created = client.create_service(&request).await.unwrap();
    assert_eq!(created.id, "svc-9");
    assert_eq!(created.vlan_id, Some(30));
}

#[tokio::test]
async fn test_sync_profiles_batch_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/management/v1/profiles/sync"))
        .and(body_json(json!({ "profileIds": ["p1", "p2"] })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .sync_profiles(&["p1".to_owned(), "p2".to_owned()])
        .await
        .unwrap();
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/profiles/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Profile not found",
            "errorCode": "profile.not-found"
        })))
        .mount(&server)
        .await;

    let err = client.get_profile("missing").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.api_error_code(), Some("profile.not-found"));
    assert!(err.to_string().contains("Profile not found"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/sites"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_sites().await.unwrap_err();
    assert!(matches!(err, Error::InvalidApiKey));
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/management/v1/profiles/p1/sync"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = client.sync_profile("p1").await.unwrap_err();
    assert!(matches!(err, Error::RateLimited { retry_after_secs: 7 }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_bad_json_reports_deserialization() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.list_services().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "not json"),
        other => panic!("expected deserialization error, got {other:?}"),
    }
}
